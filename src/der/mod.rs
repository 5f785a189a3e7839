// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! A minimal ASN.1 DER reader/writer — just enough to parse and emit the
//! key structures PEM import/export needs (SubjectPublicKeyInfo, PKCS#1,
//! PKCS#8, RFC 5915 EC private keys). Not a general-purpose ASN.1 library.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
  Integer,
  BitString,
  OctetString,
  Null,
  ObjectIdentifier,
  Sequence,
  /// A context-specific, explicitly-tagged constructed value `[n]`.
  ContextSpecific(u8),
}

impl Tag {
  fn from_byte(byte: u8) -> Option<Self> {
    Some(match byte {
      0x02 => Tag::Integer,
      0x03 => Tag::BitString,
      0x04 => Tag::OctetString,
      0x05 => Tag::Null,
      0x06 => Tag::ObjectIdentifier,
      0x30 => Tag::Sequence,
      b if b & 0xA0 == 0xA0 => Tag::ContextSpecific(b & 0x1F),
      _ => return None,
    })
  }
}

/// A well-known object identifier, compared in its DER-encoded (not dotted)
/// byte form.
pub fn oid(dotted: &str) -> Vec<u8> {
  let parts: Vec<u64> = dotted.split('.').map(|p| p.parse().unwrap()).collect();
  let mut out: Vec<u8> = Vec::new();
  out.push((parts[0] * 40 + parts[1]) as u8);
  for &part in &parts[2..] {
    if part == 0 {
      out.push(0);
      continue;
    }
    let mut buf: Vec<u8> = Vec::new();
    let mut value: u64 = part;
    while value > 0 {
      buf.push((value & 0x7F) as u8);
      value >>= 7;
    }
    buf.reverse();
    for (i, byte) in buf.iter().enumerate() {
      out.push(if i + 1 < buf.len() { byte | 0x80 } else { *byte });
    }
  }
  out
}

pub const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
pub const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
pub const OID_P256: &str = "1.2.840.10045.3.1.7";
pub const OID_P384: &str = "1.3.132.0.34";
pub const OID_P521: &str = "1.3.132.0.35";
pub const OID_SECP256K1: &str = "1.3.132.0.10";
