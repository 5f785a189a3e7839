// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! AEAD content encryption: AES-CBC-HMAC-SHA2 (hand-assembled, RFC 7518
//! §5.2) and AES-GCM (native AEAD via the `aes-gcm` crate, RFC 7518 §5.3).

mod cbc_hmac;
mod gcm;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JweEncryption {
  #[serde(rename = "A128CBC-HS256")]
  A128CbcHs256,
  #[serde(rename = "A192CBC-HS384")]
  A192CbcHs384,
  #[serde(rename = "A256CBC-HS512")]
  A256CbcHs512,
  #[serde(rename = "A128GCM")]
  A128Gcm,
  #[serde(rename = "A192GCM")]
  A192Gcm,
  #[serde(rename = "A256GCM")]
  A256Gcm,
}

impl JweEncryption {
  pub fn name(self) -> &'static str {
    match self {
      JweEncryption::A128CbcHs256 => "A128CBC-HS256",
      JweEncryption::A192CbcHs384 => "A192CBC-HS384",
      JweEncryption::A256CbcHs512 => "A256CBC-HS512",
      JweEncryption::A128Gcm => "A128GCM",
      JweEncryption::A192Gcm => "A192GCM",
      JweEncryption::A256Gcm => "A256GCM",
    }
  }

  pub fn cek_bits(self) -> u32 {
    match self {
      JweEncryption::A128CbcHs256 => 256,
      JweEncryption::A192CbcHs384 => 384,
      JweEncryption::A256CbcHs512 => 512,
      JweEncryption::A128Gcm => 128,
      JweEncryption::A192Gcm => 192,
      JweEncryption::A256Gcm => 256,
    }
  }

  pub fn iv_bits(self) -> u32 {
    match self {
      JweEncryption::A128CbcHs256 | JweEncryption::A192CbcHs384 | JweEncryption::A256CbcHs512 => 128,
      JweEncryption::A128Gcm | JweEncryption::A192Gcm | JweEncryption::A256Gcm => 96,
    }
  }
}

pub struct Sealed {
  pub ciphertext: Vec<u8>,
  pub iv: Vec<u8>,
  pub tag: Vec<u8>,
}

pub fn encrypt(enc: JweEncryption, plaintext: &[u8], cek: &[u8], aad: &[u8]) -> Result<Sealed> {
  if cek.len() as u32 * 8 != enc.cek_bits() {
    return Err(Error::InvalidKey(format!("{} requires a {}-bit cek", enc.name(), enc.cek_bits())));
  }
  match enc {
    JweEncryption::A128CbcHs256 => cbc_hmac::encrypt::<sha2::Sha256, 16>(plaintext, cek, aad, 16),
    JweEncryption::A192CbcHs384 => cbc_hmac::encrypt::<sha2::Sha384, 24>(plaintext, cek, aad, 24),
    JweEncryption::A256CbcHs512 => cbc_hmac::encrypt::<sha2::Sha512, 32>(plaintext, cek, aad, 32),
    JweEncryption::A128Gcm | JweEncryption::A192Gcm | JweEncryption::A256Gcm => gcm::encrypt(enc, plaintext, cek, aad),
  }
}

pub fn decrypt(enc: JweEncryption, ciphertext: &[u8], tag: &[u8], cek: &[u8], aad: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
  if cek.len() as u32 * 8 != enc.cek_bits() {
    return Err(Error::DecryptionError);
  }
  match enc {
    JweEncryption::A128CbcHs256 => cbc_hmac::decrypt::<sha2::Sha256, 16>(ciphertext, tag, cek, aad, iv, 16),
    JweEncryption::A192CbcHs384 => cbc_hmac::decrypt::<sha2::Sha384, 24>(ciphertext, tag, cek, aad, iv, 24),
    JweEncryption::A256CbcHs512 => cbc_hmac::decrypt::<sha2::Sha512, 32>(ciphertext, tag, cek, aad, iv, 32),
    JweEncryption::A128Gcm | JweEncryption::A192Gcm | JweEncryption::A256Gcm => gcm::decrypt(enc, ciphertext, tag, cek, aad, iv),
  }
}
