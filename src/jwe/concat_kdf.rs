// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The single-hash Concat KDF (NIST SP 800-56A §5.8.1), as RFC 7518 §4.6
//! uses it to derive ECDH-ES key material.

use sha2::Digest;
use sha2::Sha256;

use crate::jwu;

/// Derives `keydatalen_bits / 8` bytes from agreement output `z`.
///
/// `input = 0x00000001 || z || len32(alg) || alg || len32(apu) || apu ||
/// len32(apv) || apv || len32(keydatalen_bits)`, output is the leading
/// `keydatalen_bits / 8` bytes of SHA-256(input) — one round suffices
/// because every `enc`/wrap-key size this crate supports is ≤ 256 bits.
pub fn derive(z: &[u8], alg: &str, apu: &[u8], apv: &[u8], keydatalen_bits: u32) -> Vec<u8> {
  let mut input: Vec<u8> = Vec::new();
  input.extend_from_slice(&jwu::pack_be_u32(1));
  input.extend_from_slice(z);
  input.extend_from_slice(&jwu::pack_be_u32(alg.len() as u32));
  input.extend_from_slice(alg.as_bytes());
  input.extend_from_slice(&jwu::pack_be_u32(apu.len() as u32));
  input.extend_from_slice(apu);
  input.extend_from_slice(&jwu::pack_be_u32(apv.len() as u32));
  input.extend_from_slice(apv);
  input.extend_from_slice(&jwu::pack_be_u32(keydatalen_bits));

  let digest = Sha256::digest(&input);
  digest[..(keydatalen_bits as usize) / 8].to_vec()
}

#[cfg(test)]
mod tests {
  use super::*;

  // RFC 7518 Appendix C.
  #[test]
  fn rfc7518_appendix_c() {
    let z: Vec<u8> = vec![
      158, 86, 217, 29, 129, 113, 53, 211, 114, 131, 66, 131, 191, 132, 38, 156, 251, 49, 110, 163, 218, 128, 106,
      72, 246, 218, 167, 121, 140, 254, 144, 196,
    ];
    let apu = b"Alice";
    let apv = b"Bob";
    let derived = derive(&z, "A128GCM", apu, apv, 128);
    let expected: Vec<u8> = vec![
      86, 170, 141, 234, 248, 35, 109, 32, 92, 34, 40, 205, 113, 167, 16, 26,
    ];
    assert_eq!(derived, expected);
  }
}
