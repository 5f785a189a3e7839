// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! PBES2-HS256+A128KW / HS384+A192KW / HS512+A256KW (RFC 7518 §4.8):
//! PBKDF2 over a password-based JWK derives the AES key-wrap key, which
//! then wraps the cek with [`super::aes_kw`]. Salt and iteration count
//! ride in the header as `p2s`/`p2c`.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;

use crate::error::Error;
use crate::error::Result;
use crate::jwu;

use super::aes_kw;
use super::JweAlgorithm;

pub const DEFAULT_ITERATION_COUNT: u32 = 4096;
const DEFAULT_SALT_INPUT_LEN: usize = 8;

fn derived_key_len(alg: JweAlgorithm) -> usize {
  match alg {
    JweAlgorithm::Pbes2Hs256A128Kw => 16,
    JweAlgorithm::Pbes2Hs384A192Kw => 24,
    JweAlgorithm::Pbes2Hs512A256Kw => 32,
    _ => unreachable!("derived_key_len only called for PBES2-* algorithms"),
  }
}

/// Builds the PBKDF2 salt: `alg || 0x00 || salt_input` (RFC 7518 §4.8.1.1).
fn salt(alg: JweAlgorithm, salt_input: &[u8]) -> Vec<u8> {
  jwu::concat(&[alg.name().as_bytes(), &[0x00], salt_input])
}

fn derive(alg: JweAlgorithm, password: &[u8], salt_input: &[u8], iterations: u32) -> Vec<u8> {
  let salt: Vec<u8> = salt(alg, salt_input);
  let key_len: usize = derived_key_len(alg);
  let mut out: Vec<u8> = vec![0u8; key_len];
  match alg {
    JweAlgorithm::Pbes2Hs256A128Kw => pbkdf2_hmac::<Sha256>(password, &salt, iterations, &mut out),
    JweAlgorithm::Pbes2Hs384A192Kw => pbkdf2_hmac::<Sha384>(password, &salt, iterations, &mut out),
    JweAlgorithm::Pbes2Hs512A256Kw => pbkdf2_hmac::<Sha512>(password, &salt, iterations, &mut out),
    _ => unreachable!("derive only called for PBES2-* algorithms"),
  }
  out
}

pub struct Params {
  pub salt_input: Vec<u8>,
  pub iterations: u32,
}

/// Wraps `cek` with a key derived from `password`, generating a fresh
/// random salt input. Returns the wrapped key alongside the header
/// parameters the caller must emit as `p2s`/`p2c`.
pub fn wrap(alg: JweAlgorithm, password: &[u8], cek: &[u8]) -> Result<(Vec<u8>, Params)> {
  let salt_input: Vec<u8> = jwu::secure_random(DEFAULT_SALT_INPUT_LEN);
  let iterations: u32 = DEFAULT_ITERATION_COUNT;
  let kek: Vec<u8> = derive(alg, password, &salt_input, iterations);
  let wrapped: Vec<u8> = aes_kw::wrap(&kek, cek)?;
  Ok((wrapped, Params { salt_input, iterations }))
}

pub fn unwrap(alg: JweAlgorithm, password: &[u8], salt_input: &[u8], iterations: u32, wrapped: &[u8]) -> Result<Vec<u8>> {
  if iterations == 0 {
    return Err(Error::DecryptionError);
  }
  let kek: Vec<u8> = derive(alg, password, salt_input, iterations);
  aes_kw::unwrap(&kek, wrapped)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roundtrip() {
    let password = b"correct horse battery staple";
    let cek: Vec<u8> = (0u8..16).collect();
    let (wrapped, params) = wrap(JweAlgorithm::Pbes2Hs256A128Kw, password, &cek).unwrap();
    let recovered = unwrap(JweAlgorithm::Pbes2Hs256A128Kw, password, &params.salt_input, params.iterations, &wrapped).unwrap();
    assert_eq!(recovered, cek);
  }

  #[test]
  fn wrong_password_fails() {
    let cek: Vec<u8> = (0u8..16).collect();
    let (wrapped, params) = wrap(JweAlgorithm::Pbes2Hs256A128Kw, b"right", &cek).unwrap();
    assert!(unwrap(JweAlgorithm::Pbes2Hs256A128Kw, b"wrong", &params.salt_input, params.iterations, &wrapped).is_err());
  }

  // RFC 7518 Appendix C: PBES2-HS256+A128KW derives a 16-byte key-wrap key
  // from the password "Thus from my lips, by yours, my sin is purged.",
  // the given salt input, and 4096 PBKDF2-HMAC-SHA256 iterations.
  #[test]
  fn rfc7518_appendix_c_derives_the_published_wrap_key() {
    let password = b"Thus from my lips, by yours, my sin is purged.";
    let salt_input: [u8; 16] = [217, 96, 147, 112, 150, 117, 70, 247, 127, 8, 155, 137, 174, 42, 80, 215];
    let expected_key: [u8; 16] = [110, 171, 169, 92, 129, 92, 109, 117, 233, 242, 116, 233, 170, 14, 24, 75];

    let derived = derive(JweAlgorithm::Pbes2Hs256A128Kw, password, &salt_input, 4096);
    assert_eq!(derived, expected_key);
  }

  // Same vector, carried through the AES Key Wrap step: wrapping the
  // RFC-published CEK with the derived key above reproduces the RFC's
  // published JWE Encrypted Key.
  #[test]
  fn rfc7518_appendix_c_wraps_the_published_cek() {
    let kek: [u8; 16] = [110, 171, 169, 92, 129, 92, 109, 117, 233, 242, 116, 233, 170, 14, 24, 75];
    let cek: [u8; 32] = [
      111, 27, 25, 52, 66, 29, 20, 78, 92, 176, 56, 240, 65, 208, 82, 112, 161, 131, 36, 55, 202, 236, 185, 172, 129, 23, 153, 194, 195,
      48, 253, 182,
    ];
    let expected_encrypted_key: [u8; 40] = [
      78, 186, 151, 59, 11, 14, 10, 120, 97, 210, 173, 156, 176, 149, 128, 35, 38, 107, 112, 24, 160, 130, 217, 142, 215, 231, 223, 192,
      69, 118, 244, 192, 133, 140, 183, 96, 73, 82, 142, 225,
    ];

    let wrapped = aes_kw::wrap(&kek, &cek).unwrap();
    assert_eq!(wrapped, expected_encrypted_key);

    let recovered = aes_kw::unwrap(&kek, &wrapped).unwrap();
    assert_eq!(recovered, cek);
  }
}
