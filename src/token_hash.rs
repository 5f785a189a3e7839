// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! `at_hash`/`c_hash` (OpenID Connect Core §3.1.3.6 / RFC 7519 §5 style):
//! base64url(left half of the hash matching the ID token's signing
//! algorithm), applied to an access token or authorization code.

use crate::error::Result;
use crate::jws::JwsAlgorithm;
use crate::jws::short_hash;
use crate::jwu;

/// Computes `at_hash`/`c_hash` for `value`, hashed with the algorithm
/// family matching the JWS `alg` that will sign the enclosing ID token.
pub fn compute(alg: JwsAlgorithm, value: &[u8]) -> Result<String> {
  let left_half: Vec<u8> = short_hash(alg, value)?;
  Ok(jwu::encode_b64(left_half))
}

/// Verifies `value` against a previously-computed `at_hash`/`c_hash`.
pub fn verify(alg: JwsAlgorithm, value: &[u8], expected_b64: &str) -> Result<bool> {
  let actual: String = compute(alg, value)?;
  Ok(jwu::secure_compare(actual.as_bytes(), expected_b64.as_bytes()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn at_hash_is_half_the_digest() {
    let hash: String = compute(JwsAlgorithm::HS256, b"access-token-value").unwrap();
    let decoded = jwu::decode_b64(&hash).unwrap();
    assert_eq!(decoded.len(), 16);
  }

  #[test]
  fn verify_rejects_tampered_value() {
    let hash: String = compute(JwsAlgorithm::HS256, b"access-token-value").unwrap();
    assert!(!verify(JwsAlgorithm::HS256, b"different-value", &hash).unwrap());
  }
}
