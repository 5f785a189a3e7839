// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Byte and format utilities shared across the JOSE pipeline (base64url,
//! big-endian packing, constant-time compare, secure randomness).

use rand::RngCore;

use crate::error::Error;
use crate::error::Result;

/// Encodes `data` as base64url without padding (RFC 4648 §5).
pub fn encode_b64(data: impl AsRef<[u8]>) -> String {
  base64::encode_config(data, base64::URL_SAFE_NO_PAD)
}

/// Decodes base64url input. Tolerates a missing-padding input (the common
/// JOSE wire form) but rejects any character outside the url-safe alphabet.
pub fn decode_b64(data: impl AsRef<[u8]>) -> Result<Vec<u8>> {
  let input: &[u8] = data.as_ref();
  let padded: std::borrow::Cow<'_, [u8]> = match input.len() % 4 {
    0 => std::borrow::Cow::Borrowed(input),
    remainder => {
      let mut owned: Vec<u8> = input.to_vec();
      owned.resize(input.len() + (4 - remainder), b'=');
      std::borrow::Cow::Owned(owned)
    }
  };

  base64::decode_config(padded.as_ref(), base64::URL_SAFE).map_err(Error::from)
}

/// Serializes `value` to JSON and base64url-encodes the result — the
/// `BASE64URL(UTF8(JSON(value)))` operation used for protected headers and
/// JWT claim sets.
pub fn encode_json_b64<T: serde::Serialize>(value: &T) -> Result<String> {
  let json: Vec<u8> = serde_json::to_vec(value)?;
  Ok(encode_b64(json))
}

/// Inverse of [`encode_json_b64`].
pub fn decode_json_b64<T: serde::de::DeserializeOwned>(data: impl AsRef<[u8]>) -> Result<T> {
  let decoded: Vec<u8> = decode_b64(data)?;
  serde_json::from_slice(&decoded).map_err(Error::from)
}

/// Packs `value` as an 8-byte big-endian integer (the `AL` field of
/// AES-CBC-HMAC-SHA2, RFC 7518 §5.2.2.1).
pub fn pack_be_u64(value: u64) -> [u8; 8] {
  value.to_be_bytes()
}

/// Packs `value` as a 4-byte big-endian integer (the `len32(...)` fields of
/// Concat-KDF, NIST SP 800-56A §5.8.1.2).
pub fn pack_be_u32(value: u32) -> [u8; 4] {
  value.to_be_bytes()
}

/// Constant-time, length-checked byte equality.
pub fn secure_compare(lhs: &[u8], rhs: &[u8]) -> bool {
  use subtle::ConstantTimeEq;
  lhs.len() == rhs.len() && lhs.ct_eq(rhs).into()
}

/// Fills `out` with cryptographically secure random bytes from the default
/// system RNG. Callers that need deterministic output for test vectors
/// should call the primitive directly with an injected `RngCore` instead of
/// going through this helper.
pub fn secure_random(len: usize) -> Vec<u8> {
  let mut out: Vec<u8> = vec![0u8; len];
  rand::rngs::OsRng.fill_bytes(&mut out);
  out
}

/// Concatenates byte slices without an intermediate `Vec<Vec<u8>>` — used
/// throughout the AAD/MAC-input assembly in §4.6/§4.8.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
  let mut out: Vec<u8> = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
  for part in parts {
    out.extend_from_slice(part);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base64url_roundtrip() {
    for data in [&b""[..], b"f", b"fo", b"foo", b"foob", b"fooba", b"foobar", &[0, 1, 2, 255, 254]] {
      let encoded: String = encode_b64(data);
      assert!(!encoded.contains('='));
      assert_eq!(decode_b64(encoded).unwrap(), data);
    }
  }

  #[test]
  fn decode_rejects_non_alphabet() {
    assert!(decode_b64("not valid!!").is_err());
  }

  #[test]
  fn secure_compare_is_length_checked() {
    assert!(secure_compare(b"abc", b"abc"));
    assert!(!secure_compare(b"abc", b"abcd"));
    assert!(!secure_compare(b"abc", b"abd"));
  }
}
