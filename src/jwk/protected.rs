// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Password-protected JWK import: a JWK or JWK Set document carrying a
//! `ciphertext` member is itself a JWE (`cty: jwk+json` or `jwk-set+json`)
//! whose plaintext is the key material, keyed by a password-derived PBES2
//! wrap key rather than an asymmetric or shared key.

use serde_json::Value;

use crate::error::Error;
use crate::error::Result;
use crate::jwe::Decoder;
use crate::jwk::params::JwkParamsOct;
use crate::jwk::Jwk;
use crate::jwk::JwkSet;
use crate::jwu;
use crate::secret::Secret;

fn password_key(password: &[u8]) -> Jwk {
  Jwk::from_params(JwkParamsOct { k: jwu::encode_b64(password) })
}

fn is_jwe_document(document: &str) -> bool {
  serde_json::from_str::<Value>(document)
    .map(|doc| doc.get("ciphertext").is_some())
    .unwrap_or(false)
}

fn decrypt(document: &str, password: &[u8]) -> Result<Vec<u8>> {
  let key: Jwk = password_key(password);
  Decoder::new(Secret::Jwk(&key)).decode(document.as_bytes()).map(|token| token.claims)
}

/// Imports a single JWK from `document`. If `document` carries a
/// `ciphertext` member it is decrypted first using `password` (the
/// default registry for this path is PBES2-HS256+A128KW); otherwise
/// `document` is the plain JWK JSON itself.
pub fn import(document: &str, password: Option<&[u8]>) -> Result<Jwk> {
  if is_jwe_document(document) {
    let password: &[u8] = password.ok_or_else(|| Error::InvalidOperation("password-protected JWK requires a password".into()))?;
    let plaintext: Vec<u8> = decrypt(document, password)?;
    return serde_json::from_slice(&plaintext).map_err(Error::from);
  }
  serde_json::from_str(document).map_err(Error::from)
}

/// As [`import`], for a `{"keys": [...]}` JWK Set document.
pub fn import_set(document: &str, password: Option<&[u8]>) -> Result<JwkSet> {
  let keys_json: Vec<u8> = if is_jwe_document(document) {
    let password: &[u8] = password.ok_or_else(|| Error::InvalidOperation("password-protected JWK Set requires a password".into()))?;
    decrypt(document, password)?
  } else {
    document.as_bytes().to_vec()
  };

  let doc: Value = serde_json::from_slice(&keys_json)?;
  let keys: &Vec<Value> = doc
    .get("keys")
    .and_then(Value::as_array)
    .ok_or_else(|| Error::TokenParseError("JWK Set document is missing 'keys'".into()))?;

  let parsed: Vec<Jwk> = keys
    .iter()
    .cloned()
    .map(serde_json::from_value)
    .collect::<serde_json::Result<Vec<Jwk>>>()?;
  Ok(JwkSet::from_iter(parsed))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jwe::Encoder;
  use crate::jwe::JweAlgorithm;
  use crate::jwe::JweEncryption;
  use crate::jwe::JweFormat;

  #[test]
  fn password_protected_jwk_round_trips() {
    let password = b"correct horse battery staple";
    let inner: Jwk = Jwk::from_params(JwkParamsOct {
      k: jwu::encode_b64("sekrit signing material"),
    });
    let plaintext: Vec<u8> = serde_json::to_vec(&inner).unwrap();

    let pw_jwk: Jwk = password_key(password);
    let wrapped: String = Encoder::new(JweAlgorithm::Pbes2Hs256A128Kw, JweEncryption::A128Gcm)
      .format(JweFormat::JsonFlattened)
      .recipient(&pw_jwk)
      .encode(&plaintext)
      .unwrap();

    let recovered: Jwk = import(&wrapped, Some(password)).unwrap();
    assert_eq!(recovered.try_oct_params().unwrap().k, inner.try_oct_params().unwrap().k);
  }

  #[test]
  fn wrong_password_is_rejected() {
    let inner: Jwk = Jwk::from_params(JwkParamsOct {
      k: jwu::encode_b64("sekrit signing material"),
    });
    let plaintext: Vec<u8> = serde_json::to_vec(&inner).unwrap();

    let pw_jwk: Jwk = password_key(b"right password");
    let wrapped: String = Encoder::new(JweAlgorithm::Pbes2Hs256A128Kw, JweEncryption::A128Gcm)
      .format(JweFormat::JsonFlattened)
      .recipient(&pw_jwk)
      .encode(&plaintext)
      .unwrap();

    assert!(import(&wrapped, Some(b"wrong password")).is_err());
  }

  #[test]
  fn import_without_ciphertext_parses_directly() {
    let jwk: Jwk = Jwk::from_params(JwkParamsOct {
      k: jwu::encode_b64("plain secret"),
    });
    let json: String = serde_json::to_string(&jwk).unwrap();
    let recovered: Jwk = import(&json, None).unwrap();
    assert_eq!(recovered.try_oct_params().unwrap().k, jwk.try_oct_params().unwrap().k);
  }

  #[test]
  fn import_set_round_trips_through_password_protection() {
    let password = b"a different password";
    let key_a: Jwk = Jwk::from_params(JwkParamsOct { k: jwu::encode_b64("key a material") });
    let key_b: Jwk = Jwk::from_params(JwkParamsOct { k: jwu::encode_b64("key b material") });
    let plaintext: Vec<u8> = serde_json::to_vec(&serde_json::json!({ "keys": [key_a, key_b] })).unwrap();

    let pw_jwk: Jwk = password_key(password);
    let wrapped: String = Encoder::new(JweAlgorithm::Pbes2Hs256A128Kw, JweEncryption::A128Gcm)
      .format(JweFormat::JsonFlattened)
      .recipient(&pw_jwk)
      .encode(&plaintext)
      .unwrap();

    let set: JwkSet = import_set(&wrapped, Some(password)).unwrap();
    assert_eq!(set.len(), 2);
  }
}
