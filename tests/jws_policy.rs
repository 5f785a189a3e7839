// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! `alg: none` and `crit` policy, exercised end-to-end through the public
//! JWS API (RFC 8725 §3.2).

use jose_core::jws::Decoder;
use jose_core::jws::Encoder;
use jose_core::jws::JwsAlgorithm;
use jose_core::jws::JwsHeader;
use jose_core::jwk::Jwk;
use jose_core::jwk::JwkParamsOct;
use jose_core::jwu;
use jose_core::registry::JoseConfig;
use jose_core::secret::Secret;
use jose_core::Error;

fn hmac_key() -> Jwk {
  Jwk::from_params(JwkParamsOct {
    k: jwu::encode_b64("a sufficiently long shared secret for HS256"),
  })
}

#[test]
fn none_is_rejected_by_default() {
  let jwk = hmac_key();
  let token: String = Encoder::new()
    .recipient(&jwk, JwsHeader::new(JwsAlgorithm::HS256))
    .encode(b"hello")
    .unwrap();

  // Hand-build an alg=none token with the same payload, since the public
  // Encoder has no way to select `none` (it only signs with a real key).
  let none_header = jwu::encode_json_b64(&serde_json::json!({ "alg": "none" })).unwrap();
  let payload: &str = token.split('.').nth(1).unwrap();
  let none_token = format!("{none_header}.{payload}.");

  let err = Decoder::new(Secret::Jwk(&jwk)).decode(none_token.as_bytes()).unwrap_err();
  assert!(matches!(err, Error::UnsupportedError(_)));
}

#[test]
fn none_requires_opt_in_and_an_empty_signature() {
  let jwk = hmac_key();
  let none_header = jwu::encode_json_b64(&serde_json::json!({ "alg": "none" })).unwrap();
  let payload: String = jwu::encode_b64("hello");
  let none_token = format!("{none_header}.{payload}.");

  let mut config = JoseConfig::new();
  config.enable_none();

  let token = Decoder::new(Secret::Jwk(&jwk)).config(config).decode(none_token.as_bytes()).unwrap();
  assert_eq!(token.claims, b"hello");
}

#[test]
fn none_with_kid_is_rejected_even_when_enabled() {
  let jwk = hmac_key();
  let none_header = jwu::encode_json_b64(&serde_json::json!({ "alg": "none", "kid": "attacker" })).unwrap();
  let payload: String = jwu::encode_b64("hello");
  let none_token = format!("{none_header}.{payload}.");

  let mut config = JoseConfig::new();
  config.enable_none();

  let err = Decoder::new(Secret::Jwk(&jwk)).config(config).decode(none_token.as_bytes()).unwrap_err();
  assert!(matches!(err, Error::SignatureVerificationError(_)));
}

#[test]
fn unknown_crit_value_is_rejected() {
  let jwk = hmac_key();
  let mut header = JwsHeader::new(JwsAlgorithm::HS256);
  header.crit = Some(vec!["urn:example:custom".to_string()]);

  let token: String = Encoder::new().recipient(&jwk, header).encode(b"hello").unwrap();

  let err = Decoder::new(Secret::Jwk(&jwk)).decode(token.as_bytes()).unwrap_err();
  assert!(matches!(err, Error::UnsupportedError(_)));
}

#[test]
fn built_in_crit_names_are_accepted() {
  let jwk = hmac_key();
  let mut header = JwsHeader::new(JwsAlgorithm::HS256);
  header.crit = Some(vec!["exp".to_string()]);
  header.extra.insert("exp".to_string(), serde_json::json!(9_999_999_999i64));

  let token: String = Encoder::new().recipient(&jwk, header).encode(b"hello").unwrap();

  let decoded = Decoder::new(Secret::Jwk(&jwk)).decode(token.as_bytes()).unwrap();
  assert_eq!(decoded.claims, b"hello");
}

#[test]
fn tampered_signature_is_rejected() {
  let jwk = hmac_key();
  let token: String = Encoder::new()
    .recipient(&jwk, JwsHeader::new(JwsAlgorithm::HS256))
    .encode(b"hello")
    .unwrap();

  let mut parts: Vec<&str> = token.split('.').collect();
  let tampered_payload: String = jwu::encode_b64("goodbye");
  parts[1] = &tampered_payload;
  let tampered: String = parts.join(".");

  let err = Decoder::new(Secret::Jwk(&jwk)).decode(tampered.as_bytes()).unwrap_err();
  assert!(matches!(err, Error::SignatureVerificationError(_)));
}
