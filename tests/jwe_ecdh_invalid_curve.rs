// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Adversarial coverage for the classic invalid-curve attack against
//! ECDH-ES: an attacker-supplied `epk` whose point is not on the named
//! curve must be rejected rather than silently used for agreement.

use jose_core::jwe::Decoder;
use jose_core::jwe::Encoder;
use jose_core::jwe::JweAlgorithm;
use jose_core::jwe::JweEncryption;
use jose_core::jwk::Jwk;
use jose_core::jwk::JwkParamsEc;
use jose_core::jwu;
use jose_core::secret::Secret;

fn recipient_keypair() -> (Jwk, Jwk) {
  let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
  let point = secret.public_key().to_encoded_point(false);
  let x = jwu::encode_b64(point.x().unwrap());
  let y = jwu::encode_b64(point.y().unwrap());

  let private = Jwk::from_params(JwkParamsEc {
    crv: "P-256".to_string(),
    x: x.clone(),
    y: y.clone(),
    d: Some(jwu::encode_b64(secret.to_bytes())),
  });
  let public = Jwk::from_params(JwkParamsEc {
    crv: "P-256".to_string(),
    x,
    y,
    d: None,
  });
  (private, public)
}

#[test]
fn tampered_epk_off_curve_is_rejected() {
  let (private, public) = recipient_keypair();

  let token: String = Encoder::new(JweAlgorithm::EcdhEsA128Kw, JweEncryption::A128Gcm)
    .recipient(&public)
    .encode(b"top secret")
    .unwrap();

  let mut parts: Vec<&str> = token.split('.').collect();
  assert_eq!(parts.len(), 5, "compact JWE has 5 dot-separated segments");

  let protected_raw: Vec<u8> = jwu::decode_b64(parts[0]).unwrap();
  let mut header: serde_json::Value = serde_json::from_slice(&protected_raw).unwrap();

  // Replace the ephemeral public key's x-coordinate with an arbitrary
  // 32-byte string that is not a valid P-256 point.
  header["epk"]["x"] = serde_json::json!(jwu::encode_b64([7u8; 32]));

  let tampered_protected: String = jwu::encode_b64(serde_json::to_vec(&header).unwrap());
  parts[0] = &tampered_protected;
  let tampered_token: String = parts.join(".");

  let result = Decoder::new(Secret::Jwk(&private)).decode(tampered_token.as_bytes());
  assert!(result.is_err(), "decoding a JWE with an off-curve epk must fail");
}

#[test]
fn genuine_token_round_trips() {
  let (private, public) = recipient_keypair();

  let token: String = Encoder::new(JweAlgorithm::EcdhEsA128Kw, JweEncryption::A128Gcm)
    .recipient(&public)
    .encode(b"top secret")
    .unwrap();

  let decoded = Decoder::new(Secret::Jwk(&private)).decode(token.as_bytes()).unwrap();
  assert_eq!(decoded.claims, b"top secret");
}
