// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! [`Decoder`] resolving a verification key out of a [`JwkSet`] by the
//! token's `alg`/`kid`, rather than being handed a single known key.

use jose_core::jwk::Jwk;
use jose_core::jwk::JwkParamsOct;
use jose_core::jwk::JwkSet;
use jose_core::jws::Decoder;
use jose_core::jws::Encoder;
use jose_core::jws::JwsAlgorithm;
use jose_core::jws::JwsHeader;
use jose_core::jwu;
use jose_core::secret::Secret;
use jose_core::Error;

fn hmac_key(secret: &str, kid: &str) -> Jwk {
  let mut jwk = Jwk::from_params(JwkParamsOct { k: jwu::encode_b64(secret) });
  jwk.set_kid(kid);
  jwk
}

#[test]
fn decoder_picks_the_matching_key_by_kid_out_of_a_set() {
  let key_a = hmac_key("first shared secret material goes here", "key-a");
  let key_b = hmac_key("second shared secret material goes here", "key-b");

  let token: String = Encoder::new()
    .recipient(&key_b, JwsHeader::new(JwsAlgorithm::HS256))
    .encode(b"signed with key b")
    .unwrap();

  let mut set = JwkSet::new();
  set.add(key_a).unwrap();
  set.add(key_b).unwrap();

  let decoded = Decoder::new(Secret::KeySet(&set)).decode(token.as_bytes()).unwrap();
  assert_eq!(decoded.claims, b"signed with key b");
}

#[test]
fn decoder_fails_when_the_set_has_no_matching_kid() {
  let key_a = hmac_key("first shared secret material goes here", "key-a");
  let key_b = hmac_key("second shared secret material goes here", "key-b");

  let token: String = Encoder::new()
    .recipient(&key_b, JwsHeader::new(JwsAlgorithm::HS256))
    .encode(b"signed with key b")
    .unwrap();

  let mut set = JwkSet::new();
  set.add(key_a).unwrap();

  let err = Decoder::new(Secret::KeySet(&set)).decode(token.as_bytes()).unwrap_err();
  assert!(matches!(err, Error::SignatureVerificationError(_)));
}

#[test]
fn explicit_decoder_kid_overrides_the_header() {
  let key_a = hmac_key("first shared secret material goes here", "key-a");
  let key_b = hmac_key("second shared secret material goes here", "key-b");

  // Sign with key-b's material but strip the header kid, forcing callers
  // to supply the kid out of band (e.g. from a transport-level hint).
  let mut header = JwsHeader::new(JwsAlgorithm::HS256);
  header.kid = None;
  let token: String = Encoder::new().auto_kid(false).recipient(&key_b, header).encode(b"hello").unwrap();

  let mut set = JwkSet::new();
  set.add(key_a).unwrap();
  set.add(key_b).unwrap();

  let decoded = Decoder::new(Secret::KeySet(&set)).kid("key-b").decode(token.as_bytes()).unwrap();
  assert_eq!(decoded.claims, b"hello");
}
