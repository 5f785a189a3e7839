// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! End-to-end criteria-based lookup over a [`JwkSet`], exercised through
//! the public API the way an external consumer would use it.

use jose_core::jwk::Jwk;
use jose_core::jwk::JwkOperation;
use jose_core::jwk::JwkParamsEc;
use jose_core::jwk::JwkParamsOct;
use jose_core::jwk::JwkSet;
use jose_core::jwk::JwkUse;
use jose_core::jwu;
use jose_core::Error;

fn oct(secret: &str, kid: &str) -> Jwk {
  let mut jwk = Jwk::from_params(JwkParamsOct { k: jwu::encode_b64(secret) });
  jwk.set_kid(kid);
  jwk.set_alg("HS256");
  jwk
}

#[test]
fn get_prefers_mandatory_if_present_over_bare_match() {
  let mut set = JwkSet::new();
  set.add(oct("first-secret-material", "a")).unwrap();
  let mut signing = oct("second-secret-material", "b");
  signing.set_use(JwkUse::Sig);
  set.add(signing).unwrap();

  let mut criteria = serde_json::Map::new();
  criteria.insert("alg".to_string(), serde_json::json!("HS256"));
  criteria.insert("@use".to_string(), serde_json::json!("sig"));

  let found: &Jwk = set.get(&criteria).unwrap();
  assert_eq!(found.kid(), Some("b"));
}

#[test]
fn get_fails_closed_when_no_key_matches() {
  let mut set = JwkSet::new();
  set.add(oct("some-secret-material-here", "a")).unwrap();

  let mut criteria = serde_json::Map::new();
  criteria.insert("alg".to_string(), serde_json::json!("RS256"));

  let err = set.get(&criteria).unwrap_err();
  assert!(matches!(err, Error::KeyNotFound));
}

#[test]
fn add_rejects_duplicate_kid() {
  let mut set = JwkSet::new();
  set.add(oct("some-secret-material-here", "dup")).unwrap();
  let err = set.add(oct("different-secret-material", "dup")).unwrap_err();
  assert!(matches!(err, Error::KeyAlreadyExists));
}

#[test]
fn add_rejects_duplicate_thumbprint_even_with_different_kid() {
  let mut set = JwkSet::new();
  set.add(oct("identical-secret-material", "a")).unwrap();
  let err = set.add(oct("identical-secret-material", "b")).unwrap_err();
  assert!(matches!(err, Error::KeyAlreadyExists));
}

#[test]
fn mandatory_criterion_excludes_keys_missing_the_property() {
  let mut set = JwkSet::new();
  set.add(oct("some-secret-material-here", "no-ops")).unwrap();
  let mut with_ops = oct("other-secret-material-here", "with-ops");
  with_ops.set_key_ops(vec![JwkOperation::Sign]);
  set.add(with_ops).unwrap();

  let mut criteria = serde_json::Map::new();
  criteria.insert("key_ops".to_string(), serde_json::json!(["sign"]));

  let matches: Vec<&Jwk> = set.find(&criteria);
  assert_eq!(matches.len(), 1);
  assert_eq!(matches[0].kid(), Some("with-ops"));
}

#[test]
fn kty_criterion_distinguishes_oct_from_ec() {
  let mut set = JwkSet::new();
  set.add(oct("some-secret-material-here", "oct-key")).unwrap();

  let mut ec = Jwk::from_params(JwkParamsEc {
    crv: "P-256".to_string(),
    x: jwu::encode_b64([1u8; 32]),
    y: jwu::encode_b64([2u8; 32]),
    d: None,
  });
  ec.set_kid("ec-key");
  set.add(ec).unwrap();

  let mut criteria = serde_json::Map::new();
  criteria.insert("kty".to_string(), serde_json::json!("EC"));

  let found: &Jwk = set.get(&criteria).unwrap();
  assert_eq!(found.kid(), Some("ec-key"));
}
