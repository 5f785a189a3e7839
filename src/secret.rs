// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The key source an [`crate::jws::Decoder`]/[`crate::jwe::Decoder`] resolves
//! a verification/decryption key from: a single known key, or a set searched
//! by the header's `kid`/`alg`.

use crate::error::Error;
use crate::error::Result;
use crate::jwk::Jwk;
use crate::jwk::JwkSet;

#[derive(Debug, Clone, Copy)]
pub enum Secret<'a> {
  Jwk(&'a Jwk),
  KeySet(&'a JwkSet),
}

impl<'a> Secret<'a> {
  /// Resolves the key to use for a token carrying header `alg` and an
  /// optional `kid`. A lone [`Secret::Jwk`] is always used as-is, regardless
  /// of whether its `kid` matches — callers that want `kid`-based selection
  /// over several candidates should use [`Secret::KeySet`].
  pub fn resolve(&self, alg: &str, kid: Option<&str>) -> Result<&'a Jwk> {
    match self {
      Secret::Jwk(jwk) => Ok(jwk),
      Secret::KeySet(set) => {
        let mut criteria = serde_json::Map::new();
        criteria.insert("alg".to_string(), serde_json::Value::String(alg.to_string()));
        if let Some(kid) = kid {
          criteria.insert("kid".to_string(), serde_json::Value::String(kid.to_string()));
        }
        set.get(&criteria).map_err(|_| Error::KeyNotFound)
      }
    }
  }
}
