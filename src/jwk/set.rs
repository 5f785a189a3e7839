// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! An insertion-ordered JWK Set (RFC 7517 §5) with RFC 7638/`kid`-based
//! identity and a mandatory/optional criteria matcher for lookup.

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::criteria;
use crate::jwk::Jwk;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwkSet {
  keys: Vec<Jwk>,
}

impl JwkSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.keys.len()
  }

  pub fn is_empty(&self) -> bool {
    self.keys.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Jwk> {
    self.keys.iter()
  }

  pub fn as_slice(&self) -> &[Jwk] {
    &self.keys
  }

  /// Two keys are "identical" iff their thumbprints match, or both have a
  /// `kid` and those strings match.
  fn identical(a: &Jwk, b: &Jwk) -> bool {
    if a.thumbprint() == b.thumbprint() {
      return true;
    }
    matches!((a.kid(), b.kid()), (Some(x), Some(y)) if x == y)
  }

  /// Fails with [`Error::KeyAlreadyExists`] on either identity condition.
  pub fn add(&mut self, jwk: Jwk) -> Result<()> {
    if self.keys.iter().any(|existing| Self::identical(existing, &jwk)) {
      return Err(Error::KeyAlreadyExists);
    }
    self.keys.push(jwk);
    Ok(())
  }

  /// Adds every key in `other`, silently skipping duplicates.
  pub fn add_all(&mut self, other: impl IntoIterator<Item = Jwk>) {
    for jwk in other {
      let _ = self.add(jwk);
    }
  }

  /// Removes a key by value, matching on thumbprint.
  pub fn remove(&mut self, jwk: &Jwk) -> bool {
    let before: usize = self.keys.len();
    self.keys.retain(|existing| existing.thumbprint() != jwk.thumbprint());
    self.keys.len() != before
  }

  /// Returns the highest-ranked key matching `criteria`.
  pub fn get(&self, criteria: &serde_json::Map<String, serde_json::Value>) -> Result<&Jwk> {
    criteria::select(&self.keys, criteria).into_iter().next().ok_or(Error::KeyNotFound)
  }

  /// Returns all matching keys, ranked highest-first.
  pub fn find(&self, criteria: &serde_json::Map<String, serde_json::Value>) -> Vec<&Jwk> {
    criteria::select(&self.keys, criteria)
  }
}

impl FromIterator<Jwk> for JwkSet {
  fn from_iter<I: IntoIterator<Item = Jwk>>(iter: I) -> Self {
    let mut set: JwkSet = JwkSet::new();
    set.add_all(iter);
    set
  }
}

impl<'a> IntoIterator for &'a JwkSet {
  type Item = &'a Jwk;
  type IntoIter = std::slice::Iter<'a, Jwk>;

  fn into_iter(self) -> Self::IntoIter {
    self.keys.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jwk::JwkParamsOct;
  use crate::jwu;

  fn oct(secret: &str) -> Jwk {
    Jwk::from_params(JwkParamsOct { k: jwu::encode_b64(secret) })
  }

  #[test]
  fn add_rejects_duplicate_by_thumbprint() {
    let mut set: JwkSet = JwkSet::new();
    set.add(oct("shared")).unwrap();
    assert!(matches!(set.add(oct("shared")), Err(Error::KeyAlreadyExists)));
  }

  #[test]
  fn add_all_swallows_duplicates() {
    let mut set: JwkSet = JwkSet::new();
    set.add_all(vec![oct("a"), oct("a"), oct("b")]);
    assert_eq!(set.len(), 2);
  }
}
