// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The key-set criteria matcher: mandatory / mandatory-if-present /
//! optional lookup over a JWK's properties.

use serde_json::Value;

use crate::jwk::Jwk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
  Mandatory,
  MandatoryIfPresent,
  Optional,
}

struct Criterion {
  rule: Rule,
  property: String,
  value: Value,
}

fn parse_criteria(criteria: &serde_json::Map<String, Value>) -> Vec<Criterion> {
  criteria
    .iter()
    .map(|(key, value)| {
      let (rule, property) = match key.as_bytes().first() {
        Some(b'@') => (Rule::MandatoryIfPresent, key[1..].to_string()),
        Some(b'~') => (Rule::Optional, key[1..].to_string()),
        _ => (Rule::Mandatory, key.clone()),
      };
      Criterion {
        rule,
        property,
        value: value.clone(),
      }
    })
    .collect()
}

/// Reads a named property off a JWK as a JSON value for criteria matching.
/// Unknown properties resolve to `None` (never matches, never disqualifies
/// a mandatory-if-present/optional criterion).
fn property(jwk: &Jwk, name: &str) -> Option<Value> {
  match name {
    "kty" => Some(Value::String(jwk.kty().to_string())),
    "kid" => jwk.kid().map(|s| Value::String(s.to_string())),
    "use" => jwk
      .use_()
      .and_then(|u| serde_json::to_value(u).ok())
      .and_then(|v| v.as_str().map(|s| Value::String(s.to_string()))),
    "alg" => jwk.alg().map(|s| Value::String(s.to_string())),
    "key_ops" => jwk
      .key_ops()
      .map(|ops| Value::Array(ops.iter().filter_map(|op| serde_json::to_value(op).ok()).collect())),
    "crv" => match jwk.params() {
      crate::jwk::JwkParams::Ec(p) => Some(Value::String(p.crv.clone())),
      crate::jwk::JwkParams::Okp(p) => Some(Value::String(p.crv.clone())),
      _ => None,
    },
    "#size" => jwk.size().ok().map(|bits| Value::Number(bits.into())),
    "#public" => Some(Value::Bool(jwk.is_public())),
    _ => None,
  }
}

/// `true` iff criterion `value` matches key `actual`: scalar-scalar
/// equality, scalar-in-array, array-contains-scalar, or non-empty array
/// intersection.
fn matches(value: &Value, actual: &Value) -> bool {
  match (value, actual) {
    (Value::Array(want), Value::Array(have)) => want.iter().any(|w| have.contains(w)),
    (Value::Array(want), scalar) => want.contains(scalar),
    (scalar, Value::Array(have)) => have.contains(scalar),
    (scalar, actual) => scalar == actual,
  }
}

/// The number of mandatory-if-present + optional criteria a key satisfies —
/// used to rank tied candidates (higher ranks first, ties keep insertion
/// order).
fn rank(jwk: &Jwk, criteria: &[Criterion]) -> usize {
  criteria
    .iter()
    .filter(|c| c.rule != Rule::Mandatory)
    .filter(|c| match property(jwk, &c.property) {
      Some(actual) => matches(&c.value, &actual),
      None => false,
    })
    .count()
}

fn satisfies_mandatory(jwk: &Jwk, criteria: &[Criterion]) -> bool {
  criteria.iter().all(|c| match c.rule {
    Rule::Mandatory => match property(jwk, &c.property) {
      Some(actual) => matches(&c.value, &actual),
      None => false,
    },
    Rule::MandatoryIfPresent => match property(jwk, &c.property) {
      Some(actual) => matches(&c.value, &actual),
      None => true,
    },
    Rule::Optional => true,
  })
}

/// Filters `keys` by the mandatory + mandatory-if-present criteria, then
/// ranks survivors by how many mandatory-if-present/optional criteria they
/// additionally satisfy, descending, preserving insertion order on ties.
pub fn select<'a>(keys: &'a [Jwk], criteria: &serde_json::Map<String, Value>) -> Vec<&'a Jwk> {
  let criteria: Vec<Criterion> = parse_criteria(criteria);

  let mut candidates: Vec<(usize, usize, &Jwk)> = keys
    .iter()
    .enumerate()
    .filter(|(_, jwk)| satisfies_mandatory(jwk, &criteria))
    .map(|(index, jwk)| (rank(jwk, &criteria), index, jwk))
    .collect();

  // Stable sort by rank descending; equal ranks keep insertion (index) order
  // because `sort_by` is stable and we compare only on rank.
  candidates.sort_by(|a, b| b.0.cmp(&a.0));
  candidates.into_iter().map(|(_, _, jwk)| jwk).collect()
}
