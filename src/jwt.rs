// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! JSON Web Token (RFC 7519): claims handling layered on [`crate::jws`].
//! `JwtHeaderSet` is just [`JwsHeader`] under the name the donor crate's
//! tests use it by; the claim auto-completion and `nbf`/`exp` validation
//! live here rather than in `jws` because they are JWT-specific, not
//! general-JWS behavior.

use std::collections::HashSet;

use serde_json::Map;
use serde_json::Value;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::Jwk;
use crate::jws;
use crate::jws::JwsHeader;
use crate::registry::JoseConfig;
use crate::secret::Secret;

pub type JwtHeaderSet = JwsHeader;

/// A thin wrapper over a JSON object, with typed accessors for the
/// time-based claims the core validates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JwtClaims(Map<String, Value>);

impl JwtClaims {
  pub fn new() -> Self {
    Self(Map::new())
  }

  pub fn from_map(map: Map<String, Value>) -> Self {
    Self(map)
  }

  pub fn into_map(self) -> Map<String, Value> {
    self.0
  }

  pub fn as_map(&self) -> &Map<String, Value> {
    &self.0
  }

  fn get_i64(&self, name: &str) -> Option<i64> {
    self.0.get(name).and_then(Value::as_i64)
  }

  pub fn iat(&self) -> Option<i64> {
    self.get_i64("iat")
  }

  pub fn set_iat(&mut self, value: i64) {
    self.0.insert("iat".to_string(), Value::from(value));
  }

  pub fn nbf(&self) -> Option<i64> {
    self.get_i64("nbf")
  }

  pub fn set_nbf(&mut self, value: i64) {
    self.0.insert("nbf".to_string(), Value::from(value));
  }

  pub fn exp(&self) -> Option<i64> {
    self.get_i64("exp")
  }

  pub fn set_exp(&mut self, value: i64) {
    self.0.insert("exp".to_string(), Value::from(value));
  }

  pub fn iss(&self) -> Option<&str> {
    self.0.get("iss").and_then(Value::as_str)
  }

  pub fn aud(&self) -> Option<&Value> {
    self.0.get("aud")
  }

  pub fn sub(&self) -> Option<&str> {
    self.0.get("sub").and_then(Value::as_str)
  }

  pub fn jti(&self) -> Option<&str> {
    self.0.get("jti").and_then(Value::as_str)
  }
}

fn now_seconds() -> Result<i64> {
  use std::time::SystemTime;
  use std::time::UNIX_EPOCH;
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs() as i64)
    .map_err(|_| Error::SystemLibraryError("system clock is before the Unix epoch".into()))
}

/// Builds and signs a JWT. Single-recipient only: JWTs are not a multi-
/// signature format in practice, unlike the generic JWS JSON forms.
pub struct Encoder<'a> {
  jwk: &'a Jwk,
  header: JwsHeader,
  auto_iat: bool,
}

impl<'a> Encoder<'a> {
  pub fn new(jwk: &'a Jwk, header: JwsHeader) -> Self {
    Self {
      jwk,
      header,
      auto_iat: true,
    }
  }

  pub fn auto_iat(mut self, enabled: bool) -> Self {
    self.auto_iat = enabled;
    self
  }

  pub fn encode(&self, claims: &JwtClaims) -> Result<String> {
    let mut claims: JwtClaims = claims.clone();
    if self.auto_iat && claims.iat().is_none() {
      claims.set_iat(now_seconds()?);
    }

    let payload: Vec<u8> = serde_json::to_vec(&claims.0)?;
    jws::Encoder::new().recipient(self.jwk, self.header.clone()).encode(&payload)
  }
}

/// Decodes and validates a JWT: the enclosed JWS is verified first, then
/// `nbf`/`exp` are checked against the current time.
pub struct Decoder<'a> {
  inner: jws::Decoder<'a>,
  skip_validation: HashSet<&'static str>,
  config: JoseConfig,
}

impl<'a> Decoder<'a> {
  pub fn new(key: Secret<'a>) -> Self {
    Self {
      inner: jws::Decoder::new(key),
      skip_validation: HashSet::new(),
      config: JoseConfig::default(),
    }
  }

  pub fn kid(mut self, kid: &'a str) -> Self {
    self.inner = self.inner.kid(kid);
    self
  }

  pub fn config(mut self, config: JoseConfig) -> Self {
    self.config = config;
    self.inner = self.inner.config(config);
    self
  }

  /// Skips `nbf` and/or `exp` enforcement for the named claim(s) — e.g.
  /// `.skip_validation(&["exp"])` for a deliberately-expired test fixture.
  pub fn skip_validation(mut self, claims: &[&'static str]) -> Self {
    self.skip_validation.extend(claims);
    self
  }

  pub fn decode(&self, data: &[u8]) -> Result<JwtClaims> {
    let token: jws::Token = self.inner.decode(data)?;
    let claims: JwtClaims = JwtClaims::from_map(serde_json::from_slice(&token.claims).map_err(Error::from)?);

    let now: i64 = now_seconds()?;
    let allowance: i64 = self.config.time_allowance();

    if !self.skip_validation.contains("nbf") {
      if let Some(nbf) = claims.nbf() {
        if now + allowance < nbf {
          return Err(Error::TooEarly(nbf));
        }
      }
    }

    if !self.skip_validation.contains("exp") {
      if let Some(exp) = claims.exp() {
        if now > exp + allowance {
          return Err(Error::TooLate(exp));
        }
      }
    }

    Ok(claims)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jwk::JwkParamsOct;
  use crate::jws::JwsAlgorithm;
  use crate::jwu;

  fn hs256_key() -> Jwk {
    Jwk::from_params(JwkParamsOct {
      k: jwu::encode_b64("a sufficiently long shared secret for HS256"),
    })
  }

  #[test]
  fn encode_auto_sets_iat() {
    let jwk = hs256_key();
    let header = JwsHeader::new(JwsAlgorithm::HS256).typ("JWT");
    let token = Encoder::new(&jwk, header).encode(&JwtClaims::new()).unwrap();
    let claims = Decoder::new(Secret::Jwk(&jwk)).decode(token.as_bytes()).unwrap();
    assert!(claims.iat().is_some());
  }

  #[test]
  fn expired_token_is_too_late() {
    let jwk = hs256_key();
    let header = JwsHeader::new(JwsAlgorithm::HS256);
    let mut claims = JwtClaims::new();
    claims.set_exp(0);
    let token = Encoder::new(&jwk, header).encode(&claims).unwrap();
    assert!(matches!(Decoder::new(Secret::Jwk(&jwk)).decode(token.as_bytes()), Err(Error::TooLate(0))));
  }

  #[test]
  fn skip_validation_allows_expired_token() {
    let jwk = hs256_key();
    let header = JwsHeader::new(JwsAlgorithm::HS256);
    let mut claims = JwtClaims::new();
    claims.set_exp(0);
    let token = Encoder::new(&jwk, header).encode(&claims).unwrap();
    let decoded = Decoder::new(Secret::Jwk(&jwk)).skip_validation(&["exp"]).decode(token.as_bytes()).unwrap();
    assert_eq!(decoded.exp(), Some(0));
  }

  #[test]
  fn not_yet_valid_token_is_too_early() {
    let jwk = hs256_key();
    let header = JwsHeader::new(JwsAlgorithm::HS256);
    let mut claims = JwtClaims::new();
    claims.set_nbf(i64::MAX - 10_000);
    let token = Encoder::new(&jwk, header).encode(&claims).unwrap();
    assert!(matches!(Decoder::new(Secret::Jwk(&jwk)).decode(token.as_bytes()), Err(Error::TooEarly(_))));
  }
}
