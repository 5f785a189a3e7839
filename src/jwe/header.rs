// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The JWE header (RFC 7516 §4 / RFC 7518 §4.6): same shape and merge
//! policy as [`crate::jws::JwsHeader`], with JWE-specific members and its
//! own `crit` understood set.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::Jwk;

use super::content_encryption::JweEncryption;
use super::key_management::JweAlgorithm;

/// The built-in `crit` understood set for JWE.
const UNDERSTOOD_CRIT: &[&str] = &["alg", "enc", "kid", "zip"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JweHeader {
  pub alg: JweAlgorithm,
  pub enc: JweEncryption,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kid: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub zip: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub crit: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub epk: Option<Jwk>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub apu: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub apv: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub p2s: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub p2c: Option<u32>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl JweHeader {
  pub fn new(alg: JweAlgorithm, enc: JweEncryption) -> Self {
    Self {
      alg,
      enc,
      kid: None,
      zip: None,
      crit: None,
      epk: None,
      apu: None,
      apv: None,
      p2s: None,
      p2c: None,
      extra: Map::new(),
    }
  }

  pub fn kid(mut self, kid: impl Into<String>) -> Self {
    self.kid = Some(kid.into());
    self
  }

  /// `zip: "DEF"` — raw DEFLATE the plaintext before encryption.
  pub fn deflate(mut self) -> Self {
    self.zip = Some("DEF".to_string());
    self
  }

  pub(crate) fn check_crit(&self) -> Result<()> {
    match &self.crit {
      None => Ok(()),
      Some(names) => {
        for name in names {
          if !UNDERSTOOD_CRIT.contains(&name.as_str()) {
            return Err(Error::UnsupportedError(format!("critical header '{name}' is not understood")));
          }
        }
        Ok(())
      }
    }
  }

  /// Same reject-on-overlap policy as `JwsHeader::merge_unprotected`.
  pub(crate) fn merge_unprotected(&mut self, unprotected: &JweHeader) -> Result<()> {
    if unprotected.kid.is_some() && self.kid.is_some() {
      return Err(Error::TokenParseError("protected and unprotected headers both set 'kid'".into()));
    }
    self.kid = self.kid.take().or_else(|| unprotected.kid.clone());
    self.zip = self.zip.take().or_else(|| unprotected.zip.clone());
    self.crit = self.crit.take().or_else(|| unprotected.crit.clone());
    self.epk = self.epk.take().or_else(|| unprotected.epk.clone());
    self.apu = self.apu.take().or_else(|| unprotected.apu.clone());
    self.apv = self.apv.take().or_else(|| unprotected.apv.clone());
    self.p2s = self.p2s.take().or_else(|| unprotected.p2s.clone());
    self.p2c = self.p2c.take().or_else(|| unprotected.p2c.clone());
    for (key, value) in &unprotected.extra {
      if self.extra.contains_key(key) {
        return Err(Error::TokenParseError(format!("protected and unprotected headers both set '{key}'")));
      }
      self.extra.insert(key.clone(), value.clone());
    }
    Ok(())
  }
}
