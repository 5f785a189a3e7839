// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! JSON Web Signature (RFC 7515): the compact and JSON (general/flattened)
//! serialisation forms, critical-header policy, and the signature
//! primitive families dispatched from [`JwsAlgorithm`].

mod ecdsa;
mod eddsa;
mod hmac;
mod none;
mod rsa;

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::Jwk;
use crate::jwu;
use crate::registry::JoseConfig;
use crate::secret::Secret;

/// The built-in `crit` understood set for JWS.
const UNDERSTOOD_CRIT: &[&str] = &["nbf", "exp", "alg", "kid"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwsAlgorithm {
  HS256,
  HS384,
  HS512,
  RS256,
  RS384,
  RS512,
  ES256,
  ES384,
  ES512,
  #[cfg(feature = "es256k")]
  ES256K,
  EdDSA,
  #[serde(rename = "none")]
  None,
}

impl fmt::Display for JwsAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = serde_json::to_value(self).unwrap_or(Value::Null);
    write!(f, "{}", name.as_str().unwrap_or("unknown"))
  }
}

impl JwsAlgorithm {
  /// Every signing algorithm this build actually supports. `ES256K` is
  /// present only when the `es256k` Cargo feature is enabled; `none` is
  /// never listed here, since it only becomes available through
  /// [`crate::registry::JoseConfig::enable_none`].
  pub fn supported_variants() -> Vec<JwsAlgorithm> {
    let mut variants = vec![
      JwsAlgorithm::HS256,
      JwsAlgorithm::HS384,
      JwsAlgorithm::HS512,
      JwsAlgorithm::RS256,
      JwsAlgorithm::RS384,
      JwsAlgorithm::RS512,
      JwsAlgorithm::ES256,
      JwsAlgorithm::ES384,
      JwsAlgorithm::ES512,
      JwsAlgorithm::EdDSA,
    ];
    #[cfg(feature = "es256k")]
    variants.push(JwsAlgorithm::ES256K);
    variants
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwsHeader {
  pub alg: JwsAlgorithm,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kid: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub typ: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cty: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub crit: Option<Vec<String>>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl JwsHeader {
  pub fn new(alg: JwsAlgorithm) -> Self {
    Self {
      alg,
      kid: None,
      typ: None,
      cty: None,
      crit: None,
      extra: Map::new(),
    }
  }

  pub fn kid(mut self, kid: impl Into<String>) -> Self {
    self.kid = Some(kid.into());
    self
  }

  pub fn typ(mut self, typ: impl Into<String>) -> Self {
    self.typ = Some(typ.into());
    self
  }

  /// Checks the `crit` policy: every listed name must be in the built-in
  /// understood set.
  fn check_crit(&self) -> Result<()> {
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

  /// Merges `unprotected` into `self`. Overlapping entries are rejected
  /// rather than silently overwritten.
  fn merge_unprotected(&mut self, unprotected: &JwsHeader) -> Result<()> {
    if unprotected.kid.is_some() && self.kid.is_some() {
      return Err(Error::TokenParseError("protected and unprotected headers both set 'kid'".into()));
    }
    self.kid = self.kid.take().or_else(|| unprotected.kid.clone());
    self.typ = self.typ.take().or_else(|| unprotected.typ.clone());
    self.cty = self.cty.take().or_else(|| unprotected.cty.clone());
    self.crit = self.crit.take().or_else(|| unprotected.crit.clone());
    for (key, value) in &unprotected.extra {
      if self.extra.contains_key(key) {
        return Err(Error::TokenParseError(format!("protected and unprotected headers both set '{key}'")));
      }
      self.extra.insert(key.clone(), value.clone());
    }
    Ok(())
  }
}

fn sign_with(alg: JwsAlgorithm, msg: &[u8], jwk: &Jwk) -> Result<Vec<u8>> {
  match alg {
    JwsAlgorithm::HS256 | JwsAlgorithm::HS384 | JwsAlgorithm::HS512 => hmac::sign(alg, msg, jwk),
    JwsAlgorithm::RS256 | JwsAlgorithm::RS384 | JwsAlgorithm::RS512 => rsa::sign(alg, msg, jwk),
    JwsAlgorithm::ES256 | JwsAlgorithm::ES384 | JwsAlgorithm::ES512 => ecdsa::sign(alg, msg, jwk),
    #[cfg(feature = "es256k")]
    JwsAlgorithm::ES256K => ecdsa::sign(alg, msg, jwk),
    JwsAlgorithm::EdDSA => eddsa::sign(msg, jwk),
    JwsAlgorithm::None => Ok(none::sign()),
  }
}

fn verify_with(alg: JwsAlgorithm, msg: &[u8], sig: &[u8], jwk: &Jwk) -> Result<bool> {
  match alg {
    JwsAlgorithm::HS256 | JwsAlgorithm::HS384 | JwsAlgorithm::HS512 => hmac::verify(alg, msg, sig, jwk),
    JwsAlgorithm::RS256 | JwsAlgorithm::RS384 | JwsAlgorithm::RS512 => rsa::verify(alg, msg, sig, jwk),
    JwsAlgorithm::ES256 | JwsAlgorithm::ES384 | JwsAlgorithm::ES512 => ecdsa::verify(alg, msg, sig, jwk),
    #[cfg(feature = "es256k")]
    JwsAlgorithm::ES256K => ecdsa::verify(alg, msg, sig, jwk),
    JwsAlgorithm::EdDSA => eddsa::verify(msg, sig, jwk),
    JwsAlgorithm::None => Ok(none::verify(sig)),
  }
}

/// The left-half hash used by `at_hash`/`c_hash` ([`crate::token_hash`]).
pub(crate) fn short_hash(alg: JwsAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
  match alg {
    JwsAlgorithm::HS256 | JwsAlgorithm::HS384 | JwsAlgorithm::HS512 => hmac::short_hash(alg, data),
    JwsAlgorithm::RS256 | JwsAlgorithm::ES256 | JwsAlgorithm::EdDSA => hmac::short_hash(JwsAlgorithm::HS256, data),
    JwsAlgorithm::RS384 | JwsAlgorithm::ES384 => hmac::short_hash(JwsAlgorithm::HS384, data),
    JwsAlgorithm::RS512 | JwsAlgorithm::ES512 => hmac::short_hash(JwsAlgorithm::HS512, data),
    #[cfg(feature = "es256k")]
    JwsAlgorithm::ES256K => hmac::short_hash(JwsAlgorithm::HS256, data),
    JwsAlgorithm::None => Err(Error::UnsupportedError("alg=none has no defined short hash".into())),
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationFormat {
  Compact,
  JsonGeneral,
  JsonFlattened,
}

/// A decoded JWS: the merged header and the raw (non-reparsed) payload.
#[derive(Debug, Clone)]
pub struct Token {
  pub header: JwsHeader,
  pub claims: Vec<u8>,
}

struct PendingRecipient<'a> {
  jwk: &'a Jwk,
  header: JwsHeader,
}

/// Builds and signs a JWS, optionally for multiple recipients (the JSON
/// general-serialisation case).
pub struct Encoder<'a> {
  recipients: Vec<PendingRecipient<'a>>,
  format: SerializationFormat,
  auto_kid: bool,
}

impl<'a> Default for Encoder<'a> {
  fn default() -> Self {
    Self::new()
  }
}

impl<'a> Encoder<'a> {
  pub fn new() -> Self {
    Self {
      recipients: Vec::new(),
      format: SerializationFormat::Compact,
      auto_kid: true,
    }
  }

  pub fn recipient(mut self, jwk: &'a Jwk, header: JwsHeader) -> Self {
    self.recipients.push(PendingRecipient { jwk, header });
    self
  }

  pub fn format(mut self, format: SerializationFormat) -> Self {
    self.format = format;
    self
  }

  pub fn auto_kid(mut self, enabled: bool) -> Self {
    self.auto_kid = enabled;
    self
  }

  fn sign_one(&self, payload_b64: &str, recipient: &PendingRecipient<'a>) -> Result<(JwsHeader, Vec<u8>)> {
    let mut header: JwsHeader = recipient.header.clone();
    if self.auto_kid && header.kid.is_none() {
      if let Some(kid) = recipient.jwk.kid() {
        header.kid = Some(kid.to_string());
      }
    }

    let protected_b64: String = jwu::encode_json_b64(&header)?;
    let signing_input: Vec<u8> = jwu::concat(&[protected_b64.as_bytes(), b".", payload_b64.as_bytes()]);
    let signature: Vec<u8> = sign_with(header.alg, &signing_input, recipient.jwk)?;
    Ok((header, signature))
  }

  pub fn encode(&self, payload: &[u8]) -> Result<String> {
    if self.recipients.is_empty() {
      return Err(Error::InvalidOperation("JWS encoding requires at least one recipient".into()));
    }
    let payload_b64: String = jwu::encode_b64(payload);

    if self.recipients.len() == 1 && self.format == SerializationFormat::Compact {
      let (header, signature) = self.sign_one(&payload_b64, &self.recipients[0])?;
      let protected_b64: String = jwu::encode_json_b64(&header)?;
      return Ok(format!("{protected_b64}.{payload_b64}.{}", jwu::encode_b64(&signature)));
    }

    let mut signatures: Vec<Value> = Vec::with_capacity(self.recipients.len());
    for recipient in &self.recipients {
      let (header, signature) = self.sign_one(&payload_b64, recipient)?;
      let protected_b64: String = jwu::encode_json_b64(&header)?;
      signatures.push(serde_json::json!({
        "protected": protected_b64,
        "signature": jwu::encode_b64(&signature),
      }));
    }

    let doc: Value = if signatures.len() == 1 && self.format == SerializationFormat::JsonFlattened {
      let mut entry = signatures.remove(0);
      let entry = entry.as_object_mut().expect("constructed above as an object");
      serde_json::json!({
        "payload": payload_b64,
        "protected": entry.remove("protected").unwrap(),
        "signature": entry.remove("signature").unwrap(),
      })
    } else {
      serde_json::json!({ "payload": payload_b64, "signatures": signatures })
    };

    Ok(serde_json::to_string(&doc)?)
  }
}

/// Parses and verifies a JWS, resolving the verification key from a
/// [`Secret`].
pub struct Decoder<'a> {
  key: Secret<'a>,
  kid: Option<&'a str>,
  config: JoseConfig,
  expected_alg: Option<JwsAlgorithm>,
}

impl<'a> Decoder<'a> {
  pub fn new(key: Secret<'a>) -> Self {
    Self {
      key,
      kid: None,
      config: JoseConfig::default(),
      expected_alg: None,
    }
  }

  pub fn kid(mut self, kid: &'a str) -> Self {
    self.kid = Some(kid);
    self
  }

  pub fn config(mut self, config: JoseConfig) -> Self {
    self.config = config;
    self
  }

  /// Pins the algorithm a caller expects the token to use. When set,
  /// `decode` rejects any token whose `alg` header doesn't match this value
  /// before a verification key is ever resolved, closing off algorithm
  /// confusion: a token can't redirect itself onto a different primitive
  /// than the one the caller asked to verify against.
  pub fn expected_alg(mut self, alg: JwsAlgorithm) -> Self {
    self.expected_alg = Some(alg);
    self
  }

  fn candidate_segments(data: &[u8]) -> Result<(String, String, String)> {
    let text: &str = std::str::from_utf8(data).map_err(|_| Error::TokenParseError("token is not valid UTF-8".into()))?;
    let trimmed: &str = text.trim();

    if trimmed.starts_with('{') {
      let doc: Value = serde_json::from_str(trimmed)?;
      let payload: String = doc
        .get("payload")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::TokenParseError("JWS JSON serialization is missing 'payload'".into()))?
        .to_string();

      if let Some(signatures) = doc.get("signatures").and_then(Value::as_array) {
        let entry: &Value = signatures.first().ok_or_else(|| Error::TokenParseError("empty 'signatures' array".into()))?;
        let protected: String = entry
          .get("protected")
          .and_then(Value::as_str)
          .ok_or_else(|| Error::TokenParseError("signature entry is missing 'protected'".into()))?
          .to_string();
        let signature: String = entry
          .get("signature")
          .and_then(Value::as_str)
          .ok_or_else(|| Error::TokenParseError("signature entry is missing 'signature'".into()))?
          .to_string();
        return Ok((protected, payload, signature));
      }

      let protected: String = doc
        .get("protected")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::TokenParseError("flattened JWS JSON is missing 'protected'".into()))?
        .to_string();
      let signature: String = doc
        .get("signature")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::TokenParseError("flattened JWS JSON is missing 'signature'".into()))?
        .to_string();
      return Ok((protected, payload, signature));
    }

    let mut parts = trimmed.split('.');
    let protected = parts.next().ok_or_else(|| Error::TokenParseError("empty token".into()))?;
    let payload = parts.next().ok_or_else(|| Error::TokenParseError("missing payload segment".into()))?;
    let signature = parts.next().ok_or_else(|| Error::TokenParseError("missing signature segment".into()))?;
    if parts.next().is_some() {
      return Err(Error::TokenParseError("too many segments for JWS compact serialization".into()));
    }
    Ok((protected.to_string(), payload.to_string(), signature.to_string()))
  }

  pub fn decode(&self, data: &[u8]) -> Result<Token> {
    let (protected_b64, payload_b64, signature_b64) = Self::candidate_segments(data)?;

    let mut header: JwsHeader = jwu::decode_json_b64(&protected_b64)?;
    header.check_crit()?;

    if let Some(expected) = self.expected_alg {
      if header.alg != expected {
        return Err(Error::SignatureVerificationError(format!(
          "token alg '{}' does not match the expected alg '{expected}'",
          header.alg
        )));
      }
    }

    if header.alg == JwsAlgorithm::None && !self.config.none_enabled() {
      return Err(Error::UnsupportedError("alg=none is disabled; opt in via JoseConfig::enable_none".into()));
    }

    let signature: Vec<u8> = jwu::decode_b64(&signature_b64)?;
    if header.alg == JwsAlgorithm::None {
      // Only a header with no kid and an empty signature segment is
      // accepted, even after opting in.
      if !signature.is_empty() || header.kid.is_some() {
        return Err(Error::SignatureVerificationError("alg=none requires an empty signature and no kid".into()));
      }
      let claims: Vec<u8> = jwu::decode_b64(&payload_b64)?;
      return Ok(Token { header, claims });
    }

    let jwk: &Jwk = self
      .key
      .resolve(&header.alg.to_string(), self.kid.or(header.kid.as_deref()))
      .map_err(|_| Error::SignatureVerificationError("no key matches the token's alg/kid".into()))?;

    let signing_input: Vec<u8> = jwu::concat(&[protected_b64.as_bytes(), b".", payload_b64.as_bytes()]);
    let verified: bool = verify_with(header.alg, &signing_input, &signature, jwk)
      .map_err(|_| Error::SignatureVerificationError("signature verification failed".into()))?;
    if !verified {
      return Err(Error::SignatureVerificationError("signature verification failed".into()));
    }

    let claims: Vec<u8> = jwu::decode_b64(&payload_b64)?;
    Ok(Token { header, claims })
  }
}
