// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! JSON Web Encryption (RFC 7516): the compact and JSON (general/
//! flattened) serialisation forms, the key-management/content-encryption
//! primitive families, and the encrypt/decrypt pipelines built on top of
//! them.

mod concat_kdf;
pub mod content_encryption;
mod header;
pub mod key_management;

use serde_json::Map;
use serde_json::Value;

pub use content_encryption::JweEncryption;
pub use header::JweHeader;
pub use key_management::JweAlgorithm;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::Jwk;
use crate::jwk::JwkParamsOct;
use crate::jwu;
use crate::secret::Secret;

/// Per-recipient header members (RFC 7516 §4.2): everything
/// [`key_management::derive`]/[`key_management::encrypt_key`] can inject
/// differs per recipient, so these never go in the shared `protected`
/// header of a JSON-serialised token.
const PER_RECIPIENT_FIELDS: &[&str] = &["kid", "epk", "apu", "apv", "p2s", "p2c"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JweFormat {
  Compact,
  JsonGeneral,
  JsonFlattened,
}

/// A decoded JWE: the merged header and the decrypted (and, if `zip`
/// was set, inflated) plaintext.
#[derive(Debug, Clone)]
pub struct Token {
  pub header: JweHeader,
  pub claims: Vec<u8>,
}

fn random_cek(enc: JweEncryption) -> Vec<u8> {
  jwu::secure_random((enc.cek_bits() / 8) as usize)
}

fn oct_secret(bytes: &[u8]) -> Jwk {
  Jwk::from_params(JwkParamsOct { k: jwu::encode_b64(bytes) })
}

fn deflate(plaintext: &[u8]) -> Vec<u8> {
  miniz_oxide::deflate::compress_to_vec(plaintext, 6)
}

fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
  miniz_oxide::inflate::decompress_to_vec(compressed).map_err(|_| Error::TokenParseError("zip=DEF payload does not inflate".into()))
}

/// Resolves `cek` and the per-recipient `encrypted_key` for one recipient,
/// mutating `header` with whatever the key-management primitive injects
/// (`epk`/`p2s`/`p2c`).
fn resolve_cek_for_recipient(alg: JweAlgorithm, jwk: &Jwk, header: &mut JweHeader, shared_cek: Option<&[u8]>) -> Result<(Vec<u8>, Vec<u8>)> {
  let secret = Secret::Jwk(jwk);

  if alg.is_key_derivation() {
    let derived: Vec<u8> = key_management::derive(alg, &secret, header, true)?;
    if alg.is_key_encryption() {
      // Wrapped agreement (ECDH-ES+AxxxKW): `derived` is the wrap key.
      let cek: Vec<u8> = shared_cek.map(<[u8]>::to_vec).unwrap_or_else(|| random_cek(header.enc));
      let wrap_key_jwk: Jwk = oct_secret(&derived);
      let encrypted_key: Vec<u8> = key_management::encrypt_key(alg, &Secret::Jwk(&wrap_key_jwk), header, &cek)?;
      Ok((cek, encrypted_key))
    } else {
      // Bare `dir`/`ECDH-ES`: the derived key IS the cek, no wrap stage.
      if shared_cek.is_some() {
        return Err(Error::InvalidOperation(format!("{alg} cannot share a cek across multiple recipients")));
      }
      Ok((derived, Vec::new()))
    }
  } else {
    let cek: Vec<u8> = shared_cek.map(<[u8]>::to_vec).unwrap_or_else(|| random_cek(header.enc));
    let encrypted_key: Vec<u8> = key_management::encrypt_key(alg, &secret, header, &cek)?;
    Ok((cek, encrypted_key))
  }
}

/// Splits a [`JweHeader`] into its shared (`protected`) and per-recipient
/// members for JSON serialisation.
fn split_recipient_fields(header: &JweHeader) -> Result<(JweHeader, Map<String, Value>)> {
  let mut protected: JweHeader = header.clone();
  protected.kid = None;
  protected.epk = None;
  protected.apu = None;
  protected.apv = None;
  protected.p2s = None;
  protected.p2c = None;

  let full: Value = serde_json::to_value(header)?;
  let full: &Map<String, Value> = full.as_object().expect("JweHeader serializes to a JSON object");
  let mut recipient_header: Map<String, Value> = Map::new();
  for key in PER_RECIPIENT_FIELDS {
    if let Some(value) = full.get(*key) {
      recipient_header.insert((*key).to_string(), value.clone());
    }
  }
  Ok((protected, recipient_header))
}

/// Merges a per-recipient JSON header object into a clone of the shared
/// (decoded) protected header, rejecting any member present in both
/// (the same reject-on-overlap policy as protected/unprotected merging).
fn apply_recipient_fields(header: &mut JweHeader, recipient_header: &Map<String, Value>) -> Result<()> {
  for key in PER_RECIPIENT_FIELDS {
    let Some(value) = recipient_header.get(*key) else { continue };
    match *key {
      "kid" => {
        if header.kid.is_some() {
          return Err(Error::TokenParseError("protected and per-recipient headers both set 'kid'".into()));
        }
        header.kid = serde_json::from_value(value.clone())?;
      }
      "epk" => {
        if header.epk.is_some() {
          return Err(Error::TokenParseError("protected and per-recipient headers both set 'epk'".into()));
        }
        header.epk = serde_json::from_value(value.clone())?;
      }
      "apu" => {
        if header.apu.is_some() {
          return Err(Error::TokenParseError("protected and per-recipient headers both set 'apu'".into()));
        }
        header.apu = serde_json::from_value(value.clone())?;
      }
      "apv" => {
        if header.apv.is_some() {
          return Err(Error::TokenParseError("protected and per-recipient headers both set 'apv'".into()));
        }
        header.apv = serde_json::from_value(value.clone())?;
      }
      "p2s" => {
        if header.p2s.is_some() {
          return Err(Error::TokenParseError("protected and per-recipient headers both set 'p2s'".into()));
        }
        header.p2s = serde_json::from_value(value.clone())?;
      }
      "p2c" => {
        if header.p2c.is_some() {
          return Err(Error::TokenParseError("protected and per-recipient headers both set 'p2c'".into()));
        }
        header.p2c = serde_json::from_value(value.clone())?;
      }
      _ => unreachable!("PER_RECIPIENT_FIELDS is exhaustively matched above"),
    }
  }
  Ok(())
}

/// Builds and encrypts a JWE, optionally for multiple recipients sharing
/// one content-encryption key (the JSON general-serialisation case).
/// Multi-recipient tokens require a `KeyEncryptionAlgorithm` (bare
/// `dir`/`ECDH-ES` can only ever produce a single recipient-specific cek).
pub struct Encoder<'a> {
  alg: JweAlgorithm,
  enc: JweEncryption,
  zip: bool,
  crit: Option<Vec<String>>,
  recipients: Vec<&'a Jwk>,
  format: JweFormat,
  auto_kid: bool,
}

impl<'a> Encoder<'a> {
  pub fn new(alg: JweAlgorithm, enc: JweEncryption) -> Self {
    Self {
      alg,
      enc,
      zip: false,
      crit: None,
      recipients: Vec::new(),
      format: JweFormat::Compact,
      auto_kid: true,
    }
  }

  pub fn deflate(mut self) -> Self {
    self.zip = true;
    self
  }

  pub fn recipient(mut self, jwk: &'a Jwk) -> Self {
    self.recipients.push(jwk);
    self
  }

  pub fn format(mut self, format: JweFormat) -> Self {
    self.format = format;
    self
  }

  pub fn auto_kid(mut self, enabled: bool) -> Self {
    self.auto_kid = enabled;
    self
  }

  fn base_header(&self) -> JweHeader {
    let mut header = JweHeader::new(self.alg, self.enc);
    header.crit = self.crit.clone();
    if self.zip {
      header = header.deflate();
    }
    header
  }

  pub fn encode(&self, plaintext: &[u8]) -> Result<String> {
    if self.recipients.is_empty() {
      return Err(Error::InvalidOperation("JWE encoding requires at least one recipient".into()));
    }
    if self.recipients.len() > 1 && self.format == JweFormat::Compact {
      return Err(Error::InvalidOperation("JWE compact serialization supports exactly one recipient".into()));
    }

    let plaintext: Vec<u8> = if self.zip { deflate(plaintext) } else { plaintext.to_vec() };

    if self.recipients.len() == 1 {
      let jwk: &Jwk = self.recipients[0];
      let mut header: JweHeader = self.base_header();
      if self.auto_kid && header.kid.is_none() {
        if let Some(kid) = jwk.kid() {
          header.kid = Some(kid.to_string());
        }
      }
      let (cek, encrypted_key) = resolve_cek_for_recipient(self.alg, jwk, &mut header, None)?;

      return match self.format {
        JweFormat::Compact => {
          let protected_b64: String = jwu::encode_json_b64(&header)?;
          let sealed = content_encryption::encrypt(self.enc, &plaintext, &cek, protected_b64.as_bytes())?;
          Ok(format!(
            "{protected_b64}.{}.{}.{}.{}",
            jwu::encode_b64(&encrypted_key),
            jwu::encode_b64(&sealed.iv),
            jwu::encode_b64(&sealed.ciphertext),
            jwu::encode_b64(&sealed.tag),
          ))
        }
        JweFormat::JsonGeneral | JweFormat::JsonFlattened => {
          let (protected, recipient_header) = split_recipient_fields(&header)?;
          let protected_b64: String = jwu::encode_json_b64(&protected)?;
          let sealed = content_encryption::encrypt(self.enc, &plaintext, &cek, protected_b64.as_bytes())?;
          Ok(serde_json::to_string(&serde_json::json!({
            "protected": protected_b64,
            "header": recipient_header,
            "encrypted_key": jwu::encode_b64(&encrypted_key),
            "iv": jwu::encode_b64(&sealed.iv),
            "ciphertext": jwu::encode_b64(&sealed.ciphertext),
            "tag": jwu::encode_b64(&sealed.tag),
          }))?)
        }
      };
    }

    if !self.alg.is_key_encryption() {
      return Err(Error::InvalidOperation(format!("{} cannot be used with multiple recipients", self.alg)));
    }
    let shared_cek: Vec<u8> = random_cek(self.enc);
    let protected: JweHeader = self.base_header();
    let protected_b64: String = jwu::encode_json_b64(&protected)?;

    let mut recipients: Vec<Value> = Vec::with_capacity(self.recipients.len());
    for jwk in &self.recipients {
      let mut header: JweHeader = self.base_header();
      if self.auto_kid {
        if let Some(kid) = jwk.kid() {
          header.kid = Some(kid.to_string());
        }
      }
      let (_, encrypted_key) = resolve_cek_for_recipient(self.alg, jwk, &mut header, Some(&shared_cek))?;
      let (_, recipient_header) = split_recipient_fields(&header)?;
      recipients.push(serde_json::json!({
        "header": recipient_header,
        "encrypted_key": jwu::encode_b64(&encrypted_key),
      }));
    }

    let sealed = content_encryption::encrypt(self.enc, &plaintext, &shared_cek, protected_b64.as_bytes())?;
    Ok(serde_json::to_string(&serde_json::json!({
      "protected": protected_b64,
      "recipients": recipients,
      "iv": jwu::encode_b64(&sealed.iv),
      "ciphertext": jwu::encode_b64(&sealed.ciphertext),
      "tag": jwu::encode_b64(&sealed.tag),
    }))?)
  }
}

struct RawToken {
  protected_b64: String,
  recipient_headers: Vec<Map<String, Value>>,
  encrypted_keys: Vec<Vec<u8>>,
  iv: Vec<u8>,
  ciphertext: Vec<u8>,
  tag: Vec<u8>,
}

fn get_str<'a>(doc: &'a Value, key: &str, what: &str) -> Result<&'a str> {
  doc.get(key).and_then(Value::as_str).ok_or_else(|| Error::TokenParseError(format!("{what} is missing '{key}'")))
}

fn parse_json(doc: &Value) -> Result<RawToken> {
  let protected_b64: String = get_str(doc, "protected", "JWE JSON serialization")?.to_string();
  let iv: Vec<u8> = jwu::decode_b64(get_str(doc, "iv", "JWE JSON serialization")?)?;
  let ciphertext: Vec<u8> = jwu::decode_b64(get_str(doc, "ciphertext", "JWE JSON serialization")?)?;
  let tag: Vec<u8> = jwu::decode_b64(get_str(doc, "tag", "JWE JSON serialization")?)?;

  if let Some(recipients) = doc.get("recipients").and_then(Value::as_array) {
    if recipients.is_empty() {
      return Err(Error::TokenParseError("empty 'recipients' array".into()));
    }
    let mut recipient_headers: Vec<Map<String, Value>> = Vec::with_capacity(recipients.len());
    let mut encrypted_keys: Vec<Vec<u8>> = Vec::with_capacity(recipients.len());
    for entry in recipients {
      let header: Map<String, Value> = entry.get("header").and_then(Value::as_object).cloned().unwrap_or_default();
      let encrypted_key: Vec<u8> = match entry.get("encrypted_key").and_then(Value::as_str) {
        Some(s) => jwu::decode_b64(s)?,
        None => Vec::new(),
      };
      recipient_headers.push(header);
      encrypted_keys.push(encrypted_key);
    }
    return Ok(RawToken { protected_b64, recipient_headers, encrypted_keys, iv, ciphertext, tag });
  }

  let header: Map<String, Value> = doc.get("header").and_then(Value::as_object).cloned().unwrap_or_default();
  let encrypted_key: Vec<u8> = match doc.get("encrypted_key").and_then(Value::as_str) {
    Some(s) => jwu::decode_b64(s)?,
    None => Vec::new(),
  };
  Ok(RawToken {
    protected_b64,
    recipient_headers: vec![header],
    encrypted_keys: vec![encrypted_key],
    iv,
    ciphertext,
    tag,
  })
}

fn parse_compact(data: &[u8]) -> Result<RawToken> {
  let text: &str = std::str::from_utf8(data).map_err(|_| Error::TokenParseError("token is not valid UTF-8".into()))?;
  let mut parts = text.trim().split('.');
  let protected_b64 = parts.next().ok_or_else(|| Error::TokenParseError("empty token".into()))?.to_string();
  let encrypted_key = parts.next().ok_or_else(|| Error::TokenParseError("missing encrypted_key segment".into()))?;
  let iv = parts.next().ok_or_else(|| Error::TokenParseError("missing iv segment".into()))?;
  let ciphertext = parts.next().ok_or_else(|| Error::TokenParseError("missing ciphertext segment".into()))?;
  let tag = parts.next().ok_or_else(|| Error::TokenParseError("missing tag segment".into()))?;
  if parts.next().is_some() {
    return Err(Error::TokenParseError("too many segments for JWE compact serialization".into()));
  }
  Ok(RawToken {
    protected_b64,
    recipient_headers: vec![Map::new()],
    encrypted_keys: vec![jwu::decode_b64(encrypted_key)?],
    iv: jwu::decode_b64(iv)?,
    ciphertext: jwu::decode_b64(ciphertext)?,
    tag: jwu::decode_b64(tag)?,
  })
}

/// Parses and decrypts a JWE, resolving the decryption key from a
/// [`Secret`]. For a JSON-serialised token with several recipients, the
/// first one whose `kid`/`alg` resolves against `key` is used.
pub struct Decoder<'a> {
  key: Secret<'a>,
  kid: Option<&'a str>,
  expected_enc: Option<JweEncryption>,
}

impl<'a> Decoder<'a> {
  pub fn new(key: Secret<'a>) -> Self {
    Self {
      key,
      kid: None,
      expected_enc: None,
    }
  }

  pub fn kid(mut self, kid: &'a str) -> Self {
    self.kid = Some(kid);
    self
  }

  /// Pins the content-encryption algorithm a caller expects the token to
  /// use. When set, decryption is refused for any token whose `enc` header
  /// doesn't match this value, before a content-encryption key is ever
  /// derived or unwrapped.
  pub fn expected_enc(mut self, enc: JweEncryption) -> Self {
    self.expected_enc = Some(enc);
    self
  }

  pub fn decode(&self, data: &[u8]) -> Result<Token> {
    let text: &str = std::str::from_utf8(data).map_err(|_| Error::TokenParseError("token is not valid UTF-8".into()))?;
    let raw: RawToken = if text.trim().starts_with('{') {
      let doc: Value = serde_json::from_str(text.trim())?;
      parse_json(&doc)?
    } else {
      parse_compact(data)?
    };

    let protected: JweHeader = jwu::decode_json_b64(&raw.protected_b64)?;
    protected.check_crit()?;

    let mut last_err: Option<Error> = None;
    for (recipient_header, encrypted_key) in raw.recipient_headers.iter().zip(raw.encrypted_keys.iter()) {
      let mut header: JweHeader = protected.clone();
      if apply_recipient_fields(&mut header, recipient_header).is_err() {
        last_err = Some(Error::DecryptionError);
        continue;
      }
      if let Some(kid) = self.kid {
        header.kid = Some(kid.to_string());
      }

      match self.decrypt_one(&header, encrypted_key, &raw.iv, &raw.ciphertext, &raw.tag, raw.protected_b64.as_bytes()) {
        Ok(claims) => return Ok(Token { header, claims }),
        Err(err) => last_err = Some(err),
      }
    }

    Err(last_err.unwrap_or(Error::DecryptionError))
  }

  fn decrypt_one(&self, header: &JweHeader, encrypted_key: &[u8], iv: &[u8], ciphertext: &[u8], tag: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if let Some(expected) = self.expected_enc {
      if header.enc != expected {
        return Err(Error::DecryptionError);
      }
    }

    let alg: JweAlgorithm = header.alg;
    let secret = &self.key;

    let cek: Vec<u8> = if alg.is_key_derivation() {
      let derived: Vec<u8> = key_management::derive(alg, secret, &mut header.clone(), false)?;
      if alg.is_key_encryption() {
        let wrap_key_jwk: Jwk = oct_secret(&derived);
        key_management::decrypt_key(alg, &Secret::Jwk(&wrap_key_jwk), header, encrypted_key)?
      } else {
        if !encrypted_key.is_empty() {
          return Err(Error::TokenParseError(format!("{alg} must carry an empty encrypted_key segment")));
        }
        derived
      }
    } else {
      key_management::decrypt_key(alg, secret, header, encrypted_key)?
    };

    let plaintext: Vec<u8> = content_encryption::decrypt(header.enc, ciphertext, tag, &cek, aad, iv)?;
    match header.zip.as_deref() {
      None => Ok(plaintext),
      Some("DEF") => inflate(&plaintext),
      Some(other) => Err(Error::UnsupportedError(format!("unsupported zip algorithm '{other}'"))),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jwk::JwkParamsOct;

  fn a128kw_key() -> Jwk {
    let mut jwk = Jwk::from_params(JwkParamsOct { k: jwu::encode_b64(&[0x55u8; 16]) });
    jwk.set_kid("test-key");
    jwk
  }

  #[test]
  fn compact_roundtrip_a128kw() {
    let jwk = a128kw_key();
    let token = Encoder::new(JweAlgorithm::A128Kw, JweEncryption::A128Gcm)
      .recipient(&jwk)
      .encode(b"top secret")
      .unwrap();
    assert_eq!(token.matches('.').count(), 4);

    let decoded = Decoder::new(Secret::Jwk(&jwk)).decode(token.as_bytes()).unwrap();
    assert_eq!(decoded.claims, b"top secret");
  }

  #[test]
  fn compact_roundtrip_dir_with_deflate() {
    let jwk = a128kw_key();
    let token = Encoder::new(JweAlgorithm::Dir, JweEncryption::A128Gcm)
      .deflate()
      .recipient(&jwk)
      .encode(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
      .unwrap();

    let decoded = Decoder::new(Secret::Jwk(&jwk)).decode(token.as_bytes()).unwrap();
    assert_eq!(decoded.claims, b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_vec());
  }

  #[test]
  fn tampered_ciphertext_is_rejected() {
    let jwk = a128kw_key();
    let mut token = Encoder::new(JweAlgorithm::A128Kw, JweEncryption::A128Gcm)
      .recipient(&jwk)
      .encode(b"top secret")
      .unwrap();
    token.push('x');
    assert!(matches!(Decoder::new(Secret::Jwk(&jwk)).decode(token.as_bytes()), Err(Error::DecryptionError)));
  }

  #[test]
  fn json_flattened_roundtrip() {
    let jwk = a128kw_key();
    let token = Encoder::new(JweAlgorithm::A128Kw, JweEncryption::A128CbcHs256)
      .format(JweFormat::JsonFlattened)
      .recipient(&jwk)
      .encode(b"hello")
      .unwrap();

    let decoded = Decoder::new(Secret::Jwk(&jwk)).decode(token.as_bytes()).unwrap();
    assert_eq!(decoded.claims, b"hello");
  }

  #[test]
  fn json_general_multi_recipient_shares_one_cek() {
    let jwk_a = a128kw_key();
    let mut jwk_b = Jwk::from_params(JwkParamsOct { k: jwu::encode_b64(&[0xAAu8; 16]) });
    jwk_b.set_kid("recipient-b");

    let token = Encoder::new(JweAlgorithm::A128Kw, JweEncryption::A128Gcm)
      .format(JweFormat::JsonGeneral)
      .recipient(&jwk_a)
      .recipient(&jwk_b)
      .encode(b"shared secret")
      .unwrap();

    let decoded_a = Decoder::new(Secret::Jwk(&jwk_a)).decode(token.as_bytes()).unwrap();
    let decoded_b = Decoder::new(Secret::Jwk(&jwk_b)).decode(token.as_bytes()).unwrap();
    assert_eq!(decoded_a.claims, b"shared secret");
    assert_eq!(decoded_b.claims, b"shared secret");
  }

  #[test]
  fn expected_enc_mismatch_is_rejected_before_key_unwrap() {
    let jwk = a128kw_key();
    let token = Encoder::new(JweAlgorithm::A128Kw, JweEncryption::A128Gcm)
      .recipient(&jwk)
      .encode(b"top secret")
      .unwrap();

    let err = Decoder::new(Secret::Jwk(&jwk))
      .expected_enc(JweEncryption::A256Gcm)
      .decode(token.as_bytes())
      .unwrap_err();
    assert!(matches!(err, Error::DecryptionError));
  }

  #[test]
  fn expected_enc_match_decodes_normally() {
    let jwk = a128kw_key();
    let token = Encoder::new(JweAlgorithm::A128Kw, JweEncryption::A128Gcm)
      .recipient(&jwk)
      .encode(b"top secret")
      .unwrap();

    let decoded = Decoder::new(Secret::Jwk(&jwk))
      .expected_enc(JweEncryption::A128Gcm)
      .decode(token.as_bytes())
      .unwrap();
    assert_eq!(decoded.claims, b"top secret");
  }

  #[test]
  fn unknown_crit_value_is_unsupported() {
    let jwk = a128kw_key();
    let mut header = JweHeader::new(JweAlgorithm::A128Kw, JweEncryption::A128Gcm);
    header.crit = Some(vec!["x-unknown-critical".to_string()]);
    header.extra.insert("x-unknown-critical".to_string(), Value::Bool(true));
    let protected_b64 = jwu::encode_json_b64(&header).unwrap();
    let (cek, encrypted_key) = resolve_cek_for_recipient(JweAlgorithm::A128Kw, &jwk, &mut header.clone(), None).unwrap();
    let sealed = content_encryption::encrypt(JweEncryption::A128Gcm, b"x", &cek, protected_b64.as_bytes()).unwrap();
    let token = format!(
      "{protected_b64}.{}.{}.{}.{}",
      jwu::encode_b64(&encrypted_key),
      jwu::encode_b64(&sealed.iv),
      jwu::encode_b64(&sealed.ciphertext),
      jwu::encode_b64(&sealed.tag),
    );
    assert!(matches!(Decoder::new(Secret::Jwk(&jwk)).decode(token.as_bytes()), Err(Error::UnsupportedError(_))));
  }
}
