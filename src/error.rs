// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Error kinds surfaced by the JOSE pipeline.
//!
//! Each primitive raises its narrowest kind; pipeline code must never leak
//! underlying crypto-library error text into [`Error::DecryptionError`] (see
//! the redaction note on that variant) and must preserve the offending claim
//! value on [`Error::TooEarly`]/[`Error::TooLate`].

use thiserror::Error;

/// The result type returned by fallible operations in this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
  /// Malformed input: wrong segment count, bad JSON, bad base64, bad claim
  /// types, or decompression failure.
  #[error("token parse error: {0}")]
  TokenParseError(String),

  /// Unknown `crit` value, `zip` other than `DEF`, or an algorithm not
  /// supported by the host.
  #[error("unsupported: {0}")]
  UnsupportedError(String),

  /// `alg` mismatch, invalid signature, or no signing key/kid found.
  #[error("signature verification error: {0}")]
  SignatureVerificationError(String),

  /// Alg mismatch, key agreement failure, wrap/unwrap failure, or AEAD tag
  /// failure. The message is intentionally generic: never forward the
  /// underlying crypto-library text here, to avoid a padding-oracle style
  /// side channel.
  #[error("decryption failed")]
  DecryptionError,

  /// `nbf` validation failed; carries the offending `nbf` value.
  #[error("token not yet valid: nbf={0}")]
  TooEarly(i64),

  /// `exp` validation failed; carries the offending `exp` value.
  #[error("token expired: exp={0}")]
  TooLate(i64),

  /// Malformed JWK/PEM, on-curve failure, or component length mismatch.
  #[error("invalid key: {0}")]
  InvalidKey(String),

  /// No key in the set matched the lookup criteria.
  #[error("key not found")]
  KeyNotFound,

  /// Duplicate add (by thumbprint or `kid`).
  #[error("key already exists in key set")]
  KeyAlreadyExists,

  /// An underlying crypto library surfaced an error we only wrap, not
  /// interpret (e.g. invalid scalar, point decompression failure).
  #[error("system library error: {0}")]
  SystemLibraryError(String),

  /// Caller passed headers/keys in a shape the API itself forbids (e.g.
  /// `alg` missing at encode time). Reserved for programmer errors; the
  /// core never raises this from untrusted input.
  #[error("invalid operation: {0}")]
  InvalidOperation(String),
}

impl From<serde_json::Error> for Error {
  fn from(err: serde_json::Error) -> Self {
    Error::TokenParseError(err.to_string())
  }
}

impl From<base64::DecodeError> for Error {
  fn from(err: base64::DecodeError) -> Self {
    Error::TokenParseError(format!("base64: {err}"))
  }
}
