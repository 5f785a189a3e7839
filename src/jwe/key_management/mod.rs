// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Key-management primitives: the key-encryption (`encrypt_key`/
//! `decrypt_key`) and key-derivation (`derive`) contracts, dispatched by
//! [`JweAlgorithm`]. `ECDH-ES+AxxxKW` implements both — `derive` yields
//! the wrap key, then the AES-KW path wraps `cek`.

pub(crate) mod aes_kw;
mod dir;
mod ecdh_es;
mod pbes2;
mod rsa;

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::Jwk;
use crate::secret::Secret;

use super::header::JweHeader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JweAlgorithm {
  #[serde(rename = "dir")]
  Dir,
  #[serde(rename = "RSA1_5")]
  Rsa15,
  #[serde(rename = "RSA-OAEP")]
  RsaOaep,
  #[serde(rename = "RSA-OAEP-256")]
  RsaOaep256,
  #[serde(rename = "A128KW")]
  A128Kw,
  #[serde(rename = "A192KW")]
  A192Kw,
  #[serde(rename = "A256KW")]
  A256Kw,
  #[serde(rename = "PBES2-HS256+A128KW")]
  Pbes2Hs256A128Kw,
  #[serde(rename = "PBES2-HS384+A192KW")]
  Pbes2Hs384A192Kw,
  #[serde(rename = "PBES2-HS512+A256KW")]
  Pbes2Hs512A256Kw,
  #[serde(rename = "ECDH-ES")]
  EcdhEs,
  #[serde(rename = "ECDH-ES+A128KW")]
  EcdhEsA128Kw,
  #[serde(rename = "ECDH-ES+A192KW")]
  EcdhEsA192Kw,
  #[serde(rename = "ECDH-ES+A256KW")]
  EcdhEsA256Kw,
}

impl fmt::Display for JweAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = serde_json::to_value(self).unwrap_or(Value::Null);
    write!(f, "{}", name.as_str().unwrap_or("unknown"))
  }
}

impl JweAlgorithm {
  pub fn name(self) -> &'static str {
    match self {
      JweAlgorithm::Dir => "dir",
      JweAlgorithm::Rsa15 => "RSA1_5",
      JweAlgorithm::RsaOaep => "RSA-OAEP",
      JweAlgorithm::RsaOaep256 => "RSA-OAEP-256",
      JweAlgorithm::A128Kw => "A128KW",
      JweAlgorithm::A192Kw => "A192KW",
      JweAlgorithm::A256Kw => "A256KW",
      JweAlgorithm::Pbes2Hs256A128Kw => "PBES2-HS256+A128KW",
      JweAlgorithm::Pbes2Hs384A192Kw => "PBES2-HS384+A192KW",
      JweAlgorithm::Pbes2Hs512A256Kw => "PBES2-HS512+A256KW",
      JweAlgorithm::EcdhEs => "ECDH-ES",
      JweAlgorithm::EcdhEsA128Kw => "ECDH-ES+A128KW",
      JweAlgorithm::EcdhEsA192Kw => "ECDH-ES+A192KW",
      JweAlgorithm::EcdhEsA256Kw => "ECDH-ES+A256KW",
    }
  }

  pub fn is_key_derivation(self) -> bool {
    matches!(
      self,
      JweAlgorithm::Dir | JweAlgorithm::EcdhEs | JweAlgorithm::EcdhEsA128Kw | JweAlgorithm::EcdhEsA192Kw | JweAlgorithm::EcdhEsA256Kw
    )
  }

  pub fn is_key_encryption(self) -> bool {
    !matches!(self, JweAlgorithm::Dir | JweAlgorithm::EcdhEs)
  }

  /// `None` for bare `dir`/`ECDH-ES` (no wrap stage); `Some(bits)` for the
  /// wrapped-agreement and AES-KW families.
  fn wrap_key_bits(self) -> Option<u32> {
    match self {
      JweAlgorithm::A128Kw | JweAlgorithm::Pbes2Hs256A128Kw | JweAlgorithm::EcdhEsA128Kw => Some(128),
      JweAlgorithm::A192Kw | JweAlgorithm::Pbes2Hs384A192Kw | JweAlgorithm::EcdhEsA192Kw => Some(192),
      JweAlgorithm::A256Kw | JweAlgorithm::Pbes2Hs512A256Kw | JweAlgorithm::EcdhEsA256Kw => Some(256),
      _ => None,
    }
  }
}

/// `derive(keys, headers) -> shared_key`, for key-derivation algorithms.
///
/// For the wrapped-agreement family this returns the *wrap* key (already
/// the right size for the trailing AES-KW step); for bare `dir`/`ECDH-ES`
/// it returns the content-encryption key directly.
pub fn derive(alg: JweAlgorithm, key: &Secret<'_>, header: &mut JweHeader, for_encrypt: bool) -> Result<Vec<u8>> {
  match alg {
    JweAlgorithm::Dir => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref())?;
      dir::cek(jwk)
    }
    JweAlgorithm::EcdhEs | JweAlgorithm::EcdhEsA128Kw | JweAlgorithm::EcdhEsA192Kw | JweAlgorithm::EcdhEsA256Kw => {
      let keylen_bits: u32 = match alg.wrap_key_bits() {
        Some(bits) => bits,
        None => header.enc.cek_bits(),
      };
      let kdf_alg: &str = if alg == JweAlgorithm::EcdhEs { header.enc.name() } else { alg.name() };
      let apu: Vec<u8> = header.apu.as_deref().map(crate::jwu::decode_b64).transpose()?.unwrap_or_default();
      let apv: Vec<u8> = header.apv.as_deref().map(crate::jwu::decode_b64).transpose()?.unwrap_or_default();

      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref())?;

      if for_encrypt {
        if let Ok(ec_params) = jwk.try_ec_params() {
          let agreement = ecdh_es::agree_ephemeral(ec_params)?;
          header.epk = Some(agreement.epk);
          ecdh_es::derive_and_wrap(&agreement.z, kdf_alg, &apu, &apv, keylen_bits, None)
        } else {
          let okp_params = jwk.try_okp_params()?;
          let agreement = ecdh_es::agree_ephemeral_x25519(okp_params)?;
          header.epk = Some(agreement.epk);
          ecdh_es::derive_and_wrap(&agreement.z, kdf_alg, &apu, &apv, keylen_bits, None)
        }
      } else {
        let epk: &Jwk = header.epk.as_ref().ok_or(Error::DecryptionError)?;
        let z: Vec<u8> = if let Ok(ec_params) = jwk.try_ec_params() {
          let epk_params = epk.try_ec_params().map_err(|_| Error::DecryptionError)?;
          ecdh_es::agree_static(ec_params, epk_params)?
        } else {
          let okp_params = jwk.try_okp_params()?;
          let epk_params = epk.try_okp_params().map_err(|_| Error::DecryptionError)?;
          ecdh_es::agree_static_x25519(okp_params, epk_params)?
        };
        ecdh_es::derive_and_wrap(&z, kdf_alg, &apu, &apv, keylen_bits, None)
      }
    }
    _ => Err(Error::InvalidOperation(format!("{alg} is not a KeyDerivationAlgorithm"))),
  }
}

/// `encrypt_key(cek, keys, headers) -> b64url`, for key-encryption algorithms.
///
/// `key` is either the caller's recipient key (RSA/AES-KW/PBES2) or the
/// synthetic one-key wrap key produced by [`derive`] (wrapped-agreement).
pub fn encrypt_key(alg: JweAlgorithm, key: &Secret<'_>, header: &mut JweHeader, cek: &[u8]) -> Result<Vec<u8>> {
  match alg {
    JweAlgorithm::Rsa15 => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref())?;
      rsa::wrap_pkcs1v15(jwk, cek)
    }
    JweAlgorithm::RsaOaep => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref())?;
      rsa::wrap_oaep_sha1(jwk, cek)
    }
    JweAlgorithm::RsaOaep256 => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref())?;
      rsa::wrap_oaep_sha256(jwk, cek)
    }
    JweAlgorithm::A128Kw | JweAlgorithm::A192Kw | JweAlgorithm::A256Kw => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref())?;
      let kek: Vec<u8> = jwk.try_oct_params().map_err(|_| Error::InvalidKey("AES-KW requires an oct JWK".into())).and_then(|p| crate::jwu::decode_b64(&p.k))?;
      aes_kw::wrap(&kek, cek)
    }
    JweAlgorithm::Pbes2Hs256A128Kw | JweAlgorithm::Pbes2Hs384A192Kw | JweAlgorithm::Pbes2Hs512A256Kw => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref())?;
      let password: Vec<u8> = jwk.try_oct_params().map_err(|_| Error::InvalidKey("PBES2 requires an oct JWK".into())).and_then(|p| crate::jwu::decode_b64(&p.k))?;
      let (wrapped, params) = pbes2::wrap(alg, &password, cek)?;
      header.p2s = Some(crate::jwu::encode_b64(&params.salt_input));
      header.p2c = Some(params.iterations);
      Ok(wrapped)
    }
    JweAlgorithm::EcdhEsA128Kw | JweAlgorithm::EcdhEsA192Kw | JweAlgorithm::EcdhEsA256Kw => {
      // `key` here is the synthetic one-key wrap key `derive` produced.
      let jwk: &Jwk = key.resolve(alg.name(), None)?;
      let kek: Vec<u8> = jwk.try_oct_params().map_err(|_| Error::InvalidKey("expected a synthesized oct wrap key".into())).and_then(|p| crate::jwu::decode_b64(&p.k))?;
      aes_kw::wrap(&kek, cek)
    }
    _ => Err(Error::InvalidOperation(format!("{alg} is not a KeyEncryptionAlgorithm"))),
  }
}

pub fn decrypt_key(alg: JweAlgorithm, key: &Secret<'_>, header: &JweHeader, encrypted_key: &[u8]) -> Result<Vec<u8>> {
  match alg {
    JweAlgorithm::Rsa15 => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref()).map_err(|_| Error::DecryptionError)?;
      rsa::unwrap_pkcs1v15(jwk, encrypted_key)
    }
    JweAlgorithm::RsaOaep => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref()).map_err(|_| Error::DecryptionError)?;
      rsa::unwrap_oaep_sha1(jwk, encrypted_key)
    }
    JweAlgorithm::RsaOaep256 => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref()).map_err(|_| Error::DecryptionError)?;
      rsa::unwrap_oaep_sha256(jwk, encrypted_key)
    }
    JweAlgorithm::A128Kw | JweAlgorithm::A192Kw | JweAlgorithm::A256Kw => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref()).map_err(|_| Error::DecryptionError)?;
      let kek: Vec<u8> = jwk.try_oct_params().map_err(|_| Error::DecryptionError).and_then(|p| crate::jwu::decode_b64(&p.k).map_err(|_| Error::DecryptionError))?;
      aes_kw::unwrap(&kek, encrypted_key)
    }
    JweAlgorithm::Pbes2Hs256A128Kw | JweAlgorithm::Pbes2Hs384A192Kw | JweAlgorithm::Pbes2Hs512A256Kw => {
      let jwk: &Jwk = key.resolve(alg.name(), header.kid.as_deref()).map_err(|_| Error::DecryptionError)?;
      let password: Vec<u8> = jwk.try_oct_params().map_err(|_| Error::DecryptionError).and_then(|p| crate::jwu::decode_b64(&p.k).map_err(|_| Error::DecryptionError))?;
      let salt_input: Vec<u8> = header.p2s.as_deref().ok_or(Error::DecryptionError).and_then(|s| crate::jwu::decode_b64(s).map_err(|_| Error::DecryptionError))?;
      let iterations: u32 = header.p2c.ok_or(Error::DecryptionError)?;
      pbes2::unwrap(alg, &password, &salt_input, iterations, encrypted_key)
    }
    JweAlgorithm::EcdhEsA128Kw | JweAlgorithm::EcdhEsA192Kw | JweAlgorithm::EcdhEsA256Kw => {
      let jwk: &Jwk = key.resolve(alg.name(), None).map_err(|_| Error::DecryptionError)?;
      let kek: Vec<u8> = jwk.try_oct_params().map_err(|_| Error::DecryptionError).and_then(|p| crate::jwu::decode_b64(&p.k).map_err(|_| Error::DecryptionError))?;
      aes_kw::unwrap(&kek, encrypted_key)
    }
    _ => Err(Error::DecryptionError),
  }
}
