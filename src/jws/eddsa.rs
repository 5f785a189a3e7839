// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! EdDSA (RFC 8037 §3.1): Ed25519 signatures over an OKP JWK.

use ed25519_dalek::Signer;
use ed25519_dalek::Verifier;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::EcxCurve;
use crate::jwk::Jwk;
use crate::jwu;

pub fn sign(msg: &[u8], jwk: &Jwk) -> Result<Vec<u8>> {
  if jwk.try_ecx_curve()? != EcxCurve::Ed25519 {
    return Err(Error::InvalidKey("EdDSA requires an Ed25519 OKP JWK".into()));
  }
  let params = jwk.try_okp_params()?;
  let d = params.d.as_deref().ok_or_else(|| Error::InvalidKey("EdDSA signing requires a private key".into()))?;
  let seed: Vec<u8> = jwu::decode_b64(d)?;
  let seed: [u8; 32] = seed.try_into().map_err(|_| Error::InvalidKey("Ed25519 private key must be 32 bytes".into()))?;

  let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
  Ok(signing_key.sign(msg).to_bytes().to_vec())
}

pub fn verify(msg: &[u8], sig: &[u8], jwk: &Jwk) -> Result<bool> {
  if jwk.try_ecx_curve()? != EcxCurve::Ed25519 {
    return Err(Error::InvalidKey("EdDSA requires an Ed25519 OKP JWK".into()));
  }
  let params = jwk.try_okp_params()?;
  let x: Vec<u8> = jwu::decode_b64(&params.x)?;
  let x: [u8; 32] = match x.try_into() {
    Ok(x) => x,
    Err(_) => return Ok(false),
  };

  let verifying_key = match ed25519_dalek::VerifyingKey::from_bytes(&x) {
    Ok(key) => key,
    Err(_) => return Ok(false),
  };
  let signature = match ed25519_dalek::Signature::from_slice(sig) {
    Ok(sig) => sig,
    Err(_) => return Ok(false),
  };

  Ok(verifying_key.verify(msg, &signature).is_ok())
}
