// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The JWK data model (RFC 7517), thumbprints (RFC 7638), key sets with
//! criteria-based lookup, and PEM/CBOR import.

pub mod criteria;
pub mod curve;
pub mod params;
pub mod pem;
pub mod protected;
pub mod set;
pub mod thumbprint;

use serde::Deserialize;
use serde::Serialize;

pub use curve::EcCurve;
pub use curve::EcxCurve;
pub use params::JwkParams;
pub use params::JwkParamsEc;
pub use params::JwkParamsOct;
pub use params::JwkParamsOkp;
pub use params::JwkParamsRsa;
pub use set::JwkSet;

use crate::error::Error;
use crate::error::Result;
use crate::jwu;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JwkUse {
  Sig,
  Enc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwkOperation {
  #[serde(rename = "sign")]
  Sign,
  #[serde(rename = "verify")]
  Verify,
  #[serde(rename = "encrypt")]
  Encrypt,
  #[serde(rename = "decrypt")]
  Decrypt,
  #[serde(rename = "wrapKey")]
  WrapKey,
  #[serde(rename = "unwrapKey")]
  UnwrapKey,
  #[serde(rename = "deriveKey")]
  DeriveKey,
  #[serde(rename = "deriveBits")]
  DeriveBits,
}

/// A JSON Web Key (RFC 7517). Immutable after construction apart from
/// `kid`/`use_`/`key_ops`, which have setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
  #[serde(flatten)]
  params: JwkParams,
  #[serde(skip_serializing_if = "Option::is_none")]
  kid: Option<String>,
  #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
  use_: Option<JwkUse>,
  #[serde(rename = "key_ops", skip_serializing_if = "Option::is_none")]
  key_ops: Option<Vec<JwkOperation>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  alg: Option<String>,
}

impl Jwk {
  pub fn from_params(params: impl Into<JwkParams>) -> Self {
    Self {
      params: params.into(),
      kid: None,
      use_: None,
      key_ops: None,
      alg: None,
    }
  }

  pub fn params(&self) -> &JwkParams {
    &self.params
  }

  pub fn kty(&self) -> &'static str {
    self.params.kty()
  }

  pub fn try_rsa_params(&self) -> Result<&JwkParamsRsa> {
    match &self.params {
      JwkParams::Rsa(p) => Ok(p),
      _ => Err(Error::InvalidKey("expected an RSA JWK".into())),
    }
  }

  pub fn try_ec_params(&self) -> Result<&JwkParamsEc> {
    match &self.params {
      JwkParams::Ec(p) => Ok(p),
      _ => Err(Error::InvalidKey("expected an EC JWK".into())),
    }
  }

  pub fn try_okp_params(&self) -> Result<&JwkParamsOkp> {
    match &self.params {
      JwkParams::Okp(p) => Ok(p),
      _ => Err(Error::InvalidKey("expected an OKP JWK".into())),
    }
  }

  pub fn try_oct_params(&self) -> Result<&JwkParamsOct> {
    match &self.params {
      JwkParams::Oct(p) => Ok(p),
      _ => Err(Error::InvalidKey("expected an oct JWK".into())),
    }
  }

  pub fn try_ec_curve(&self) -> Result<EcCurve> {
    EcCurve::from_name(&self.try_ec_params()?.crv)
  }

  pub fn try_ecx_curve(&self) -> Result<EcxCurve> {
    EcxCurve::from_name(&self.try_okp_params()?.crv)
  }

  pub fn kid(&self) -> Option<&str> {
    self.kid.as_deref()
  }

  pub fn set_kid(&mut self, kid: impl Into<String>) {
    self.kid = Some(kid.into());
  }

  /// Returns the explicit `kid`, or lazily derives and caches one as the
  /// first 7 characters of the thumbprint.
  pub fn kid_or_derive(&mut self) -> Result<String> {
    if let Some(kid) = &self.kid {
      return Ok(kid.clone());
    }
    let derived: String = self.thumbprint_b64()?.chars().take(7).collect();
    self.kid = Some(derived.clone());
    Ok(derived)
  }

  pub fn use_(&self) -> Option<JwkUse> {
    self.use_
  }

  pub fn set_use(&mut self, use_: JwkUse) {
    self.use_ = Some(use_);
  }

  pub fn key_ops(&self) -> Option<&[JwkOperation]> {
    self.key_ops.as_deref()
  }

  pub fn set_key_ops(&mut self, ops: Vec<JwkOperation>) {
    self.key_ops = Some(ops);
  }

  pub fn alg(&self) -> Option<&str> {
    self.alg.as_deref()
  }

  pub fn set_alg(&mut self, alg: impl Into<String>) {
    self.alg = Some(alg.into());
  }

  /// `#public` — true iff asymmetric and lacking private components.
  pub fn is_public(&self) -> bool {
    self.params.is_public()
  }

  /// `#size` — key size in bits, per-kty definition (modulus bit-length for
  /// RSA, field size for EC/OKP, byte-length*8 for oct).
  pub fn size(&self) -> Result<usize> {
    Ok(match &self.params {
      JwkParams::Oct(p) => jwu::decode_b64(&p.k)?.len() * 8,
      JwkParams::Rsa(p) => jwu::decode_b64(&p.n)?.len() * 8,
      JwkParams::Ec(p) => EcCurve::from_name(&p.crv)?.coordinate_len() * 8,
      JwkParams::Okp(p) => match EcxCurve::from_name(&p.crv)? {
        EcxCurve::Ed25519 | EcxCurve::X25519 => 256,
      },
    })
  }

  pub fn thumbprint(&self) -> [u8; 32] {
    thumbprint::digest(&self.params)
  }

  pub fn thumbprint_b64(&self) -> Result<String> {
    Ok(thumbprint::thumbprint_b64(&self.params))
  }

  /// Returns the public half of an asymmetric key (drops `d` and, for RSA,
  /// the CRT components). Returns a clone for symmetric/already-public
  /// keys.
  pub fn to_public(&self) -> Jwk {
    let params: JwkParams = match &self.params {
      JwkParams::Rsa(p) => JwkParams::Rsa(JwkParamsRsa {
        n: p.n.clone(),
        e: p.e.clone(),
        d: None,
        p: None,
        q: None,
        dp: None,
        dq: None,
        qi: None,
      }),
      JwkParams::Ec(p) => JwkParams::Ec(JwkParamsEc {
        crv: p.crv.clone(),
        x: p.x.clone(),
        y: p.y.clone(),
        d: None,
      }),
      JwkParams::Okp(p) => JwkParams::Okp(JwkParamsOkp {
        crv: p.crv.clone(),
        x: p.x.clone(),
        d: None,
      }),
      JwkParams::Oct(p) => JwkParams::Oct(p.clone()),
    };

    Jwk {
      params,
      kid: self.kid.clone(),
      use_: self.use_,
      key_ops: None,
      alg: self.alg.clone(),
    }
  }

  /// Validates the on-curve invariant for EC keys; always `true` for
  /// other key types.
  pub fn is_valid(&self) -> bool {
    match &self.params {
      JwkParams::Ec(p) => match (EcCurve::from_name(&p.crv), jwu::decode_b64(&p.x), jwu::decode_b64(&p.y)) {
        (Ok(curve), Ok(x), Ok(y)) => curve.is_on_curve(&x, &y),
        _ => false,
      },
      _ => true,
    }
  }
}

impl From<JwkParamsOct> for JwkParams {
  fn from(p: JwkParamsOct) -> Self {
    JwkParams::Oct(p)
  }
}
impl From<JwkParamsRsa> for JwkParams {
  fn from(p: JwkParamsRsa) -> Self {
    JwkParams::Rsa(p)
  }
}
impl From<JwkParamsEc> for JwkParams {
  fn from(p: JwkParamsEc) -> Self {
    JwkParams::Ec(p)
  }
}
impl From<JwkParamsOkp> for JwkParams {
  fn from(p: JwkParamsOkp) -> Self {
    JwkParams::Okp(p)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn thumbprint_identity_across_public_private() {
    let private = Jwk::from_params(JwkParamsOct { k: jwu::encode_b64("secret") });
    let public = private.to_public();
    assert_eq!(private.thumbprint(), public.thumbprint());
  }

  #[test]
  fn kid_is_lazily_derived_once() {
    let mut jwk = Jwk::from_params(JwkParamsOct { k: jwu::encode_b64("secret") });
    assert!(jwk.kid().is_none());
    let kid = jwk.kid_or_derive().unwrap();
    assert_eq!(kid.len(), 7);
    assert_eq!(jwk.kid(), Some(kid.as_str()));
  }
}
