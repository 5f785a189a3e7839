// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use serde::Serialize;
use zeroize::Zeroize;

/// `kty: "oct"` — a symmetric key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct JwkParamsOct {
  pub k: String,
}

/// `kty: "RSA"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct JwkParamsRsa {
  pub n: String,
  pub e: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub d: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub p: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub q: Option<String>,
  #[serde(rename = "dp", skip_serializing_if = "Option::is_none")]
  pub dp: Option<String>,
  #[serde(rename = "dq", skip_serializing_if = "Option::is_none")]
  pub dq: Option<String>,
  #[serde(rename = "qi", skip_serializing_if = "Option::is_none")]
  pub qi: Option<String>,
}

impl JwkParamsRsa {
  pub fn is_public(&self) -> bool {
    self.d.is_none()
  }

  /// An RSA private key must retain all CRT components; callers that only
  /// have `d` cannot satisfy the CRT-based decrypt/sign primitive this
  /// crate implements.
  pub fn has_full_crt(&self) -> bool {
    self.p.is_some() && self.q.is_some() && self.dp.is_some() && self.dq.is_some() && self.qi.is_some()
  }
}

/// `kty: "EC"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct JwkParamsEc {
  pub crv: String,
  pub x: String,
  pub y: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub d: Option<String>,
}

impl JwkParamsEc {
  pub fn is_public(&self) -> bool {
    self.d.is_none()
  }
}

/// `kty: "OKP"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct JwkParamsOkp {
  pub crv: String,
  pub x: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub d: Option<String>,
}

impl JwkParamsOkp {
  pub fn is_public(&self) -> bool {
    self.d.is_none()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum JwkParams {
  #[serde(rename = "oct")]
  Oct(JwkParamsOct),
  #[serde(rename = "RSA")]
  Rsa(JwkParamsRsa),
  #[serde(rename = "EC")]
  Ec(JwkParamsEc),
  #[serde(rename = "OKP")]
  Okp(JwkParamsOkp),
}

impl JwkParams {
  pub fn kty(&self) -> &'static str {
    match self {
      JwkParams::Oct(_) => "oct",
      JwkParams::Rsa(_) => "RSA",
      JwkParams::Ec(_) => "EC",
      JwkParams::Okp(_) => "OKP",
    }
  }

  pub fn is_public(&self) -> bool {
    match self {
      JwkParams::Oct(_) => false,
      JwkParams::Rsa(params) => params.is_public(),
      JwkParams::Ec(params) => params.is_public(),
      JwkParams::Okp(params) => params.is_public(),
    }
  }
}
