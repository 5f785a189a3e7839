// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Named-curve metadata: OIDs, field sizes, and the short-Weierstrass
//! parameters needed for the on-curve invariant.

use crate::bigint;
use crate::der;
use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
  P256,
  P384,
  P521,
  Secp256K1,
}

impl EcCurve {
  pub fn name(self) -> &'static str {
    match self {
      EcCurve::P256 => "P-256",
      EcCurve::P384 => "P-384",
      EcCurve::P521 => "P-521",
      EcCurve::Secp256K1 => "secp256k1",
    }
  }

  pub fn from_name(name: &str) -> Result<Self> {
    match name {
      "P-256" => Ok(EcCurve::P256),
      "P-384" => Ok(EcCurve::P384),
      "P-521" => Ok(EcCurve::P521),
      "secp256k1" => Ok(EcCurve::Secp256K1),
      other => Err(Error::InvalidKey(format!("unsupported EC curve: {other}"))),
    }
  }

  /// Field-element width in bytes (`⌈bits/8⌉`), used to left-pad `x`/`y`
  /// and the `r`/`s` components of a fixed-width ECDSA signature.
  pub fn coordinate_len(self) -> usize {
    match self {
      EcCurve::P256 => 32,
      EcCurve::P384 => 48,
      EcCurve::P521 => 66,
      EcCurve::Secp256K1 => 32,
    }
  }

  pub fn oid(self) -> &'static str {
    match self {
      EcCurve::P256 => der::OID_P256,
      EcCurve::P384 => der::OID_P384,
      EcCurve::P521 => der::OID_P521,
      EcCurve::Secp256K1 => der::OID_SECP256K1,
    }
  }

  pub fn from_oid(oid: &str) -> Result<Self> {
    match oid {
      o if o == der::OID_P256 => Ok(EcCurve::P256),
      o if o == der::OID_P384 => Ok(EcCurve::P384),
      o if o == der::OID_P521 => Ok(EcCurve::P521),
      o if o == der::OID_SECP256K1 => Ok(EcCurve::Secp256K1),
      _ => Err(Error::InvalidKey("unrecognized EC curve OID".into())),
    }
  }

  fn params(self) -> (&'static str, &'static str, &'static str) {
    match self {
      EcCurve::P256 => (
        "ffffffff00000001000000000000000000000000fffffffffffffffffffffffc",
        "5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b",
        "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
      ),
      EcCurve::P384 => (
        "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffeffffffff0000000000000000fffffffc",
        "b3312fa7e23ee7e4988e056be3f82d19181d9c6efe8141120314088f5013875ac656398d8a2ed19d2a85c8edd3ec2aef",
        "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffeffffffff0000000000000000ffffffff",
      ),
      EcCurve::P521 => (
        "01fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffc",
        "0051953eb9618e1c9a1f929a21a0b68540eea2da725b99b315f3b8b489918ef109e156193951ec7e937b1652c0bd3bb1bf073573df883d2c34f1ef451fd46b503f00",
        "01ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
      ),
      EcCurve::Secp256K1 => (
        "0",
        "7",
        "fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f",
      ),
    }
  }

  /// Checks `y^2 ≡ x^3 + a*x + b (mod p)` for this curve — the anti
  /// invalid-curve-attack invariant.
  pub fn is_on_curve(self, x: &[u8], y: &[u8]) -> bool {
    let (a, b, p) = self.params();
    bigint::is_on_short_weierstrass_curve(x, y, &decode_hex(a), &decode_hex(b), &decode_hex(p))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcxCurve {
  Ed25519,
  X25519,
}

impl EcxCurve {
  pub fn name(self) -> &'static str {
    match self {
      EcxCurve::Ed25519 => "Ed25519",
      EcxCurve::X25519 => "X25519",
    }
  }

  pub fn from_name(name: &str) -> Result<Self> {
    match name {
      "Ed25519" => Ok(EcxCurve::Ed25519),
      "X25519" => Ok(EcxCurve::X25519),
      other => Err(Error::InvalidKey(format!("unsupported OKP curve: {other}"))),
    }
  }
}

fn decode_hex(s: &str) -> Vec<u8> {
  let s: std::borrow::Cow<'_, str> = if s.len() % 2 == 1 { format!("0{s}").into() } else { s.into() };
  (0..s.len())
    .step_by(2)
    .map(|i| u8::from_str_radix(&s[i..i + 2], 16).expect("static curve constant is valid hex"))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn secp256k1_generator_is_on_curve() {
    let gx = decode_hex("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");
    let gy = decode_hex("483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8");
    assert!(EcCurve::Secp256K1.is_on_curve(&gx, &gy));
  }
}
