// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! A minimal arbitrary-precision integer surface, backed by
//! `num-bigint-dig` (already a transitive need of the RSA raw primitive in
//! [`crate::jws::rsa`]/[`crate::jwe::key_management::rsa`]).
//!
//! This is deliberately thin: the only consumer that needs arbitrary-
//! precision arithmetic beyond RSA's own modexp is the EC on-curve check
//! in [`crate::jwk::curve`], so `add`, `mul`, `pow`, `modulo`, `powmod`,
//! and `cmp` are all that's exposed.

use num_bigint_dig::BigUint;
use num_bigint_dig::ModInverse;
use std::cmp::Ordering;

/// A non-negative arbitrary-precision integer in big-endian byte order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UInt(BigUint);

impl UInt {
  pub fn from_be_bytes(bytes: &[u8]) -> Self {
    Self(BigUint::from_bytes_be(bytes))
  }

  pub fn from_u64(value: u64) -> Self {
    Self(BigUint::from(value))
  }

  pub fn to_be_bytes(&self) -> Vec<u8> {
    self.0.to_bytes_be()
  }

  pub fn add(&self, other: &Self) -> Self {
    Self(&self.0 + &other.0)
  }

  pub fn mul(&self, other: &Self) -> Self {
    Self(&self.0 * &other.0)
  }

  pub fn pow(&self, exponent: u32) -> Self {
    Self(self.0.pow(exponent))
  }

  pub fn modulo(&self, modulus: &Self) -> Self {
    Self(&self.0 % &modulus.0)
  }

  pub fn powmod(&self, exponent: &Self, modulus: &Self) -> Self {
    Self(self.0.modpow(&exponent.0, &modulus.0))
  }

  /// Modular inverse of `self` mod `modulus`, if it exists.
  pub fn invmod(&self, modulus: &Self) -> Option<Self> {
    self.0.clone().mod_inverse(&modulus.0).map(|v| Self(v.to_biguint().unwrap_or_default()))
  }

  pub fn cmp(&self, other: &Self) -> Ordering {
    self.0.cmp(&other.0)
  }

  pub fn is_zero(&self) -> bool {
    self.0 == BigUint::default()
  }
}

/// Checks the short Weierstrass on-curve invariant `y^2 ≡ x^3 + a*x + b (mod p)`
/// for the given curve parameters, all as big-endian byte strings.
///
/// This is the anti invalid-curve-attack check that must run before any
/// EC key (imported or received as an `epk`) is used in an agreement.
pub fn is_on_short_weierstrass_curve(x: &[u8], y: &[u8], a: &[u8], b: &[u8], p: &[u8]) -> bool {
  let x: UInt = UInt::from_be_bytes(x);
  let y: UInt = UInt::from_be_bytes(y);
  let a: UInt = UInt::from_be_bytes(a);
  let b: UInt = UInt::from_be_bytes(b);
  let p: UInt = UInt::from_be_bytes(p);

  if x.cmp(&p) != Ordering::Less || y.cmp(&p) != Ordering::Less {
    return false;
  }

  let lhs: UInt = y.mul(&y).modulo(&p);
  let rhs: UInt = x.pow(3).add(&a.mul(&x)).add(&b).modulo(&p);

  lhs == rhs
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn powmod_matches_known_value() {
    // 4^13 mod 497 = 445 (textbook RSA example)
    let base: UInt = UInt::from_u64(4);
    let exp: UInt = UInt::from_u64(13);
    let modulus: UInt = UInt::from_u64(497);
    assert_eq!(base.powmod(&exp, &modulus), UInt::from_u64(445));
  }

  #[test]
  fn p256_generator_is_on_curve() {
    // NIST P-256 parameters and base point, all big-endian.
    let p = hex("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff");
    let a = hex("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc");
    let b = hex("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b");
    let gx = hex("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296");
    let gy = hex("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5");

    assert!(is_on_short_weierstrass_curve(&gx, &gy, &a, &b, &p));
  }

  #[test]
  fn tampered_point_is_rejected() {
    let p = hex("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff");
    let a = hex("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc");
    let b = hex("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b");
    let gx = hex("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296");
    // Flip the last nibble of a valid y coordinate.
    let gy = hex("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f4");

    assert!(!is_on_short_weierstrass_curve(&gx, &gy, &a, &b, &p));
  }

  fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
      .step_by(2)
      .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
      .collect()
  }
}
