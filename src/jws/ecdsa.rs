// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! ES256/384/512 and (behind the `es256k` feature) ES256K (RFC 7518 §3.4):
//! ECDSA with the fixed-width `r || s` signature encoding. Scalar
//! arithmetic is deliberately deferred to the platform; this module only
//! maps JWK fields in and out of the RustCrypto signer/verifier types.

use ecdsa::signature::Signer;
use ecdsa::signature::Verifier;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::EcCurve;
use crate::jwk::Jwk;
use crate::jws::JwsAlgorithm;
use crate::jwu;

fn expect_curve(alg: JwsAlgorithm, curve: EcCurve) -> Result<()> {
  let want: EcCurve = match alg {
    JwsAlgorithm::ES256 => EcCurve::P256,
    JwsAlgorithm::ES384 => EcCurve::P384,
    JwsAlgorithm::ES512 => EcCurve::P521,
    #[cfg(feature = "es256k")]
    JwsAlgorithm::ES256K => EcCurve::Secp256K1,
    other => return Err(Error::InvalidOperation(format!("{other} is not an ECDSA algorithm"))),
  };
  if want != curve {
    return Err(Error::InvalidKey(format!("{alg} requires curve {}, found {}", want.name(), curve.name())));
  }
  Ok(())
}

macro_rules! ecdsa_impl {
  ($module:ident, $curve:ty) => {
    mod $module {
      use super::*;
      use $curve as Curve;

      pub fn sign(msg: &[u8], jwk: &Jwk) -> Result<Vec<u8>> {
        let params = jwk.try_ec_params()?;
        let d = params.d.as_deref().ok_or_else(|| Error::InvalidKey("ECDSA signing requires a private key".into()))?;
        let bytes = jwu::decode_b64(d)?;
        let signing_key = ecdsa::SigningKey::<Curve>::from_slice(&bytes)
          .map_err(|e| Error::InvalidKey(format!("invalid EC private scalar: {e}")))?;
        let sig: ecdsa::Signature<Curve> = signing_key.sign(msg);
        Ok(sig.to_bytes().to_vec())
      }

      pub fn verify(msg: &[u8], sig: &[u8], jwk: &Jwk) -> Result<bool> {
        let params = jwk.try_ec_params()?;
        let x = jwu::decode_b64(&params.x)?;
        let y = jwu::decode_b64(&params.y)?;
        let mut point = vec![0x04u8];
        point.extend_from_slice(&x);
        point.extend_from_slice(&y);

        let verifying_key = match ecdsa::VerifyingKey::<Curve>::from_sec1_bytes(&point) {
          Ok(key) => key,
          Err(_) => return Ok(false),
        };
        let signature = match ecdsa::Signature::<Curve>::from_slice(sig) {
          Ok(sig) => sig,
          Err(_) => return Ok(false),
        };
        Ok(verifying_key.verify(msg, &signature).is_ok())
      }
    }
  };
}

ecdsa_impl!(p256_impl, p256::NistP256);
ecdsa_impl!(p384_impl, p384::NistP384);
ecdsa_impl!(p521_impl, p521::NistP521);
#[cfg(feature = "es256k")]
ecdsa_impl!(k256_impl, k256::Secp256k1);

pub fn sign(alg: JwsAlgorithm, msg: &[u8], jwk: &Jwk) -> Result<Vec<u8>> {
  expect_curve(alg, jwk.try_ec_curve()?)?;
  match alg {
    JwsAlgorithm::ES256 => p256_impl::sign(msg, jwk),
    JwsAlgorithm::ES384 => p384_impl::sign(msg, jwk),
    JwsAlgorithm::ES512 => p521_impl::sign(msg, jwk),
    #[cfg(feature = "es256k")]
    JwsAlgorithm::ES256K => k256_impl::sign(msg, jwk),
    other => Err(Error::InvalidOperation(format!("{other} is not an ECDSA algorithm"))),
  }
}

pub fn verify(alg: JwsAlgorithm, msg: &[u8], sig: &[u8], jwk: &Jwk) -> Result<bool> {
  expect_curve(alg, jwk.try_ec_curve()?)?;
  match alg {
    JwsAlgorithm::ES256 => p256_impl::verify(msg, sig, jwk),
    JwsAlgorithm::ES384 => p384_impl::verify(msg, sig, jwk),
    JwsAlgorithm::ES512 => p521_impl::verify(msg, sig, jwk),
    #[cfg(feature = "es256k")]
    JwsAlgorithm::ES256K => k256_impl::verify(msg, sig, jwk),
    other => Err(Error::InvalidOperation(format!("{other} is not an ECDSA algorithm"))),
  }
}
