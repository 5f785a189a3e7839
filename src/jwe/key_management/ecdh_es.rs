// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! ECDH-ES and ECDH-ES+AxxxKW (RFC 7518 §4.6): agreement over the static
//! recipient key and an ephemeral sender key (`epk`), fed through
//! [`crate::jwe::concat_kdf`]. Every EC `epk` is checked against
//! [`crate::jwk::curve::EcCurve::is_on_curve`] before use, closing off the
//! classic invalid-curve attack against ECDH key agreement.

use rand::rngs::OsRng;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::curve::EcCurve;
use crate::jwk::curve::EcxCurve;
use crate::jwk::Jwk;
use crate::jwk::JwkParamsEc;
use crate::jwk::JwkParamsOkp;
use crate::jwu;

use crate::jwe::concat_kdf;

use super::aes_kw;

/// The ephemeral public key this crate generated on encrypt, and the
/// agreement output `z` with the recipient's static key.
pub struct Agreement {
  pub epk: Jwk,
  pub z: Vec<u8>,
}

fn validated_point(params: &JwkParamsEc) -> Result<(Vec<u8>, Vec<u8>)> {
  let x: Vec<u8> = jwu::decode_b64(&params.x)?;
  let y: Vec<u8> = jwu::decode_b64(&params.y)?;
  if !EcCurve::from_name(&params.crv)?.is_on_curve(&x, &y) {
    return Err(Error::InvalidKey("EC point is not on the named curve".into()));
  }
  Ok((x, y))
}

/// One instantiation per NIST/SEC curve (P-256/P-384/P-521, and
/// secp256k1 behind the `es256k` feature, mirroring [`crate::jws::ecdsa`]),
/// since each RustCrypto curve crate exposes the same
/// `SecretKey`/`PublicKey`/`EncodedPoint`/`ecdh` surface under its own
/// crate root rather than a shared generic.
macro_rules! ecdh_curve_impl {
  ($module:ident, $crate_path:ident) => {
    mod $module {
      use super::*;

      pub fn agree(static_params: &JwkParamsEc) -> Result<Agreement> {
        let (x, y) = validated_point(static_params)?;
        let mut sec1: Vec<u8> = Vec::with_capacity(1 + x.len() + y.len());
        sec1.push(0x04);
        sec1.extend_from_slice(&x);
        sec1.extend_from_slice(&y);

        let encoded = $crate_path::EncodedPoint::from_bytes(&sec1).map_err(|_| Error::InvalidKey("malformed EC point".into()))?;
        let peer_public: $crate_path::PublicKey =
          Option::from($crate_path::PublicKey::from_encoded_point(&encoded)).ok_or_else(|| Error::InvalidKey("EC point is not a valid public key".into()))?;

        let ephemeral_secret = $crate_path::SecretKey::random(&mut OsRng);
        let ephemeral_public = ephemeral_secret.public_key();

        let shared = $crate_path::ecdh::diffie_hellman(ephemeral_secret.to_nonzero_scalar(), peer_public.as_affine());
        let z: Vec<u8> = shared.raw_secret_bytes().to_vec();

        let ephemeral_point = ephemeral_public.to_encoded_point(false);
        let epk = Jwk::from_params(JwkParamsEc {
          crv: static_params.crv.clone(),
          x: jwu::encode_b64(ephemeral_point.x().expect("uncompressed point has an x coordinate")),
          y: jwu::encode_b64(ephemeral_point.y().expect("uncompressed point has a y coordinate")),
          d: None,
        });

        Ok(Agreement { epk, z })
      }

      pub fn agree_with_epk(static_secret: &JwkParamsEc, epk_params: &JwkParamsEc) -> Result<Vec<u8>> {
        let d: Vec<u8> = jwu::decode_b64(
          static_secret
            .d
            .as_deref()
            .ok_or_else(|| Error::InvalidKey("ECDH-ES agreement requires a private static key".into()))?,
        )?;
        let static_secret_key =
          $crate_path::SecretKey::from_slice(&d).map_err(|_| Error::InvalidKey("malformed EC private scalar".into()))?;

        let (x, y) = validated_point(epk_params).map_err(|_| Error::DecryptionError)?;
        let mut sec1: Vec<u8> = Vec::with_capacity(1 + x.len() + y.len());
        sec1.push(0x04);
        sec1.extend_from_slice(&x);
        sec1.extend_from_slice(&y);
        let encoded = $crate_path::EncodedPoint::from_bytes(&sec1).map_err(|_| Error::DecryptionError)?;
        let epk_public: $crate_path::PublicKey = Option::from($crate_path::PublicKey::from_encoded_point(&encoded)).ok_or(Error::DecryptionError)?;

        let shared = $crate_path::ecdh::diffie_hellman(static_secret_key.to_nonzero_scalar(), epk_public.as_affine());
        Ok(shared.raw_secret_bytes().to_vec())
      }
    }
  };
}

ecdh_curve_impl!(p256_impl, p256);
ecdh_curve_impl!(p384_impl, p384);
ecdh_curve_impl!(p521_impl, p521);
#[cfg(feature = "es256k")]
ecdh_curve_impl!(k256_impl, k256);

/// Generates an ephemeral keypair on the same curve as `static_params` and
/// agrees with it, for the encrypt side.
pub fn agree_ephemeral(static_params: &JwkParamsEc) -> Result<Agreement> {
  match EcCurve::from_name(&static_params.crv)? {
    EcCurve::P256 => p256_impl::agree(static_params),
    EcCurve::P384 => p384_impl::agree(static_params),
    EcCurve::P521 => p521_impl::agree(static_params),
    #[cfg(feature = "es256k")]
    EcCurve::Secp256K1 => k256_impl::agree(static_params),
    #[cfg(not(feature = "es256k"))]
    other => Err(Error::UnsupportedError(format!("ECDH-ES over {} is not supported", other.name()))),
  }
}

/// Agrees using the recipient's static private key and the `epk` carried
/// in the token header, for the decrypt side.
pub fn agree_static(static_params: &JwkParamsEc, epk_params: &JwkParamsEc) -> Result<Vec<u8>> {
  if static_params.crv != epk_params.crv {
    return Err(Error::DecryptionError);
  }
  match EcCurve::from_name(&static_params.crv)? {
    EcCurve::P256 => p256_impl::agree_with_epk(static_params, epk_params),
    EcCurve::P384 => p384_impl::agree_with_epk(static_params, epk_params),
    EcCurve::P521 => p521_impl::agree_with_epk(static_params, epk_params),
    #[cfg(feature = "es256k")]
    EcCurve::Secp256K1 => k256_impl::agree_with_epk(static_params, epk_params),
    #[cfg(not(feature = "es256k"))]
    _ => Err(Error::DecryptionError),
  }
}

/// X25519 agreement for OKP keys (RFC 8037 covers the `OKP` JWK shape;
/// RFC 7518 §4.6 does not name X25519 explicitly, but the same ECDH-ES
/// construction is what every major JOSE implementation uses for it).
pub fn agree_ephemeral_x25519(static_params: &JwkParamsOkp) -> Result<Agreement> {
  EcxCurve::from_name(&static_params.crv)?;
  let peer_bytes: Vec<u8> = jwu::decode_b64(&static_params.x)?;
  let peer_arr: [u8; 32] = peer_bytes.try_into().map_err(|_| Error::InvalidKey("X25519 public key must be 32 bytes".into()))?;
  let peer_public = x25519_dalek::PublicKey::from(peer_arr);

  let ephemeral_secret = x25519_dalek::EphemeralSecret::random_from_rng(OsRng);
  let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral_secret);
  let z: Vec<u8> = ephemeral_secret.diffie_hellman(&peer_public).to_bytes().to_vec();

  let epk = Jwk::from_params(JwkParamsOkp {
    crv: static_params.crv.clone(),
    x: jwu::encode_b64(ephemeral_public.as_bytes()),
    d: None,
  });

  Ok(Agreement { epk, z })
}

pub fn agree_static_x25519(static_params: &JwkParamsOkp, epk_params: &JwkParamsOkp) -> Result<Vec<u8>> {
  let d: Vec<u8> = jwu::decode_b64(
    static_params
      .d
      .as_deref()
      .ok_or_else(|| Error::InvalidKey("ECDH-ES agreement requires a private static key".into()))?,
  )?;
  let d_arr: [u8; 32] = d.try_into().map_err(|_| Error::InvalidKey("X25519 private key must be 32 bytes".into()))?;
  let static_secret = x25519_dalek::StaticSecret::from(d_arr);

  let peer_bytes: Vec<u8> = jwu::decode_b64(&epk_params.x)?;
  let peer_arr: [u8; 32] = peer_bytes.try_into().map_err(|_| Error::DecryptionError)?;
  let peer_public = x25519_dalek::PublicKey::from(peer_arr);

  Ok(static_secret.diffie_hellman(&peer_public).to_bytes().to_vec())
}

/// Derives key material from the agreement output, wrapping `cek` with it
/// when present (the `ECDH-ES+AxxxKW` family) or returning it directly as
/// the cek (plain `ECDH-ES`).
pub fn derive_and_wrap(z: &[u8], header_alg: &str, apu: &[u8], apv: &[u8], keylen_bits: u32, cek: Option<&[u8]>) -> Result<Vec<u8>> {
  let derived: Vec<u8> = concat_kdf::derive(z, header_alg, apu, apv, keylen_bits);
  match cek {
    None => Ok(derived),
    Some(cek) => aes_kw::wrap(&derived, cek),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn p256_agreement_round_trip() {
    let static_secret_key = p256::SecretKey::random(&mut OsRng);
    let static_point = static_secret_key.public_key().to_encoded_point(false);
    let static_private_params = JwkParamsEc {
      crv: "P-256".to_string(),
      x: jwu::encode_b64(static_point.x().unwrap()),
      y: jwu::encode_b64(static_point.y().unwrap()),
      d: Some(jwu::encode_b64(static_secret_key.to_bytes())),
    };
    let static_public_params = JwkParamsEc {
      d: None,
      ..static_private_params.clone()
    };

    let agreement = agree_ephemeral(&static_public_params).unwrap();
    let epk_params = agreement.epk.try_ec_params().unwrap().clone();
    let z2 = agree_static(&static_private_params, &epk_params).unwrap();

    assert_eq!(agreement.z, z2);
  }

  #[test]
  fn x25519_agreement_round_trip() {
    let static_secret = x25519_dalek::StaticSecret::random_from_rng(OsRng);
    let static_public = x25519_dalek::PublicKey::from(&static_secret);
    let static_private_params = JwkParamsOkp {
      crv: "X25519".to_string(),
      x: jwu::encode_b64(static_public.as_bytes()),
      d: Some(jwu::encode_b64(static_secret.to_bytes())),
    };
    let static_public_params = JwkParamsOkp {
      d: None,
      ..static_private_params.clone()
    };

    let agreement = agree_ephemeral_x25519(&static_public_params).unwrap();
    let epk_params = agreement.epk.try_okp_params().unwrap().clone();
    let z2 = agree_static_x25519(&static_private_params, &epk_params).unwrap();

    assert_eq!(agreement.z, z2);
  }
}
