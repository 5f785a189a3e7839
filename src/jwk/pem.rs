// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! PEM import: SubjectPublicKeyInfo, PKCS#8 unencrypted private keys,
//! RFC 5915 EC private keys, and PKCS#1 RSA private keys.

use crate::der;
use crate::der::Reader;
use crate::der::Tag;
use crate::error::Error;
use crate::error::Result;
use crate::jwk::curve::EcCurve;
use crate::jwk::params::JwkParamsEc;
use crate::jwk::params::JwkParamsRsa;
use crate::jwk::Jwk;
use crate::jwu;

/// Parses a PEM-armored key of any of the supported kinds and returns the
/// corresponding JWK.
pub fn import(pem: &str) -> Result<Jwk> {
  let (label, der_bytes) = strip_armor(pem)?;

  match label.as_str() {
    "PUBLIC KEY" => import_spki(&der_bytes),
    "PRIVATE KEY" => import_pkcs8(&der_bytes),
    "EC PRIVATE KEY" => import_ec_private(&der_bytes, None),
    "RSA PRIVATE KEY" => import_pkcs1_rsa(&der_bytes),
    other => Err(Error::InvalidKey(format!("unsupported PEM label: {other}"))),
  }
}

fn strip_armor(pem: &str) -> Result<(String, Vec<u8>)> {
  let pem: &str = pem.trim();
  let begin_idx: usize = pem.find("-----BEGIN ").ok_or_else(|| Error::InvalidKey("missing PEM header".into()))?;
  let header_end: usize = pem[begin_idx..]
    .find("-----\n")
    .or_else(|| pem[begin_idx..].find("-----\r\n"))
    .ok_or_else(|| Error::InvalidKey("malformed PEM header".into()))?;
  let label: String = pem[begin_idx + "-----BEGIN ".len()..begin_idx + header_end].to_string();

  let footer: String = format!("-----END {label}-----");
  let body_start: usize = begin_idx + header_end + "-----\n".len();
  let footer_idx: usize = pem.find(&footer).ok_or_else(|| Error::InvalidKey("missing PEM footer".into()))?;

  let body: String = pem[body_start..footer_idx].chars().filter(|c| !c.is_whitespace()).collect();
  let der: Vec<u8> = base64::decode_config(body, base64::STANDARD).map_err(Error::from)?;

  Ok((label, der))
}

fn import_spki(der_bytes: &[u8]) -> Result<Jwk> {
  let root: Reader = Reader::parse(der_bytes)?;
  let alg_id: &Reader = root.child_at(0)?;
  let oid: String = read_oid(alg_id.child_at(0)?)?;
  let bit_string: &Reader = root.child_at(1)?;
  // BIT STRING contents: one leading "unused bits" byte, then the payload.
  let payload: &[u8] = bit_string.contents().get(1..).ok_or_else(|| Error::InvalidKey("empty BIT STRING".into()))?;

  if oid == der::OID_RSA_ENCRYPTION {
    let key: Reader = Reader::parse(payload)?;
    let n: &[u8] = key.child_at(0)?.value_as_uint_octets()?;
    let e: &[u8] = key.child_at(1)?.value_as_uint_octets()?;
    return Ok(Jwk::from_params(JwkParamsRsa {
      n: jwu::encode_b64(n),
      e: jwu::encode_b64(e),
      d: None,
      p: None,
      q: None,
      dp: None,
      dq: None,
      qi: None,
    }));
  }

  if oid == der::OID_EC_PUBLIC_KEY {
    let curve_oid: String = read_oid(alg_id.child_at(1)?)?;
    let curve: EcCurve = EcCurve::from_oid(&curve_oid)?;
    return ec_public_from_point(curve, payload);
  }

  Err(Error::InvalidKey(format!("unsupported SubjectPublicKeyInfo algorithm OID: {oid}")))
}

fn ec_public_from_point(curve: EcCurve, point: &[u8]) -> Result<Jwk> {
  let len: usize = curve.coordinate_len();
  if point.first() != Some(&0x04) || point.len() != 1 + 2 * len {
    return Err(Error::InvalidKey("EC point must be uncompressed (0x04 || x || y)".into()));
  }
  let (x, y) = point[1..].split_at(len);

  Ok(Jwk::from_params(JwkParamsEc {
    crv: curve.name().to_string(),
    x: jwu::encode_b64(x),
    y: jwu::encode_b64(y),
    d: None,
  }))
}

fn import_pkcs8(der_bytes: &[u8]) -> Result<Jwk> {
  let root: Reader = Reader::parse(der_bytes)?;
  let alg_id: &Reader = root.child_at(1)?;
  let oid: String = read_oid(alg_id.child_at(0)?)?;
  let private_key_octets: &Reader = root.child_at(2)?;
  let inner: &[u8] = private_key_octets.contents();

  if oid == der::OID_RSA_ENCRYPTION {
    return import_pkcs1_rsa(inner);
  }

  if oid == der::OID_EC_PUBLIC_KEY {
    let curve_oid: String = read_oid(alg_id.child_at(1)?)?;
    let curve: EcCurve = EcCurve::from_oid(&curve_oid)?;
    return import_ec_private(inner, Some(curve));
  }

  Err(Error::InvalidKey(format!("unsupported PKCS#8 algorithm OID: {oid}")))
}

/// RFC 5915 ECPrivateKey. `outer_curve` carries the curve named by the
/// enclosing PKCS#8 AlgorithmIdentifier, used when the `[0] parameters`
/// field (which is OPTIONAL here) is absent.
fn import_ec_private(der_bytes: &[u8], outer_curve: Option<EcCurve>) -> Result<Jwk> {
  let root: Reader = Reader::parse(der_bytes)?;
  let d: &[u8] = root.child_at(1)?.contents();

  let curve: EcCurve = match root.child_with_tag(Tag::ContextSpecific(0)) {
    Ok(params) => EcCurve::from_oid(&read_oid(params.child_at(0)?)?)?,
    Err(_) => outer_curve.ok_or_else(|| Error::InvalidKey("EC private key is missing curve parameters".into()))?,
  };

  let len: usize = curve.coordinate_len();
  if d.len() != len {
    return Err(Error::InvalidKey("EC private scalar has the wrong length for its curve".into()));
  }

  let (x, y) = match root.child_with_tag(Tag::ContextSpecific(1)) {
    Ok(public) => {
      // [1] EXPLICIT BIT STRING — one child, the BIT STRING itself.
      let bit_string: &Reader = public.child_at(0)?;
      let point: &[u8] = bit_string.contents().get(1..).ok_or_else(|| Error::InvalidKey("empty EC public point".into()))?;
      if point.first() != Some(&0x04) || point.len() != 1 + 2 * len {
        return Err(Error::InvalidKey("EC point must be uncompressed".into()));
      }
      let (x, y) = point[1..].split_at(len);
      (x.to_vec(), y.to_vec())
    }
    Err(_) => return Err(Error::InvalidKey("EC private key without public point is not supported".into())),
  };

  Ok(Jwk::from_params(JwkParamsEc {
    crv: curve.name().to_string(),
    x: jwu::encode_b64(x),
    y: jwu::encode_b64(y),
    d: Some(jwu::encode_b64(d)),
  }))
}

fn import_pkcs1_rsa(der_bytes: &[u8]) -> Result<Jwk> {
  let root: Reader = Reader::parse(der_bytes)?;

  let uint_at = |index: usize| -> Result<Vec<u8>> { Ok(root.child_at(index)?.value_as_uint_octets()?.to_vec()) };

  Ok(Jwk::from_params(JwkParamsRsa {
    n: jwu::encode_b64(uint_at(1)?),
    e: jwu::encode_b64(uint_at(2)?),
    d: Some(jwu::encode_b64(uint_at(3)?)),
    p: Some(jwu::encode_b64(uint_at(4)?)),
    q: Some(jwu::encode_b64(uint_at(5)?)),
    dp: Some(jwu::encode_b64(uint_at(6)?)),
    dq: Some(jwu::encode_b64(uint_at(7)?)),
    qi: Some(jwu::encode_b64(uint_at(8)?)),
  }))
}

fn read_oid(node: &Reader) -> Result<String> {
  if node.tag() != Tag::ObjectIdentifier {
    return Err(Error::InvalidKey("expected OBJECT IDENTIFIER".into()));
  }
  Ok(decode_oid(node.contents()))
}

/// Decodes a DER OID's contents into dotted form, the inverse of
/// [`der::oid`].
fn decode_oid(bytes: &[u8]) -> String {
  let mut parts: Vec<u64> = Vec::new();
  if let Some((&first, rest)) = bytes.split_first() {
    parts.push((first / 40) as u64);
    parts.push((first % 40) as u64);

    let mut value: u64 = 0;
    for &byte in rest {
      value = (value << 7) | (byte & 0x7F) as u64;
      if byte & 0x80 == 0 {
        parts.push(value);
        value = 0;
      }
    }
  }
  parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn oid_roundtrips() {
    let encoded: Vec<u8> = der::oid(der::OID_RSA_ENCRYPTION);
    assert_eq!(decode_oid(&encoded), der::OID_RSA_ENCRYPTION);
  }
}
