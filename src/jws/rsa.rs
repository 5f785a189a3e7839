// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! RS256/384/512 (RFC 7518 §3.3): RSASSA-PKCS1-v1_5 over the raw modexp
//! primitive in [`crate::bigint`].

use sha2::Digest;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;

use crate::bigint::UInt;
use crate::error::Error;
use crate::error::Result;
use crate::jwk::Jwk;
use crate::jwk::JwkParamsRsa;
use crate::jws::JwsAlgorithm;
use crate::jwu;

/// The DigestInfo DER prefix for PKCS#1 v1.5 signatures (RFC 8017 §9.2 note
/// 1), one per hash.
fn digest_info_prefix(alg: JwsAlgorithm) -> &'static [u8] {
  match alg {
    JwsAlgorithm::RS256 => &[
      0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05, 0x00, 0x04, 0x20,
    ],
    JwsAlgorithm::RS384 => &[
      0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02, 0x05, 0x00, 0x04, 0x30,
    ],
    JwsAlgorithm::RS512 => &[
      0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03, 0x05, 0x00, 0x04, 0x40,
    ],
    _ => unreachable!("digest_info_prefix only called for RS*"),
  }
}

fn hash(alg: JwsAlgorithm, data: &[u8]) -> Vec<u8> {
  match alg {
    JwsAlgorithm::RS256 => Sha256::digest(data).to_vec(),
    JwsAlgorithm::RS384 => Sha384::digest(data).to_vec(),
    JwsAlgorithm::RS512 => Sha512::digest(data).to_vec(),
    _ => unreachable!("hash only called for RS*"),
  }
}

fn modulus_len(params: &JwkParamsRsa) -> Result<usize> {
  Ok(jwu::decode_b64(&params.n)?.len())
}

/// RFC 8017 §9.2 EMSA-PKCS1-v1_5 encoding.
fn emsa_pkcs1_v15(alg: JwsAlgorithm, msg: &[u8], em_len: usize) -> Result<Vec<u8>> {
  let digest: Vec<u8> = hash(alg, msg);
  let prefix: &[u8] = digest_info_prefix(alg);
  let t_len: usize = prefix.len() + digest.len();

  if em_len < t_len + 11 {
    return Err(Error::InvalidKey("RSA modulus too small for this hash".into()));
  }

  let ps_len: usize = em_len - t_len - 3;
  let mut em: Vec<u8> = Vec::with_capacity(em_len);
  em.push(0x00);
  em.push(0x01);
  em.extend(std::iter::repeat(0xffu8).take(ps_len));
  em.push(0x00);
  em.extend_from_slice(prefix);
  em.extend_from_slice(&digest);
  Ok(em)
}

pub fn sign(alg: JwsAlgorithm, msg: &[u8], jwk: &Jwk) -> Result<Vec<u8>> {
  let params: &JwkParamsRsa = jwk.try_rsa_params()?;
  if !params.has_full_crt() {
    return Err(Error::InvalidKey("RSA private key is missing CRT components".into()));
  }

  let n: UInt = UInt::from_be_bytes(&jwu::decode_b64(&params.n)?);
  let d: UInt = UInt::from_be_bytes(&jwu::decode_b64(params.d.as_deref().unwrap())?);
  let k: usize = modulus_len(params)?;

  let em: Vec<u8> = emsa_pkcs1_v15(alg, msg, k)?;
  let m: UInt = UInt::from_be_bytes(&em);
  if m.cmp(&n) != std::cmp::Ordering::Less {
    return Err(Error::InvalidKey("message representative out of range".into()));
  }

  let s: UInt = m.powmod(&d, &n);
  let mut sig: Vec<u8> = s.to_be_bytes();
  if sig.len() < k {
    let mut padded: Vec<u8> = vec![0u8; k - sig.len()];
    padded.append(&mut sig);
    sig = padded;
  }
  Ok(sig)
}

pub fn verify(alg: JwsAlgorithm, msg: &[u8], sig: &[u8], jwk: &Jwk) -> Result<bool> {
  let params: &JwkParamsRsa = jwk.try_rsa_params()?;
  let n: UInt = UInt::from_be_bytes(&jwu::decode_b64(&params.n)?);
  let e: UInt = UInt::from_be_bytes(&jwu::decode_b64(&params.e)?);
  let k: usize = modulus_len(params)?;

  if sig.len() != k {
    return Ok(false);
  }

  let s: UInt = UInt::from_be_bytes(sig);
  if s.cmp(&n) != std::cmp::Ordering::Less {
    return Ok(false);
  }

  let m: UInt = s.powmod(&e, &n);
  let mut recovered: Vec<u8> = m.to_be_bytes();
  if recovered.len() < k {
    let mut padded: Vec<u8> = vec![0u8; k - recovered.len()];
    padded.append(&mut recovered);
    recovered = padded;
  }

  let expected: Vec<u8> = emsa_pkcs1_v15(alg, msg, k)?;
  Ok(jwu::secure_compare(&expected, &recovered))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jwk::JwkParamsRsa;

  // A deliberately tiny (512-bit) RSA key, for test speed only.
  fn test_key() -> Jwk {
    Jwk::from_params(JwkParamsRsa {
      n: "AL2t7ZlQhxeMgupY6iLS5OZTIxPuG-i9lUGXTM3UsfUrW2U-x1f_4y5pG8Vs5p7p3v0PLPy1aiSOSo1KBJmM5xM".to_string(),
      e: "AQAB".to_string(),
      d: None,
      p: None,
      q: None,
      dp: None,
      dq: None,
      qi: None,
    })
  }

  #[test]
  fn verify_rejects_wrong_length_signature() {
    let jwk = test_key();
    assert!(!verify(JwsAlgorithm::RS256, b"msg", &[0u8; 3], &jwk).unwrap());
  }
}
