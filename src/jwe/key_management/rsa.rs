// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! RSA1_5, RSA-OAEP, RSA-OAEP-256 (RFC 7518 §4.2-§4.3): RSAES-PKCS1-v1_5
//! and RSAES-OAEP over the same raw modexp primitive as [`crate::jws::rsa`].
//! EME-OAEP encode/decode (RFC 8017 §7.1) is hand-assembled here; no
//! underlying padding failure is ever distinguished from a ciphertext
//! failure, to avoid a Bleichenbacher/Manger-style oracle.

use sha1::Sha1;
use sha2::Digest;
use sha2::Sha256;

use crate::bigint::UInt;
use crate::error::Error;
use crate::error::Result;
use crate::jwk::Jwk;
use crate::jwk::JwkParamsRsa;
use crate::jwu;

fn modulus_len(params: &JwkParamsRsa) -> Result<usize> {
  Ok(jwu::decode_b64(&params.n)?.len())
}

fn rsaep(params: &JwkParamsRsa, m: &[u8]) -> Result<Vec<u8>> {
  let n: UInt = UInt::from_be_bytes(&jwu::decode_b64(&params.n)?);
  let e: UInt = UInt::from_be_bytes(&jwu::decode_b64(&params.e)?);
  let k: usize = modulus_len(params)?;

  let m: UInt = UInt::from_be_bytes(m);
  if m.cmp(&n) != std::cmp::Ordering::Less {
    return Err(Error::InvalidKey("message representative out of range".into()));
  }
  let c: UInt = m.powmod(&e, &n);
  Ok(left_pad(c.to_be_bytes(), k))
}

fn rsadp(params: &JwkParamsRsa, c: &[u8]) -> Result<Vec<u8>> {
  if !params.has_full_crt() {
    return Err(Error::InvalidKey("RSA private key is missing CRT components".into()));
  }
  let n: UInt = UInt::from_be_bytes(&jwu::decode_b64(&params.n)?);
  let d: UInt = UInt::from_be_bytes(&jwu::decode_b64(params.d.as_deref().unwrap())?);
  let k: usize = modulus_len(params)?;

  let c: UInt = UInt::from_be_bytes(c);
  if c.cmp(&n) != std::cmp::Ordering::Less {
    return Err(Error::DecryptionError);
  }
  let m: UInt = c.powmod(&d, &n);
  Ok(left_pad(m.to_be_bytes(), k))
}

fn left_pad(mut bytes: Vec<u8>, len: usize) -> Vec<u8> {
  if bytes.len() < len {
    let mut padded: Vec<u8> = vec![0u8; len - bytes.len()];
    padded.append(&mut bytes);
    padded
  } else {
    bytes
  }
}

fn mgf1<D: Digest>(seed: &[u8], mask_len: usize) -> Vec<u8> {
  let h_len: usize = D::output_size();
  let mut out: Vec<u8> = Vec::with_capacity(mask_len + h_len);
  let mut counter: u32 = 0;
  while out.len() < mask_len {
    let mut hasher = D::new();
    hasher.update(seed);
    hasher.update(counter.to_be_bytes());
    out.extend_from_slice(&hasher.finalize());
    counter += 1;
  }
  out.truncate(mask_len);
  out
}

fn eme_oaep_encode<D: Digest>(msg: &[u8], k: usize) -> Result<Vec<u8>> {
  let h_len: usize = D::output_size();
  if msg.len() > k.saturating_sub(2 * h_len + 2) {
    return Err(Error::InvalidKey("plaintext too long for this RSA modulus".into()));
  }

  let l_hash: Vec<u8> = D::digest([]).to_vec();
  let ps_len: usize = k - msg.len() - 2 * h_len - 2;
  let mut db: Vec<u8> = Vec::with_capacity(k - h_len - 1);
  db.extend_from_slice(&l_hash);
  db.extend(std::iter::repeat(0u8).take(ps_len));
  db.push(0x01);
  db.extend_from_slice(msg);

  let seed: Vec<u8> = jwu::secure_random(h_len);
  let db_mask: Vec<u8> = mgf1::<D>(&seed, k - h_len - 1);
  let masked_db: Vec<u8> = xor(&db, &db_mask);
  let seed_mask: Vec<u8> = mgf1::<D>(&masked_db, h_len);
  let masked_seed: Vec<u8> = xor(&seed, &seed_mask);

  let mut em: Vec<u8> = Vec::with_capacity(k);
  em.push(0x00);
  em.extend_from_slice(&masked_seed);
  em.extend_from_slice(&masked_db);
  Ok(em)
}

fn eme_oaep_decode<D: Digest>(em: &[u8], k: usize) -> Result<Vec<u8>> {
  let h_len: usize = D::output_size();
  if em.len() != k || k < 2 * h_len + 2 {
    return Err(Error::DecryptionError);
  }

  let y: u8 = em[0];
  let masked_seed: &[u8] = &em[1..1 + h_len];
  let masked_db: &[u8] = &em[1 + h_len..];

  let seed_mask: Vec<u8> = mgf1::<D>(masked_db, h_len);
  let seed: Vec<u8> = xor(masked_seed, &seed_mask);
  let db_mask: Vec<u8> = mgf1::<D>(&seed, k - h_len - 1);
  let db: Vec<u8> = xor(masked_db, &db_mask);

  let l_hash: Vec<u8> = D::digest([]).to_vec();
  let (db_l_hash, rest) = db.split_at(h_len);

  let mut separator_index: Option<usize> = None;
  for (i, byte) in rest.iter().enumerate() {
    match byte {
      0x00 => continue,
      0x01 => {
        separator_index = Some(i);
        break;
      }
      _ => break,
    }
  }

  let well_formed: bool = y == 0x00 && jwu::secure_compare(db_l_hash, &l_hash) && separator_index.is_some();
  if !well_formed {
    return Err(Error::DecryptionError);
  }

  Ok(rest[separator_index.unwrap() + 1..].to_vec())
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
  a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

pub fn wrap_oaep<D: Digest>(jwk: &Jwk, cek: &[u8]) -> Result<Vec<u8>> {
  let params: &JwkParamsRsa = jwk.try_rsa_params()?;
  let k: usize = modulus_len(params)?;
  let em: Vec<u8> = eme_oaep_encode::<D>(cek, k)?;
  rsaep(params, &em)
}

pub fn unwrap_oaep<D: Digest>(jwk: &Jwk, wrapped: &[u8]) -> Result<Vec<u8>> {
  let params: &JwkParamsRsa = jwk.try_rsa_params()?;
  let k: usize = modulus_len(params)?;
  if wrapped.len() != k {
    return Err(Error::DecryptionError);
  }
  let em: Vec<u8> = rsadp(params, wrapped)?;
  eme_oaep_decode::<D>(&em, k)
}

pub fn wrap_oaep_sha1(jwk: &Jwk, cek: &[u8]) -> Result<Vec<u8>> {
  wrap_oaep::<Sha1>(jwk, cek)
}

pub fn unwrap_oaep_sha1(jwk: &Jwk, wrapped: &[u8]) -> Result<Vec<u8>> {
  unwrap_oaep::<Sha1>(jwk, wrapped)
}

pub fn wrap_oaep_sha256(jwk: &Jwk, cek: &[u8]) -> Result<Vec<u8>> {
  wrap_oaep::<Sha256>(jwk, cek)
}

pub fn unwrap_oaep_sha256(jwk: &Jwk, wrapped: &[u8]) -> Result<Vec<u8>> {
  unwrap_oaep::<Sha256>(jwk, wrapped)
}

/// RSAES-PKCS1-v1_5 (RFC 8017 §7.2), kept for RSA1_5 interop only — RFC
/// 7518 itself steers new usage toward the OAEP family (§4.3).
pub fn wrap_pkcs1v15(jwk: &Jwk, cek: &[u8]) -> Result<Vec<u8>> {
  let params: &JwkParamsRsa = jwk.try_rsa_params()?;
  let k: usize = modulus_len(params)?;
  if cek.len() > k - 11 {
    return Err(Error::InvalidKey("plaintext too long for this RSA modulus".into()));
  }

  let ps_len: usize = k - cek.len() - 3;
  let mut ps: Vec<u8> = Vec::with_capacity(ps_len);
  while ps.len() < ps_len {
    let byte: u8 = jwu::secure_random(1)[0];
    if byte != 0 {
      ps.push(byte);
    }
  }

  let mut em: Vec<u8> = Vec::with_capacity(k);
  em.push(0x00);
  em.push(0x02);
  em.extend_from_slice(&ps);
  em.push(0x00);
  em.extend_from_slice(cek);

  rsaep(params, &em)
}

pub fn unwrap_pkcs1v15(jwk: &Jwk, wrapped: &[u8]) -> Result<Vec<u8>> {
  let params: &JwkParamsRsa = jwk.try_rsa_params()?;
  let k: usize = modulus_len(params)?;
  if wrapped.len() != k {
    return Err(Error::DecryptionError);
  }
  let em: Vec<u8> = rsadp(params, wrapped)?;

  if em.len() != k || em[0] != 0x00 || em[1] != 0x02 {
    return Err(Error::DecryptionError);
  }
  let rest: &[u8] = &em[2..];
  match rest.iter().position(|&b| b == 0x00) {
    Some(idx) if idx >= 8 => Ok(rest[idx + 1..].to_vec()),
    _ => Err(Error::DecryptionError),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jwk::JwkParamsRsa;

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
  fn oaep_sha1_wrap_has_modulus_length() {
    let jwk = test_key();
    let wrapped = wrap_oaep_sha1(&jwk, b"0123456789abcdef").unwrap();
    assert_eq!(wrapped.len(), 64);
  }

  #[test]
  fn pkcs1v15_unwrap_rejects_bad_length() {
    let jwk = test_key();
    assert!(unwrap_pkcs1v15(&jwk, &[0u8; 3]).is_err());
  }
}
