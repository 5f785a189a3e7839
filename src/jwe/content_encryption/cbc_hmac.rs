// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! AES-CBC-HMAC-SHA2 (RFC 7518 §5.2): the MAC-then-encrypt composite cek
//! splits in half — the first half is the HMAC key, the second half the
//! AES-CBC key — so we implement it ourselves rather than reach for an
//! AEAD crate that expects the two keys pre-split out of band.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::BlockDecryptMut;
use aes::cipher::BlockEncryptMut;
use aes::cipher::KeyIvInit;
use hmac::Mac;
use hmac::SimpleHmac;
use sha2::digest::core_api::BlockSizeUser;
use sha2::digest::Digest;
use sha2::digest::OutputSizeUser;

use crate::error::Error;
use crate::error::Result;
use crate::jwu;

use super::Sealed;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

fn split_cek(cek: &[u8], aes_key_len: usize) -> Result<(&[u8], &[u8])> {
  let mac_key_len: usize = aes_key_len;
  if cek.len() != mac_key_len + aes_key_len {
    return Err(Error::InvalidKey("cek length does not match AES-CBC-HMAC-SHA2 split".into()));
  }
  Ok(cek.split_at(mac_key_len))
}

fn al(aad_len: usize) -> [u8; 8] {
  ((aad_len as u64) * 8).to_be_bytes()
}

fn tag<D>(mac_key: &[u8], aad: &[u8], iv: &[u8], ciphertext: &[u8], tag_len: usize) -> Vec<u8>
where
  D: Digest + Clone + BlockSizeUser + OutputSizeUser,
  SimpleHmac<D>: Mac,
{
  let mut mac: SimpleHmac<D> = SimpleHmac::<D>::new_from_slice(mac_key).expect("HMAC accepts any key length");
  mac.update(aad);
  mac.update(iv);
  mac.update(ciphertext);
  mac.update(&al(aad.len()));
  mac.finalize().into_bytes()[..tag_len].to_vec()
}

pub fn encrypt<D, const AES_KEY_LEN: usize>(plaintext: &[u8], cek: &[u8], aad: &[u8], tag_len: usize) -> Result<Sealed>
where
  D: Digest + Clone + BlockSizeUser + OutputSizeUser,
  SimpleHmac<D>: Mac,
{
  let (mac_key, aes_key) = split_cek(cek, AES_KEY_LEN)?;
  let iv: Vec<u8> = jwu::secure_random(16);

  let ciphertext: Vec<u8> = match AES_KEY_LEN {
    16 => Aes128CbcEnc::new(aes_key.into(), iv.as_slice().into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    24 => Aes192CbcEnc::new(aes_key.into(), iv.as_slice().into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    32 => Aes256CbcEnc::new(aes_key.into(), iv.as_slice().into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    _ => return Err(Error::InvalidOperation("unsupported AES-CBC key length".into())),
  };

  let computed_tag: Vec<u8> = tag::<D>(mac_key, aad, &iv, &ciphertext, tag_len);

  Ok(Sealed {
    ciphertext,
    iv,
    tag: computed_tag,
  })
}

pub fn decrypt<D, const AES_KEY_LEN: usize>(
  ciphertext: &[u8],
  received_tag: &[u8],
  cek: &[u8],
  aad: &[u8],
  iv: &[u8],
  tag_len: usize,
) -> Result<Vec<u8>>
where
  D: Digest + Clone + BlockSizeUser + OutputSizeUser,
  SimpleHmac<D>: Mac,
{
  let (mac_key, aes_key) = split_cek(cek, AES_KEY_LEN).map_err(|_| Error::DecryptionError)?;

  let expected_tag: Vec<u8> = tag::<D>(mac_key, aad, iv, ciphertext, tag_len);
  if !jwu::secure_compare(&expected_tag, received_tag) {
    return Err(Error::DecryptionError);
  }

  let mut buf: Vec<u8> = ciphertext.to_vec();
  let plaintext: &[u8] = match AES_KEY_LEN {
    16 => Aes128CbcDec::new(aes_key.into(), iv.into())
      .decrypt_padded_mut::<Pkcs7>(&mut buf)
      .map_err(|_| Error::DecryptionError)?,
    24 => Aes192CbcDec::new(aes_key.into(), iv.into())
      .decrypt_padded_mut::<Pkcs7>(&mut buf)
      .map_err(|_| Error::DecryptionError)?,
    32 => Aes256CbcDec::new(aes_key.into(), iv.into())
      .decrypt_padded_mut::<Pkcs7>(&mut buf)
      .map_err(|_| Error::DecryptionError)?,
    _ => return Err(Error::DecryptionError),
  };

  Ok(plaintext.to_vec())
}

#[cfg(test)]
mod tests {
  use super::*;
  use sha2::Sha256;

  // RFC 7518 Appendix B (A128CBC-HS256 worked example).
  #[test]
  fn rfc7518_appendix_b() {
    let mac_key: Vec<u8> = (0..16).collect();
    let enc_key: Vec<u8> = (16..32).collect();
    let mut cek: Vec<u8> = mac_key.clone();
    cek.extend_from_slice(&enc_key);

    let plaintext: &[u8] = b"Live long and prosper.";
    let aad: Vec<u8> = vec![
      101, 121, 74, 104, 98, 71, 99, 105, 79, 105, 74, 66, 77, 84, 73, 52, 83, 49, 99, 105, 76, 67, 74, 108, 98, 109,
      77, 105, 79, 105, 74, 66, 77, 84, 73, 52, 81, 48, 74, 68, 76, 85, 104, 84, 77, 106, 85, 50, 73, 110, 48,
    ];
    let iv: Vec<u8> = vec![3, 22, 60, 12, 43, 67, 104, 105, 108, 108, 105, 99, 111, 116, 104, 101];

    let aes_key: &[u8] = &cek[16..];
    let ciphertext = Aes128CbcEnc::new(aes_key.into(), iv.as_slice().into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let expected_ciphertext: Vec<u8> = vec![
      40, 57, 83, 181, 119, 33, 133, 148, 198, 185, 243, 24, 152, 230, 6, 75, 129, 223, 127, 19, 210, 82, 183, 230,
      168, 33, 215, 104, 143, 112, 56, 102,
    ];
    assert_eq!(ciphertext, expected_ciphertext);

    let computed_tag: Vec<u8> = tag::<Sha256>(&cek[..16], &aad, &iv, &ciphertext, 16);
    let expected_tag: Vec<u8> = vec![83, 73, 191, 98, 104, 205, 211, 128, 201, 189, 199, 133, 32, 38, 194, 85];
    assert_eq!(computed_tag, expected_tag);
  }

  #[test]
  fn roundtrip_and_tamper_detection() {
    let cek: Vec<u8> = jwu::secure_random(32);
    let aad: Vec<u8> = b"header".to_vec();
    let sealed = encrypt::<Sha256, 16>(b"hello jwe", &cek, &aad, 16).unwrap();
    let plaintext = decrypt::<Sha256, 16>(&sealed.ciphertext, &sealed.tag, &cek, &aad, &sealed.iv, 16).unwrap();
    assert_eq!(plaintext, b"hello jwe");

    let mut bad_tag = sealed.tag.clone();
    bad_tag[0] ^= 0xFF;
    assert!(decrypt::<Sha256, 16>(&sealed.ciphertext, &bad_tag, &cek, &aad, &sealed.iv, 16).is_err());
  }
}
