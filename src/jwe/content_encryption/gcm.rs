// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! AES-GCM (RFC 7518 §5.3): a native AEAD, unlike AES-CBC-HMAC-SHA2 — no
//! manual key splitting or MAC assembly needed.

use aes_gcm::aead::Aead;
use aes_gcm::aead::KeyInit;
use aes_gcm::aead::Payload;
use aes_gcm::Aes128Gcm;
use aes_gcm::Aes192Gcm;
use aes_gcm::Aes256Gcm;
use aes_gcm::Nonce;

use crate::error::Error;
use crate::error::Result;
use crate::jwu;

use super::JweEncryption;
use super::Sealed;

const GCM_IV_LEN: usize = 12;
const GCM_TAG_LEN: usize = 16;

pub fn encrypt(enc: JweEncryption, plaintext: &[u8], cek: &[u8], aad: &[u8]) -> Result<Sealed> {
  let iv: Vec<u8> = jwu::secure_random(GCM_IV_LEN);
  let nonce = Nonce::from_slice(&iv);
  let payload = Payload { msg: plaintext, aad };

  let mut sealed: Vec<u8> = match enc {
    JweEncryption::A128Gcm => Aes128Gcm::new_from_slice(cek)
      .map_err(|_| Error::InvalidKey("bad A128GCM key length".into()))?
      .encrypt(nonce, payload)
      .map_err(|_| Error::DecryptionError)?,
    JweEncryption::A192Gcm => Aes192Gcm::new_from_slice(cek)
      .map_err(|_| Error::InvalidKey("bad A192GCM key length".into()))?
      .encrypt(nonce, payload)
      .map_err(|_| Error::DecryptionError)?,
    JweEncryption::A256Gcm => Aes256Gcm::new_from_slice(cek)
      .map_err(|_| Error::InvalidKey("bad A256GCM key length".into()))?
      .encrypt(nonce, payload)
      .map_err(|_| Error::DecryptionError)?,
    _ => return Err(Error::InvalidOperation("not a GCM encryption algorithm".into())),
  };

  let tag: Vec<u8> = sealed.split_off(sealed.len() - GCM_TAG_LEN);

  Ok(Sealed {
    ciphertext: sealed,
    iv,
    tag,
  })
}

pub fn decrypt(enc: JweEncryption, ciphertext: &[u8], tag: &[u8], cek: &[u8], aad: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
  if iv.len() != GCM_IV_LEN || tag.len() != GCM_TAG_LEN {
    return Err(Error::DecryptionError);
  }
  let nonce = Nonce::from_slice(iv);

  let mut combined: Vec<u8> = Vec::with_capacity(ciphertext.len() + tag.len());
  combined.extend_from_slice(ciphertext);
  combined.extend_from_slice(tag);
  let payload = Payload { msg: &combined, aad };

  match enc {
    JweEncryption::A128Gcm => Aes128Gcm::new_from_slice(cek)
      .map_err(|_| Error::DecryptionError)?
      .decrypt(nonce, payload)
      .map_err(|_| Error::DecryptionError),
    JweEncryption::A192Gcm => Aes192Gcm::new_from_slice(cek)
      .map_err(|_| Error::DecryptionError)?
      .decrypt(nonce, payload)
      .map_err(|_| Error::DecryptionError),
    JweEncryption::A256Gcm => Aes256Gcm::new_from_slice(cek)
      .map_err(|_| Error::DecryptionError)?
      .decrypt(nonce, payload)
      .map_err(|_| Error::DecryptionError),
    _ => Err(Error::DecryptionError),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roundtrip_and_tamper_detection() {
    let cek: Vec<u8> = jwu::secure_random(16);
    let aad: Vec<u8> = b"protected-header".to_vec();
    let sealed = encrypt(JweEncryption::A128Gcm, b"plaintext", &cek, &aad).unwrap();
    let plaintext = decrypt(JweEncryption::A128Gcm, &sealed.ciphertext, &sealed.tag, &cek, &aad, &sealed.iv).unwrap();
    assert_eq!(plaintext, b"plaintext");

    let mut bad_tag = sealed.tag.clone();
    bad_tag[0] ^= 0xFF;
    assert!(decrypt(JweEncryption::A128Gcm, &sealed.ciphertext, &bad_tag, &cek, &aad, &sealed.iv).is_err());
  }
}
