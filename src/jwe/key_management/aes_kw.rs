// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! AES Key Wrap (RFC 3394), used directly by A128/192/256KW and as the
//! final wrapping step of PBES2 and ECDH-ES+AxxxKW. Built over the `aes`
//! crate's raw block cipher rather than pulled in as a pre-built
//! `aes-kw` dependency, since key wrap is a primitive this crate owns
//! rather than delegates.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::BlockDecrypt;
use aes::cipher::BlockEncrypt;
use aes::cipher::KeyInit;
use aes::Aes128;
use aes::Aes192;
use aes::Aes256;

use crate::error::Error;
use crate::error::Result;

const DEFAULT_IV: u64 = 0xA6A6A6A6A6A6A6A6;

trait KwCipher {
  fn new(key: &[u8]) -> Result<Self>
  where
    Self: Sized;
  fn encrypt_block(&self, block: &mut [u8; 16]);
  fn decrypt_block(&self, block: &mut [u8; 16]);
}

macro_rules! kw_cipher_impl {
  ($ty:ty) => {
    impl KwCipher for $ty {
      fn new(key: &[u8]) -> Result<Self> {
        <$ty>::new_from_slice(key).map_err(|_| Error::InvalidKey("bad AES key-wrap key length".into()))
      }

      fn encrypt_block(&self, block: &mut [u8; 16]) {
        let mut ga = GenericArray::clone_from_slice(block);
        BlockEncrypt::encrypt_block(self, &mut ga);
        block.copy_from_slice(&ga);
      }

      fn decrypt_block(&self, block: &mut [u8; 16]) {
        let mut ga = GenericArray::clone_from_slice(block);
        BlockDecrypt::decrypt_block(self, &mut ga);
        block.copy_from_slice(&ga);
      }
    }
  };
}

kw_cipher_impl!(Aes128);
kw_cipher_impl!(Aes192);
kw_cipher_impl!(Aes256);

fn wrap_with<C: KwCipher>(kek: &[u8], cek: &[u8]) -> Result<Vec<u8>> {
  if cek.len() % 8 != 0 || cek.len() < 16 {
    return Err(Error::InvalidKey("AES key wrap input must be a multiple of 8 bytes, at least 16".into()));
  }
  let cipher: C = C::new(kek)?;
  let n: usize = cek.len() / 8;

  let mut r: Vec<[u8; 8]> = cek.chunks(8).map(|c| c.try_into().unwrap()).collect();
  let mut a: u64 = DEFAULT_IV;

  for j in 0..=5u64 {
    for i in 0..n {
      let mut block: [u8; 16] = [0u8; 16];
      block[..8].copy_from_slice(&a.to_be_bytes());
      block[8..].copy_from_slice(&r[i]);
      cipher.encrypt_block(&mut block);
      let t: u64 = n as u64 * j + (i as u64 + 1);
      a = u64::from_be_bytes(block[..8].try_into().unwrap()) ^ t;
      r[i].copy_from_slice(&block[8..]);
    }
  }

  let mut out: Vec<u8> = Vec::with_capacity(8 + cek.len());
  out.extend_from_slice(&a.to_be_bytes());
  for block in &r {
    out.extend_from_slice(block);
  }
  Ok(out)
}

fn unwrap_with<C: KwCipher>(kek: &[u8], wrapped: &[u8]) -> Result<Vec<u8>> {
  if wrapped.len() % 8 != 0 || wrapped.len() < 24 {
    return Err(Error::DecryptionError);
  }
  let cipher: C = C::new(kek).map_err(|_| Error::DecryptionError)?;
  let n: usize = wrapped.len() / 8 - 1;

  let mut a: u64 = u64::from_be_bytes(wrapped[..8].try_into().unwrap());
  let mut r: Vec<[u8; 8]> = wrapped[8..].chunks(8).map(|c| c.try_into().unwrap()).collect();

  for j in (0..=5u64).rev() {
    for i in (0..n).rev() {
      let t: u64 = n as u64 * j + (i as u64 + 1);
      let mut block: [u8; 16] = [0u8; 16];
      block[..8].copy_from_slice(&(a ^ t).to_be_bytes());
      block[8..].copy_from_slice(&r[i]);
      cipher.decrypt_block(&mut block);
      a = u64::from_be_bytes(block[..8].try_into().unwrap());
      r[i].copy_from_slice(&block[8..]);
    }
  }

  if a != DEFAULT_IV {
    return Err(Error::DecryptionError);
  }

  Ok(r.into_iter().flatten().collect())
}

pub fn wrap(kek: &[u8], cek: &[u8]) -> Result<Vec<u8>> {
  match kek.len() {
    16 => wrap_with::<Aes128>(kek, cek),
    24 => wrap_with::<Aes192>(kek, cek),
    32 => wrap_with::<Aes256>(kek, cek),
    _ => Err(Error::InvalidKey("AES key-wrap key must be 128/192/256 bits".into())),
  }
}

pub fn unwrap(kek: &[u8], wrapped: &[u8]) -> Result<Vec<u8>> {
  match kek.len() {
    16 => unwrap_with::<Aes128>(kek, wrapped),
    24 => unwrap_with::<Aes192>(kek, wrapped),
    32 => unwrap_with::<Aes256>(kek, wrapped),
    _ => Err(Error::DecryptionError),
  }
}
