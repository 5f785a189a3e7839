// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! `dir` (RFC 7518 §4.5): direct use of a shared symmetric key as the cek.
//! No encrypted key segment, no header augmentation.

use crate::error::Error;
use crate::error::Result;
use crate::jwk::Jwk;
use crate::jwu;

pub fn cek(jwk: &Jwk) -> Result<Vec<u8>> {
  let params = jwk.try_oct_params().map_err(|_| Error::InvalidKey("dir requires an oct JWK".into()))?;
  jwu::decode_b64(&params.k)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jwk::JwkParamsOct;

  #[test]
  fn cek_is_the_raw_oct_secret() {
    let jwk = Jwk::from_params(JwkParamsOct { k: jwu::encode_b64("0123456789abcdef") });
    assert_eq!(cek(&jwk).unwrap(), b"0123456789abcdef");
  }
}
