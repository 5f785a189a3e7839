// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! HS256/384/512 (RFC 7518 §3.2): HMAC with the matching SHA-2 hash.

use hmac::Mac;
use hmac::SimpleHmac;
use sha2::Digest;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::Jwk;
use crate::jws::JwsAlgorithm;
use crate::jwu;

fn shared_secret(jwk: &Jwk) -> Result<Vec<u8>> {
  let params = jwk.try_oct_params().map_err(|_| Error::InvalidKey("HMAC requires an oct JWK".into()))?;
  jwu::decode_b64(&params.k)
}

pub fn sign(alg: JwsAlgorithm, msg: &[u8], jwk: &Jwk) -> Result<Vec<u8>> {
  let key: Vec<u8> = shared_secret(jwk)?;
  match alg {
    JwsAlgorithm::HS256 => Ok(mac::<Sha256>(&key, msg)),
    JwsAlgorithm::HS384 => Ok(mac::<Sha384>(&key, msg)),
    JwsAlgorithm::HS512 => Ok(mac::<Sha512>(&key, msg)),
    other => Err(Error::InvalidOperation(format!("{other} is not an HMAC algorithm"))),
  }
}

pub fn verify(alg: JwsAlgorithm, msg: &[u8], sig: &[u8], jwk: &Jwk) -> Result<bool> {
  let expected: Vec<u8> = sign(alg, msg, jwk)?;
  Ok(jwu::secure_compare(&expected, sig))
}

fn mac<D: Digest + Clone + hmac::digest::core_api::BlockSizeUser + hmac::digest::OutputSizeUser>(
  key: &[u8],
  msg: &[u8],
) -> Vec<u8>
where
  SimpleHmac<D>: Mac,
{
  let mut mac: SimpleHmac<D> = SimpleHmac::<D>::new_from_slice(key).expect("HMAC accepts any key length");
  mac.update(msg);
  mac.finalize().into_bytes().to_vec()
}

/// The left half of the underlying hash, for `at_hash`/`c_hash` (OIDC Core
/// §3.1.3.6 / RFC 7519 §5).
pub fn short_hash(alg: JwsAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
  let full: Vec<u8> = match alg {
    JwsAlgorithm::HS256 => Sha256::digest(data).to_vec(),
    JwsAlgorithm::HS384 => Sha384::digest(data).to_vec(),
    JwsAlgorithm::HS512 => Sha512::digest(data).to_vec(),
    other => return Err(Error::InvalidOperation(format!("{other} has no defined short hash"))),
  };
  Ok(full[..full.len() / 2].to_vec())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jwk::JwkParamsOct;

  #[test]
  fn hs256_rfc7515_a1() {
    let jwk = Jwk::from_params(JwkParamsOct {
      k: "AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow".to_string(),
    });
    let signing_input = b"eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9.eyJpc3MiOiJqb2UiLCJleHAiOjEzMDA4MTkzODAsImh0dHA6XC9cL2V4YW1wbGUuY29tXC9pc19yb290Ijp0cnVlfQ";

    let sig: Vec<u8> = sign(JwsAlgorithm::HS256, signing_input, &jwk).unwrap();
    assert_eq!(jwu::encode_b64(&sig), "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
  }
}
