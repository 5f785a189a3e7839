// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! RFC 7638 JWK thumbprint: SHA-256 over a canonical JSON object containing
//! only the `kty`-required members, keys sorted lexicographically.

use sha2::Digest;
use sha2::Sha256;

use crate::jwk::params::JwkParams;
use crate::jwu;

/// Builds the canonical (sorted-key, no-whitespace) JSON object RFC 7638
/// hashes, then returns its SHA-256 digest.
pub fn digest(params: &JwkParams) -> [u8; 32] {
  let canonical: String = canonical_json(params);
  let mut hasher: Sha256 = Sha256::new();
  hasher.update(canonical.as_bytes());
  hasher.finalize().into()
}

/// base64url(SHA-256(canonical JSON)) — the thumbprint as used for `kid`.
pub fn thumbprint_b64(params: &JwkParams) -> String {
  jwu::encode_b64(digest(params))
}

fn canonical_json(params: &JwkParams) -> String {
  // RFC 7638 §3.2 required-member sets, in sorted order (all member names
  // here already sort lexicographically: crv<kty<x<y, d<kty<n... etc.).
  match params {
    JwkParams::Rsa(p) => format!(
      r#"{{"e":{},"kty":"RSA","n":{}}}"#,
      json_string(&p.e),
      json_string(&p.n)
    ),
    JwkParams::Ec(p) => format!(
      r#"{{"crv":{},"kty":"EC","x":{},"y":{}}}"#,
      json_string(&p.crv),
      json_string(&p.x),
      json_string(&p.y)
    ),
    JwkParams::Okp(p) => format!(r#"{{"crv":{},"kty":"OKP","x":{}}}"#, json_string(&p.crv), json_string(&p.x)),
    JwkParams::Oct(p) => format!(r#"{{"k":{},"kty":"oct"}}"#, json_string(&p.k)),
  }
}

/// Values in the thumbprint's member set are always plain base64url/curve
/// name strings with no characters that need JSON escaping, but we still go
/// through `serde_json` rather than hand-quoting to stay correct if that
/// assumption is ever violated by an imported key.
fn json_string(value: &str) -> String {
  serde_json::to_string(value).expect("string serialization cannot fail")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jwk::params::JwkParamsRsa;

  #[test]
  fn rfc7638_example() {
    // RFC 7638 §3.1 example key.
    let params = JwkParamsRsa {
      n: "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw".to_string(),
      e: "AQAB".to_string(),
      d: None,
      p: None,
      q: None,
      dp: None,
      dq: None,
      qi: None,
    };

    assert_eq!(thumbprint_b64(&JwkParams::Rsa(params)), "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs");
  }
}
