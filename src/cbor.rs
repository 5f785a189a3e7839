// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! A minimal CBOR (RFC 8949) reader, just enough to decode COSE_Key-shaped
//! input (RFC 8152 §7) for the `cbor` JWK import format.
//! Indefinite-length items and tags beyond what COSE keys use are not
//! supported.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Uint(u64),
  NegInt(i64),
  Bytes(Vec<u8>),
  Text(String),
  Array(Vec<Value>),
  /// COSE keys are integer- or text-keyed maps; we normalise both to a
  /// canonical string form (`"1"`, `"-1"`, `"kty"`, ...) for lookup.
  Map(BTreeMap<MapKey, Value>),
  Bool(bool),
  Null,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MapKey {
  Int(i64),
  Text(String),
}

impl Value {
  pub fn as_map(&self) -> Option<&BTreeMap<MapKey, Value>> {
    match self {
      Value::Map(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_bytes(&self) -> Option<&[u8]> {
    match self {
      Value::Bytes(b) => Some(b),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Value::Uint(u) => i64::try_from(*u).ok(),
      Value::NegInt(n) => Some(*n),
      _ => None,
    }
  }

  pub fn get(&self, key: i64) -> Option<&Value> {
    self.as_map()?.get(&MapKey::Int(key))
  }
}

/// Decodes a single top-level CBOR data item.
pub fn decode(input: &[u8]) -> Result<Value> {
  let (value, rest) = decode_one(input)?;
  if !rest.is_empty() {
    return Err(Error::InvalidKey("trailing bytes after CBOR item".into()));
  }
  Ok(value)
}

fn decode_one(input: &[u8]) -> Result<(Value, &[u8])> {
  let (&first, rest) = input
    .split_first()
    .ok_or_else(|| Error::InvalidKey("truncated CBOR item".into()))?;

  let major: u8 = first >> 5;
  let info: u8 = first & 0x1F;

  match major {
    0 => {
      let (value, rest) = read_uint(info, rest)?;
      Ok((Value::Uint(value), rest))
    }
    1 => {
      let (value, rest) = read_uint(info, rest)?;
      Ok((Value::NegInt(-1 - value as i64), rest))
    }
    2 => {
      let (len, rest) = read_uint(info, rest)?;
      let (bytes, rest) = split_checked(rest, len as usize)?;
      Ok((Value::Bytes(bytes.to_vec()), rest))
    }
    3 => {
      let (len, rest) = read_uint(info, rest)?;
      let (bytes, rest) = split_checked(rest, len as usize)?;
      let text: String = String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidKey("invalid CBOR text".into()))?;
      Ok((Value::Text(text), rest))
    }
    4 => {
      let (len, mut rest) = read_uint(info, rest)?;
      let mut items: Vec<Value> = Vec::with_capacity(len as usize);
      for _ in 0..len {
        let (item, next) = decode_one(rest)?;
        items.push(item);
        rest = next;
      }
      Ok((Value::Array(items), rest))
    }
    5 => {
      let (len, mut rest) = read_uint(info, rest)?;
      let mut map: BTreeMap<MapKey, Value> = BTreeMap::new();
      for _ in 0..len {
        let (key, next) = decode_one(rest)?;
        let (value, next) = decode_one(next)?;
        map.insert(map_key(key)?, value);
        rest = next;
      }
      Ok((Value::Map(map), rest))
    }
    7 => match info {
      20 => Ok((Value::Bool(false), rest)),
      21 => Ok((Value::Bool(true), rest)),
      22 => Ok((Value::Null, rest)),
      _ => Err(Error::InvalidKey("unsupported CBOR simple value".into())),
    },
    _ => Err(Error::InvalidKey("unsupported CBOR major type".into())),
  }
}

fn map_key(value: Value) -> Result<MapKey> {
  match value {
    Value::Uint(u) => Ok(MapKey::Int(i64::try_from(u).map_err(|_| Error::InvalidKey("CBOR map key overflow".into()))?)),
    Value::NegInt(n) => Ok(MapKey::Int(n)),
    Value::Text(t) => Ok(MapKey::Text(t)),
    _ => Err(Error::InvalidKey("unsupported CBOR map key type".into())),
  }
}

fn read_uint(info: u8, rest: &[u8]) -> Result<(u64, &[u8])> {
  match info {
    0..=23 => Ok((info as u64, rest)),
    24 => {
      let (b, rest) = split_checked(rest, 1)?;
      Ok((b[0] as u64, rest))
    }
    25 => {
      let (b, rest) = split_checked(rest, 2)?;
      Ok((u16::from_be_bytes([b[0], b[1]]) as u64, rest))
    }
    26 => {
      let (b, rest) = split_checked(rest, 4)?;
      Ok((u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64, rest))
    }
    27 => {
      let (b, rest) = split_checked(rest, 8)?;
      let mut arr: [u8; 8] = [0; 8];
      arr.copy_from_slice(b);
      Ok((u64::from_be_bytes(arr), rest))
    }
    _ => Err(Error::InvalidKey("unsupported CBOR length encoding (indefinite?)".into())),
  }
}

fn split_checked(input: &[u8], len: usize) -> Result<(&[u8], &[u8])> {
  if input.len() < len {
    return Err(Error::InvalidKey("truncated CBOR item".into()));
  }
  Ok(input.split_at(len))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_small_uint() {
    assert_eq!(decode(&[0x05]).unwrap(), Value::Uint(5));
  }

  #[test]
  fn decodes_byte_string() {
    assert_eq!(decode(&[0x43, 0x01, 0x02, 0x03]).unwrap(), Value::Bytes(vec![1, 2, 3]));
  }

  #[test]
  fn decodes_cose_key_shaped_map() {
    // {1: 2, -1: 1, -2: h'01', -3: h'02'} — OKP-ish COSE_Key skeleton.
    let input = [0xA4, 0x01, 0x02, 0x20, 0x01, 0x21, 0x41, 0x01, 0x22, 0x41, 0x02];
    let value: Value = decode(&input).unwrap();
    assert_eq!(value.get(1), Some(&Value::Uint(2)));
    assert_eq!(value.get(-1), Some(&Value::Uint(1)));
    assert_eq!(value.get(-2).and_then(Value::as_bytes), Some(&[1u8][..]));
  }
}
