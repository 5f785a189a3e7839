// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! A tiny DER writer sufficient to emit SubjectPublicKeyInfo / PKCS#1 /
//! PKCS#8 structures for PEM export.

#[derive(Default)]
pub struct Writer {
  buf: Vec<u8>,
}

impl Writer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.buf
  }

  /// Appends an INTEGER, prefixing a `0x00` byte if the high bit of the
  /// first content byte would otherwise be mistaken for a sign bit.
  pub fn write_uint(&mut self, value: &[u8]) -> &mut Self {
    let mut content: Vec<u8> = value.to_vec();
    while content.len() > 1 && content[0] == 0 && content[1] & 0x80 == 0 {
      content.remove(0);
    }
    if content.is_empty() {
      content.push(0);
    }
    if content[0] & 0x80 != 0 {
      content.insert(0, 0);
    }
    self.write_tlv(0x02, &content)
  }

  pub fn write_null(&mut self) -> &mut Self {
    self.write_tlv(0x05, &[])
  }

  pub fn write_octet_string(&mut self, value: &[u8]) -> &mut Self {
    self.write_tlv(0x04, value)
  }

  pub fn write_bit_string(&mut self, value: &[u8]) -> &mut Self {
    let mut content: Vec<u8> = Vec::with_capacity(value.len() + 1);
    content.push(0); // zero unused bits
    content.extend_from_slice(value);
    self.write_tlv(0x03, &content)
  }

  pub fn write_oid(&mut self, der_oid: &[u8]) -> &mut Self {
    self.write_tlv(0x06, der_oid)
  }

  pub fn write_sequence(&mut self, build: impl FnOnce(&mut Writer)) -> &mut Self {
    let mut inner: Writer = Writer::new();
    build(&mut inner);
    self.write_tlv(0x30, &inner.buf)
  }

  pub fn write_context(&mut self, tag: u8, build: impl FnOnce(&mut Writer)) -> &mut Self {
    let mut inner: Writer = Writer::new();
    build(&mut inner);
    self.write_tlv(0xA0 | (tag & 0x1F), &inner.buf)
  }

  fn write_tlv(&mut self, tag: u8, content: &[u8]) -> &mut Self {
    self.buf.push(tag);
    self.write_length(content.len());
    self.buf.extend_from_slice(content);
    self
  }

  fn write_length(&mut self, len: usize) {
    if len < 0x80 {
      self.buf.push(len as u8);
      return;
    }
    let bytes: Vec<u8> = len
      .to_be_bytes()
      .into_iter()
      .skip_while(|&b| b == 0)
      .collect::<Vec<_>>();
    self.buf.push(0x80 | bytes.len() as u8);
    self.buf.extend_from_slice(&bytes);
  }
}

#[cfg(test)]
mod tests {
  use super::super::reader::Reader;
  use super::*;

  #[test]
  fn uint_roundtrips_through_reader() {
    let mut writer: Writer = Writer::new();
    writer.write_uint(&[0x80, 0x01]);
    let encoded: Vec<u8> = writer.into_bytes();

    let node: Reader = Reader::parse(&encoded).unwrap();
    assert_eq!(node.value_as_uint_octets().unwrap(), &[0x80, 0x01]);
  }

  #[test]
  fn sequence_roundtrips() {
    let mut writer: Writer = Writer::new();
    writer.write_sequence(|seq| {
      seq.write_uint(&[0x01]);
      seq.write_null();
    });
    let encoded: Vec<u8> = writer.into_bytes();

    let node: Reader = Reader::parse(&encoded).unwrap();
    assert_eq!(node.len(), 2);
  }
}
