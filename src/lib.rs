// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]

mod bigint;
mod der;

pub mod cbor;
pub mod error;
pub mod jwe;
pub mod jwk;
pub mod jws;
pub mod jwt;
pub mod jwu;
pub mod registry;
pub mod secret;
pub mod token_hash;

pub use error::Error;
pub use error::Result;
