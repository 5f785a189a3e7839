// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The process-wide algorithm registry configuration: whether `alg=none`
//! is accepted, and the JWT `nbf`/`exp` clock-skew allowance. Expressed as
//! an explicit config struct, with a `RwLock`-guarded singleton kept only
//! for call-site brevity.

use std::sync::OnceLock;
use std::sync::RwLock;

/// Default `nbf`/`exp` clock-skew allowance, in seconds.
pub const DEFAULT_TIME_ALLOWANCE: i64 = 300;

#[derive(Debug, Clone, Copy)]
pub struct JoseConfig {
  allow_none: bool,
  time_allowance: i64,
}

impl Default for JoseConfig {
  fn default() -> Self {
    Self {
      allow_none: false,
      time_allowance: DEFAULT_TIME_ALLOWANCE,
    }
  }
}

impl JoseConfig {
  pub fn new() -> Self {
    Self::default()
  }

  /// `none` MUST be absent from the default registry (RFC 8725 §3.2);
  /// opt in explicitly.
  pub fn enable_none(&mut self) -> &mut Self {
    self.allow_none = true;
    self
  }

  pub fn disable_none(&mut self) -> &mut Self {
    self.allow_none = false;
    self
  }

  pub fn none_enabled(&self) -> bool {
    self.allow_none
  }

  pub fn set_time_allowance(&mut self, seconds: i64) -> &mut Self {
    self.time_allowance = seconds;
    self
  }

  pub fn time_allowance(&self) -> i64 {
    self.time_allowance
  }
}

fn global_lock() -> &'static RwLock<JoseConfig> {
  static GLOBAL: OnceLock<RwLock<JoseConfig>> = OnceLock::new();
  GLOBAL.get_or_init(|| RwLock::new(JoseConfig::default()))
}

/// Returns a snapshot of the process-wide default configuration.
pub fn global() -> JoseConfig {
  *global_lock().read().expect("registry lock poisoned")
}

/// Opts the process-wide default registry into accepting `alg=none`.
pub fn enable_none() {
  global_lock().write().expect("registry lock poisoned").enable_none();
}

/// Reverts [`enable_none`].
pub fn disable_none() {
  global_lock().write().expect("registry lock poisoned").disable_none();
}

/// Overrides the process-wide default `nbf`/`exp` clock-skew allowance.
pub fn set_time_allowance(seconds: i64) {
  global_lock().write().expect("registry lock poisoned").set_time_allowance(seconds);
}
