//! Configuration surface.
//!
//! Mirrors the shape of the upstream SDK's client constructors: a provider
//! selects the auth/websocket host family, credentials authorize against
//! it, and a handful of tunables control worker concurrency and queue
//! depth. Validation happens once, synchronously, in [`ConfigBuilder::build`]
//! — a misconfigured client fails at construction, not mid-stream.

use std::time::Duration;

use crate::error::{IntrinioError, Result};
use crate::models::Provider;

/// Which wire format a connection will speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFamily {
  EquitiesV2,
  EquitiesLegacy,
  Options,
}

impl ProductFamily {
  pub(crate) fn is_options(&self) -> bool {
    matches!(self, ProductFamily::Options)
  }

  pub(crate) fn default_worker_count(&self) -> usize {
    match self {
      ProductFamily::Options => 4,
      ProductFamily::EquitiesV2 | ProductFamily::EquitiesLegacy => 1,
    }
  }

  pub(crate) fn default_queue_capacity(&self) -> usize {
    match self {
      ProductFamily::Options => 250_000,
      ProductFamily::EquitiesV2 | ProductFamily::EquitiesLegacy => 10_000,
    }
  }
}

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct Config {
  pub provider: Provider,
  pub product: ProductFamily,
  pub api_key: Option<String>,
  pub username: Option<String>,
  pub password: Option<String>,
  pub manual_ip_address: Option<String>,
  pub delayed: bool,
  pub tradesonly: bool,
  pub bypass_parsing: bool,
  pub worker_count: usize,
  pub queue_capacity: usize,
  pub auth_timeout: Duration,
}

impl Config {
  pub fn builder(provider: Provider, product: ProductFamily) -> ConfigBuilder {
    ConfigBuilder::new(provider, product)
  }

  pub(crate) fn uses_basic_auth(&self) -> bool {
    self.api_key.is_none()
  }
}

/// Fluent builder for [`Config`], following the same shape as a
/// `Default`-backed settings struct with chained setters.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
  provider: Provider,
  product: ProductFamily,
  api_key: Option<String>,
  username: Option<String>,
  password: Option<String>,
  manual_ip_address: Option<String>,
  delayed: bool,
  tradesonly: bool,
  bypass_parsing: bool,
  worker_count: Option<usize>,
  queue_capacity: Option<usize>,
  auth_timeout: Duration,
}

impl ConfigBuilder {
  pub fn new(provider: Provider, product: ProductFamily) -> Self {
    ConfigBuilder {
      provider,
      product,
      api_key: None,
      username: None,
      password: None,
      manual_ip_address: None,
      delayed: false,
      tradesonly: false,
      bypass_parsing: false,
      worker_count: None,
      queue_capacity: None,
      auth_timeout: Duration::from_secs(10),
    }
  }

  pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
    self.api_key = Some(api_key.into());
    self
  }

  pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
    self.username = Some(username.into());
    self.password = Some(password.into());
    self
  }

  pub fn manual_ip_address(mut self, ip: impl Into<String>) -> Self {
    self.manual_ip_address = Some(ip.into());
    self
  }

  pub fn delayed(mut self, delayed: bool) -> Self {
    self.delayed = delayed;
    self
  }

  pub fn tradesonly(mut self, tradesonly: bool) -> Self {
    self.tradesonly = tradesonly;
    self
  }

  /// When set, equities decoders skip field extraction and hand the raw
  /// per-message slice to `on_raw` instead of decoding trades/quotes.
  pub fn bypass_parsing(mut self, bypass_parsing: bool) -> Self {
    self.bypass_parsing = bypass_parsing;
    self
  }

  pub fn worker_count(mut self, worker_count: usize) -> Self {
    self.worker_count = Some(worker_count);
    self
  }

  pub fn queue_capacity(mut self, queue_capacity: usize) -> Self {
    self.queue_capacity = Some(queue_capacity);
    self
  }

  pub fn auth_timeout(mut self, timeout: Duration) -> Self {
    self.auth_timeout = timeout;
    self
  }

  pub fn build(self) -> Result<Config> {
    if self.api_key.is_none() && (self.username.is_none() || self.password.is_none()) {
      return Err(IntrinioError::Configuration(
        "either api_key or both username and password must be set".to_string(),
      ));
    }
    if matches!(self.provider, Provider::Manual) && self.manual_ip_address.is_none() {
      return Err(IntrinioError::Configuration(
        "manual_ip_address is required for Provider::Manual".to_string(),
      ));
    }
    if let Some(key) = &self.api_key {
      if key.is_empty() {
        return Err(IntrinioError::Configuration("api_key must not be empty".to_string()));
      }
    }

    Ok(Config {
      provider: self.provider,
      product: self.product,
      api_key: self.api_key,
      username: self.username,
      password: self.password,
      manual_ip_address: self.manual_ip_address,
      delayed: self.delayed,
      tradesonly: self.tradesonly,
      bypass_parsing: self.bypass_parsing,
      worker_count: self.worker_count.unwrap_or_else(|| self.product.default_worker_count()),
      queue_capacity: self
        .queue_capacity
        .unwrap_or_else(|| self.product.default_queue_capacity()),
      auth_timeout: self.auth_timeout,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_missing_credentials() {
    let err = Config::builder(Provider::Realtime, ProductFamily::EquitiesV2)
      .build()
      .unwrap_err();
    assert!(matches!(err, IntrinioError::Configuration(_)));
  }

  #[test]
  fn rejects_manual_without_ip() {
    let err = Config::builder(Provider::Manual, ProductFamily::Options)
      .api_key("key")
      .build()
      .unwrap_err();
    assert!(matches!(err, IntrinioError::Configuration(_)));
  }

  #[test]
  fn applies_product_defaults() {
    let cfg = Config::builder(Provider::Opra, ProductFamily::Options)
      .api_key("key")
      .build()
      .unwrap();
    assert_eq!(cfg.worker_count, 4);
    assert_eq!(cfg.queue_capacity, 250_000);
  }
}
