//! Cache backends for persisted payloads.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

mod memory;

pub use memory::InMemoryCache;

/// A string keyed store for persisted payloads.
///
/// Backend errors are returned as-is; callers decide whether a failure is fatal.
#[async_trait]
pub trait CacheStorage: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`. With a `ttl`, the entry is gone once it elapses.
    async fn insert(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;
}
