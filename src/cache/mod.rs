//! Compilation cache module
//!
//! Memoizes compiled execution plans keyed by namespace prefix, canonical
//! document text and operation name. Capacity is a fixed entry count with
//! least-recently-used eviction. The cache knows nothing about GraphQL
//! semantics; it only stores what the executor hands it.

mod config;
mod key;
mod stats;
mod storage;

pub use config::{CacheConfig, CacheOptions};
pub use key::CacheKey;
pub use stats::CacheStats;
pub use storage::LruCompilationCache;

use crate::error::Result;
use crate::execution::CompiledArtifact;
use std::sync::Arc;

/// Default maximum number of compiled artifacts
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Config file location relative to the home directory
pub const DEFAULT_CONFIG_FILE: &str = ".gql-jit/config.toml";

/// Shared store of compiled artifacts
///
/// One store may serve many executors; cache keys carry a namespace
/// prefix so schemas never collide.
pub trait CompilationStore: Send + Sync {
    /// Check whether an artifact is cached for `key`
    ///
    /// Does not refresh recency.
    fn has(&self, key: &CacheKey) -> bool;

    /// Fetch the artifact for `key` and mark it most recently used
    ///
    /// Returns `JitError::CacheEntryNotFound` when absent.
    fn get(&self, key: &CacheKey) -> Result<CompiledArtifact>;

    /// Insert or replace the artifact for `key`, evicting the least
    /// recently used entry when full
    fn set(&self, key: CacheKey, artifact: CompiledArtifact);

    /// Remove a single entry, returning whether it existed
    fn invalidate(&self, key: &CacheKey) -> bool;

    /// Remove all entries and reset statistics
    fn clear(&self);

    /// Number of cached artifacts
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached artifacts
    fn capacity(&self) -> usize;

    /// Get cache statistics
    fn stats(&self) -> CacheStats;

    /// Check if caching is enabled
    fn is_enabled(&self) -> bool;
}

/// Create a new compilation cache with the given configuration
pub fn create_cache(config: CacheConfig) -> Result<Arc<dyn CompilationStore>> {
    Ok(Arc::new(LruCompilationCache::new(config)?))
}

/// Create a cache with default settings
pub fn create_default_cache() -> Result<Arc<dyn CompilationStore>> {
    Ok(Arc::new(LruCompilationCache::with_default_config()?))
}
