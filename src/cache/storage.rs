//! In-memory LRU storage for compiled artifacts

use super::config::CacheConfig;
use super::key::CacheKey;
use super::stats::CacheStats;
use super::CompilationStore;
use crate::error::{JitError, Result};
use crate::execution::CompiledArtifact;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

struct CacheState {
    entries: LruCache<CacheKey, CompiledArtifact>,
    stats: CacheStats,
}

/// Capacity-bounded compilation cache with strict least-recently-used eviction
///
/// All operations take a single lock, so an insert and the eviction it
/// causes happen atomically.
pub struct LruCompilationCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl LruCompilationCache {
    /// Create a new cache
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let capacity = NonZeroUsize::new(config.max_entries).ok_or_else(|| {
            JitError::InvalidConfig("max_entries must be greater than zero".to_string())
        })?;

        info!(
            enabled = config.enabled,
            max_entries = config.max_entries,
            "Created compilation cache"
        );

        Ok(Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                stats: CacheStats::new(config.max_entries),
            }),
            config,
        })
    }

    /// Create with default configuration
    pub fn with_default_config() -> Result<Self> {
        Self::new(CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // The state stays consistent across a panic in another holder.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CompilationStore for LruCompilationCache {
    fn has(&self, key: &CacheKey) -> bool {
        if !self.config.enabled {
            return false;
        }

        let mut state = self.lock();
        let found = state.entries.contains(key);
        if !found {
            state.stats.misses += 1;
            state.stats.calculate_hit_rate();
        }
        found
    }

    fn get(&self, key: &CacheKey) -> Result<CompiledArtifact> {
        if !self.config.enabled {
            return Err(JitError::CacheEntryNotFound(key.to_string()));
        }

        let mut state = self.lock();
        let cached = state.entries.get(key).cloned();
        match cached {
            Some(artifact) => {
                state.stats.hits += 1;
                state.stats.calculate_hit_rate();
                Ok(artifact)
            }
            None => {
                state.stats.misses += 1;
                state.stats.calculate_hit_rate();
                Err(JitError::CacheEntryNotFound(key.to_string()))
            }
        }
    }

    fn set(&self, key: CacheKey, artifact: CompiledArtifact) {
        if !self.config.enabled {
            return;
        }

        let mut state = self.lock();
        state.stats.insertions += 1;

        let displaced = state.entries.push(key.clone(), artifact);
        if let Some((old_key, _)) = displaced {
            if old_key != key {
                state.stats.evictions += 1;
                debug!("Evicted compiled artifact: {}", old_key);
            }
        }
    }

    fn invalidate(&self, key: &CacheKey) -> bool {
        self.lock().entries.pop(key).is_some()
    }

    fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.stats = CacheStats::new(self.config.max_entries);
        info!("Cleared compilation cache");
    }

    fn len(&self) -> usize {
        self.lock().entries.len()
    }

    fn capacity(&self) -> usize {
        self.config.max_entries
    }

    fn stats(&self) -> CacheStats {
        let state = self.lock();
        let mut stats = state.stats.clone();
        stats.entries = state.entries.len();
        stats
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}
