//! Cache statistics

use serde::{Deserialize, Serialize};

/// Compilation cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of compiled artifacts currently cached
    pub entries: usize,

    /// Configured maximum number of entries
    pub capacity: usize,

    /// Lookups answered from the cache
    pub hits: u64,

    /// Lookups that found nothing
    ///
    /// Counted by every `has` or `get` that misses on an enabled cache, so a
    /// request that re-checks after waiting on another compilation can
    /// record two misses. A disabled cache records none.
    pub misses: u64,

    /// Artifacts stored, including overwrites
    pub insertions: u64,

    /// Entries dropped to make room for newer ones
    pub evictions: u64,

    /// Cache hit rate (0.0 to 1.0)
    pub hit_rate: f64,
}

impl CacheStats {
    /// Create new cache statistics
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Calculate hit rate from hits and misses
    pub fn calculate_hit_rate(&mut self) {
        let total = self.hits + self.misses;
        self.hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };
    }

    /// Display statistics in a human-readable format
    pub fn display(&self) -> String {
        let mut output = String::new();
        output.push_str("Compilation Cache Statistics:\n");
        output.push_str(&format!("  Entries: {}/{}\n", self.entries, self.capacity));
        output.push_str(&format!("  Hits: {}\n", self.hits));
        output.push_str(&format!("  Misses: {}\n", self.misses));
        output.push_str(&format!("  Insertions: {}\n", self.insertions));
        output.push_str(&format!("  Evictions: {}\n", self.evictions));
        output.push_str(&format!("  Hit rate: {:.1}%\n", self.hit_rate * 100.0));
        output
    }
}
