use serde::Serialize;

/// Counters of a [`CachedStore`](crate::CachedStore).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups currently cached, present or absent.
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub max_entries: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        let stats = CacheStats {
            entries: 1,
            hits: 3,
            misses: 1,
            max_entries: 10,
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
