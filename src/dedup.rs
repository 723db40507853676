//! Time-bounded memo of recently-resolved URLs.
//!
//! Prevents a URL pasted twice (or echoed by several clients) from triggering
//! repeated fetches. Entries are never evicted; the TTL check tolerates stale
//! ones, so memory grows only with the number of distinct URLs seen.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long a URL stays "already handled": one hour.
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Maps resource keys to the instant they were last processed.
#[derive(Debug)]
pub struct DedupCache {
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl DedupCache {
    /// Create a cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `key` should be processed now.
    ///
    /// Returns `true` — and records the key — when it is absent or its last
    /// processing is at least TTL ago. Returns `false` otherwise, leaving the
    /// recorded timestamp untouched.
    pub fn should_process(&self, key: &str) -> bool {
        self.should_process_at(key, Instant::now())
    }

    /// Clock-parameterized variant of [`should_process`](Self::should_process)
    /// for deterministic tests.
    fn should_process_at(&self, key: &str, now: Instant) -> bool {
        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(last) = seen.get(key) {
            if now.saturating_duration_since(*last) < self.ttl {
                return false;
            }
        }
        seen.insert(key.to_owned(), now);
        true
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
