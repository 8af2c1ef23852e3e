//! Short-window, process-local suppression of duplicate alert dispatches.
//!
//! [`DedupCache`] remembers when each dedupe key was last dispatched and
//! rejects the same key again until the window elapses. State is lost on
//! restart and not shared across processes; the durable alert log covers
//! explicit dispatches.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::types::DbId;

/// Default suppression window for automatic alerts.
pub const DEFAULT_DEDUPE_WINDOW: Duration = Duration::from_millis(5000);

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Millisecond wall-clock source, injectable so tests control time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Dedupe key for an automatic (mutation-triggered) alert.
///
/// The key embeds the dispatch time in milliseconds, so two calls separated
/// by at least one millisecond never collide and the cache only catches
/// dispatches racing within the same millisecond.
pub fn automatic_dedupe_key(product_id: DbId, stock: i32, now_millis: i64) -> String {
    format!("{product_id}-{stock}-{now_millis}")
}

// ---------------------------------------------------------------------------
// DedupCache
// ---------------------------------------------------------------------------

/// Map of dedupe key to insertion time, swept on every insert.
#[derive(Debug)]
pub struct DedupCache {
    window_millis: i64,
    entries: Mutex<HashMap<String, i64>>,
}

impl DedupCache {
    /// Create an empty cache with the given suppression window.
    pub fn new(window: Duration) -> Self {
        Self {
            window_millis: i64::try_from(window.as_millis()).unwrap_or(i64::MAX),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The configured suppression window.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_millis.max(0) as u64)
    }

    /// Atomically check `key` and record it.
    ///
    /// Returns `true` when the caller may dispatch (key absent or expired),
    /// in which case the key is stamped with `now_millis` and every expired
    /// entry is swept. Returns `false` when the key was seen within the
    /// window; the cache is left untouched.
    pub fn check_and_insert(&self, key: &str, now_millis: i64) -> bool {
        let mut entries = self.lock();

        if let Some(&inserted_at) = entries.get(key) {
            if now_millis - inserted_at < self.window_millis {
                return false;
            }
        }

        entries.insert(key.to_string(), now_millis);
        let window = self.window_millis;
        entries.retain(|_, inserted_at| now_millis - *inserted_at <= window);
        true
    }

    /// Whether `key` is currently held and unexpired.
    #[cfg(test)]
    fn contains(&self, key: &str, now_millis: i64) -> bool {
        self.lock()
            .get(key)
            .is_some_and(|&inserted_at| now_millis - inserted_at < self.window_millis)
    }

    /// Number of entries currently held (expired ones included until the
    /// next insert sweeps them).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, i64>> {
        // A poisoned map only means another dispatch panicked mid-insert;
        // the data is still a valid cache.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUPE_WINDOW)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
