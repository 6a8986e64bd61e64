//! Time-bounded help-text cache.
//!
//! Fetching help can mean an HTTP round trip or spawning a pager-stripped
//! `man`; the cache de-duplicates those lookups for 30 minutes per command.
//! A background task sweeps expired entries every 5 minutes. Reads and
//! writes are safe from any thread or task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// How long a cached help page stays valid.
pub const HELP_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// How often the background sweep drops expired entries.
pub const HELP_CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    text: String,
    expires_at: Instant,
}

/// Mapping from command key to help text with per-entry expiry.
pub struct HelpCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for HelpCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpCache {
    pub fn new() -> Self {
        Self::with_ttl(HELP_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// The cached text, or the empty string on miss or expiry.
    pub fn get(&self, command: &str) -> String {
        let entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        match entries.get(command) {
            Some(entry) if entry.expires_at > Instant::now() => entry.text.clone(),
            _ => String::new(),
        }
    }

    /// Store help text, replacing any prior value and restarting its TTL.
    pub fn set(&self, command: &str, text: &str) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        entries.insert(
            command.to_string(),
            CacheEntry {
                text: text.to_string(),
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop every expired entry.
    pub fn evict_expired(&self) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the periodic eviction sweep. The task holds only a weak
    /// handle and exits on its own once every strong handle is gone.
    pub fn spawn_eviction(cache: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::downgrade(cache);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await; // the first tick fires immediately
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                cache.evict_expired();
            }
        })
    }
}
