use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    value: bool,
    expires_at: Instant,
}

/// Time-boxed cache of admin verdicts, keyed by normalized email.
///
/// The cache is owned by the application state, not by the gate itself:
/// admin resolution is correct without it, and the handlers that mutate
/// admin sources can invalidate the affected entry directly. A zero TTL
/// disables caching entirely.
#[derive(Debug)]
pub struct AdminStatusCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl AdminStatusCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, email: &str) -> Option<bool> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(email) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value),
            Some(_) => {
                entries.remove(email);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, email: &str, value: bool) {
        if self.ttl.is_zero() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                email.to_string(),
                CacheEntry {
                    value,
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
    }

    /// Drops the entry for one email, so the next check hits the sources.
    pub fn invalidate(&self, email: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(email);
        }
    }
}
