//! # Resolution Cache
//! Time-bounded memoization of resolved products, keyed by barcode and
//! shared by every lookup source. Entries live 24 hours; an expired entry is
//! treated as a miss and evicted lazily on the next read. There is no
//! background sweep.
//!
//! "Not found" is never cached: a transient source outage must not plant
//! false negatives. Generated placeholders *are* cached so a genuinely
//! unlisted barcode does not re-hit every source on each scan.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::product::ProductRecord;

/// Default entry lifetime: 24 hours from insertion.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug)]
struct CacheEntry {
    product: ProductRecord,
    expires_at: Instant,
}

/// Thread-safe barcode → product memo. Construct once at the composition
/// root and share via `Arc`; the event loop serializes access in practice,
/// the mutex just keeps the type honest under tests.
#[derive(Debug)]
pub struct ResolutionCache {
    inner: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResolutionCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Convenience constructor for the standard 24h lifetime.
    pub fn new_24h() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Look up a barcode. Expired entries are removed and reported as a miss.
    pub fn get(&self, barcode: &str) -> Option<ProductRecord> {
        let mut map = self.inner.lock().expect("resolution cache mutex poisoned");
        match map.get(barcode) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.product.clone()),
            Some(_) => {
                map.remove(barcode);
                None
            }
            None => None,
        }
    }

    /// Insert or refresh an entry; lifetime restarts from now.
    pub fn put(&self, barcode: &str, product: ProductRecord) {
        let mut map = self.inner.lock().expect("resolution cache mutex poisoned");
        map.insert(
            barcode.to_string(),
            CacheEntry {
                product,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Number of live-or-expired entries currently held (diagnostics only).
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("resolution cache mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new_24h()
    }
}
