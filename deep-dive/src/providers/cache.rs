// Response cache shared by the HTTP providers.
//
// Entries are keyed by source plus the request parameters in sorted order,
// so parameter order never produces a second entry.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Cache key: a source name and its sorted `(name, value)` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    source: String,
    params: Vec<(String, String)>,
}

impl CacheKey {
    pub fn new(source: &str, params: &[(&str, String)]) -> Self {
        let mut params: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        params.sort();
        Self {
            source: source.to_string(),
            params,
        }
    }
}

/// Time-bounded cache behind an async mutex.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached value for `key` if it has not expired. Expired entries are
    /// evicted on lookup.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((expires, value)) if Instant::now() < *expires => {
                debug!(source = %key.source, "cache hit");
                Some(value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`, sweeping out every expired entry first.
    pub async fn insert(&self, key: CacheKey, value: V) {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (expires, _)| now < *expires);
        entries.insert(key, (now + self.ttl, value));
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
