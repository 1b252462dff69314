//! Retrieval cache
//!
//! Memoizes (language, normalized query) -> result snippets so repeated
//! questions skip the embedding call entirely. Capacity-bounded with
//! insertion-time eviction and lazy per-entry TTL expiry.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use zoid_core::Language;

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("static regex"));

/// Normalize a query for cache keying: lowercase, trim, strip punctuation.
/// Two queries differing only in case or punctuation hit the same entry.
pub fn normalize_query(query: &str) -> String {
    let lowered = query.to_lowercase();
    PUNCTUATION.replace_all(&lowered, "").trim().to_string()
}

fn cache_key(language: Language, query: &str) -> String {
    format!("{}:{}", language.code(), normalize_query(query))
}

struct CacheEntry {
    snippets: Vec<String>,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Cache statistics for observability
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
}

/// Capacity-bounded retrieval cache with per-entry TTL
///
/// The mutex covers the whole eviction+insert path, so concurrent turns
/// cannot corrupt the map or evict past capacity.
pub struct RetrievalCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
    default_ttl: Duration,
}

impl RetrievalCache {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
            default_ttl,
        }
    }

    /// Look up cached snippets. Expired entries are removed and reported as
    /// misses. No side effects on a plain miss.
    pub fn get(&self, language: Language, query: &str) -> Option<Vec<String>> {
        let key = cache_key(language, query);
        let mut entries = self.entries.lock();
        match entries.get(&key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(&key);
                None
            },
            Some(entry) => Some(entry.snippets.clone()),
            None => None,
        }
    }

    /// Store snippets with the default TTL
    pub fn put(&self, language: Language, query: &str, snippets: Vec<String>) {
        self.put_with_ttl(language, query, snippets, self.default_ttl);
    }

    /// Store snippets with an explicit TTL. At capacity, the entry with the
    /// oldest insertion timestamp is evicted (insertion-time, not LRU).
    pub fn put_with_ttl(
        &self,
        language: Language,
        query: &str,
        snippets: Vec<String>,
        ttl: Duration,
    ) {
        let key = cache_key(language, query);
        let mut entries = self.entries.lock();

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest_key) = oldest {
                entries.remove(&oldest_key);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                snippets,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.lock().len(),
            capacity: self.capacity,
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
