//! Bounded LRU cache for rendered lines.
//!
//! Two ceilings apply at once: an entry count and an approximate byte size.
//! Everything (map, LRU order, byte counter, metrics, invalidation context)
//! lives behind a single mutex and every public method is one critical section.

use crate::content::ViewMode;
use lru::LruCache;
use parking_lot::Mutex;
use std::sync::Arc;

pub const DEFAULT_CAPACITY: usize = 1000;
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Fixed per-entry estimate for the key's fixed fields, the entry struct and
/// the LRU node.
pub const ENTRY_OVERHEAD: usize = 64;

/// Everything a rendered line depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderCacheKey {
    pub file_hash: Arc<str>,
    /// Hunk position within the file; -1 for file headers, -2 for separators.
    pub hunk_index: i64,
    pub line_index: usize,
    pub width: u16,
    pub view_mode: ViewMode,
    pub theme: Arc<str>,
}

impl RenderCacheKey {
    fn entry_size(&self, value: &str) -> usize {
        value.len() + self.file_hash.len() + self.theme.len() + ENTRY_OVERHEAD
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: Arc<str>,
    size: usize,
}

/// Snapshot of the cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Evictions made while the byte ceiling was exceeded.
    pub size_evictions: u64,
    pub entries: usize,
    pub bytes: usize,
}

impl CacheStats {
    /// Hit percentage, `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

struct Inner {
    entries: LruCache<RenderCacheKey, CacheEntry>,
    capacity: usize,
    max_bytes: usize,
    current_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    size_evictions: u64,
    view_mode: ViewMode,
    theme: String,
}

impl Inner {
    fn over_bytes(&self, incoming: usize) -> bool {
        self.max_bytes > 0 && self.current_bytes + incoming > self.max_bytes
    }

    fn evict_one(&mut self, size_pressure: bool) -> bool {
        match self.entries.pop_lru() {
            Some((_, evicted)) => {
                self.current_bytes -= evicted.size;
                self.evictions += 1;
                if size_pressure {
                    self.size_evictions += 1;
                }
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.current_bytes = 0;
    }
}

pub struct RenderCache {
    inner: Mutex<Inner>,
}

impl RenderCache {
    /// Zero `capacity` selects the default. Zero `max_bytes` disables the
    /// byte ceiling, leaving count-only eviction.
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        let capacity = if capacity == 0 { DEFAULT_CAPACITY } else { capacity };
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                capacity,
                max_bytes,
                current_bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                size_evictions: 0,
                view_mode: ViewMode::default(),
                theme: String::new(),
            }),
        }
    }

    /// Look up a rendered line and promote it to most recently used.
    pub fn get(&self, key: &RenderCacheKey) -> Option<Arc<str>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match inner.entries.get(key) {
            Some(entry) => {
                inner.hits += 1;
                Some(Arc::clone(&entry.value))
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Store a rendered line, evicting from the LRU tail as needed.
    ///
    /// Values larger than the whole byte budget are not stored (and replace
    /// nothing: an existing entry for `key` is dropped).
    pub fn put(&self, key: RenderCacheKey, value: impl Into<Arc<str>>) {
        let value = value.into();
        let size = key.entry_size(&value);

        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if inner.max_bytes > 0 && size > inner.max_bytes {
            if let Some(old) = inner.entries.pop(&key) {
                inner.current_bytes -= old.size;
            }
            tracing::trace!(size, max = inner.max_bytes, "render cache: value exceeds byte budget");
            return;
        }

        if let Some(entry) = inner.entries.get_mut(&key) {
            let old_size = entry.size;
            entry.value = value;
            entry.size = size;
            inner.current_bytes = inner.current_bytes - old_size + size;
            // The replaced entry is now most recent, so this never evicts it.
            while inner.over_bytes(0) && inner.evict_one(true) {}
            return;
        }

        loop {
            let over_count = inner.entries.len() >= inner.capacity;
            let over_bytes = inner.over_bytes(size);
            if !over_count && !over_bytes {
                break;
            }
            if !inner.evict_one(over_bytes) {
                break;
            }
        }

        inner.entries.put(key, CacheEntry { value, size });
        inner.current_bytes += size;
    }

    /// Drop every entry. Metrics are kept.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.entries.len();
        inner.clear();
        tracing::debug!(dropped, "render cache cleared");
    }

    pub fn contains(&self, key: &RenderCacheKey) -> bool {
        self.inner.lock().entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn size_bytes(&self) -> usize {
        self.inner.lock().current_bytes
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    pub fn max_bytes(&self) -> usize {
        self.inner.lock().max_bytes
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            size_evictions: inner.size_evictions,
            entries: inner.entries.len(),
            bytes: inner.current_bytes,
        }
    }

    /// Zero the counters without touching the cached lines.
    pub fn reset_stats(&self) {
        let mut inner = self.inner.lock();
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
        inner.size_evictions = 0;
    }

    /// Record the active view mode; clears everything when it changed.
    pub fn set_view_mode(&self, mode: ViewMode) -> bool {
        let mut inner = self.inner.lock();
        if inner.view_mode == mode {
            return false;
        }
        inner.view_mode = mode;
        inner.clear();
        tracing::debug!(?mode, "render cache cleared for view mode change");
        true
    }

    /// Record the active theme; clears everything when it changed.
    pub fn set_theme(&self, theme: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.theme == theme {
            return false;
        }
        inner.theme = theme.to_string();
        inner.clear();
        tracing::debug!(theme, "render cache cleared for theme change");
        true
    }
}

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("RenderCache")
            .field("entries", &stats.entries)
            .field("bytes", &stats.bytes)
            .finish()
    }
}
