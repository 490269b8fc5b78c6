//! Bounded LRU caches for decoded resources.
//!
//! Decoding an emoticon is cheap once, but a chat screen redraws the same
//! handful of tags constantly. The resolver keeps two independent caches:
//! one for single-frame images ([`StaticCache`]) and one for animations
//! ([`AnimatedCache`]). Both are instances of the generic [`ResourceCache`].
//!
//! # Design
//!
//! ## Capacity
//!
//! Capacity is counted in **entries**, not bytes. Emoticons are small and
//! uniform, and the configured maximum (`cache.max_entries`) bounds each
//! cache separately.
//!
//! ## Eviction releases
//!
//! Values leave a cache in three ways, and each one calls [`Release::release`]
//! exactly once on the departing value:
//!
//! - **Eviction**: inserting past capacity drops the least-recently-used entry.
//! - **Replacement**: `put` under an existing key with a *different* value
//!   (by `Arc` identity). Re-inserting the same `Arc` releases nothing.
//! - **Removal**: [`ResourceCache::remove`] and [`ResourceCache::clear`].
//!
//! For a [`StaticImage`] release frees the pixel buffer; for an
//! [`AnimatedImage`] it detaches the redraw callback.
//!
//! ## Locking
//!
//! Each cache is one `Mutex` around an [`lru::LruCache`]. `get` needs the
//! lock too, because a hit reorders the recency list. Releases run while the
//! lock is held, so no other caller can fetch a value from its slot while
//! it is being released.

use crate::imaging::{AnimatedImage, StaticImage};
use lru::LruCache;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

/// Side effect applied to a value when its cache slot lets go of it.
pub trait Release {
    fn release(&self);
}

/// Cache of single-frame images keyed by asset path.
pub type StaticCache = ResourceCache<StaticImage>;

/// Cache of animations keyed by asset path.
pub type AnimatedCache = ResourceCache<AnimatedImage>;

struct Slots<V> {
    lru: LruCache<String, Arc<V>>,
    stats: CacheStats,
}

impl<V: Release> Slots<V> {
    /// Push `value` under `key`, releasing whatever the push displaced.
    fn push(&mut self, key: String, value: Arc<V>) {
        let Some((old_key, old_value)) = self.lru.push(key.clone(), value.clone()) else {
            return;
        };
        if old_key == key {
            if !Arc::ptr_eq(&old_value, &value) {
                log::debug!("cache replace {key}");
                old_value.release();
                self.stats.replacement();
            }
        } else {
            log::debug!("cache evict {old_key}");
            old_value.release();
            self.stats.eviction();
        }
    }
}

/// A thread-safe LRU cache from asset path to a shared, releasable value.
pub struct ResourceCache<V: Release> {
    slots: Mutex<Slots<V>>,
}

impl<V: Release> ResourceCache<V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: Mutex::new(Slots {
                lru: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots<V>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `path`, marking it most-recently-used on a hit.
    pub fn get(&self, path: &str) -> Option<Arc<V>> {
        let mut slots = self.lock();
        let hit = slots.lru.get(path).cloned();
        match hit {
            Some(_) => slots.stats.hit(),
            None => slots.stats.miss(),
        }
        hit
    }

    /// Insert or replace the value at `path` and return the stored value.
    pub fn put(&self, path: impl Into<String>, value: Arc<V>) -> Arc<V> {
        self.lock().push(path.into(), value.clone());
        value
    }

    /// Insert `value` unless `path` is already cached; return whichever value
    /// the cache holds afterwards.
    ///
    /// Two callers that decoded the same asset concurrently both end up with
    /// the first stored value.
    pub fn put_if_absent(&self, path: impl Into<String>, value: Arc<V>) -> Arc<V> {
        let path = path.into();
        let mut slots = self.lock();
        if let Some(existing) = slots.lru.get(&path) {
            return existing.clone();
        }
        slots.push(path, value.clone());
        value
    }

    /// Remove and release the value at `path`.
    pub fn remove(&self, path: &str) -> bool {
        let mut slots = self.lock();
        match slots.lru.pop(path) {
            Some(value) => {
                value.release();
                true
            }
            None => false,
        }
    }

    /// Remove and release every value, least-recently-used first.
    pub fn clear(&self) {
        let mut slots = self.lock();
        while let Some((_, value)) = slots.lru.pop_lru() {
            value.release();
        }
    }

    /// Whether `path` is cached, without touching its recency.
    pub fn contains(&self, path: &str) -> bool {
        self.lock().lru.contains(path)
    }

    pub fn len(&self) -> usize {
        self.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().lru.cap().get()
    }

    /// Cached keys, most-recently-used first.
    pub fn keys(&self) -> Vec<String> {
        self.lock().lru.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}

/// Counters describing how a cache has been used.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub replacements: u64,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits = self.hits.saturating_add(1);
    }

    pub fn miss(&mut self) {
        self.misses = self.misses.saturating_add(1);
    }

    pub fn eviction(&mut self) {
        self.evictions = self.evictions.saturating_add(1);
    }

    pub fn replacement(&mut self) {
        self.replacements = self.replacements.saturating_add(1);
    }

    pub fn lookups(&self) -> u64 {
        self.hits.saturating_add(self.misses)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits, {} misses ({} lookups)",
            self.hits,
            self.misses,
            self.lookups()
        )?;
        if self.evictions > 0 || self.replacements > 0 {
            write!(
                f,
                ", {} evicted, {} replaced",
                self.evictions, self.replacements
            )?;
        }
        Ok(())
    }
}
