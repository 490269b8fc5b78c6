//! # Emoticon Cache
//!
//! Resolves short bracketed tags like `[smile]` to decoded emoticon images.
//! A bundled XML catalog maps every tag to an asset path; the still and
//! animated renditions of that asset are decoded on first use and kept in
//! bounded LRU caches.
//!
//! # Lifecycle
//!
//! ```text
//! 1. Build     Builder  →  Resolver      (config + assets → loaded catalog)
//! 2. Resolve   tag      →  Arc<image>    (cache hit, or decode and insert)
//! 3. Evict     LRU full →  release       (pixels dropped, callbacks detached)
//! ```
//!
//! A [`Resolver`] only exists once its catalog has loaded, so every query on
//! it runs against a complete table. The catalog is immutable after load;
//! only the two caches change, each behind its own lock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manager`] | [`Builder`], one-time configuration, and the process-wide instance |
//! | [`resolver`] | Tag → image resolution, static fallback chain, stickers, events |
//! | [`catalog`] | XML catalog parsing into an [`EntryTable`] |
//! | [`paging`] | Padding the default sequence to whole pages |
//! | [`cache`] | Thread-safe LRU resource cache with release-on-evict |
//! | [`imaging`] | Decoding (`image` crate) and the decoded resource types |
//! | [`tags`] | The tag pattern and message splitting |
//! | [`assets`] | Read-only asset providers: directory or in-memory |
//! | [`config`] | `emoticons.toml` loading, validation, and merging |
//! | [`check`] | Whole-catalog validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Two Caches, One Capacity
//!
//! Still images and animations live in separate caches sized by the same
//! `max_entries` setting. A screen full of animated tags should not push the
//! cheap still previews out, and vice versa. Capacity counts entries, not
//! bytes: emoticons are small and uniform enough that a count is predictable.
//!
//! ## Release on Eviction
//!
//! Callers receive `Arc` handles, so an evicted resource can still be in use
//! somewhere. Eviction therefore releases it explicitly: a still image drops
//! its pixel buffer and an animation detaches its redraw callback. A holder
//! of a stale handle sees a released resource instead of a cache that keeps
//! growing behind its back.
//!
//! ## Failures Are Not Cached
//!
//! A missing or corrupt asset resolves to `None` and is reported through
//! `log` and the optional event channel. Nothing is remembered, so fixing
//! the asset fixes the tag without a restart.

pub mod assets;
pub mod cache;
pub mod catalog;
pub mod check;
pub mod config;
pub mod imaging;
pub mod manager;
pub mod output;
pub mod paging;
pub mod resolver;
pub mod tags;

pub use catalog::{Entry, EntryTable};
pub use manager::{Builder, InitError};
pub use resolver::{ResolveError, ResolveEvent, Resolver, ResourceKind};

#[cfg(test)]
pub(crate) mod test_helpers;
