//! Tag → image resolution.
//!
//! The [`Resolver`] owns the loaded [`EntryTable`], both resource caches, and
//! the collaborators that read and decode assets. It is built once by the
//! [`Builder`](crate::manager::Builder); an instance only exists after the
//! catalog loaded successfully.
//!
//! ## Resolution order
//!
//! `resolve_static` tries an ordered list of [`StaticSource`] strategies and
//! stops at the first whose asset exists:
//!
//! ```text
//! 1. Still               <path>.png   full decode
//! 2. FirstAnimatedFrame  <path>.gif   first frame only
//! ```
//!
//! The second strategy keeps memory bounded when a message shows many
//! animated tags at once: only one frame is materialized. Full animations are
//! decoded only by `resolve_animated`, always from `<path>.gif`.
//!
//! ## Failures
//!
//! A missing or corrupt asset never poisons a tag. The `resolve_*` methods
//! return `None`, log a warning, and send [`ResolveEvent::Failed`] to the
//! optional event channel. Nothing is cached for a failure, so a later call
//! retries from scratch. The `try_resolve_*` variants return the typed
//! [`ResolveError`] instead.

use crate::assets::{AssetError, AssetProvider, read_asset};
use crate::cache::{AnimatedCache, StaticCache};
use crate::catalog::{Entry, EntryTable};
use crate::config::EmoticonConfig;
use crate::imaging::{AnimatedImage, DecodeError, Decoder, StaticImage};
use crate::tags::{self, Segment};
use image::RgbaImage;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Extension of animated assets.
pub const ANIMATED_EXTENSION: &str = "gif";
/// Extension of still assets.
pub const STILL_EXTENSION: &str = "png";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: DecodeError,
    },
    #[error("No image loader configured for stickers")]
    NoImageLoader,
    #[error("Invalid sticker name {0:?}: must be a plain file name")]
    InvalidStickerName(String),
}

/// Which cache and decode path a resolution went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Static,
    Animated,
    Sticker,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Static => "static",
            ResourceKind::Animated => "animated",
            ResourceKind::Sticker => "sticker",
        })
    }
}

/// Progress reported on the optional event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveEvent {
    /// A cache miss was filled by decoding `path`.
    Decoded { path: String, kind: ResourceKind },
    /// Resolving `tag` failed; the result was `None` and nothing was cached.
    Failed {
        tag: String,
        path: String,
        kind: ResourceKind,
        error: String,
    },
}

/// Loads sticker bytes from outside the bundled catalog (e.g. a download directory).
pub trait ImageLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<u8>, AssetError>;
}

/// Loader reading stickers straight from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load(&self, path: &Path) -> Result<Vec<u8>, AssetError> {
        std::fs::read(path).map_err(|e| {
            let display = path.display().to_string();
            if e.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(display)
            } else {
                AssetError::Io {
                    path: display,
                    source: e,
                }
            }
        })
    }
}

/// One step of the static fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticSource {
    /// A still image decoded in full.
    Still,
    /// The first frame of the animated asset.
    FirstAnimatedFrame,
}

impl StaticSource {
    /// Strategies in the order they are tried.
    pub const ORDER: [StaticSource; 2] = [StaticSource::Still, StaticSource::FirstAnimatedFrame];

    pub fn extension(self) -> &'static str {
        match self {
            StaticSource::Still => STILL_EXTENSION,
            StaticSource::FirstAnimatedFrame => ANIMATED_EXTENSION,
        }
    }

    pub fn asset_path(self, path: &str) -> String {
        format!("{}.{}", path, self.extension())
    }

    fn decode(self, decoder: &dyn Decoder, bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
        match self {
            StaticSource::Still => decoder.decode_static(bytes),
            StaticSource::FirstAnimatedFrame => decoder.decode_first_frame(bytes),
        }
    }
}

/// Resolves tags to cached image resources.
pub struct Resolver {
    config: EmoticonConfig,
    sticker_path: PathBuf,
    table: EntryTable,
    assets: Arc<dyn AssetProvider>,
    decoder: Arc<dyn Decoder>,
    image_loader: Option<Arc<dyn ImageLoader>>,
    static_cache: StaticCache,
    animated_cache: AnimatedCache,
    events: Option<Sender<ResolveEvent>>,
}

/// Everything a [`Resolver`] is assembled from.
pub(crate) struct ResolverParts {
    pub config: EmoticonConfig,
    pub sticker_path: PathBuf,
    pub table: EntryTable,
    pub assets: Arc<dyn AssetProvider>,
    pub decoder: Arc<dyn Decoder>,
    pub image_loader: Option<Arc<dyn ImageLoader>>,
    pub capacity: std::num::NonZeroUsize,
    pub events: Option<Sender<ResolveEvent>>,
}

impl Resolver {
    pub(crate) fn from_parts(parts: ResolverParts) -> Self {
        Self {
            config: parts.config,
            sticker_path: parts.sticker_path,
            table: parts.table,
            assets: parts.assets,
            decoder: parts.decoder,
            image_loader: parts.image_loader,
            static_cache: StaticCache::new(parts.capacity),
            animated_cache: AnimatedCache::new(parts.capacity),
            events: parts.events,
        }
    }

    pub fn config(&self) -> &EmoticonConfig {
        &self.config
    }

    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    pub fn static_cache(&self) -> &StaticCache {
        &self.static_cache
    }

    pub fn animated_cache(&self) -> &AnimatedCache {
        &self.animated_cache
    }

    pub fn sticker_path(&self) -> &Path {
        &self.sticker_path
    }

    pub fn image_loader(&self) -> Option<&Arc<dyn ImageLoader>> {
        self.image_loader.as_ref()
    }

    // ========================================================================
    // Catalog queries
    // ========================================================================

    /// Catalog entry for `tag`. Unknown tags and placeholders yield `None`.
    pub fn lookup(&self, tag: &str) -> Option<&Entry> {
        self.table.get(tag).filter(|e| !e.is_placeholder())
    }

    /// Length of the padded default sequence (a multiple of the page size).
    pub fn default_entry_count(&self) -> usize {
        self.table.default_count()
    }

    /// Tag text of the default entry at `index`; `Some("")` for padding.
    pub fn default_entry_text(&self, index: usize) -> Option<&str> {
        self.table.default_text(index)
    }

    pub fn page_count(&self) -> usize {
        self.table.page_count()
    }

    pub fn page(&self, index: usize) -> &[Entry] {
        self.table.page(index)
    }

    /// The compiled tag pattern, for callers splitting message text.
    pub fn tag_pattern(&self) -> &'static Regex {
        tags::tag_pattern()
    }

    /// Split `text` into literal and tag segments.
    pub fn split<'t>(&self, text: &'t str) -> Vec<Segment<'t>> {
        tags::split_tags(text)
    }

    // ========================================================================
    // Static resolution
    // ========================================================================

    /// Single-frame image for `tag`, or `None` if unknown or unloadable.
    pub fn resolve_static(&self, tag: &str) -> Option<Arc<StaticImage>> {
        self.try_resolve_static(tag)
            .unwrap_or_else(|err| self.report(tag, ResourceKind::Static, err))
    }

    /// Like [`resolve_static`](Self::resolve_static), surfacing the failure.
    pub fn try_resolve_static(&self, tag: &str) -> Result<Option<Arc<StaticImage>>, ResolveError> {
        let Some(entry) = self.lookup(tag) else {
            return Ok(None);
        };
        if let Some(hit) = self.static_cache.get(&entry.path) {
            return Ok(Some(hit));
        }
        let decoded = Arc::new(self.load_static(&entry.path)?);
        self.emit(ResolveEvent::Decoded {
            path: entry.path.clone(),
            kind: ResourceKind::Static,
        });
        Ok(Some(
            self.static_cache.put_if_absent(entry.path.clone(), decoded),
        ))
    }

    /// Static image for the default entry at `index`. Padding yields `None`.
    pub fn resolve_display_static(&self, index: usize) -> Option<Arc<StaticImage>> {
        let text = self.default_entry_text(index)?;
        self.resolve_static(text)
    }

    fn load_static(&self, path: &str) -> Result<StaticImage, ResolveError> {
        for source in StaticSource::ORDER {
            let asset = source.asset_path(path);
            if !self.assets.exists(&asset) {
                continue;
            }
            let bytes = read_asset(self.assets.as_ref(), &asset)?;
            let pixels = source
                .decode(self.decoder.as_ref(), &bytes)
                .map_err(|source| ResolveError::Decode {
                    path: asset.clone(),
                    source,
                })?;
            return Ok(StaticImage::new(path, pixels));
        }
        Err(AssetError::NotFound(format!(
            "{path}.{STILL_EXTENSION} or {path}.{ANIMATED_EXTENSION}"
        ))
        .into())
    }

    /// Decode the static images of default page `index` ahead of display.
    ///
    /// Entries resolve in parallel; returns how many resolved.
    pub fn preload_page(&self, index: usize) -> usize {
        self.page(index)
            .par_iter()
            .filter(|e| !e.is_placeholder())
            .filter(|e| self.resolve_static(&e.text).is_some())
            .count()
    }

    // ========================================================================
    // Animated resolution
    // ========================================================================

    /// Full animation for `tag`, or `None` if unknown or unloadable.
    pub fn resolve_animated(&self, tag: &str) -> Option<Arc<AnimatedImage>> {
        self.try_resolve_animated(tag)
            .unwrap_or_else(|err| self.report(tag, ResourceKind::Animated, err))
    }

    /// Like [`resolve_animated`](Self::resolve_animated), surfacing the failure.
    pub fn try_resolve_animated(
        &self,
        tag: &str,
    ) -> Result<Option<Arc<AnimatedImage>>, ResolveError> {
        let Some(entry) = self.lookup(tag) else {
            return Ok(None);
        };
        if let Some(hit) = self.animated_cache.get(&entry.path) {
            return Ok(Some(hit));
        }
        let asset = format!("{}.{}", entry.path, ANIMATED_EXTENSION);
        let bytes = read_asset(self.assets.as_ref(), &asset)?;
        let frames = self
            .decoder
            .decode_animated(&bytes)
            .map_err(|source| ResolveError::Decode {
                path: asset.clone(),
                source,
            })?;
        let decoded = Arc::new(AnimatedImage::new(entry.path.clone(), frames));
        self.emit(ResolveEvent::Decoded {
            path: entry.path.clone(),
            kind: ResourceKind::Animated,
        });
        Ok(Some(
            self.animated_cache
                .put_if_absent(entry.path.clone(), decoded),
        ))
    }

    // ========================================================================
    // Stickers
    // ========================================================================

    /// Static image for a downloaded sticker `<sticker_path>/<name>`.
    ///
    /// `name` must be a single file name; absolute paths, separators, and
    /// `.`/`..` are rejected so lookups stay inside the sticker directory.
    pub fn resolve_sticker(&self, name: &str) -> Option<Arc<StaticImage>> {
        self.try_resolve_sticker(name)
            .unwrap_or_else(|err| self.report(name, ResourceKind::Sticker, err))
    }

    pub fn try_resolve_sticker(&self, name: &str) -> Result<Option<Arc<StaticImage>>, ResolveError> {
        let path = self.sticker_file(name)?;
        let key = path.to_string_lossy().into_owned();
        if let Some(hit) = self.static_cache.get(&key) {
            return Ok(Some(hit));
        }
        let loader = self.image_loader.as_ref().ok_or(ResolveError::NoImageLoader)?;
        let bytes = loader.load(&path)?;
        let pixels = self
            .decoder
            .decode_static(&bytes)
            .map_err(|source| ResolveError::Decode {
                path: key.clone(),
                source,
            })?;
        let decoded = Arc::new(StaticImage::new(key.clone(), pixels));
        self.emit(ResolveEvent::Decoded {
            path: key.clone(),
            kind: ResourceKind::Sticker,
        });
        Ok(Some(self.static_cache.put_if_absent(key, decoded)))
    }

    fn sticker_file(&self, name: &str) -> Result<PathBuf, ResolveError> {
        let mut parts = Path::new(name).components();
        match (parts.next(), parts.next()) {
            (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => {
                Ok(self.sticker_path.join(name))
            }
            _ => Err(ResolveError::InvalidStickerName(name.to_string())),
        }
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    fn report<T>(&self, tag: &str, kind: ResourceKind, err: ResolveError) -> Option<T> {
        let path = match kind {
            ResourceKind::Sticker => self
                .sticker_file(tag)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            _ => self
                .lookup(tag)
                .map(|e| e.path.clone())
                .unwrap_or_default(),
        };
        log::warn!("{kind} resolution of {tag:?} failed: {err}");
        self.emit(ResolveEvent::Failed {
            tag: tag.to_string(),
            path,
            kind,
            error: err.to_string(),
        });
        None
    }

    fn emit(&self, event: ResolveEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening anymore.
            let _ = tx.send(event);
        }
    }
}
