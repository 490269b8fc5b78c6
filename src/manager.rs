//! Building the resolver and the process-wide instance.
//!
//! Configuration happens exactly once. A [`Builder`] collects settings and
//! collaborators, validates them, loads the catalog, and hands back an
//! immutable [`Resolver`]. Later changes to the builder cannot reach a
//! resolver that has already been built.
//!
//! Hosts that want a single shared instance use [`install`] (fails if one is
//! already installed) or [`get_or_install`] (first caller builds, everyone
//! else waits and shares the result). Both serialize initialization behind
//! one lock, so exactly one catalog load runs even when threads race.
//!
//! ```no_run
//! use emoticon_cache::assets::DirAssets;
//! use emoticon_cache::manager::Builder;
//!
//! let resolver = Builder::new()
//!     .assets(DirAssets::new("assets"))
//!     .cache_max_size(256)
//!     .files_dir("/var/lib/chat")
//!     .build()
//!     .expect("catalog loads");
//! let smile = resolver.resolve_static("[smile]");
//! ```

use crate::assets::AssetProvider;
use crate::catalog::{CatalogError, load_catalog};
use crate::config::{ConfigError, EmoticonConfig};
use crate::imaging::{Decoder, ImageDecoder};
use crate::resolver::{ImageLoader, ResolveEvent, Resolver, ResolverParts};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Collects configuration and collaborators for a [`Resolver`].
pub struct Builder {
    config: EmoticonConfig,
    assets: Option<Arc<dyn AssetProvider>>,
    decoder: Arc<dyn Decoder>,
    image_loader: Option<Arc<dyn ImageLoader>>,
    files_dir: Option<PathBuf>,
    events: Option<Sender<ResolveEvent>>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Builder with stock configuration and the `image`-crate decoder.
    pub fn new() -> Self {
        Self::with_config(EmoticonConfig::default())
    }

    /// Builder starting from a loaded configuration.
    pub fn with_config(config: EmoticonConfig) -> Self {
        Self {
            config,
            assets: None,
            decoder: Arc::new(ImageDecoder::new()),
            image_loader: None,
            files_dir: None,
            events: None,
        }
    }

    /// Catalog root directory inside the asset provider.
    pub fn emoticon_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.catalog.dir = dir.into();
        self
    }

    /// Group whose entries fill the default pages.
    pub fn source_group(mut self, group: impl Into<String>) -> Self {
        self.config.catalog.source_group = group.into();
        self
    }

    /// Catalog document name, relative to the catalog root.
    pub fn config_name(mut self, name: impl Into<String>) -> Self {
        self.config.catalog.config_name = name.into();
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.catalog.page_size = size;
        self
    }

    /// Per-cache capacity in entries. Zero is rejected by [`build`](Self::build).
    pub fn cache_max_size(mut self, entries: usize) -> Self {
        self.config.cache.max_entries = entries;
        self
    }

    pub fn sticker_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.stickers.path = Some(path.into());
        self
    }

    /// Host files directory; stickers default to `<files_dir>/sticker`.
    pub fn files_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.files_dir = Some(dir.into());
        self
    }

    pub fn assets(self, assets: impl AssetProvider + 'static) -> Self {
        self.assets_arc(Arc::new(assets))
    }

    pub fn assets_arc(mut self, assets: Arc<dyn AssetProvider>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn decoder(self, decoder: impl Decoder + 'static) -> Self {
        self.decoder_arc(Arc::new(decoder))
    }

    pub fn decoder_arc(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn image_loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.image_loader = Some(Arc::new(loader));
        self
    }

    /// Channel receiving decode and failure events.
    pub fn events(mut self, tx: Sender<ResolveEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn config(&self) -> &EmoticonConfig {
        &self.config
    }

    /// Validate, load the catalog, and assemble the resolver.
    pub fn build(self) -> Result<Resolver, InitError> {
        self.config.validate()?;
        let capacity = self.config.cache.capacity()?;
        let assets = self
            .assets
            .ok_or(ConfigError::MissingContext("asset provider"))?;
        let sticker_path = self
            .config
            .stickers
            .resolve_path(self.files_dir.as_deref())?;
        let table = load_catalog(assets.as_ref(), &self.config.catalog)?;

        log::debug!(
            "resolver ready: {} tags, {} default slots, cache capacity {}",
            table.len(),
            table.default_count(),
            capacity
        );
        Ok(Resolver::from_parts(ResolverParts {
            config: self.config,
            sticker_path,
            table,
            assets,
            decoder: self.decoder,
            image_loader: self.image_loader,
            capacity,
            events: self.events,
        }))
    }
}

// ============================================================================
// Process-wide instance
// ============================================================================

static GLOBAL: OnceLock<Resolver> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

/// Build and install the process-wide resolver.
///
/// Fails with [`ConfigError::AlreadyInitialized`] if one is already installed;
/// configuration cannot change after first use.
pub fn install(builder: Builder) -> Result<&'static Resolver, InitError> {
    let _guard = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if GLOBAL.get().is_some() {
        return Err(ConfigError::AlreadyInitialized.into());
    }
    let resolver = builder.build()?;
    Ok(GLOBAL.get_or_init(|| resolver))
}

/// Return the installed resolver, building it with `make` if there is none yet.
///
/// `make` runs at most once per process across all threads. A failed build
/// installs nothing, so a later call may try again.
pub fn get_or_install(
    make: impl FnOnce() -> Builder,
) -> Result<&'static Resolver, InitError> {
    if let Some(resolver) = GLOBAL.get() {
        return Ok(resolver);
    }
    let _guard = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(resolver) = GLOBAL.get() {
        return Ok(resolver);
    }
    let resolver = make().build()?;
    Ok(GLOBAL.get_or_init(|| resolver))
}

/// The installed resolver, if any.
pub fn global() -> Option<&'static Resolver> {
    GLOBAL.get()
}
