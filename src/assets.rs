//! Asset byte-stream providers.
//!
//! The catalog and every image are read through an [`AssetProvider`], keyed by
//! slash-separated asset paths such as `emoticons/source/s1.png`. The
//! resolver never touches the filesystem itself; hosts plug in whatever
//! storage backs their bundle.
//!
//! Two providers ship with the crate:
//!
//! - [`DirAssets`] — a directory on disk acts as the asset root.
//! - [`MemoryAssets`] — an in-memory map, writable at runtime. Useful for
//!   embedding the bundle with `include_bytes!` and for tests.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl AssetError {
    fn io(path: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            AssetError::NotFound(path.to_string())
        } else {
            AssetError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// Read-only access to bundled assets.
pub trait AssetProvider: Send + Sync {
    /// Open the asset at `path` for reading.
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, AssetError>;

    /// List the file names directly under `dir`.
    fn list(&self, dir: &str) -> Result<Vec<String>, AssetError>;

    /// Whether an asset exists at `path`, decided by listing its directory.
    fn exists(&self, path: &str) -> bool {
        let (dir, name) = split_asset_path(path);
        self.list(dir)
            .map(|names| names.iter().any(|n| n == name))
            .unwrap_or(false)
    }
}

/// Read an asset fully into memory.
pub fn read_asset(provider: &dyn AssetProvider, path: &str) -> Result<Vec<u8>, AssetError> {
    let mut reader = provider.open(path)?;
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| AssetError::io(path, e))?;
    Ok(bytes)
}

/// Split `a/b/c.png` into (`a/b`, `c.png`). Paths without a slash live in the root (`""`).
pub fn split_asset_path(path: &str) -> (&str, &str) {
    let path = path.trim_matches('/');
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

// ============================================================================
// Directory-backed provider
// ============================================================================

/// Asset provider rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty() && *part != "..")
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl AssetProvider for DirAssets {
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, AssetError> {
        let file = fs::File::open(self.resolve(path)).map_err(|e| AssetError::io(path, e))?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn list(&self, dir: &str) -> Result<Vec<String>, AssetError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.resolve(dir)).map_err(|e| AssetError::io(dir, e))? {
            let entry = entry.map_err(|e| AssetError::io(dir, e))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

// ============================================================================
// In-memory provider
// ============================================================================

/// Asset provider backed by an in-memory map of path → bytes.
///
/// Writable after construction, so assets can appear (or be repaired) while
/// a resolver is already serving.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the asset at `path`.
    pub fn insert(&self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let path = path.into().trim_matches('/').to_string();
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, bytes.into());
    }

    /// Remove the asset at `path`, returning whether it existed.
    pub fn remove(&self, path: &str) -> bool {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path.trim_matches('/'))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetProvider for MemoryAssets {
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, AssetError> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files
            .get(path.trim_matches('/'))
            .map(|bytes| Box::new(Cursor::new(bytes.clone())) as Box<dyn Read + Send>)
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }

    fn list(&self, dir: &str) -> Result<Vec<String>, AssetError> {
        let dir = dir.trim_matches('/');
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        Ok(files
            .keys()
            .filter_map(|key| {
                let (parent, name) = split_asset_path(key);
                (parent == dir).then(|| name.to_string())
            })
            .collect())
    }
}
