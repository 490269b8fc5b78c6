//! Shared test utilities for the emoticon-cache test suite.
//!
//! Provides catalog document builders, encoded image fixtures, and a
//! preconfigured [`Builder`] that work with in-memory assets.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let assets = Arc::new(MemoryAssets::new());
//! assets.insert("emoticons/emoji.xml", catalog_xml(&[
//!     ("source", &[("[smile]", "s1")]),
//! ]));
//! assets.insert("emoticons/source/s1.gif", gif_bytes(3, 8, 8));
//!
//! let resolver = test_builder(assets).build().unwrap();
//! assert!(resolver.resolve_animated("[smile]").is_some());
//! ```

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::gif::GifEncoder;
use image::{Delay, DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::assets::MemoryAssets;
use crate::config::CatalogConfig;
use crate::manager::Builder;

// =========================================================================
// Catalog documents
// =========================================================================

/// Stock catalog settings: `emoticons/emoji.xml`, source group `source`, 20 per page.
pub fn catalog_config() -> CatalogConfig {
    CatalogConfig::default()
}

/// Render a catalog document.
///
/// Each group is `(title, entries)`, each entry `(tag, file)`.
///
/// ```rust
/// catalog_xml(&[
///     ("source", &[("[smile]", "s1"), ("[wave]", "s2")]),
///     ("extra", &[("[party]", "p1")]),
/// ]);
/// ```
pub fn catalog_xml(groups: &[(&str, &[(&str, &str)])]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Emoticons>\n");
    for (title, entries) in groups {
        xml.push_str(&format!("    <Catalog Title=\"{title}\">\n"));
        for (tag, file) in entries.iter() {
            xml.push_str(&format!(
                "        <Emoticon Tag=\"{tag}\" File=\"{file}\" />\n"
            ));
        }
        xml.push_str("    </Catalog>\n");
    }
    xml.push_str("</Emoticons>\n");
    xml
}

// =========================================================================
// Encoded images
// =========================================================================

fn solid(width: u32, height: u32, shade: u8) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([shade, 255 - shade, 128, 255]))
}

/// A `width`x`height` PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(solid(width, height, 40))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// An animated GIF with `frames` frames of `width`x`height`, 100ms each.
pub fn gif_bytes(frames: usize, width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        let frames = (0..frames).map(|i| {
            image::Frame::from_parts(
                solid(width, height, (i * 60 % 256) as u8),
                0,
                0,
                Delay::from_numer_denom_ms(100, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }
    bytes
}

// =========================================================================
// Resolver setup
// =========================================================================

/// Builder over `assets` with a fixed files directory and the real decoder.
pub fn test_builder(assets: Arc<MemoryAssets>) -> Builder {
    Builder::new().assets_arc(assets).files_dir("/tmp/files")
}
