//! Decoder trait and shared error type.
//!
//! The [`Decoder`] trait defines the three operations the resolver needs:
//! decode a still image, decode a full animation, and decode only the first
//! frame of an animation.
//!
//! The production implementation is
//! [`ImageDecoder`](super::rust_decoder::ImageDecoder), built on the `image`
//! crate.

use super::resource::Frame;
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Corrupt or unsupported image: {0}")]
    Corrupt(String),
    #[error("Image contains no frames")]
    NoFrames,
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        DecodeError::Corrupt(err.to_string())
    }
}

/// Trait for image decoders.
///
/// Implementations only turn bytes into pixels; caching and the choice of
/// which asset to decode belong to the resolver.
pub trait Decoder: Send + Sync {
    /// Decode a single-frame image.
    fn decode_static(&self, bytes: &[u8]) -> Result<RgbaImage, DecodeError>;

    /// Decode every frame of an animation.
    fn decode_animated(&self, bytes: &[u8]) -> Result<Vec<Frame>, DecodeError>;

    /// Decode only the first frame of an animation.
    fn decode_first_frame(&self, bytes: &[u8]) -> Result<RgbaImage, DecodeError>;
}
