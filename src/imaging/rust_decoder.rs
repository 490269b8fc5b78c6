//! Pure Rust decoder built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Still image (PNG, JPEG, WebP, GIF) | `image::load_from_memory` |
//! | Animation (GIF) | `GifDecoder` + `AnimationDecoder::into_frames` |
//! | Animation (WebP) | `WebPDecoder` + `AnimationDecoder::into_frames` |
//! | First frame | the same frame iterators, stopped after one frame |
//!
//! Formats without animation support decode to a single frame with zero
//! delay, so a still asset can stand in where an animation is requested.

use super::decoder::{DecodeError, Decoder};
use super::resource::Frame;
use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Frames, ImageFormat, RgbaImage};
use std::io::Cursor;
use std::time::Duration;

/// Production decoder using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn new() -> Self {
        Self
    }
}

fn collect_frames(frames: Frames<'_>) -> Result<Vec<Frame>, DecodeError> {
    let frames = frames
        .map(|frame| {
            let frame = frame?;
            let delay = Duration::from(frame.delay());
            Ok(Frame::new(frame.into_buffer(), delay))
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;
    if frames.is_empty() {
        return Err(DecodeError::NoFrames);
    }
    Ok(frames)
}

fn first_of(mut frames: Frames<'_>) -> Result<RgbaImage, DecodeError> {
    let frame = frames.next().ok_or(DecodeError::NoFrames)??;
    Ok(frame.into_buffer())
}

impl Decoder for ImageDecoder {
    fn decode_static(&self, bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
        Ok(image::load_from_memory(bytes)?.to_rgba8())
    }

    fn decode_animated(&self, bytes: &[u8]) -> Result<Vec<Frame>, DecodeError> {
        match image::guess_format(bytes)? {
            ImageFormat::Gif => collect_frames(GifDecoder::new(Cursor::new(bytes))?.into_frames()),
            ImageFormat::WebP => {
                let decoder = WebPDecoder::new(Cursor::new(bytes))?;
                if decoder.has_animation() {
                    collect_frames(decoder.into_frames())
                } else {
                    Ok(vec![Frame::new(self.decode_static(bytes)?, Duration::ZERO)])
                }
            }
            _ => Ok(vec![Frame::new(self.decode_static(bytes)?, Duration::ZERO)]),
        }
    }

    fn decode_first_frame(&self, bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
        match image::guess_format(bytes)? {
            ImageFormat::Gif => first_of(GifDecoder::new(Cursor::new(bytes))?.into_frames()),
            ImageFormat::WebP => {
                let decoder = WebPDecoder::new(Cursor::new(bytes))?;
                if decoder.has_animation() {
                    first_of(decoder.into_frames())
                } else {
                    self.decode_static(bytes)
                }
            }
            _ => self.decode_static(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gif_bytes, png_bytes};

    #[test]
    fn decode_static_png() {
        let img = ImageDecoder.decode_static(&png_bytes(5, 3)).unwrap();
        assert_eq!(img.dimensions(), (5, 3));
    }

    #[test]
    fn decode_animated_gif_keeps_every_frame() {
        let frames = ImageDecoder.decode_animated(&gif_bytes(4, 6, 6)).unwrap();
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.image.dimensions() == (6, 6)));
        assert_eq!(frames[0].delay, Duration::from_millis(100));
    }

    #[test]
    fn decode_first_frame_of_gif() {
        let img = ImageDecoder.decode_first_frame(&gif_bytes(3, 8, 4)).unwrap();
        assert_eq!(img.dimensions(), (8, 4));
    }

    #[test]
    fn decode_animated_still_png_is_single_frame() {
        let frames = ImageDecoder.decode_animated(&png_bytes(2, 2)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].delay, Duration::ZERO);
    }

    #[test]
    fn decode_first_frame_of_png_falls_back_to_still() {
        let img = ImageDecoder.decode_first_frame(&png_bytes(7, 1)).unwrap();
        assert_eq!(img.dimensions(), (7, 1));
    }

    #[test]
    fn garbage_is_corrupt() {
        assert!(matches!(
            ImageDecoder.decode_static(b"definitely not an image"),
            Err(DecodeError::Corrupt(_))
        ));
        assert!(ImageDecoder.decode_animated(b"GIF89a broken").is_err());
    }
}
