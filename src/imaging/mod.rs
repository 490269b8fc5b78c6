//! Image decoding and decoded resources — pure Rust.
//!
//! | Concern | Type |
//! |---|---|
//! | **Decode** | [`Decoder`] trait, [`ImageDecoder`] (`image` crate) |
//! | **Still resource** | [`StaticImage`] — releasable RGBA buffer |
//! | **Animated resource** | [`AnimatedImage`] — frames + weak [`FrameCallback`] |
//!
//! The module is split into:
//! - **Decoder**: [`Decoder`] trait + [`DecodeError`]
//! - **Rust decoder**: the production [`ImageDecoder`]
//! - **Resource**: the values the caches own and the resolver hands out

pub mod decoder;
pub mod resource;
pub mod rust_decoder;

pub use decoder::{DecodeError, Decoder};
pub use resource::{AnimatedImage, Frame, FrameCallback, StaticImage};
pub use rust_decoder::ImageDecoder;
