//! Decoded image resources handed out by the resolver.
//!
//! - [`StaticImage`] — one decoded RGBA frame. Its pixel buffer can be
//!   released by the owning cache; holders of an `Arc` keep the metadata but
//!   see no pixels afterwards.
//! - [`AnimatedImage`] — all frames of an animation plus a non-owning
//!   [`FrameCallback`] that a display widget attaches to get redraw requests
//!   when the frame advances.

use crate::cache::Release;
use image::RgbaImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

/// One decoded frame of an animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub image: RgbaImage,
    /// How long the frame stays on screen before the next one.
    pub delay: Duration,
}

impl Frame {
    pub fn new(image: RgbaImage, delay: Duration) -> Self {
        Self { image, delay }
    }
}

// ============================================================================
// Static
// ============================================================================

/// A single decoded frame, keyed by the asset path it came from.
#[derive(Debug)]
pub struct StaticImage {
    path: String,
    width: u32,
    height: u32,
    pixels: RwLock<Option<RgbaImage>>,
}

impl StaticImage {
    pub fn new(path: impl Into<String>, pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            path: path.into(),
            width,
            height,
            pixels: RwLock::new(Some(pixels)),
        }
    }

    /// Cache key this image was resolved under.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the pixel buffer in bytes, or 0 once released.
    pub fn byte_size(&self) -> usize {
        self.pixels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |p| p.as_raw().len())
    }

    pub fn is_released(&self) -> bool {
        self.pixels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Run `f` against the pixels; `None` if the buffer has been released.
    pub fn with_pixels<R>(&self, f: impl FnOnce(&RgbaImage) -> R) -> Option<R> {
        self.pixels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

impl Release for StaticImage {
    fn release(&self) {
        let freed = self
            .pixels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if freed.is_some() {
            log::debug!("released pixels of {}", self.path);
        }
    }
}

// ============================================================================
// Animated
// ============================================================================

/// Receiver of redraw requests from an [`AnimatedImage`].
pub trait FrameCallback: Send + Sync {
    /// The image moved to a new frame and should be redrawn.
    fn invalidate(&self, image: &AnimatedImage);
}

/// A decoded animation with a weakly held redraw callback.
pub struct AnimatedImage {
    path: String,
    frames: Vec<Frame>,
    current: AtomicUsize,
    callback: Mutex<Option<Weak<dyn FrameCallback>>>,
}

impl std::fmt::Debug for AnimatedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatedImage")
            .field("path", &self.path)
            .field("frames", &self.frames.len())
            .field("current", &self.current_index())
            .field("has_callback", &self.has_callback())
            .finish()
    }
}

impl AnimatedImage {
    /// `frames` must not be empty; decoders reject frameless input.
    pub fn new(path: impl Into<String>, frames: Vec<Frame>) -> Self {
        debug_assert!(!frames.is_empty(), "animation without frames");
        Self {
            path: path.into(),
            frames,
            current: AtomicUsize::new(0),
            callback: Mutex::new(None),
        }
    }

    /// Cache key this animation was resolved under.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.current_index())
    }

    /// Total duration of one loop.
    pub fn duration(&self) -> Duration {
        self.frames.iter().map(|f| f.delay).sum()
    }

    /// Attach the redraw callback. Only a weak reference is kept.
    pub fn set_callback(&self, callback: &Arc<dyn FrameCallback>) {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::downgrade(callback));
    }

    /// Detach the redraw callback; no further redraw requests are delivered.
    pub fn clear_callback(&self) {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Whether a callback is attached and still alive.
    pub fn has_callback(&self) -> bool {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Step to the next frame (wrapping) and ask the callback to redraw.
    ///
    /// Returns the new frame index.
    pub fn advance(&self) -> usize {
        let len = self.frames.len().max(1);
        let step = |i: usize| Some((i + 1) % len);
        let next = match self.current.fetch_update(Ordering::AcqRel, Ordering::Acquire, step) {
            Ok(prev) | Err(prev) => (prev + 1) % len,
        };

        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade);
        if let Some(callback) = callback {
            callback.invalidate(self);
        }
        next
    }
}

impl Release for AnimatedImage {
    fn release(&self) {
        self.clear_callback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixels(w: u32, h: u32) -> RgbaImage {
        RgbaImage::new(w, h)
    }

    fn frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|_| Frame::new(pixels(2, 2), Duration::from_millis(100)))
            .collect()
    }

    #[derive(Default)]
    struct CountingCallback {
        calls: AtomicUsize,
    }

    impl FrameCallback for CountingCallback {
        fn invalidate(&self, _image: &AnimatedImage) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    // =========================================================================
    // StaticImage
    // =========================================================================

    #[test]
    fn static_image_reports_dimensions_and_size() {
        let img = StaticImage::new("e/source/s1", pixels(4, 3));
        assert_eq!(img.path(), "e/source/s1");
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.byte_size(), 4 * 3 * 4);
        assert!(!img.is_released());
    }

    #[test]
    fn static_image_release_drops_pixels() {
        let img = StaticImage::new("p", pixels(4, 4));
        img.release();
        assert!(img.is_released());
        assert_eq!(img.byte_size(), 0);
        assert_eq!(img.with_pixels(|p| p.width()), None);
        // Dimensions survive for layout.
        assert_eq!(img.dimensions(), (4, 4));
    }

    #[test]
    fn static_image_release_twice_is_harmless() {
        let img = StaticImage::new("p", pixels(1, 1));
        img.release();
        img.release();
        assert!(img.is_released());
    }

    // =========================================================================
    // AnimatedImage
    // =========================================================================

    #[test]
    fn advance_wraps_and_notifies() {
        let anim = AnimatedImage::new("e/source/a", frames(3));
        let cb = Arc::new(CountingCallback::default());
        let dyn_cb: Arc<dyn FrameCallback> = cb.clone();
        anim.set_callback(&dyn_cb);

        assert_eq!(anim.advance(), 1);
        assert_eq!(anim.advance(), 2);
        assert_eq!(anim.advance(), 0);
        assert_eq!(cb.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cleared_callback_gets_no_redraws() {
        let anim = AnimatedImage::new("a", frames(2));
        let cb = Arc::new(CountingCallback::default());
        let dyn_cb: Arc<dyn FrameCallback> = cb.clone();
        anim.set_callback(&dyn_cb);
        assert!(anim.has_callback());

        anim.release();
        assert!(!anim.has_callback());
        anim.advance();
        assert_eq!(cb.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn callback_is_not_kept_alive_by_image() {
        let anim = AnimatedImage::new("a", frames(2));
        let dyn_cb: Arc<dyn FrameCallback> = Arc::new(CountingCallback::default());
        anim.set_callback(&dyn_cb);
        drop(dyn_cb);
        assert!(!anim.has_callback());
        // Advancing with a dead callback is a no-op for notifications.
        assert_eq!(anim.advance(), 1);
    }

    #[test]
    fn concurrent_advances_are_not_lost() {
        let anim = AnimatedImage::new("a", frames(7));
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        anim.advance();
                    }
                });
            }
        });
        assert_eq!(anim.current_index(), 800 % 7);
    }

    #[test]
    fn duration_sums_frame_delays() {
        let anim = AnimatedImage::new("a", frames(4));
        assert_eq!(anim.duration(), Duration::from_millis(400));
        assert_eq!(anim.frame_count(), 4);
        assert_eq!(anim.current_frame().unwrap().image.dimensions(), (2, 2));
    }
}
