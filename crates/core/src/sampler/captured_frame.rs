use std::sync::Arc;

use crate::shared::content_size::ContentSize;
use crate::shared::pixels::OpaqueBuffer;

/// Immutable snapshot published after each successful capture.
///
/// Cloning is cheap: the pixels are shared. A newer capture never mutates
/// the pixels of a frame a consumer still holds.
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    image: Arc<OpaqueBuffer>,
    source_size: ContentSize,
    capture_size: ContentSize,
    quality_scale: f32,
    blur_radius_factor: f32,
    version: u64,
}

impl CapturedFrame {
    pub(crate) fn new(
        image: Arc<OpaqueBuffer>,
        source_size: ContentSize,
        quality_scale: f32,
        blur_radius_factor: f32,
        version: u64,
    ) -> Self {
        let capture_size = ContentSize::from(image.dimensions());
        Self {
            image,
            source_size,
            capture_size,
            quality_scale,
            blur_radius_factor,
            version,
        }
    }

    pub fn image(&self) -> &OpaqueBuffer {
        &self.image
    }

    /// Logical size the content is displayed at.
    pub fn source_size(&self) -> ContentSize {
        self.source_size
    }

    /// Size actually sampled.
    pub fn capture_size(&self) -> ContentSize {
        self.capture_size
    }

    /// Capture size over source size.
    pub fn quality_scale(&self) -> f32 {
        self.quality_scale
    }

    /// Multiplier for the user's blur radius.
    pub fn blur_radius_factor(&self) -> f32 {
        self.blur_radius_factor
    }

    /// Strictly increasing across publishes; "same or older" means no new data.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// True if both frames are backed by the same pixel memory.
    pub fn shares_pixels_with(&self, other: &CapturedFrame) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_capture_size_comes_from_image() {
        let frame = CapturedFrame::new(
            Arc::new(RgbImage::new(30, 60)),
            ContentSize::new(100, 200),
            0.3,
            0.78,
            7,
        );
        assert_eq!(frame.capture_size(), ContentSize::new(30, 60));
        assert_eq!(frame.source_size(), ContentSize::new(100, 200));
        assert_eq!(frame.version(), 7);
    }

    #[test]
    fn test_clone_shares_pixels() {
        let frame = CapturedFrame::new(Arc::new(RgbImage::new(2, 2)), ContentSize::new(4, 4), 0.5, 0.5, 1);
        let other = frame.clone();
        assert!(frame.shares_pixels_with(&other));
    }
}
