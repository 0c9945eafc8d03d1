use std::path::Path;
use std::sync::{Mutex, PoisonError};

use image::imageops::{self, FilterType};

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::capture_source::CaptureSource;
use crate::shared::content_size::ContentSize;
use crate::shared::pixels::CaptureBuffer;

pub type SizeProvider = Box<dyn Fn() -> ContentSize + Send + Sync>;

/// Sub-rectangle of the image that covers the display area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Samples a still background image, drawn the way it is displayed: scaled to
/// cover the content area and center-cropped.
///
/// Still images are never blank by accident, so white-frame rejection is off.
pub struct StaticImageCaptureSource {
    image: Mutex<Option<CaptureBuffer>>,
    display_size: SizeProvider,
}

impl StaticImageCaptureSource {
    pub fn new(image: CaptureBuffer, display_size: SizeProvider) -> Self {
        Self {
            image: Mutex::new(Some(image)),
            display_size,
        }
    }

    /// Decodes `path` with the `image` crate.
    pub fn open(path: &Path, display_size: SizeProvider) -> Result<Self, CaptureError> {
        let decoded = image::open(path)?.into_rgba8();
        log::debug!(
            "Loaded backdrop image {} ({}x{})",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        Ok(Self::new(decoded, display_size))
    }

    pub fn is_released(&self) -> bool {
        self.image
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Center crop of an `image_w`x`image_h` image matching the aspect ratio of
/// `display`.
pub fn cover_crop(image_w: u32, image_h: u32, display: ContentSize) -> CropRect {
    let src_aspect = image_w as f32 / image_h as f32;
    let dst_aspect = display.width as f32 / display.height as f32;

    if src_aspect > dst_aspect {
        let width = ((image_h as f32 * dst_aspect) as u32).clamp(1, image_w);
        CropRect {
            x: (image_w - width) / 2,
            y: 0,
            width,
            height: image_h,
        }
    } else {
        let height = ((image_w as f32 / dst_aspect) as u32).clamp(1, image_h);
        CropRect {
            x: 0,
            y: (image_h - height) / 2,
            width: image_w,
            height,
        }
    }
}

impl CaptureSource for StaticImageCaptureSource {
    fn size(&self) -> ContentSize {
        (self.display_size)()
    }

    fn capture(&self, target: &mut CaptureBuffer) -> Result<(), CaptureError> {
        let display = self.size();
        if display.is_empty() || target.width() == 0 || target.height() == 0 {
            return Err(CaptureError::NotReady);
        }

        let guard = self.image.lock().unwrap_or_else(PoisonError::into_inner);
        let image = guard.as_ref().ok_or(CaptureError::Released)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::NotReady);
        }

        let crop = cover_crop(image.width(), image.height(), display);
        let cropped = imageops::crop_imm(image, crop.x, crop.y, crop.width, crop.height).to_image();
        let scaled = imageops::resize(&cropped, target.width(), target.height(), FilterType::Triangle);
        target.copy_from_slice(scaled.as_raw());
        Ok(())
    }

    fn reject_likely_white_frame(&self) -> bool {
        false
    }

    fn release(&self) {
        self.image
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
