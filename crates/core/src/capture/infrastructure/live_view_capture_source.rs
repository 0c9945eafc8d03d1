use std::sync::Arc;

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::capture_source::CaptureSource;
use crate::capture::domain::content_surface::ContentSurface;
use crate::shared::content_size::ContentSize;
use crate::shared::pixels::CaptureBuffer;

/// Provider for the view being sampled; `None` while it is detached.
pub type ViewProvider = Box<dyn Fn() -> Option<Arc<dyn ContentSurface>> + Send + Sync>;

/// Samples a live view by drawing its current content scaled into the target.
///
/// Cheap and synchronous, but a view that has not rendered yet may hand back
/// a blank surface, so white-frame rejection is on by default.
pub struct LiveViewCaptureSource {
    view: ViewProvider,
    reject_white: bool,
}

impl LiveViewCaptureSource {
    pub fn new(view: ViewProvider, reject_white: bool) -> Self {
        Self { view, reject_white }
    }

    /// Source over a fixed surface with white-frame rejection enabled.
    pub fn for_surface(surface: Arc<dyn ContentSurface>) -> Self {
        Self::new(Box::new(move || Some(surface.clone())), true)
    }
}

impl CaptureSource for LiveViewCaptureSource {
    fn size(&self) -> ContentSize {
        (self.view)().map(|v| v.size()).unwrap_or(ContentSize::ZERO)
    }

    fn capture(&self, target: &mut CaptureBuffer) -> Result<(), CaptureError> {
        let view = (self.view)().ok_or(CaptureError::NotReady)?;
        if view.size().is_empty() {
            return Err(CaptureError::NotReady);
        }
        view.draw_scaled(target)
    }

    fn reject_likely_white_frame(&self) -> bool {
        self.reject_white
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::infrastructure::shared_surface::SharedSurface;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_detached_view_reports_zero_size() {
        let source = LiveViewCaptureSource::new(Box::new(|| None), true);
        assert_eq!(source.size(), ContentSize::ZERO);
    }

    #[test]
    fn test_detached_view_capture_fails() {
        let source = LiveViewCaptureSource::new(Box::new(|| None), true);
        let mut target = RgbaImage::new(4, 4);
        assert!(matches!(
            source.capture(&mut target),
            Err(CaptureError::NotReady)
        ));
    }

    #[test]
    fn test_unrendered_view_capture_fails() {
        let surface = Arc::new(SharedSurface::new());
        let source = LiveViewCaptureSource::for_surface(surface);
        let mut target = RgbaImage::new(4, 4);
        assert!(source.capture(&mut target).is_err());
    }

    #[test]
    fn test_capture_scales_content_into_target() {
        let surface = Arc::new(SharedSurface::new());
        surface.present(RgbaImage::from_pixel(40, 20, Rgba([90, 60, 30, 255])));
        let source = LiveViewCaptureSource::for_surface(surface);

        assert_eq!(source.size(), ContentSize::new(40, 20));
        let mut target = RgbaImage::new(8, 4);
        source.capture(&mut target).unwrap();
        let px = target.get_pixel(3, 2).0;
        for (got, want) in px.iter().zip([90u8, 60, 30, 255]) {
            assert!(got.abs_diff(want) <= 1, "{px:?}");
        }
    }

    #[test]
    fn test_reject_flag_is_configurable() {
        let source = LiveViewCaptureSource::new(Box::new(|| None), false);
        assert!(!source.reject_likely_white_frame());
    }
}
