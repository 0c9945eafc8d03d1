use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::capture_source::CaptureSource;
use crate::capture::domain::content_surface::{CopyResult, CopySurface};
use crate::shared::constants::GPU_COPY_TIMEOUT_MS;
use crate::shared::content_size::ContentSize;
use crate::shared::pixels::CaptureBuffer;

pub type CopySurfaceProvider = Box<dyn Fn() -> Option<Arc<dyn CopySurface>> + Send + Sync>;

/// Samples a surface through an asynchronous copy, waiting a bounded time
/// for the copy to land.
///
/// A copy that misses the deadline is abandoned; the late result is dropped
/// with the completion channel.
pub struct GpuCopyCaptureSource {
    surface: CopySurfaceProvider,
    reject_white: bool,
    timeout: Duration,
}

impl GpuCopyCaptureSource {
    pub fn new(surface: CopySurfaceProvider, reject_white: bool) -> Self {
        Self {
            surface,
            reject_white,
            timeout: Duration::from_millis(GPU_COPY_TIMEOUT_MS),
        }
    }

    pub fn for_surface(surface: Arc<dyn CopySurface>) -> Self {
        Self::new(Box::new(move || Some(surface.clone())), true)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CaptureSource for GpuCopyCaptureSource {
    fn size(&self) -> ContentSize {
        (self.surface)()
            .map(|s| s.size())
            .unwrap_or(ContentSize::ZERO)
    }

    fn capture(&self, target: &mut CaptureBuffer) -> Result<(), CaptureError> {
        let surface = (self.surface)().ok_or(CaptureError::NotReady)?;
        if surface.size().is_empty() {
            return Err(CaptureError::NotReady);
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded::<CopyResult>(1);
        surface.request_copy(target.width(), target.height(), done_tx);

        let copy = match done_rx.recv_timeout(self.timeout) {
            Ok(result) => result?,
            Err(RecvTimeoutError::Timeout) => {
                return Err(CaptureError::Timeout(self.timeout.as_millis() as u64))
            }
            Err(RecvTimeoutError::Disconnected) => return Err(CaptureError::Disconnected),
        };

        if copy.dimensions() != target.dimensions() {
            return Err(CaptureError::SizeMismatch {
                target_width: target.width(),
                target_height: target.height(),
                width: copy.width(),
                height: copy.height(),
            });
        }
        target.copy_from_slice(copy.as_raw());
        Ok(())
    }

    fn reject_likely_white_frame(&self) -> bool {
        self.reject_white
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::infrastructure::shared_surface::SharedSurface;
    use crossbeam_channel::Sender;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;
    use std::time::Instant;

    /// Accepts copy requests and never answers them.
    struct StalledSurface {
        parked: Mutex<Vec<Sender<CopyResult>>>,
    }

    impl CopySurface for StalledSurface {
        fn size(&self) -> ContentSize {
            ContentSize::new(100, 100)
        }

        fn request_copy(&self, _width: u32, _height: u32, done: Sender<CopyResult>) {
            self.parked.lock().unwrap().push(done);
        }
    }

    /// Answers with a buffer of the wrong size.
    struct WrongSizeSurface;

    impl CopySurface for WrongSizeSurface {
        fn size(&self) -> ContentSize {
            ContentSize::new(100, 100)
        }

        fn request_copy(&self, width: u32, height: u32, done: Sender<CopyResult>) {
            let _ = done.send(Ok(RgbaImage::new(width + 1, height)));
        }
    }

    /// Drops the completion sender without answering.
    struct DroppingSurface;

    impl CopySurface for DroppingSurface {
        fn size(&self) -> ContentSize {
            ContentSize::new(100, 100)
        }

        fn request_copy(&self, _width: u32, _height: u32, _done: Sender<CopyResult>) {}
    }

    #[test]
    fn test_copy_lands_in_target() {
        let surface = Arc::new(SharedSurface::new());
        surface.present(RgbaImage::from_pixel(32, 32, Rgba([1, 2, 3, 255])));
        let source = GpuCopyCaptureSource::for_surface(surface)
            .with_timeout(Duration::from_secs(2));

        let mut target = RgbaImage::new(8, 8);
        source.capture(&mut target).unwrap();
        let px = target.get_pixel(4, 4).0;
        for (got, want) in px.iter().zip([1u8, 2, 3, 255]) {
            assert!(got.abs_diff(want) <= 1, "{px:?}");
        }
    }

    #[test]
    fn test_stalled_copy_times_out() {
        let surface = Arc::new(StalledSurface {
            parked: Mutex::new(Vec::new()),
        });
        let source = GpuCopyCaptureSource::for_surface(surface);

        let started = Instant::now();
        let mut target = RgbaImage::new(8, 8);
        let result = source.capture(&mut target);

        assert!(matches!(result, Err(CaptureError::Timeout(GPU_COPY_TIMEOUT_MS))));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_wrong_size_copy_is_rejected() {
        let source = GpuCopyCaptureSource::for_surface(Arc::new(WrongSizeSurface));
        let mut target = RgbaImage::new(8, 8);
        assert!(matches!(
            source.capture(&mut target),
            Err(CaptureError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_dropped_completion_is_disconnected() {
        let source = GpuCopyCaptureSource::for_surface(Arc::new(DroppingSurface));
        let mut target = RgbaImage::new(8, 8);
        assert!(matches!(
            source.capture(&mut target),
            Err(CaptureError::Disconnected)
        ));
    }

    #[test]
    fn test_missing_surface_is_not_ready() {
        let source = GpuCopyCaptureSource::new(Box::new(|| None), true);
        assert_eq!(source.size(), ContentSize::ZERO);
        let mut target = RgbaImage::new(8, 8);
        assert!(matches!(
            source.capture(&mut target),
            Err(CaptureError::NotReady)
        ));
    }
}
