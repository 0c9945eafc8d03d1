use crossbeam_channel::Sender;

use crate::capture::domain::capture_error::CaptureError;
use crate::shared::content_size::ContentSize;
use crate::shared::pixels::CaptureBuffer;

/// A view whose current content can be drawn, scaled, into a buffer on the
/// calling thread.
pub trait ContentSurface: Send + Sync {
    fn size(&self) -> ContentSize;

    /// Draws the whole content scaled to `target`'s dimensions.
    fn draw_scaled(&self, target: &mut CaptureBuffer) -> Result<(), CaptureError>;
}

/// Result delivered by an asynchronous surface copy.
pub type CopyResult = Result<CaptureBuffer, CaptureError>;

/// A surface that services pixel copies asynchronously, e.g. a GPU-backed
/// texture that must be read back by the compositor.
pub trait CopySurface: Send + Sync {
    fn size(&self) -> ContentSize;

    /// Requests a copy scaled to `width`x`height`. The result is sent on
    /// `done` at some later point; the request itself never blocks.
    fn request_copy(&self, width: u32, height: u32, done: Sender<CopyResult>);
}
