use crate::capture::domain::capture_error::CaptureError;
use crate::shared::content_size::ContentSize;
use crate::shared::pixels::CaptureBuffer;

/// Something that can be sampled for the content currently behind a
/// translucent surface.
///
/// This is a port: the sampler only sees this interface, so live views,
/// asynchronous copies and still images are treated uniformly through the
/// shared failure/cost signal.
pub trait CaptureSource: Send + Sync {
    /// Current logical content size. An empty size means capture is unavailable.
    fn size(&self) -> ContentSize;

    /// Best-effort synchronous sample into `target`, which is pre-allocated at
    /// the desired capture resolution.
    ///
    /// Implementations backed by asynchronous copies must bound their own
    /// wait and return [`CaptureError::Timeout`] rather than block.
    fn capture(&self, target: &mut CaptureBuffer) -> Result<(), CaptureError>;

    /// Whether the sampler should reject samples that look like an
    /// uninitialised blank surface.
    fn reject_likely_white_frame(&self) -> bool {
        true
    }

    /// Releases source-held resources. Must be idempotent.
    fn release(&self) {}
}
