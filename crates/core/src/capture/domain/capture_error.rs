use thiserror::Error;

/// Why a capture source could not produce a sample.
///
/// The sampler never surfaces these; they are folded into the governor's
/// failure statistics and logged at debug level.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("content is not ready")]
    NotReady,
    #[error("target is {target_width}x{target_height}, copy produced {width}x{height}")]
    SizeMismatch {
        target_width: u32,
        target_height: u32,
        width: u32,
        height: u32,
    },
    #[error("copy did not complete within {0} ms")]
    Timeout(u64),
    #[error("copy dispatcher is gone")]
    Disconnected,
    #[error("source has been released")]
    Released,
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
