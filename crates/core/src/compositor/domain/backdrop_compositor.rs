use thiserror::Error;

use crate::sampler::captured_frame::CapturedFrame;
use crate::shared::content_size::ContentSize;
use crate::shared::pixels::OpaqueBuffer;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompositeError {
    #[error("panel does not overlap the captured backdrop")]
    EmptyRegion,
}

/// Area of the screen a blurred backdrop is drawn behind, in source
/// coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Panel {
    pub x: f32,
    pub y: f32,
    pub size: ContentSize,
}

impl Panel {
    pub fn new(x: f32, y: f32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            size: ContentSize::new(width, height),
        }
    }
}

/// Renders the backdrop behind a panel from the latest captured frame.
///
/// `blur_radius` is the user's radius in source pixels; implementations
/// apply the frame's blur radius factor and quality scale themselves. The
/// output has the panel's size.
pub trait BackdropCompositor: Send {
    fn composite(
        &self,
        frame: &CapturedFrame,
        panel: Panel,
        blur_radius: f32,
    ) -> Result<OpaqueBuffer, CompositeError>;
}
