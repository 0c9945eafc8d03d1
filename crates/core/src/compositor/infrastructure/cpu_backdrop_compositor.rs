use std::cell::RefCell;

use image::imageops::{self, FilterType};

use crate::compositor::domain::backdrop_compositor::{BackdropCompositor, CompositeError, Panel};
use crate::compositor::domain::source_mapping::map_source_rect;
use crate::sampler::captured_frame::CapturedFrame;
use crate::shared::pixels::OpaqueBuffer;

use super::gaussian;

/// Crops the panel's region out of the captured frame, blurs it at capture
/// resolution and scales it up to the panel size.
///
/// The effective radius in capture pixels is
/// `blur_radius * blur_radius_factor * quality_scale`.
#[derive(Default)]
pub struct CpuBackdropCompositor {
    blur_temp: RefCell<Vec<f32>>,
}

impl CpuBackdropCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blur radius in capture pixels for `frame`.
    pub fn capture_radius(frame: &CapturedFrame, blur_radius: f32) -> f32 {
        blur_radius.max(0.0) * frame.blur_radius_factor() * frame.quality_scale()
    }
}

impl BackdropCompositor for CpuBackdropCompositor {
    fn composite(
        &self,
        frame: &CapturedFrame,
        panel: Panel,
        blur_radius: f32,
    ) -> Result<OpaqueBuffer, CompositeError> {
        let rect = map_source_rect(frame, (panel.x, panel.y), panel.size).ok_or(CompositeError::EmptyRegion)?;
        let mut region = imageops::crop_imm(frame.image(), rect.x, rect.y, rect.width, rect.height).to_image();

        let kernel_size = gaussian::kernel_size_for_radius(Self::capture_radius(frame, blur_radius));
        if kernel_size > 1 {
            let kernel = gaussian::gaussian_kernel_1d(kernel_size);
            let mut temp = self.blur_temp.borrow_mut();
            gaussian::separable_blur(
                &mut region,
                rect.width as usize,
                rect.height as usize,
                3,
                &kernel,
                &mut temp,
            );
        }

        if region.dimensions() == (panel.size.width, panel.size.height) {
            return Ok(region);
        }
        Ok(imageops::resize(
            &region,
            panel.size.width,
            panel.size.height,
            FilterType::Triangle,
        ))
    }
}
