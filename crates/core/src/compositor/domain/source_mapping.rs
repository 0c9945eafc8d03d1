use crate::sampler::captured_frame::CapturedFrame;
use crate::shared::content_size::ContentSize;

/// Rectangle in capture-buffer pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps a rectangle given in source coordinates onto `frame`'s capture buffer.
pub fn map_source_rect(frame: &CapturedFrame, offset: (f32, f32), size: ContentSize) -> Option<CaptureRect> {
    map_rect(frame.source_size(), frame.capture_size(), offset, size)
}

/// Per-axis scaling with rounding. The result is at least 1x1 and always lies
/// inside the capture area; `None` when any size involved is empty.
pub fn map_rect(
    source: ContentSize,
    capture: ContentSize,
    (x, y): (f32, f32),
    size: ContentSize,
) -> Option<CaptureRect> {
    if source.is_empty() || capture.is_empty() || size.is_empty() {
        return None;
    }

    let scale_x = capture.width as f32 / source.width as f32;
    let scale_y = capture.height as f32 / source.height as f32;

    let left = clamp_origin((x * scale_x).round(), capture.width);
    let top = clamp_origin((y * scale_y).round(), capture.height);
    let width = scaled_extent(size.width, scale_x).min(capture.width - left);
    let height = scaled_extent(size.height, scale_y).min(capture.height - top);

    Some(CaptureRect {
        x: left,
        y: top,
        width,
        height,
    })
}

fn clamp_origin(value: f32, extent: u32) -> u32 {
    value.clamp(0.0, (extent - 1) as f32) as u32
}

fn scaled_extent(value: u32, scale: f32) -> u32 {
    ((value as f32 * scale).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rect(x: u32, y: u32, width: u32, height: u32) -> CaptureRect {
        CaptureRect { x, y, width, height }
    }

    #[rstest]
    #[case::inside((100.0, 50.0), (200, 100), rect(30, 15, 60, 30))]
    #[case::negative_origin((-40.0, -10.0), (200, 100), rect(0, 0, 60, 30))]
    #[case::overflowing((900.0, 450.0), (400, 200), rect(270, 135, 30, 15))]
    #[case::past_the_edge((5000.0, 5000.0), (100, 100), rect(299, 149, 1, 1))]
    #[case::tiny((10.0, 10.0), (1, 1), rect(3, 3, 1, 1))]
    fn test_map_rect(#[case] offset: (f32, f32), #[case] size: (u32, u32), #[case] expected: CaptureRect) {
        let mapped = map_rect(
            ContentSize::new(1000, 500),
            ContentSize::new(300, 150),
            offset,
            size.into(),
        );
        assert_eq!(mapped, Some(expected));
    }

    #[rstest]
    #[case::empty_source(ContentSize::new(0, 500), ContentSize::new(300, 150), ContentSize::new(10, 10))]
    #[case::empty_capture(ContentSize::new(1000, 500), ContentSize::new(300, 0), ContentSize::new(10, 10))]
    #[case::empty_region(ContentSize::new(1000, 500), ContentSize::new(300, 150), ContentSize::new(0, 10))]
    fn test_map_rect_rejects_empty(
        #[case] source: ContentSize,
        #[case] capture: ContentSize,
        #[case] size: ContentSize,
    ) {
        assert_eq!(map_rect(source, capture, (0.0, 0.0), size), None);
    }

    #[test]
    fn test_anisotropic_scale() {
        let mapped = map_rect(
            ContentSize::new(100, 100),
            ContentSize::new(50, 25),
            (20.0, 20.0),
            ContentSize::new(40, 40),
        );
        assert_eq!(mapped, Some(rect(10, 5, 20, 10)));
    }

    #[test]
    fn test_map_source_rect_uses_frame_sizes() {
        use image::RgbImage;
        use std::sync::Arc;

        let frame = CapturedFrame::new(Arc::new(RgbImage::new(30, 15)), ContentSize::new(100, 50), 0.3, 0.78, 1);
        let mapped = map_source_rect(&frame, (50.0, 0.0), ContentSize::new(50, 50));
        assert_eq!(mapped, Some(rect(15, 0, 15, 15)));
    }
}
