use crate::shared::constants::{WHITE_CHANNEL_MIN, WHITE_FRAME_GRID, WHITE_FRAME_REJECT_PERCENT};
use crate::shared::pixels::CaptureBuffer;

/// Cheap check for a sample that is most likely an uninitialised surface.
///
/// Samples a sparse grid (about 8x8) and reports true when at least 92% of
/// the sampled pixels are near-white. Empty buffers are always rejected.
pub fn is_likely_white_frame(buffer: &CaptureBuffer) -> bool {
    let (w, h) = buffer.dimensions();
    if w == 0 || h == 0 {
        return true;
    }

    let step_x = (w / WHITE_FRAME_GRID).max(1) as usize;
    let step_y = (h / WHITE_FRAME_GRID).max(1) as usize;
    let mut total = 0u32;
    let mut white = 0u32;

    for y in (0..h).step_by(step_y) {
        for x in (0..w).step_by(step_x) {
            let [r, g, b, _] = buffer.get_pixel(x, y).0;
            if r >= WHITE_CHANNEL_MIN && g >= WHITE_CHANNEL_MIN && b >= WHITE_CHANNEL_MIN {
                white += 1;
            }
            total += 1;
        }
    }

    if total == 0 {
        return true;
    }
    white * 100 / total >= WHITE_FRAME_REJECT_PERCENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use rstest::rstest;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const DARK: Rgba<u8> = Rgba([20, 30, 40, 255]);

    /// 16x16 buffer sampled at step 2: the 64 grid points are the even
    /// coordinates. The first `dark` grid points (row-major) are dark.
    fn grid_image(dark: u32) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(16, 16, WHITE);
        let mut marked = 0;
        'outer: for y in (0..16).step_by(2) {
            for x in (0..16).step_by(2) {
                if marked == dark {
                    break 'outer;
                }
                img.put_pixel(x, y, DARK);
                marked += 1;
            }
        }
        img
    }

    #[test]
    fn test_all_white_is_rejected() {
        let img = RgbaImage::from_pixel(64, 40, WHITE);
        assert!(is_likely_white_frame(&img));
    }

    #[test]
    fn test_dark_frame_is_accepted() {
        let img = RgbaImage::from_pixel(64, 40, DARK);
        assert!(!is_likely_white_frame(&img));
    }

    #[test]
    fn test_empty_buffer_is_rejected() {
        let img = RgbaImage::new(0, 0);
        assert!(is_likely_white_frame(&img));
    }

    #[rstest]
    #[case::all_white(0, true)]
    #[case::ninety_five_percent(3, true)]
    #[case::just_over_threshold(5, true)]
    #[case::just_under_threshold(6, false)]
    #[case::mostly_dark(40, false)]
    fn test_threshold_on_8x8_grid(#[case] dark: u32, #[case] rejected: bool) {
        // 59/64 white = 92.1%, 58/64 white = 90.6%
        assert_eq!(is_likely_white_frame(&grid_image(dark)), rejected);
    }

    #[test]
    fn test_near_white_counts_as_white() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([245, 250, 246, 0]));
        assert!(is_likely_white_frame(&img));
    }

    #[test]
    fn test_single_bright_channel_is_not_white() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 200, 255]));
        assert!(!is_likely_white_frame(&img));
    }

    #[test]
    fn test_off_grid_pixels_are_ignored() {
        // Odd coordinates are never sampled on a 16x16 buffer.
        let mut img = RgbaImage::from_pixel(16, 16, WHITE);
        for y in (1..16).step_by(2) {
            for x in 0..16 {
                img.put_pixel(x, y, DARK);
            }
        }
        assert!(is_likely_white_frame(&img));
    }
}
