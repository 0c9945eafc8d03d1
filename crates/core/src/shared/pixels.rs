use image::{Rgb, RgbImage, Rgba, RgbaImage};

/// Raw capture target: RGBA8, row-major. Alpha may be garbage after a capture.
pub type CaptureBuffer = RgbaImage;

/// Alpha-free buffer handed to consumers.
pub type OpaqueBuffer = RgbImage;

/// Copies the colour channels of `src` into `dst`, discarding alpha.
///
/// Equivalent to a source-mode composite onto an opaque black canvas: the
/// destination is cleared first and pixels outside `src` stay black.
pub fn copy_opaque(src: &CaptureBuffer, dst: &mut OpaqueBuffer) {
    for px in dst.pixels_mut() {
        *px = Rgb([0, 0, 0]);
    }
    let w = src.width().min(dst.width());
    let h = src.height().min(dst.height());
    for y in 0..h {
        for x in 0..w {
            let Rgba([r, g, b, _]) = *src.get_pixel(x, y);
            dst.put_pixel(x, y, Rgb([r, g, b]));
        }
    }
}
