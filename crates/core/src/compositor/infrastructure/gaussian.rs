/// Odd kernel size whose derived sigma approximates `radius`.
///
/// Radii below half a pixel yield 1, i.e. no blur.
pub fn kernel_size_for_radius(radius: f32) -> usize {
    if !radius.is_finite() || radius < 0.5 {
        return 1;
    }
    2 * (radius * 3.0).ceil() as usize + 1
}

/// Normalised 1D Gaussian weights, sigma = `kernel_size / 6`.
pub fn gaussian_kernel_1d(kernel_size: usize) -> Vec<f32> {
    debug_assert!(kernel_size % 2 == 1);
    let sigma = kernel_size as f64 / 6.0;
    let half = (kernel_size / 2) as f64;
    let weights: Vec<f64> = (0..kernel_size)
        .map(|i| {
            let d = i as f64 - half;
            (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| (w / total) as f32).collect()
}

/// Two-pass blur of interleaved 8-bit pixels with edge clamping.
///
/// `temp` is scratch space reused across calls.
pub fn separable_blur(
    data: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &[f32],
    temp: &mut Vec<f32>,
) {
    if kernel.len() <= 1 || width == 0 || height == 0 {
        return;
    }
    let half = (kernel.len() / 2) as isize;
    let at = |x: usize, y: usize, c: usize| (y * width + x) * channels + c;
    temp.clear();
    temp.resize(width * height * channels, 0.0);

    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                temp[at(x, y, c)] = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let sx = clamp_index(x as isize + k as isize - half, width);
                        data[at(sx, y, c)] as f32 * w
                    })
                    .sum();
            }
        }
    }

    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let value: f32 = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| {
                        let sy = clamp_index(y as isize + k as isize - half, height);
                        temp[at(x, sy, c)] * w
                    })
                    .sum();
                data[at(x, y, c)] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}
