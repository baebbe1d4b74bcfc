//! Grayscale preprocessing and edge masks.
//!
//! - [`gaussian_blur_3x3`] smooths the grayscale image before the plane
//!   detector's intensity test.
//! - [`canny`] is a compact Canny operator (Sobel, L1 magnitude,
//!   four-direction non-maximum suppression, hysteresis).
//! - [`edge_mask`] runs Canny on everything below a top crop and leaves the
//!   cropped band empty.
//!
//! All neighborhood operations use reflect-101 borders (`dcb|abcd|cba`).

// Pixel arithmetic moves between u32 image dimensions and signed offsets
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use image::{GrayImage, Luma};

use crate::params::EdgeParams;

/// Value written for edge pixels.
pub const EDGE_PIXEL: u8 = 255;

/// Maps a possibly out-of-range index back into `[0, n)` by mirroring
/// around the border pixel.
fn reflect101(i: isize, n: usize) -> usize {
    let n = n as isize;
    if n <= 1 {
        return 0;
    }
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= n {
        i = 2 * n - 2 - i;
    }
    i.clamp(0, n - 1) as usize
}

/// Normalized 3-tap Gaussian kernel.
#[must_use]
pub fn gaussian_kernel_3(sigma: f64) -> [f64; 3] {
    let side = (-1.0 / (2.0 * sigma * sigma)).exp();
    let sum = 1.0 + 2.0 * side;
    [side / sum, 1.0 / sum, side / sum]
}

/// Blurs a grayscale image with a separable 3×3 Gaussian.
///
/// Results are rounded to the nearest integer.
///
/// # Example
///
/// ```
/// use image::GrayImage;
/// use sensor_features::gaussian_blur_3x3;
///
/// let flat = GrayImage::from_pixel(8, 8, image::Luma([90]));
/// assert_eq!(gaussian_blur_3x3(&flat, 1.0), flat);
/// ```
#[must_use]
pub fn gaussian_blur_3x3(src: &GrayImage, sigma: f64) -> GrayImage {
    let (width, height) = src.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return src.clone();
    }
    let kernel = gaussian_kernel_3(sigma);
    let data = src.as_raw();

    // Horizontal pass
    let mut rows = vec![0.0; w * h];
    for y in 0..h {
        for x in 0..w {
            rows[y * w + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, &kv)| {
                    let sx = reflect101(x as isize + k as isize - 1, w);
                    kv * f64::from(data[y * w + sx])
                })
                .sum();
        }
    }

    // Vertical pass
    GrayImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let value: f64 = kernel
            .iter()
            .enumerate()
            .map(|(k, &kv)| {
                let sy = reflect101(y as isize + k as isize - 1, h);
                kv * rows[sy * w + x]
            })
            .sum();
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Sobel derivatives in x and y.
fn sobel(data: &[u8], w: usize, h: usize) -> (Vec<i32>, Vec<i32>) {
    let at = |x: isize, y: isize| -> i32 {
        i32::from(data[reflect101(y, h) * w + reflect101(x, w)])
    };
    let mut gx = vec![0; w * h];
    let mut gy = vec![0; w * h];
    for y in 0..h as isize {
        for x in 0..w as isize {
            let i = y as usize * w + x as usize;
            gx[i] = (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1));
            gy[i] = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
        }
    }
    (gx, gy)
}

/// Thins the gradient magnitude to one-pixel ridges.
fn non_max_suppression(gx: &[i32], gy: &[i32], w: usize, h: usize) -> Vec<f64> {
    // tan(22.5°) and tan(67.5°)
    const TAN_22: f64 = 0.414_213_562_373_095_1;
    const TAN_67: f64 = 2.414_213_562_373_095;

    let magnitude: Vec<f64> = gx
        .iter()
        .zip(gy)
        .map(|(&x, &y)| f64::from(x.abs() + y.abs()))
        .collect();
    let mag = |x: isize, y: isize| -> f64 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0.0
        } else {
            magnitude[y as usize * w + x as usize]
        }
    };

    let mut out = vec![0.0; w * h];
    for y in 0..h as isize {
        for x in 0..w as isize {
            let i = y as usize * w + x as usize;
            let m = magnitude[i];
            if m <= 0.0 {
                continue;
            }
            let ax = f64::from(gx[i].abs());
            let ay = f64::from(gy[i].abs());
            let ((x1, y1), (x2, y2)) = if ay <= ax * TAN_22 {
                ((x - 1, y), (x + 1, y))
            } else if ay >= ax * TAN_67 {
                ((x, y - 1), (x, y + 1))
            } else if (gx[i] > 0) == (gy[i] > 0) {
                ((x - 1, y - 1), (x + 1, y + 1))
            } else {
                ((x + 1, y - 1), (x - 1, y + 1))
            };
            if m > mag(x1, y1) && m >= mag(x2, y2) {
                out[i] = m;
            }
        }
    }
    out
}

/// Keeps strong pixels and every candidate 8-connected to one.
fn hysteresis(magnitude: &[f64], w: usize, h: usize, low: f64, high: f64) -> Vec<u8> {
    let mut out = vec![0u8; w * h];
    let mut stack: Vec<usize> = magnitude
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m > high)
        .map(|(i, _)| i)
        .collect();
    for &i in &stack {
        out[i] = EDGE_PIXEL;
    }

    while let Some(i) = stack.pop() {
        let (x, y) = ((i % w) as isize, (i / w) as isize);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if out[j] == 0 && magnitude[j] > low {
                    out[j] = EDGE_PIXEL;
                    stack.push(j);
                }
            }
        }
    }
    out
}

/// Runs the Canny edge detector.
///
/// The thresholds may be given in either order; the smaller one is used as
/// the hysteresis low threshold. Edge pixels are [`EDGE_PIXEL`], all others
/// zero.
#[must_use]
pub fn canny(src: &GrayImage, threshold1: f64, threshold2: f64) -> GrayImage {
    let (width, height) = src.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return GrayImage::new(width, height);
    }
    let (low, high) = if threshold1 <= threshold2 {
        (threshold1, threshold2)
    } else {
        (threshold2, threshold1)
    };

    let (gx, gy) = sobel(src.as_raw(), w, h);
    let thinned = non_max_suppression(&gx, &gy, w, h);
    let edges = hysteresis(&thinned, w, h, low, high);

    GrayImage::from_fn(width, height, |x, y| {
        Luma([edges[y as usize * w + x as usize]])
    })
}

/// Builds the edge mask used to validate lidar edge points.
///
/// Rows above `height / top_crop_divisor` are left empty; Canny runs on
/// the remaining rows only, so the crop boundary does not itself produce
/// edges.
#[must_use]
pub fn edge_mask(gray: &GrayImage, params: &EdgeParams) -> GrayImage {
    let (width, height) = gray.dimensions();
    let top = height / params.top_crop_divisor.max(1);

    let mut mask = GrayImage::new(width, height);
    if top >= height {
        return mask;
    }
    let cropped = image::imageops::crop_imm(gray, 0, top, width, height - top).to_image();
    let edges = canny(&cropped, params.canny_high, params.canny_low);
    image::imageops::replace(&mut mask, &edges, 0, i64::from(top));
    mask
}
