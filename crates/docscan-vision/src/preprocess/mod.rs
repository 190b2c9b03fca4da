// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preprocessor (C1): grayscale -> bilateral filter -> Gaussian blur -> Canny
// -> elliptical dilation. Every intermediate buffer is scoped to
// `preprocess` and dropped before it returns; callers only ever see the
// final edge mask.

use docscan_core::{ChannelLayout, DocScanError, ImageView};
use image::{GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{dilate, Norm};
use tracing::debug;

/// Bilateral filter window diameter, per the preprocessing pipeline.
const BILATERAL_DIAMETER: i32 = 9;
const BILATERAL_SIGMA_COLOR: f64 = 75.0;
const BILATERAL_SIGMA_SPACE: f64 = 75.0;
const GAUSSIAN_SIGMA: f32 = 1.4;
const CANNY_LOW: f32 = 30.0;
const CANNY_HIGH: f32 = 100.0;
/// `imageproc::morphology` has no elliptical structuring element; a 5x5
/// square (`Norm::LInf`, k=2) is the closest primitive it offers and is
/// what every strategy downstream is tuned against.
const DILATION_RADIUS: u8 = 2;

/// Converts a neutral frame into an owned 8-bit grayscale `image` buffer,
/// respecting row stride and channel layout.
pub fn to_gray_image(view: &ImageView) -> Result<GrayImage, DocScanError> {
    let (width, height) = (view.width(), view.height());
    let channels = view.channels().channel_count() as usize;
    let mut gray = GrayImage::new(width, height);

    for y in 0..height {
        let row = view.row(y).ok_or_else(|| {
            DocScanError::InvalidFrame(format!("missing row {y} in {width}x{height} frame"))
        })?;
        for x in 0..width {
            let offset = x as usize * channels;
            let pixel = row.get(offset..offset + channels).ok_or_else(|| {
                DocScanError::InvalidFrame(format!("row {y} too short for width {width}"))
            })?;
            let value = match view.channels() {
                ChannelLayout::Luma => pixel[0],
                ChannelLayout::Rgb | ChannelLayout::Rgba => {
                    let (r, g, b) = (pixel[0] as u32, pixel[1] as u32, pixel[2] as u32);
                    ((r * 299 + g * 587 + b * 114) / 1000) as u8
                }
            };
            gray.put_pixel(x, y, Luma([value]));
        }
    }

    Ok(gray)
}

/// Runs the full C1 pipeline and returns the dilated Canny edge mask.
pub fn preprocess(gray: &GrayImage) -> GrayImage {
    let filtered = bilateral_filter(
        gray,
        BILATERAL_DIAMETER,
        BILATERAL_SIGMA_COLOR,
        BILATERAL_SIGMA_SPACE,
    );
    let blurred = gaussian_blur_f32(&filtered, GAUSSIAN_SIGMA);
    let edges = canny(&blurred, CANNY_LOW, CANNY_HIGH);
    let dilated = dilate(&edges, Norm::LInf, DILATION_RADIUS);
    debug!("preprocessing pipeline complete");
    dilated
}

/// Edge-preserving smoothing: each output pixel is a weighted average of its
/// window, where the weight combines a spatial Gaussian (distance from the
/// window centre) and a range Gaussian (intensity difference from the centre
/// pixel). Noisy flat regions get smoothed; edges, where intensity jumps,
/// keep their contrast because distant-in-value neighbours are down-weighted.
fn bilateral_filter(gray: &GrayImage, diameter: i32, sigma_color: f64, sigma_space: f64) -> GrayImage {
    let (width, height) = gray.dimensions();
    let radius = diameter / 2;
    let mut output = GrayImage::new(width, height);

    let spatial_coeff = -1.0 / (2.0 * sigma_space * sigma_space);
    let color_coeff = -1.0 / (2.0 * sigma_color * sigma_color);

    for y in 0..height {
        for x in 0..width {
            let center = gray.get_pixel(x, y).0[0] as f64;
            let mut weighted_sum = 0.0;
            let mut weight_total = 0.0;

            for dy in -radius..=radius {
                let ny = y as i32 + dy;
                if ny < 0 || ny >= height as i32 {
                    continue;
                }
                for dx in -radius..=radius {
                    let nx = x as i32 + dx;
                    if nx < 0 || nx >= width as i32 {
                        continue;
                    }
                    let neighbor = gray.get_pixel(nx as u32, ny as u32).0[0] as f64;
                    let spatial_dist_sq = (dx * dx + dy * dy) as f64;
                    let color_dist_sq = (neighbor - center).powi(2);
                    let weight =
                        (spatial_coeff * spatial_dist_sq + color_coeff * color_dist_sq).exp();
                    weighted_sum += neighbor * weight;
                    weight_total += weight;
                }
            }

            let value = if weight_total > 0.0 {
                (weighted_sum / weight_total).round().clamp(0.0, 255.0) as u8
            } else {
                center as u8
            };
            output.put_pixel(x, y, Luma([value]));
        }
    }

    output
}
