// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectifier (C5): perspective-warps a validated quad into an upright
// rectangle sized from its own opposite-edge lengths. A degenerate or
// non-finite transform is a `RectificationFailed` error rather than a
// best-effort fallback — the caller's tracker state is left untouched so the
// next frame can simply try again.

use docscan_core::geometry::distance;
use docscan_core::{ChannelLayout, DocScanError, ImageView, Quadrilateral};
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::{debug, instrument};

/// Rectifies `view` against `quad`: crops and perspective-warps the document
/// region into a new upright `ImageView`.
#[instrument(skip(view, quad))]
pub fn rectify(view: &ImageView, quad: &Quadrilateral) -> Result<ImageView, DocScanError> {
    let (out_w, out_h) = destination_size(quad);

    let src: [(f32, f32); 4] = quad
        .as_points()
        .map(|p| (p.x as f32, p.y as f32));
    let dest: [(f32, f32); 4] = [
        (0.0, 0.0),
        (out_w as f32, 0.0),
        (out_w as f32, out_h as f32),
        (0.0, out_h as f32),
    ];

    let projection = Projection::from_control_points(src, dest)
        .ok_or_else(|| DocScanError::RectificationFailed("degenerate perspective transform".into()))?;

    let rgba_input = to_rgba_image(view)?;
    let mut output = RgbaImage::new(out_w, out_h);
    let default_pixel = Rgba([255u8, 255, 255, 255]);
    warp_into(&rgba_input, &projection, Interpolation::Bilinear, default_pixel, &mut output);

    debug!(out_w, out_h, "rectification complete");

    ImageView::packed(out_w, out_h, ChannelLayout::Rgba, output.into_raw())
}

/// Destination size from the canonicalized quad's max opposite-edge lengths,
/// rounded and clamped to at least one pixel on each axis.
fn destination_size(quad: &Quadrilateral) -> (u32, u32) {
    let w = distance(quad.top_left, quad.top_right).max(distance(quad.bottom_left, quad.bottom_right));
    let h = distance(quad.top_right, quad.bottom_right).max(distance(quad.top_left, quad.bottom_left));
    (w.round().max(1.0) as u32, h.round().max(1.0) as u32)
}

fn to_rgba_image(view: &ImageView) -> Result<RgbaImage, DocScanError> {
    let (width, height) = (view.width(), view.height());
    let channels = view.channels().channel_count() as usize;
    let mut rgba = RgbaImage::new(width, height);

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
                ChannelLayout::Luma => Rgba([pixel[0], pixel[0], pixel[0], 255]),
                ChannelLayout::Rgb => Rgba([pixel[0], pixel[1], pixel[2], 255]),
                ChannelLayout::Rgba => Rgba([pixel[0], pixel[1], pixel[2], pixel[3]]),
            };
            rgba.put_pixel(x, y, value);
        }
    }

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::Point;

    fn square_quad(side: f64) -> Quadrilateral {
        Quadrilateral::new(
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        )
    }

    #[test]
    fn destination_size_matches_square_side() {
        let quad = square_quad(120.0);
        assert_eq!(destination_size(&quad), (120, 120));
    }

    #[test]
    fn destination_size_is_never_zero_for_a_degenerate_quad() {
        let quad = Quadrilateral::new(
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
        );
        let (w, h) = destination_size(&quad);
        assert!(w >= 1 && h >= 1);
    }

    #[test]
    fn rectify_succeeds_on_a_well_formed_quad() {
        let view = ImageView::packed(200, 200, ChannelLayout::Rgba, vec![128u8; 200 * 200 * 4]).unwrap();
        let quad = Quadrilateral::new(
            Point::new(10.0, 10.0),
            Point::new(190.0, 10.0),
            Point::new(190.0, 190.0),
            Point::new(10.0, 190.0),
        );
        let result = rectify(&view, &quad).unwrap();
        assert_eq!(result.width(), 180);
        assert_eq!(result.height(), 180);
    }

    #[test]
    fn rectify_rejects_degenerate_quad() {
        let view = ImageView::packed(50, 50, ChannelLayout::Luma, vec![0u8; 50 * 50]).unwrap();
        let quad = Quadrilateral::new(
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
        );
        assert!(rectify(&view, &quad).is_err());
    }
}
