// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure rendering helper: draws a stroked, translucently-filled polygon over
// a frame. No detection semantics — this exists purely so a host's preview
// surface can show the tracked quad without reimplementing point-in-polygon
// fill blending itself.

use docscan_core::{ChannelLayout, ImageView, Quadrilateral};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as ImgPoint;

/// Rendering parameters for `draw_polygon_overlay`. Distinct from
/// `ScannerConfig`'s `stroke_color`/`fill_alpha` fields (which are just the
/// host-facing defaults a caller may copy from) so this module has no
/// dependency on the session's live config.
#[derive(Debug, Clone, Copy)]
pub struct OverlayStyle {
    /// Packed `0xRRGGBB`.
    pub stroke_color: u32,
    pub fill_alpha: f32,
}

impl OverlayStyle {
    pub fn from_config(config: &docscan_core::ScannerConfig) -> Self {
        Self {
            stroke_color: config.stroke_color,
            fill_alpha: config.fill_alpha,
        }
    }

    fn stroke_rgba(&self) -> Rgba<u8> {
        let [r, g, b] = packed_to_rgb(self.stroke_color);
        Rgba([r, g, b, 255])
    }
}

fn packed_to_rgb(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

/// Draws `quad`'s outline and a translucent fill onto a copy of `image`.
pub fn draw_polygon_overlay(image: &ImageView, quad: &Quadrilateral, style: OverlayStyle) -> ImageView {
    let mut canvas = to_rgba_image(image);
    let points: Vec<ImgPoint<i32>> = quad
        .as_points()
        .iter()
        .map(|p| ImgPoint::new(p.x.round() as i32, p.y.round() as i32))
        .collect();

    fill_polygon(&mut canvas, &points, style);
    if has_distinct_points(&points) {
        draw_polygon_mut(&mut canvas, &points, style.stroke_rgba());
    }

    ImageView::packed(canvas.width(), canvas.height(), ChannelLayout::Rgba, canvas.into_raw())
        .expect("overlay canvas dimensions always match the source frame")
}

fn has_distinct_points(points: &[ImgPoint<i32>]) -> bool {
    points.windows(2).any(|w| w[0] != w[1])
}

/// Alpha-blends `style.fill_alpha` of the stroke colour into every pixel
/// inside `points`, using a scanline point-in-polygon test (`imageproc`
/// has no alpha-filled-polygon primitive).
fn fill_polygon(canvas: &mut RgbaImage, points: &[ImgPoint<i32>], style: OverlayStyle) {
    if points.len() < 3 || style.fill_alpha <= 0.0 {
        return;
    }
    let alpha = style.fill_alpha.clamp(0.0, 1.0);
    let [fr, fg, fb] = packed_to_rgb(style.stroke_color);

    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0).max(0);
    let max_y = points
        .iter()
        .map(|p| p.y)
        .max()
        .unwrap_or(0)
        .min(canvas.height() as i32 - 1);

    for y in min_y..=max_y {
        let mut xs: Vec<i32> = Vec::new();
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            if (a.y > y) != (b.y > y) {
                let t = (y - a.y) as f64 / (b.y - a.y) as f64;
                xs.push((a.x as f64 + t * (b.x - a.x) as f64).round() as i32);
            }
        }
        xs.sort_unstable();
        for pair in xs.chunks_exact(2) {
            let (start, end) = (pair[0].max(0), pair[1].min(canvas.width() as i32 - 1));
            for x in start..=end {
                let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                let Rgba([r, g, b, a]) = *pixel;
                let blend = |src: u8, dst: u8| ((1.0 - alpha) * dst as f32 + alpha * src as f32).round() as u8;
                *pixel = Rgba([blend(fr, r), blend(fg, g), blend(fb, b), a]);
            }
        }
    }
}

fn to_rgba_image(view: &ImageView) -> RgbaImage {
    let (width, height) = (view.width(), view.height());
    let channels = view.channels().channel_count() as usize;
    let mut rgba = RgbaImage::new(width, height);

    for y in 0..height {
        let Some(row) = view.row(y) else { continue };
        for x in 0..width {
            let offset = x as usize * channels;
            let Some(pixel) = row.get(offset..offset + channels) else { continue };
            let value = match view.channels() {
                ChannelLayout::Luma => Rgba([pixel[0], pixel[0], pixel[0], 255]),
                ChannelLayout::Rgb => Rgba([pixel[0], pixel[1], pixel[2], 255]),
                ChannelLayout::Rgba => Rgba([pixel[0], pixel[1], pixel[2], pixel[3]]),
            };
            rgba.put_pixel(x, y, value);
        }
    }
    rgba
}
