// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry validator (C3): canonicalizes an arbitrary 4-point candidate into
// TL/TR/BR/BL order and checks aspect ratio, area, and corner angles. Every
// quad extraction strategy in `extract` routes its candidates through here
// before accepting one.

use docscan_core::geometry::{distance, interior_angle_degrees, shoelace_area};
use docscan_core::{Point, Quadrilateral, ScannerConfig};

const MIN_ASPECT_RATIO: f64 = 0.25;
const MAX_ASPECT_RATIO: f64 = 4.0;
const MIN_CORNER_ANGLE_DEGREES: f64 = 50.0;
const MAX_CORNER_ANGLE_DEGREES: f64 = 130.0;

/// Reorders four arbitrary points into canonical `[top-left, top-right,
/// bottom-right, bottom-left]` order.
///
/// `TL = argmin(x + y)`, `BR = argmax(x + y)`, `TR = argmin(x - y)`,
/// `BL = argmax(x - y)` — the usual sum/difference trick, robust to small
/// perspective skew since it only needs the four points to be roughly in
/// quadrilateral position, not axis-aligned.
pub fn canonicalize(points: &[Point; 4]) -> Quadrilateral {
    let ord = |a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal);
    let top_left = *points
        .iter()
        .min_by(|a, b| ord(&(a.x + a.y), &(b.x + b.y)))
        .unwrap();
    let bottom_right = *points
        .iter()
        .max_by(|a, b| ord(&(a.x + a.y), &(b.x + b.y)))
        .unwrap();
    let top_right = *points
        .iter()
        .min_by(|a, b| ord(&(a.x - a.y), &(b.x - b.y)))
        .unwrap();
    let bottom_left = *points
        .iter()
        .max_by(|a, b| ord(&(a.x - a.y), &(b.x - b.y)))
        .unwrap();

    Quadrilateral::new(top_left, top_right, bottom_right, bottom_left)
}

/// Checks a canonicalized quad against the aspect ratio, area, and corner
/// angle invariants. Does not check point count — callers must only pass in
/// quads built from exactly four points.
pub fn validate(quad: &Quadrilateral, frame_width: u32, frame_height: u32, config: &ScannerConfig) -> bool {
    let w = distance(quad.top_left, quad.top_right).max(distance(quad.bottom_left, quad.bottom_right));
    let h = distance(quad.top_right, quad.bottom_right).max(distance(quad.top_left, quad.bottom_left));

    if h <= f64::EPSILON {
        return false;
    }
    let aspect_ratio = w / h;
    if !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&aspect_ratio) {
        return false;
    }

    let min_area = config.min_frame_area_percent * frame_width as f64 * frame_height as f64;
    if shoelace_area(&quad.as_points()) < min_area {
        return false;
    }

    let points = quad.as_points();
    for i in 0..4 {
        let prev = points[(i + 3) % 4];
        let corner = points[i];
        let next = points[(i + 1) % 4];
        let angle = interior_angle_degrees(prev, corner, next);
        if !(MIN_CORNER_ANGLE_DEGREES..=MAX_CORNER_ANGLE_DEGREES).contains(&angle) {
            return false;
        }
    }

    true
}

/// Canonicalizes and validates in one step, the shape every extraction
/// strategy actually wants.
///
/// Shape checks (aspect ratio, area, corner angles) run against the
/// as-detected candidate; only once it passes is it clamped into
/// `[0, frame_width] x [0, frame_height]`, per the invariant that every
/// point the core hands to C4 stays within the frame it came from (a
/// strategy like the Hough fallback may otherwise produce an intersection
/// just outside the frame).
pub fn canonicalize_and_validate(
    points: &[Point; 4],
    frame_width: u32,
    frame_height: u32,
    config: &ScannerConfig,
) -> Option<Quadrilateral> {
    let quad = canonicalize(points);
    if validate(&quad, frame_width, frame_height, config) {
        Some(quad.clamp_to_frame(frame_width, frame_height))
    } else {
        None
    }
}
