// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the docscan detection pipeline.

use serde::{Deserialize, Serialize};

/// A 2-D coordinate in frame pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp this point into `[0, width] x [0, height]`, per the invariant
    /// that every point the core produces stays within the frame it came
    /// from.
    pub fn clamp_to_frame(self, width: u32, height: u32) -> Self {
        Self {
            x: self.x.clamp(0.0, width as f64),
            y: self.y.clamp(0.0, height as f64),
        }
    }
}

/// An ordered 4-tuple of points, canonically `[top-left, top-right,
/// bottom-right, bottom-left]` (clockwise from TL). Corner order is an
/// invariant once a quad leaves the geometry validator (C3) — every other
/// component may assume this ordering and must not need to re-sort it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quadrilateral {
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// The four corners in canonical TL, TR, BR, BL order.
    pub fn as_points(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// Build a quad from a 4-element array already in canonical order.
    pub fn from_points(points: [Point; 4]) -> Self {
        Self {
            top_left: points[0],
            top_right: points[1],
            bottom_right: points[2],
            bottom_left: points[3],
        }
    }

    /// Per-corner EMA: `result[i] = alpha * self[i] + (1 - alpha) * previous[i]`.
    pub fn smoothed_towards(&self, previous: &Quadrilateral, alpha: f32) -> Quadrilateral {
        let alpha = alpha as f64;
        let lerp = |new: Point, prev: Point| Point {
            x: alpha * new.x + (1.0 - alpha) * prev.x,
            y: alpha * new.y + (1.0 - alpha) * prev.y,
        };
        Quadrilateral {
            top_left: lerp(self.top_left, previous.top_left),
            top_right: lerp(self.top_right, previous.top_right),
            bottom_right: lerp(self.bottom_right, previous.bottom_right),
            bottom_left: lerp(self.bottom_left, previous.bottom_left),
        }
    }

    /// Maximum per-corner Euclidean displacement between this quad and
    /// `other`, taken corner-for-corner (not nearest-neighbour matched —
    /// both quads are assumed to already be in canonical order).
    pub fn max_corner_displacement(&self, other: &Quadrilateral) -> f64 {
        self.as_points()
            .iter()
            .zip(other.as_points().iter())
            .map(|(a, b)| crate::geometry::distance(*a, *b))
            .fold(0.0, f64::max)
    }

    /// Unsigned shoelace area of the quad.
    pub fn area(&self) -> f64 {
        crate::geometry::shoelace_area(&self.as_points())
    }

    /// Clamp every corner into the given frame's bounds.
    pub fn clamp_to_frame(&self, width: u32, height: u32) -> Quadrilateral {
        Quadrilateral::from_points(
            self.as_points().map(|p| p.clamp_to_frame(width, height)),
        )
    }
}

/// The result of a single frame's detection pass: a smoothed quadrilateral
/// plus the frame it was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedDocument {
    pub quad: Quadrilateral,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Confidence in `[0, 1]`. Presently always `1.0` — reserved for a
    /// future classifier that scores candidate quads.
    pub confidence: f32,
    pub timestamp_ms: u64,
}

impl DetectedDocument {
    pub fn new(quad: Quadrilateral, frame_width: u32, frame_height: u32, timestamp_ms: u64) -> Self {
        Self {
            quad,
            frame_width,
            frame_height,
            confidence: 1.0,
            timestamp_ms,
        }
    }
}
