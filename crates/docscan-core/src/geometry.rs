// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small geometry helpers shared by the vision, tracker, and session crates.

use crate::types::Point;

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Signed shoelace area of a simple polygon given by its vertices in order.
///
/// Positive for counter-clockwise vertex order, negative for clockwise, by
/// the usual shoelace convention. Callers that only need magnitude should
/// take `.abs()`.
pub fn shoelace_signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum / 2.0
}

/// Unsigned shoelace area of a simple polygon.
pub fn shoelace_area(points: &[Point]) -> f64 {
    shoelace_signed_area(points).abs()
}

/// Interior angle in degrees at `corner`, formed by the two edges
/// `prev -> corner` and `corner -> next`.
pub fn interior_angle_degrees(prev: Point, corner: Point, next: Point) -> f64 {
    let v1 = (prev.x - corner.x, prev.y - corner.y);
    let v2 = (next.x - corner.x, next.y - corner.y);

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let mag1 = (v1.0.powi(2) + v1.1.powi(2)).sqrt();
    let mag2 = (v2.0.powi(2) + v2.1.powi(2)).sqrt();

    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }

    let cos_theta = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_theta.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_pythagorean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((distance(a, b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn shoelace_area_unit_square() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert!((shoelace_area(&pts) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn shoelace_area_is_invariant_to_winding() {
        let cw = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
        ];
        assert!((shoelace_area(&cw) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn right_angle_is_ninety_degrees() {
        let corner = Point::new(0.0, 0.0);
        let prev = Point::new(1.0, 0.0);
        let next = Point::new(0.0, 1.0);
        let angle = interior_angle_degrees(prev, corner, next);
        assert!((angle - 90.0).abs() < 1e-6);
    }
}
