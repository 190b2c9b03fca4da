// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quad extractor (C2): three strategies, tried in strict order, the first
// candidate to pass `validate::canonicalize_and_validate` wins.
//
//   A. external contours -> Douglas-Peucker simplification -> 4-vertex check
//   B. minimum-area rotated rectangle of the largest contour
//   C. Hough line transform, classify by angle, intersect outermost pairs
//
// `imageproc` has no polygon simplification or minimum-area-rectangle
// primitive, so both are hand-rolled below.

use docscan_core::geometry::{distance, shoelace_area};
use docscan_core::{Point, Quadrilateral, ScannerConfig};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use tracing::debug;

use crate::validate::canonicalize_and_validate;

/// Fraction of a contour's perimeter used as the Douglas-Peucker epsilon.
const APPROX_POLY_EPSILON_FACTOR: f64 = 0.02;

/// Runs strategies A, B, then C in order and returns the first validated
/// candidate, or `None` if no strategy produces one.
pub fn extract_quad(
    edges: &GrayImage,
    frame_width: u32,
    frame_height: u32,
    config: &ScannerConfig,
) -> Option<Quadrilateral> {
    let contours = find_contours::<u32>(edges);
    let mut outer: Vec<Vec<Point>> = contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .map(contour_to_points)
        .collect();
    outer.sort_by(|a, b| {
        shoelace_area(b)
            .partial_cmp(&shoelace_area(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if let Some(quad) = strategy_a(&outer, frame_width, frame_height, config) {
        debug!("strategy A (contour + polygon approximation) produced a quad");
        return Some(quad);
    }
    if let Some(quad) = strategy_b(&outer, frame_width, frame_height, config) {
        debug!("strategy B (minimum-area rectangle) produced a quad");
        return Some(quad);
    }
    if let Some(quad) = strategy_c(edges, frame_width, frame_height, config) {
        debug!("strategy C (Hough line intersection) produced a quad");
        return Some(quad);
    }
    None
}

fn contour_to_points(contour: Contour<u32>) -> Vec<Point> {
    contour
        .points
        .into_iter()
        .map(|p| Point::new(p.x as f64, p.y as f64))
        .collect()
}

fn perimeter(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..points.len() {
        let next = (i + 1) % points.len();
        total += distance(points[i], points[next]);
    }
    total
}

// -- Strategy A: contour + Douglas-Peucker ------------------------------------

fn strategy_a(
    contours: &[Vec<Point>],
    frame_width: u32,
    frame_height: u32,
    config: &ScannerConfig,
) -> Option<Quadrilateral> {
    for contour in contours {
        if shoelace_area(contour) < config.min_contour_area {
            continue;
        }
        let epsilon = perimeter(contour) * APPROX_POLY_EPSILON_FACTOR;
        let simplified = douglas_peucker(contour, epsilon);
        if simplified.len() != 4 {
            continue;
        }
        let points: [Point; 4] = [simplified[0], simplified[1], simplified[2], simplified[3]];
        if let Some(quad) = canonicalize_and_validate(&points, frame_width, frame_height, config) {
            return Some(quad);
        }
    }
    None
}

/// Ramer-Douglas-Peucker polygon simplification on a closed contour.
///
/// Finds the point farthest from the chord between the first and last point;
/// if that distance exceeds `epsilon`, recurses on both halves, otherwise
/// collapses the run to its two endpoints.
fn douglas_peucker(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut result = vec![points[0]];
    dp_recursive(points, 0, points.len() - 1, epsilon, &mut result);
    result.push(points[points.len() - 1]);
    result
}

fn dp_recursive(points: &[Point], start: usize, end: usize, epsilon: f64, result: &mut Vec<Point>) {
    if end <= start + 1 {
        return;
    }
    let a = points[start];
    let b = points[end];
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let line_length = (dx * dx + dy * dy).sqrt().max(1e-9);

    let mut max_distance = 0.0;
    let mut max_index = start;
    for i in (start + 1)..end {
        let p = points[i];
        let dist = ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / line_length;
        if dist > max_distance {
            max_distance = dist;
            max_index = i;
        }
    }

    if max_distance > epsilon {
        dp_recursive(points, start, max_index, epsilon, result);
        result.push(points[max_index]);
        dp_recursive(points, max_index, end, epsilon, result);
    }
}

// -- Strategy B: minimum-area rotated rectangle -------------------------------

fn strategy_b(
    contours: &[Vec<Point>],
    frame_width: u32,
    frame_height: u32,
    config: &ScannerConfig,
) -> Option<Quadrilateral> {
    let largest = contours.first()?;
    if shoelace_area(largest) < config.min_contour_area {
        return None;
    }
    let corners = min_area_rect_corners(largest)?;
    canonicalize_and_validate(&corners, frame_width, frame_height, config)
}

/// Minimum-area enclosing rectangle of a point set via rotating calipers
/// over its convex hull. Returns the rectangle's four corners.
fn min_area_rect_corners(points: &[Point]) -> Option<[Point; 4]> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return None;
    }

    let mut best_area = f64::MAX;
    let mut best_corners: Option<[Point; 4]> = None;

    for i in 0..hull.len() {
        let p1 = hull[i];
        let p2 = hull[(i + 1) % hull.len()];
        let edge_x = p2.x - p1.x;
        let edge_y = p2.y - p1.y;
        let edge_len = (edge_x * edge_x + edge_y * edge_y).sqrt();
        if edge_len < 1e-9 {
            continue;
        }
        let ux = edge_x / edge_len;
        let uy = edge_y / edge_len;
        let vx = -uy;
        let vy = ux;

        let (mut min_u, mut max_u, mut min_v, mut max_v) =
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for p in &hull {
            let dx = p.x - p1.x;
            let dy = p.y - p1.y;
            let u = dx * ux + dy * uy;
            let v = dx * vx + dy * vy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if area < best_area {
            best_area = area;
            let corner = |u: f64, v: f64| Point::new(p1.x + u * ux + v * vx, p1.y + u * uy + v * vy);
            best_corners = Some([
                corner(min_u, min_v),
                corner(max_u, min_v),
                corner(max_u, max_v),
                corner(min_u, max_v),
            ]);
        }
    }

    best_corners
}

/// Convex hull via Andrew's monotone chain.
fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    let ord = |a: &f64, b: &f64| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal);
    pts.sort_by(|a, b| ord(&a.x, &b.x).then_with(|| ord(&a.y, &b.y)));
    pts.dedup_by(|a, b| a.x == b.x && a.y == b.y);
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: Point, a: Point, b: Point| (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x);

    let mut lower: Vec<Point> = Vec::new();
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

// -- Strategy C: Hough line intersection --------------------------------------

fn strategy_c(
    edges: &GrayImage,
    frame_width: u32,
    frame_height: u32,
    config: &ScannerConfig,
) -> Option<Quadrilateral> {
    let diagonal = ((frame_width as f64).powi(2) + (frame_height as f64).powi(2)).sqrt();
    let vote_threshold = (diagonal * 0.2).max(40.0) as u32;
    let lines = detect_lines(
        edges,
        LineDetectionOptions {
            vote_threshold,
            suppression_radius: 8,
        },
    );

    let (horizontal, vertical): (Vec<PolarLine>, Vec<PolarLine>) = lines
        .into_iter()
        .partition(|line| line.angle_in_degrees <= 45 || line.angle_in_degrees >= 135);

    if horizontal.len() < 2 || vertical.len() < 2 {
        return None;
    }

    let top = extreme_line(&horizontal, false);
    let bottom = extreme_line(&horizontal, true);
    let left = extreme_line(&vertical, false);
    let right = extreme_line(&vertical, true);

    let top_left = intersect_polar_lines(&top, &left)?;
    let top_right = intersect_polar_lines(&top, &right)?;
    let bottom_right = intersect_polar_lines(&bottom, &right)?;
    let bottom_left = intersect_polar_lines(&bottom, &left)?;

    let corners = [top_left, top_right, bottom_right, bottom_left];
    if corners.iter().any(|p| out_of_tolerance(*p, frame_width, frame_height)) {
        return None;
    }

    canonicalize_and_validate(&corners, frame_width, frame_height, config)
}

/// Picks the line with the largest (`farthest = true`) or smallest `r`.
fn extreme_line(lines: &[PolarLine], farthest: bool) -> PolarLine {
    let ord = |a: &PolarLine, b: &PolarLine| a.r.partial_cmp(&b.r).unwrap_or(std::cmp::Ordering::Equal);
    let fallback = lines[0];
    if farthest {
        lines.iter().max_by(|a, b| ord(a, b)).copied().unwrap_or(fallback)
    } else {
        lines.iter().min_by(|a, b| ord(a, b)).copied().unwrap_or(fallback)
    }
}

fn intersect_polar_lines(a: &PolarLine, b: &PolarLine) -> Option<Point> {
    let theta_a = (a.angle_in_degrees as f64).to_radians();
    let theta_b = (b.angle_in_degrees as f64).to_radians();
    let (cos_a, sin_a) = (theta_a.cos(), theta_a.sin());
    let (cos_b, sin_b) = (theta_b.cos(), theta_b.sin());

    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }

    let (r_a, r_b) = (a.r as f64, b.r as f64);
    let x = (r_a * sin_b - r_b * sin_a) / denom;
    let y = (r_b * cos_a - r_a * cos_b) / denom;
    Some(Point::new(x, y))
}

/// Rejects an intersection that lands more than one full frame dimension
/// outside the frame on either axis.
fn out_of_tolerance(p: Point, frame_width: u32, frame_height: u32) -> bool {
    let w = frame_width as f64;
    let h = frame_height as f64;
    p.x < -w || p.x > 2.0 * w || p.y < -h || p.y > 2.0 * h
}
