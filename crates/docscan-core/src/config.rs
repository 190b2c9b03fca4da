// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-frame scanner configuration.
//
// Immutable for the duration of a single frame; a host may swap it between
// frames (see `docscan-session::ScannerSession::update_config`). Swapping
// takes effect no later than the next frame — the session reads the config
// once at frame entry so a single frame never observes a torn update.

use serde::{Deserialize, Serialize};

/// Tunables for the detection, smoothing, and auto-capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Minimum pixel area for a contour to be considered by the quad
    /// extractor's strategy A/B.
    pub min_contour_area: f64,
    /// A candidate quad's area must be at least this fraction of `W * H`.
    pub min_frame_area_percent: f64,
    /// EMA weight on the new observation, in `(0, 1]`.
    pub smoothing_alpha: f32,
    /// Consecutive stable frames required before auto-capture arms.
    pub required_stable_frames: u32,
    /// Minimum wall-clock time between two auto-captures.
    pub post_capture_cooldown_ms: u64,
    /// Maximum per-corner pixel displacement still counted as "stable".
    pub min_polygon_distance: f32,
    /// Whether auto-capture is enabled at all. When `false`, only a manual
    /// trigger produces a capture.
    pub auto_capture: bool,
    /// Reserved: currently only one detection mode is defined and this
    /// field has no observable effect.
    pub detection_mode: u8,
    /// Rendering hint for `draw_polygon_overlay`: stroke colour as packed
    /// `0xRRGGBB`. Not consulted by detection logic.
    pub stroke_color: u32,
    /// Rendering hint for `draw_polygon_overlay`: fill alpha in `[0, 1]`.
    /// Not consulted by detection logic.
    pub fill_alpha: f32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_contour_area: 3000.0,
            min_frame_area_percent: 0.12,
            smoothing_alpha: 0.15,
            required_stable_frames: 20,
            post_capture_cooldown_ms: 2500,
            min_polygon_distance: 50.0,
            auto_capture: true,
            detection_mode: 1,
            stroke_color: 0x00_7A_FF,
            fill_alpha: 0.2,
        }
    }
}
