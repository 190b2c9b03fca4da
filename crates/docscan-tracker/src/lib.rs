// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temporal filter and stability tracker (C4): per-corner exponential
// smoothing, a stability counter gated on per-corner displacement, and the
// cooldown-gated auto-capture decision. One `DocumentTracker` is owned by a
// single scanning session — it is not `Send`/thread-shared on its own (see
// `docscan-session` for the `Arc<RwLock<..>>` wrapping a host uses across
// frame-producer threads).

use docscan_core::{DetectedDocument, Quadrilateral, ScannerConfig};
use tracing::{debug, info};

/// Explicit state machine driven by `DocumentTracker::update`.
///
/// `Seeking -> Tracking -> Armed -> Captured -> Seeking`, with any
/// two-consecutive-frame detection loss returning to `Seeking` regardless of
/// where in the cycle the tracker was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    /// No document currently tracked.
    Seeking,
    /// A document is tracked but has not yet met the stability bar.
    Tracking,
    /// Stability bar met; waiting on cooldown or a manual trigger.
    Armed,
    /// A capture fired on the most recent `update` call.
    Captured,
}

/// What `DocumentTracker::update` produced for the frame just processed.
#[derive(Debug, Clone)]
pub enum TrackOutcome {
    /// No document in view (beyond the one-frame dropout tolerance).
    Lost,
    /// A document is tracked; its smoothed quad and the current state.
    Tracking {
        quad: Quadrilateral,
        state: DetectionState,
        stable_frame_count: u32,
    },
    /// Auto-capture or a manual trigger fired on this frame.
    Captured { quad: Quadrilateral },
}

/// Owns the smoothing and stability state for one scanning session.
#[derive(Debug, Clone)]
pub struct DocumentTracker {
    state: DetectionState,
    last_smoothed: Option<Quadrilateral>,
    stable_frame_count: u32,
    /// Consecutive frames with no validated candidate. One frame of dropout
    /// is tolerated before the tracked quad is discarded.
    dropout_count: u32,
    last_capture_time_ms: Option<u64>,
    manual_trigger_pending: bool,
}

impl DocumentTracker {
    pub fn new() -> Self {
        Self {
            state: DetectionState::Seeking,
            last_smoothed: None,
            stable_frame_count: 0,
            dropout_count: 0,
            last_capture_time_ms: None,
            manual_trigger_pending: false,
        }
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    pub fn last_smoothed(&self) -> Option<Quadrilateral> {
        self.last_smoothed
    }

    /// Arms a manual capture: the next `update` call captures unconditionally
    /// (subject only to cooldown), regardless of `auto_capture` or the
    /// stability counter, clearing itself once consumed.
    pub fn trigger_manual_capture(&mut self) {
        self.manual_trigger_pending = true;
    }

    /// Feeds one frame's detection result (or `None` for "no candidate this
    /// frame") through smoothing, stability tracking, and the capture
    /// decision.
    pub fn update(
        &mut self,
        detection: Option<&DetectedDocument>,
        config: &ScannerConfig,
        now_ms: u64,
    ) -> TrackOutcome {
        let Some(detection) = detection else {
            return self.handle_dropout();
        };
        self.dropout_count = 0;

        let smoothed = match self.last_smoothed {
            Some(previous) => detection.quad.smoothed_towards(&previous, config.smoothing_alpha),
            None => detection.quad,
        };

        let stable = match self.last_smoothed {
            Some(previous) => detection.quad.max_corner_displacement(&previous) <= config.min_polygon_distance as f64,
            None => false,
        };
        self.stable_frame_count = if stable { self.stable_frame_count + 1 } else { 0 };
        self.last_smoothed = Some(smoothed);

        self.state = if self.stable_frame_count >= config.required_stable_frames {
            DetectionState::Armed
        } else {
            DetectionState::Tracking
        };

        if self.should_capture(config, now_ms) {
            self.stable_frame_count = 0;
            self.last_capture_time_ms = Some(now_ms);
            self.manual_trigger_pending = false;
            self.state = DetectionState::Captured;
            info!("auto-capture fired");
            return TrackOutcome::Captured { quad: smoothed };
        }

        debug!(stable_frame_count = self.stable_frame_count, state = ?self.state, "tracking");
        TrackOutcome::Tracking {
            quad: smoothed,
            state: self.state,
            stable_frame_count: self.stable_frame_count,
        }
    }

    fn should_capture(&self, config: &ScannerConfig, now_ms: u64) -> bool {
        if self.manual_trigger_pending {
            return true;
        }
        let cooldown_elapsed = match self.last_capture_time_ms {
            Some(last) => now_ms.saturating_sub(last) >= config.post_capture_cooldown_ms,
            None => true,
        };
        cooldown_elapsed && config.auto_capture && self.stable_frame_count >= config.required_stable_frames
    }

    fn handle_dropout(&mut self) -> TrackOutcome {
        self.dropout_count += 1;
        // A frame with no valid quad is never stable, tolerated or not.
        self.stable_frame_count = 0;

        if self.dropout_count >= 2 {
            self.last_smoothed = None;
            self.state = DetectionState::Seeking;
            debug!("detection lost for two consecutive frames; resetting to seeking");
            return TrackOutcome::Lost;
        }

        // One-frame tolerance: keep the last smoothed quad and state alive.
        match self.last_smoothed {
            Some(quad) => TrackOutcome::Tracking {
                quad,
                state: self.state,
                stable_frame_count: self.stable_frame_count,
            },
            None => TrackOutcome::Lost,
        }
    }
}

impl Default for DocumentTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::Point;
    use proptest::prelude::*;

    fn detection(x_off: f64, frame: u64) -> DetectedDocument {
        let quad = Quadrilateral::new(
            Point::new(0.0 + x_off, 0.0),
            Point::new(100.0 + x_off, 0.0),
            Point::new(100.0 + x_off, 140.0),
            Point::new(0.0 + x_off, 140.0),
        );
        DetectedDocument::new(quad, 640, 480, frame)
    }

    #[test]
    fn first_detection_enters_tracking_with_zero_stable_frames() {
        let mut tracker = DocumentTracker::new();
        let config = ScannerConfig::default();
        let outcome = tracker.update(Some(&detection(0.0, 0)), &config, 0);
        match outcome {
            TrackOutcome::Tracking { state, stable_frame_count, .. } => {
                assert_eq!(state, DetectionState::Tracking);
                assert_eq!(stable_frame_count, 0);
            }
            other => panic!("expected Tracking, got {other:?}"),
        }
    }

    #[test]
    fn stationary_quad_accumulates_stability_until_capture() {
        let mut tracker = DocumentTracker::new();
        let config = ScannerConfig {
            required_stable_frames: 5,
            ..ScannerConfig::default()
        };
        let mut now = 0u64;
        let mut captured = false;
        for _ in 0..10 {
            let outcome = tracker.update(Some(&detection(0.0, now)), &config, now);
            if let TrackOutcome::Captured { .. } = outcome {
                captured = true;
                break;
            }
            now += 33;
        }
        assert!(captured, "expected an auto-capture within ten stationary frames");
    }

    #[test]
    fn jittery_quad_never_accumulates_stability() {
        let mut tracker = DocumentTracker::new();
        let config = ScannerConfig {
            required_stable_frames: 5,
            min_polygon_distance: 1.0,
            ..ScannerConfig::default()
        };
        let mut now = 0u64;
        for i in 0..20 {
            let jitter = if i % 2 == 0 { 0.0 } else { 50.0 };
            let outcome = tracker.update(Some(&detection(jitter, now)), &config, now);
            assert!(!matches!(outcome, TrackOutcome::Captured { .. }));
            now += 33;
        }
    }

    /// Scenario S3 — large movement: a document that jumps 200px between
    /// two frames (well past the default `min_polygon_distance` of 50)
    /// resets the stability counter; no capture can fire before
    /// `required_stable_frames` more frames have accumulated past the jump.
    #[test]
    fn s3_large_movement_resets_stability_and_delays_capture() {
        let mut tracker = DocumentTracker::new();
        let config = ScannerConfig::default();
        let mut now = 0u64;

        for frame in 0..10 {
            tracker.update(Some(&detection(0.0, now)), &config, now);
            now += 33;
            let _ = frame;
        }
        assert!(
            tracker.last_smoothed().is_some(),
            "ten stationary frames should already be tracking something"
        );

        // Frame 11: a 200px jump, far past min_polygon_distance.
        let jump_outcome = tracker.update(Some(&detection(200.0, now)), &config, now);
        match jump_outcome {
            TrackOutcome::Tracking { stable_frame_count, .. } => {
                assert_eq!(stable_frame_count, 0, "a 200px jump must reset the stability counter");
            }
            other => panic!("expected Tracking after the jump, got {other:?}"),
        }
        now += 33;

        // No capture before frame (11 + required_stable_frames) at the earliest.
        for _ in 0..(config.required_stable_frames - 1) {
            let outcome = tracker.update(Some(&detection(200.0, now)), &config, now);
            assert!(!matches!(outcome, TrackOutcome::Captured { .. }));
            now += 33;
        }
    }

    #[test]
    fn single_frame_dropout_is_tolerated() {
        let mut tracker = DocumentTracker::new();
        let config = ScannerConfig::default();
        tracker.update(Some(&detection(0.0, 0)), &config, 0);
        let outcome = tracker.update(None, &config, 33);
        assert!(matches!(outcome, TrackOutcome::Tracking { .. }));
    }

    #[test]
    fn two_consecutive_dropouts_reset_to_seeking() {
        let mut tracker = DocumentTracker::new();
        let config = ScannerConfig::default();
        tracker.update(Some(&detection(0.0, 0)), &config, 0);
        tracker.update(None, &config, 33);
        let outcome = tracker.update(None, &config, 66);
        assert!(matches!(outcome, TrackOutcome::Lost));
        assert_eq!(tracker.state(), DetectionState::Seeking);
    }

    #[test]
    fn manual_trigger_captures_immediately_even_when_not_stable() {
        let mut tracker = DocumentTracker::new();
        let config = ScannerConfig {
            required_stable_frames: 999,
            ..ScannerConfig::default()
        };
        tracker.trigger_manual_capture();
        let outcome = tracker.update(Some(&detection(0.0, 0)), &config, 0);
        assert!(matches!(outcome, TrackOutcome::Captured { .. }));
    }

    /// Scenario S5 — manual trigger bypasses cooldown: unlike auto-capture,
    /// a manual trigger fires even while a prior capture's cooldown window
    /// is still open.
    #[test]
    fn manual_trigger_bypasses_an_active_cooldown() {
        let mut tracker = DocumentTracker::new();
        let config = ScannerConfig {
            required_stable_frames: 2,
            post_capture_cooldown_ms: 5000,
            ..ScannerConfig::default()
        };
        let mut now = 0u64;
        let mut first_capture_at = None;
        for _ in 0..6 {
            if let TrackOutcome::Captured { .. } = tracker.update(Some(&detection(0.0, now)), &config, now) {
                first_capture_at = Some(now);
                break;
            }
            now += 100;
        }
        assert!(first_capture_at.is_some());

        // Still well inside the cooldown window.
        now += 100;
        tracker.trigger_manual_capture();
        let outcome = tracker.update(Some(&detection(0.0, now)), &config, now);
        assert!(matches!(outcome, TrackOutcome::Captured { .. }));
    }

    #[test]
    fn cooldown_blocks_back_to_back_captures() {
        let mut tracker = DocumentTracker::new();
        let config = ScannerConfig {
            required_stable_frames: 2,
            post_capture_cooldown_ms: 5000,
            ..ScannerConfig::default()
        };
        let mut now = 0u64;
        let mut first_capture_at = None;
        for _ in 0..6 {
            if let TrackOutcome::Captured { .. } = tracker.update(Some(&detection(0.0, now)), &config, now) {
                first_capture_at = Some(now);
                break;
            }
            now += 100;
        }
        assert!(first_capture_at.is_some());

        // Immediately stable again, but cooldown has not elapsed.
        for _ in 0..10 {
            now += 100;
            let outcome = tracker.update(Some(&detection(0.0, now)), &config, now);
            assert!(!matches!(outcome, TrackOutcome::Captured { .. }));
        }
    }

    proptest! {
        /// Property 3: a stationary quad held for exactly
        /// `required_stable_frames + 1` updates (the first frame never
        /// counts as stable against itself) fires exactly one capture, on
        /// the final update.
        #[test]
        fn stationary_window_fires_exactly_one_capture(required_stable_frames in 1u32..40) {
            let mut tracker = DocumentTracker::new();
            let config = ScannerConfig {
                required_stable_frames,
                post_capture_cooldown_ms: 0,
                ..ScannerConfig::default()
            };
            let mut captures = 0u32;
            let total_calls = required_stable_frames + 1;
            for i in 0..total_calls {
                let now = i as u64 * 33;
                let outcome = tracker.update(Some(&detection(0.0, now)), &config, now);
                if matches!(outcome, TrackOutcome::Captured { .. }) {
                    captures += 1;
                    prop_assert_eq!(i, total_calls - 1, "capture fired before the stability window closed");
                }
            }
            prop_assert_eq!(captures, 1);
        }

        /// Property 4: once a capture fires, no second capture fires while
        /// `now - last_capture_time_ms < post_capture_cooldown_ms`, even if
        /// the tracked quad is stationary and re-stabilizes instantly.
        #[test]
        fn cooldown_window_blocks_second_capture(
            required_stable_frames in 1u32..10,
            cooldown_ms in 100u64..5000,
            frame_interval_ms in 1u64..50,
        ) {
            let mut tracker = DocumentTracker::new();
            let config = ScannerConfig {
                required_stable_frames,
                post_capture_cooldown_ms: cooldown_ms,
                ..ScannerConfig::default()
            };
            let mut now = 0u64;
            let mut first_capture_at = None;
            for _ in 0..(required_stable_frames + 5) {
                if let TrackOutcome::Captured { .. } = tracker.update(Some(&detection(0.0, now)), &config, now) {
                    first_capture_at = Some(now);
                    break;
                }
                now += frame_interval_ms;
            }
            let Some(first_capture_at) = first_capture_at else {
                // Cooldown irrelevant if no capture happened in this window.
                return Ok(());
            };

            while now - first_capture_at < cooldown_ms {
                now += frame_interval_ms;
                let outcome = tracker.update(Some(&detection(0.0, now)), &config, now);
                prop_assert!(!matches!(outcome, TrackOutcome::Captured { .. }));
            }
        }
    }
}
