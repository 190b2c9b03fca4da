// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame-analyzer glue. `ScannerSession` owns the tracker state for one
// scanning session, consults an atomically-swapped `ScannerConfig`, and
// drives `docscan-vision`'s per-frame pipeline. Single-threaded per session:
// each `process_frame`/`drive` call runs to completion before the next
// begins, matching the `Arc<Mutex<_>>` shared-state style
// `presswerk-print::resilience::NetworkResilience` uses for state a host
// thread may poke between calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use docscan_core::{DetectedDocument, DocScanError, ImageView, Quadrilateral, ScannerConfig};
use docscan_tracker::{DocumentTracker, TrackOutcome};
use docscan_vision::FrameAnalyzer;
use tracing::{info, instrument, warn};

pub mod overlay;

pub use overlay::{draw_polygon_overlay, OverlayStyle};

/// Events a streaming host receives from `ScannerSession::drive`, in this
/// order for a given frame: `DocumentDetected` always precedes
/// `DocumentCaptured`.
#[derive(Debug, Clone)]
pub enum ScannerEvent {
    DocumentDetected {
        quad: Option<Quadrilateral>,
        frame_width: u32,
        frame_height: u32,
    },
    DocumentCaptured { image: ImageView },
}

/// The polling-form result of a single `process_frame` call: the current
/// smoothed detection, plus a captured rectified image if this frame
/// triggered one.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub detection: Option<DetectedDocument>,
    pub capture: Option<ImageView>,
}

/// Owns the detection/tracking state for one scanning session.
///
/// Not internally concurrent: callers must serialize frame delivery (one
/// `process_frame`/`drive` call at a time). `config` and the manual-capture
/// flag may be updated from another thread between calls.
pub struct ScannerSession {
    analyzer: FrameAnalyzer,
    tracker: DocumentTracker,
    config: Arc<RwLock<ScannerConfig>>,
    manual_trigger: Arc<AtomicBool>,
}

impl ScannerSession {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            analyzer: FrameAnalyzer::new(),
            tracker: DocumentTracker::new(),
            config: Arc::new(RwLock::new(config)),
            manual_trigger: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Swaps the session's config. Takes effect no later than the next
    /// frame — a single `process_frame` call reads the config exactly once,
    /// so it never observes a torn update.
    pub fn update_config(&self, new_config: ScannerConfig) {
        if let Ok(mut guard) = self.config.write() {
            *guard = new_config;
        }
    }

    /// Arms a manual capture. Write-once, read-once: the flag is cleared by
    /// the tracker the first time it is consulted, whether or not the
    /// capture actually fires (cooldown can still block it).
    pub fn trigger_manual_capture(&self) {
        self.manual_trigger.store(true, Ordering::SeqCst);
    }

    /// Runs the pipeline and returns the current smoothed quad, if any.
    /// Equivalent to `process_frame_smooth` — this implementation always
    /// returns the smoothed quad, never the raw per-frame candidate.
    #[instrument(skip(self, frame))]
    pub fn process_frame(&mut self, frame: &ImageView) -> Option<DetectedDocument> {
        self.drive_internal(frame, |_| {}).detection
    }

    /// Convenience alias for non-streaming callers who want the smoothing
    /// guarantee spelled out in the method name.
    pub fn process_frame_smooth(&mut self, frame: &ImageView) -> Option<DetectedDocument> {
        self.process_frame(frame)
    }

    /// Runs the pipeline and fires `listener` with `DocumentDetected` then,
    /// if this frame captured, `DocumentCaptured` — the streaming form for
    /// hosts that prefer events over polling `process_frame`'s return value.
    #[instrument(skip(self, frame, listener))]
    pub fn drive(&mut self, frame: &ImageView, listener: impl FnMut(ScannerEvent)) {
        self.drive_internal(frame, listener);
    }

    fn drive_internal(
        &mut self,
        frame: &ImageView,
        mut listener: impl FnMut(ScannerEvent),
    ) -> FrameOutcome {
        let config = match self.config.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        };
        if self.manual_trigger.swap(false, Ordering::SeqCst) {
            self.tracker.trigger_manual_capture();
        }

        let now_ms = docscan_core::now_ms();
        let raw = match self.analyzer.analyze(frame, &config, now_ms) {
            Ok(detection) => detection,
            Err(err) => {
                warn!(error = %err, "frame analysis failed; treating as no detection");
                None
            }
        };

        let outcome = self.tracker.update(raw.as_ref(), &config, now_ms);

        let (detection, capture_quad) = match outcome {
            TrackOutcome::Lost => (None, None),
            TrackOutcome::Tracking { quad, .. } => (
                Some(DetectedDocument::new(quad, frame.width(), frame.height(), now_ms)),
                None,
            ),
            TrackOutcome::Captured { quad } => (
                Some(DetectedDocument::new(quad, frame.width(), frame.height(), now_ms)),
                Some(quad),
            ),
        };

        listener(ScannerEvent::DocumentDetected {
            quad: detection.as_ref().map(|d| d.quad),
            frame_width: frame.width(),
            frame_height: frame.height(),
        });

        let capture = match capture_quad {
            Some(quad) => match self.analyzer.rectify(frame, &quad) {
                Ok(image) => {
                    info!("document captured and rectified");
                    listener(ScannerEvent::DocumentCaptured { image: image.clone() });
                    Some(image)
                }
                Err(err) => {
                    warn!(error = %err, "rectification failed; capture discarded, tracking unaffected");
                    None
                }
            },
            None => None,
        };

        FrameOutcome { detection, capture }
    }
}

/// Stateless rectification, callable without a session.
pub fn crop_document(frame: &ImageView, quad: &Quadrilateral) -> Result<ImageView, DocScanError> {
    docscan_vision::rectify::rectify(frame, quad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::ChannelLayout;

    fn blank_frame(w: u32, h: u32) -> ImageView {
        ImageView::packed(w, h, ChannelLayout::Luma, vec![30u8; (w * h) as usize]).unwrap()
    }

    #[test]
    fn process_frame_on_blank_input_returns_no_detection() {
        let mut session = ScannerSession::new(ScannerConfig::default());
        let frame = blank_frame(200, 200);
        assert!(session.process_frame(&frame).is_none());
    }

    #[test]
    fn update_config_is_visible_to_the_next_frame() {
        let session = ScannerSession::new(ScannerConfig::default());
        let mut updated = ScannerConfig::default();
        updated.min_contour_area = 999.0;
        session.update_config(updated);
        assert_eq!(session.config.read().unwrap().min_contour_area, 999.0);
    }

    #[test]
    fn manual_trigger_flag_is_write_once_read_once() {
        let session = ScannerSession::new(ScannerConfig::default());
        session.trigger_manual_capture();
        assert!(session.manual_trigger.swap(false, Ordering::SeqCst));
        assert!(!session.manual_trigger.load(Ordering::SeqCst));
    }

    #[test]
    fn drive_fires_detected_event_even_with_no_document() {
        let mut session = ScannerSession::new(ScannerConfig::default());
        let frame = blank_frame(100, 100);
        let mut events = Vec::new();
        session.drive(&frame, |event| events.push(event));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ScannerEvent::DocumentDetected { quad: None, .. }));
    }

    /// A dark frame with a lighter rectangle, tightly packed grayscale —
    /// the same shape of synthetic frame the vision crate's own extraction
    /// tests use, fed through the full session this time.
    fn synthetic_document_frame(w: u32, h: u32, rect: (u32, u32, u32, u32)) -> ImageView {
        let (x0, y0, x1, y1) = rect;
        let mut data = vec![30u8; (w * h) as usize];
        for y in y0..y1 {
            for x in x0..x1 {
                data[(y * w + x) as usize] = 235;
            }
        }
        ImageView::packed(w, h, ChannelLayout::Luma, data).unwrap()
    }

    /// Scenario S1 — clean static document: a stationary rectangle held
    /// across frames should be detected continuously, accumulate stability,
    /// and auto-capture exactly once, producing a rectified image whose
    /// dimensions are close to the drawn rectangle's.
    #[test]
    fn s1_clean_static_document_captures_exactly_once() {
        let rect = (60, 30, 240, 270);
        let frame = synthetic_document_frame(300, 300, rect);
        let mut session = ScannerSession::new(ScannerConfig::default());

        let mut detections = 0u32;
        let mut captures: Vec<ImageView> = Vec::new();
        for _ in 0..30 {
            session.drive(&frame, |event| match event {
                ScannerEvent::DocumentDetected { quad: Some(_), .. } => detections += 1,
                ScannerEvent::DocumentCaptured { image } => captures.push(image),
                _ => {}
            });
            if !captures.is_empty() {
                break;
            }
        }

        assert_eq!(captures.len(), 1, "expected exactly one auto-capture in the window");
        assert!(detections >= 20, "document should be detected on most frames before capture");

        let drawn_w = (rect.2 - rect.0) as f64;
        let drawn_h = (rect.3 - rect.1) as f64;
        let captured = &captures[0];
        assert!((captured.width() as f64 - drawn_w).abs() / drawn_w < 0.25);
        assert!((captured.height() as f64 - drawn_h).abs() / drawn_h < 0.25);
    }

    /// Scenario S2 — jittered document: small per-frame perturbation (well
    /// under `min_polygon_distance`) still reaches stability and captures,
    /// because the tracked displacement is measured on the *smoothed*
    /// quad, which damps per-frame noise.
    #[test]
    fn s2_jittered_document_still_captures() {
        let base = (60u32, 30u32, 240u32, 270u32);
        let mut session = ScannerSession::new(ScannerConfig::default());
        let mut captures: Vec<ImageView> = Vec::new();

        // Breaks on the first capture rather than running a fixed number of
        // frames: the default 2500ms cooldown is wall-clock, and a slow
        // machine running 40+ full pipeline passes could cross it, making a
        // second capture legitimate rather than a test bug.
        for i in 0..40u32 {
            // Deterministic +-8px jitter without pulling in a RNG dependency.
            let jitter = (i * 7 % 17) as i32 - 8;
            let rect = (
                (base.0 as i32 + jitter).max(0) as u32,
                (base.1 as i32 + jitter).max(0) as u32,
                (base.2 as i32 + jitter).max(0) as u32,
                (base.3 as i32 + jitter).max(0) as u32,
            );
            let frame = synthetic_document_frame(300, 300, rect);
            session.drive(&frame, |event| {
                if let ScannerEvent::DocumentCaptured { image } = event {
                    captures.push(image);
                }
            });
            if !captures.is_empty() {
                break;
            }
        }

        assert_eq!(captures.len(), 1, "jitter under min_polygon_distance should still allow one capture");
    }
}
