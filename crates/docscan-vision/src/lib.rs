// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-frame document detection pipeline: grayscale/edge preprocessing (C1),
// quadrilateral extraction via three fallback strategies (C2), geometry
// validation and corner canonicalization (C3), and perspective rectification
// (C5). Every function here is a pure, stateless transform of one frame —
// temporal smoothing and the auto-capture state machine live in
// `docscan-tracker`.

pub mod extract;
pub mod preprocess;
pub mod rectify;
pub mod validate;

use docscan_core::{DetectedDocument, DocScanError, ImageView, Quadrilateral, ScannerConfig};
use tracing::{debug, info, instrument};

/// Runs the C1 → C2 → C3 pipeline on a single frame.
///
/// Analyzes a frame in isolation: no per-session state is read or written.
/// Returns `Ok(None)` when no strategy produced a quad that passed
/// validation — this is the ordinary "no document in view" outcome, not an
/// error. Returns `Err` only for a malformed frame or an internal imaging
/// failure.
pub struct FrameAnalyzer;

impl FrameAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Detect a document quadrilateral in `view`, or `None` if none of the
    /// three extraction strategies produced a validated candidate.
    #[instrument(skip(self, view, config), fields(width = view.width(), height = view.height()))]
    pub fn analyze(
        &self,
        view: &ImageView,
        config: &ScannerConfig,
        now_ms: u64,
    ) -> Result<Option<DetectedDocument>, DocScanError> {
        let gray = preprocess::to_gray_image(view)?;
        let prepped = preprocess::preprocess(&gray);

        let quad = extract::extract_quad(&prepped, gray.width(), gray.height(), config);

        match quad {
            Some(quad) => {
                info!("document quadrilateral detected");
                Ok(Some(DetectedDocument::new(
                    quad,
                    gray.width(),
                    gray.height(),
                    now_ms,
                )))
            }
            None => {
                debug!("no quadrilateral candidate passed validation");
                Ok(None)
            }
        }
    }

    /// Rectify `view` against a previously validated `quad` (C5): crops and
    /// warps the document into an upright, axis-aligned `ImageView`.
    #[instrument(skip(self, view, quad))]
    pub fn rectify(&self, view: &ImageView, quad: &Quadrilateral) -> Result<ImageView, DocScanError> {
        rectify::rectify(view, quad)
    }
}

impl Default for FrameAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
