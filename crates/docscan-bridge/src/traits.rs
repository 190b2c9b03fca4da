// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The host-implemented boundary. Everything upstream of `FrameSource` (the
// camera session, permission prompts, frame cadence) and downstream of
// `CaptureSink` (persistence, share sheets, preview rendering) is the host's
// concern, not this core's.

use docscan_core::{DocScanError, ImageView};

/// Converts a platform-native camera frame into the neutral `ImageView`
/// boundary type. A host pulls frames by calling `next_frame` in its own
/// capture loop; this core never owns that loop.
pub trait FrameSource {
    /// Returns the next available frame, or `Ok(None)` if the source has no
    /// frame ready (e.g. waiting on the next camera callback) without that
    /// being an error.
    fn next_frame(&mut self) -> Result<Option<ImageView>, DocScanError>;
}

/// Receives output a host cares about: the rectified capture, and
/// optionally a live preview frame with the tracked quad overlaid.
pub trait CaptureSink {
    /// A rectified document was captured. Called at most once per
    /// auto-capture or manual trigger.
    fn on_captured(&mut self, image: ImageView);

    /// A preview frame, typically with `docscan_session::draw_polygon_overlay`
    /// already applied, ready for display. Called once per processed frame;
    /// hosts that don't render a preview can no-op this.
    fn on_preview(&mut self, image: &ImageView) {
        let _ = image;
    }
}
