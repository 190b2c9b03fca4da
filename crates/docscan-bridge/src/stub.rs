// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// No-op frame source for desktop/CI builds where no camera is available.

use docscan_core::{DocScanError, ImageView};

use crate::traits::{CaptureSink, FrameSource};

/// Never produces a frame. Useful for wiring a `ScannerSession` into a test
/// harness or CI job that feeds frames some other way (e.g. from disk)
/// without a real `FrameSource`.
pub struct StubFrameSource;

impl FrameSource for StubFrameSource {
    fn next_frame(&mut self) -> Result<Option<ImageView>, DocScanError> {
        tracing::debug!("StubFrameSource::next_frame called; no camera on this platform");
        Ok(None)
    }
}

/// Logs captures and previews instead of persisting or displaying them.
pub struct StubCaptureSink;

impl CaptureSink for StubCaptureSink {
    fn on_captured(&mut self, image: ImageView) {
        tracing::info!(width = image.width(), height = image.height(), "stub sink: document captured");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_frame_source_never_produces_a_frame() {
        let mut source = StubFrameSource;
        assert!(source.next_frame().unwrap().is_none());
    }
}
