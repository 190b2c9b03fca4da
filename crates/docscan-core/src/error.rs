// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error type for the docscan detection pipeline.
//
// `NoCandidate` (no quad found) and `ValidationRejected` (C3 rejection) are
// intentionally not variants here — per the error-handling design, they are
// ordinary control flow (`Option`/early-return), never surfaced as errors.

use thiserror::Error;

/// Top-level error type for all docscan operations.
#[derive(Debug, Error)]
pub enum DocScanError {
    /// Zero-dimension frame or an unsupported channel layout. The frame is
    /// skipped; the caller is told so explicitly rather than the failure
    /// being swallowed as "no detection".
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The canonicalized quad produced a degenerate or non-finite warp
    /// transform. The detection callback still fires with the smoothed
    /// quad; only the capture is skipped.
    #[error("rectification failed: {0}")]
    RectificationFailed(String),

    /// An underlying `image`/`imageproc` primitive raised an error.
    /// Callers should log this at debug level and treat the frame as
    /// `NoCandidate`; the tracker treats it as a detection loss.
    #[error("internal imaging error: {0}")]
    InternalImagingError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocScanError>;
