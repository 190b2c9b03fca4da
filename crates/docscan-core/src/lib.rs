// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan — Core types, configuration, and error definitions shared across
// all detection-pipeline crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod image_view;
pub mod types;

pub use config::ScannerConfig;
pub use error::DocScanError;
pub use image_view::{ChannelLayout, ImageView};
pub use types::{DetectedDocument, Point, Quadrilateral};

/// Milliseconds elapsed since this process started, on a monotonic clock.
///
/// The cooldown gate in `docscan-tracker` needs elapsed time that never runs
/// backward (a wall-clock read can jump on an NTP sync or manual clock
/// change); `Instant` is the monotonic source, the same way
/// `presswerk-print`'s circuit breaker uses `Instant::now()` for its
/// elapsed-time checks rather than `chrono::Utc::now()`. Centralised here so
/// every crate stamps timestamps the same way; hosts that need deterministic
/// tests can bypass this by constructing `DetectedDocument`/tracker inputs
/// directly with a fixed `now_ms`.
pub fn now_ms() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    let start = *START.get_or_init(std::time::Instant::now);
    start.elapsed().as_millis() as u64
}
