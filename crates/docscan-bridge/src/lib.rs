// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Neutral boundary between the detection core and a host application. The
// core never links against a camera or UI framework itself; a host supplies
// a `FrameSource` to pull frames from and a `CaptureSink` to push results
// back to. `stub` is a no-op implementation for desktop/CI; `ios`/`android`
// are thin platform adapters gated on the target OS.

pub mod traits;

#[cfg(target_os = "ios")]
pub mod ios;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(any(target_os = "ios", target_os = "android")))]
pub mod stub;

pub use traits::{CaptureSink, FrameSource};

/// Returns the `FrameSource` implementation for the current target.
pub fn platform_frame_source() -> Box<dyn FrameSource> {
    #[cfg(target_os = "ios")]
    {
        Box::new(ios::IosFrameSource::new())
    }
    #[cfg(target_os = "android")]
    {
        Box::new(android::AndroidFrameSource::new())
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        Box::new(stub::StubFrameSource)
    }
}
