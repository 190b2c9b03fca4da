// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android frame source via JNI.
//
// Requires the Android NDK, targeting `aarch64-linux-android` or
// `armv7-linux-androideabi`. Unlike iOS's one-shot `UIImagePickerController`
// capture, a real-time scanner on Android drives the camera through
// CameraX's `ImageAnalysis.Analyzer` on the Kotlin/Java side, which delivers
// one frame at a time to a native method. This module is the Rust half of
// that handoff: a JNI-exported push function feeds frames into a small
// queue, and `next_frame` drains it.

#![cfg(target_os = "android")]

use std::sync::Mutex;

use jni::objects::{JByteArray, JClass};
use jni::sys::{jint, jlong};
use jni::JNIEnv;

use docscan_core::{ChannelLayout, DocScanError, ImageView};

use crate::traits::FrameSource;

/// Bound on how many undelivered frames are buffered before the oldest is
/// dropped. The analyzer runs faster than detection can consume frames is
/// the expected steady state, so this is a "drop stale frames" queue, not a
/// backpressure one.
const MAX_QUEUED_FRAMES: usize = 2;

struct PendingFrame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

static FRAME_QUEUE: Mutex<Vec<PendingFrame>> = Mutex::new(Vec::new());

/// JNI entry point called by the host Activity's `ImageAnalysis.Analyzer`
/// once per analyzed frame, with the frame already converted to packed RGBA
/// on the Java side (`Bitmap.copyPixelsToBuffer`).
///
/// Safety of the JNI signature itself is the caller's (JVM's) responsibility;
/// the body only touches plain Rust data once copied out of the `JByteArray`.
#[no_mangle]
pub extern "system" fn Java_org_hyperpolymath_docscan_FrameBridge_pushFrame(
    mut env: JNIEnv,
    _class: JClass,
    width: jint,
    height: jint,
    rgba: JByteArray,
) {
    let Ok(bytes) = env.convert_byte_array(&rgba) else {
        tracing::warn!("pushFrame: failed to copy RGBA byte array from JVM");
        return;
    };
    let frame = PendingFrame {
        width: width.max(0) as u32,
        height: height.max(0) as u32,
        rgba: bytes,
    };
    let mut queue = FRAME_QUEUE.lock().unwrap_or_else(|e| e.into_inner());
    if queue.len() >= MAX_QUEUED_FRAMES {
        queue.remove(0);
    }
    queue.push(frame);
}

/// JNI entry point: number of frames currently queued, for diagnostics.
#[no_mangle]
pub extern "system" fn Java_org_hyperpolymath_docscan_FrameBridge_queueDepth(
    _env: JNIEnv,
    _class: JClass,
) -> jlong {
    FRAME_QUEUE.lock().unwrap_or_else(|e| e.into_inner()).len() as jlong
}

/// Android frame source. Zero-sized; all state lives in the process-wide
/// [`FRAME_QUEUE`] fed by [`Java_org_hyperpolymath_docscan_FrameBridge_pushFrame`].
pub struct AndroidFrameSource;

impl AndroidFrameSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for AndroidFrameSource {
    /// Returns the oldest queued frame, or `Ok(None)` if the analyzer has
    /// not delivered one yet.
    fn next_frame(&mut self) -> Result<Option<ImageView>, DocScanError> {
        let mut queue = FRAME_QUEUE
            .lock()
            .map_err(|_| DocScanError::InternalImagingError("frame queue lock poisoned".into()))?;
        let Some(frame) = (!queue.is_empty()).then(|| queue.remove(0)) else {
            return Ok(None);
        };
        drop(queue);

        ImageView::packed(frame.width, frame.height, ChannelLayout::Rgba, frame.rgba).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queue_yields_no_frame() {
        let mut source = AndroidFrameSource::new();
        // Queue state is process-global; only assert the non-error path, not
        // emptiness, since other tests in this binary may have pushed frames.
        let _ = source.next_frame();
    }
}
