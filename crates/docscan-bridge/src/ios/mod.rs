// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS frame source via objc2.
//
// Requires compilation with the iOS SDK (Xcode). `UIImagePickerController`
// is the narrowest camera API that ships in UIKit itself; a production
// host will more likely drive `AVCaptureSession` directly for a continuous
// frame stream and only use this module's delegate pattern as a reference
// for bridging a delegate callback into a blocking `next_frame` call.
//
// Must be called from the main thread: UIKit view controllers may only be
// presented and dismissed there.

#![cfg(target_os = "ios")]

use std::cell::RefCell;
use std::ffi::c_void;
use std::sync::mpsc;

use objc2::rc::Retained;
use objc2::runtime::{AnyObject, NSObject};
use objc2::{define_class, msg_send, AllocAnyThread, MainThreadMarker};
use objc2_foundation::{NSData, NSDictionary, NSString};
use objc2_ui_kit::{
    UIApplication, UIImagePickerController, UIImagePickerControllerDelegate,
    UIImagePickerControllerSourceType, UINavigationControllerDelegate, UIViewController,
};

use docscan_core::{ChannelLayout, DocScanError, ImageView};

use crate::traits::FrameSource;

extern "C" {
    /// Key into the `info` dictionary passed to the image-picker delegate.
    /// The value is the original `UIImage` chosen by the user.
    static UIImagePickerControllerOriginalImage: &'static NSString;

    /// ```c
    /// NSData * _Nullable UIImageJPEGRepresentation(UIImage *image,
    ///                                              CGFloat compressionQuality);
    /// ```
    fn UIImageJPEGRepresentation(image: *const AnyObject, compression_quality: f64) -> *mut AnyObject;
}

fn root_view_controller() -> Result<Retained<UIViewController>, DocScanError> {
    let mtm = require_main_thread()?;
    let app = UIApplication::sharedApplication(mtm);

    // SAFETY: msg_send! to well-known UIApplication selectors (keyWindow,
    // rootViewController).
    let root: Option<Retained<UIViewController>> = unsafe {
        let window: Option<Retained<AnyObject>> = msg_send![&app, keyWindow];
        window.and_then(|w| msg_send![&w, rootViewController])
    };

    root.ok_or_else(|| DocScanError::InternalImagingError("no root view controller available".into()))
}

fn require_main_thread() -> Result<MainThreadMarker, DocScanError> {
    MainThreadMarker::new()
        .ok_or_else(|| DocScanError::InternalImagingError("must be called from the main thread".into()))
}

// ---------------------------------------------------------------------------
// Camera delegate (UIImagePickerControllerDelegate)
// ---------------------------------------------------------------------------
// Captures an `mpsc::Sender` so that `next_frame` can block until the user
// takes a photo or cancels.

struct CameraDelegateIvars {
    /// Channel sender; taken (`Option::take`) on first callback to prevent
    /// double-sends.
    sender: RefCell<Option<mpsc::Sender<Option<Vec<u8>>>>>,
}

define_class! {
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "DocScanCameraDelegate"]
    #[ivars = CameraDelegateIvars]
    struct CameraDelegate;

    unsafe impl UIImagePickerControllerDelegate for CameraDelegate {
        #[unsafe(method(imagePickerController:didFinishPickingMediaWithInfo:))]
        fn did_finish(
            &self,
            picker: &UIImagePickerController,
            info: &NSDictionary<NSString, AnyObject>,
        ) {
            // SAFETY: objectForKey with UIImagePickerControllerOriginalImage
            // (extern static from UIKit). Returns nil if key not present.
            let image_bytes: Option<Vec<u8>> = unsafe {
                info.objectForKey(UIImagePickerControllerOriginalImage)
            }
            .and_then(|ui_image: Retained<AnyObject>| {
                // SAFETY: UIImageJPEGRepresentation is a UIKit C function.
                // Returns autoreleased NSData* (nil on failure).
                let raw = unsafe { UIImageJPEGRepresentation(&*ui_image as *const AnyObject, 0.9) };
                if raw.is_null() {
                    None
                } else {
                    // SAFETY: non-null result is an NSData* (toll-free bridged
                    // with CFData). Bytes are copied immediately.
                    let ns_data: &NSData = unsafe { &*(raw as *const NSData) };
                    Some(ns_data.to_vec())
                }
            });

            // SAFETY: dismissViewControllerAnimated:completion: is a standard
            // UIViewController selector, called on the main thread (delegate
            // is MainThreadOnly).
            unsafe {
                let _: () = msg_send![
                    picker,
                    dismissViewControllerAnimated: true,
                    completion: std::ptr::null::<c_void>()
                ];
            }

            if let Some(tx) = self.ivars().sender.borrow_mut().take() {
                let _ = tx.send(image_bytes);
            }
        }

        #[unsafe(method(imagePickerControllerDidCancel:))]
        fn did_cancel(&self, picker: &UIImagePickerController) {
            unsafe {
                let _: () = msg_send![
                    picker,
                    dismissViewControllerAnimated: true,
                    completion: std::ptr::null::<c_void>()
                ];
            }
            if let Some(tx) = self.ivars().sender.borrow_mut().take() {
                let _ = tx.send(None);
            }
        }
    }

    // UIImagePickerController requires its delegate to also conform to
    // UINavigationControllerDelegate. Empty impl.
    unsafe impl UINavigationControllerDelegate for CameraDelegate {}
}

impl CameraDelegate {
    fn new(mtm: MainThreadMarker, tx: mpsc::Sender<Option<Vec<u8>>>) -> Retained<Self> {
        let this = mtm.alloc::<Self>();
        let this = this.set_ivars(CameraDelegateIvars {
            sender: RefCell::new(Some(tx)),
        });
        // SAFETY: standard NSObject init via super; `alloc` above provides a
        // valid, allocated-but-uninitialised object.
        unsafe { msg_send![super(this), init] }
    }
}

/// iOS frame source backed by `UIImagePickerController`'s camera source
/// type. One `next_frame` call presents the camera UI and blocks until the
/// user takes or cancels a photo, decoding the result into an `ImageView`.
pub struct IosFrameSource;

impl IosFrameSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IosFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for IosFrameSource {
    /// Must be called from the main thread. Blocks until the user takes a
    /// photo (`Ok(Some(frame))`) or cancels (`Ok(None)`).
    fn next_frame(&mut self) -> Result<Option<ImageView>, DocScanError> {
        let mtm = require_main_thread()?;

        let available = UIImagePickerController::isSourceTypeAvailable(
            UIImagePickerControllerSourceType::Camera,
            mtm,
        );
        if !available {
            return Err(DocScanError::InternalImagingError(
                "camera source type is not available on this device".into(),
            ));
        }

        let picker = UIImagePickerController::new(mtm);
        // SAFETY: setSourceType is a UIImagePickerController property setter;
        // availability was verified above.
        unsafe {
            picker.setSourceType(UIImagePickerControllerSourceType::Camera);
        }

        let (tx, rx) = mpsc::channel();
        let delegate = CameraDelegate::new(mtm, tx);

        // SAFETY: CameraDelegate conforms to both UIImagePickerControllerDelegate
        // and UINavigationControllerDelegate (defined above). The pointer cast
        // CameraDelegate -> AnyObject is safe: both have identical pointer
        // representation as NSObject subclasses.
        unsafe {
            let delegate_obj: &AnyObject = &*((&*delegate) as *const CameraDelegate as *const AnyObject);
            picker.setDelegate(Some(delegate_obj));
        }

        let root_vc = root_view_controller()?;
        // SAFETY: presentViewController is a UIViewController method, called
        // from the main thread per require_main_thread() above.
        unsafe {
            root_vc.presentViewController_animated_completion(&picker, true, None);
        }

        // The main run loop keeps pumping while the picker is presented, so
        // the delegate callback fires on this same thread before recv returns.
        let jpeg = rx
            .recv()
            .map_err(|e| DocScanError::InternalImagingError(format!("camera delegate channel error: {e}")))?;

        let Some(jpeg) = jpeg else { return Ok(None) };
        decode_jpeg(&jpeg).map(Some)
    }
}

fn decode_jpeg(bytes: &[u8]) -> Result<ImageView, DocScanError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| DocScanError::InternalImagingError(format!("failed to decode camera JPEG: {e}")))?
        .to_rgb8();
    let (width, height) = (decoded.width(), decoded.height());
    ImageView::packed(width, height, ChannelLayout::Rgb, decoded.into_raw())
}
