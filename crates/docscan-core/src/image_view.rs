// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Neutral frame/image boundary type. `docscan-core` never imports a camera
// library or a UI toolkit's bitmap type — hosts convert their native frame
// into an `ImageView` at the edge, and the core converts an `ImageView` back
// into whatever the host's preview/capture sink expects. See the "Mat/Bitmap
// exchange across module boundaries" redesign note.

use crate::error::DocScanError;

/// Number of channels a frame may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// Single-channel grayscale.
    Luma,
    /// Three interleaved channels (RGB or BGR — the host states which via
    /// [`ImageView::channels`] ordering; the core treats both identically).
    Rgb,
    /// Four interleaved channels, with an alpha channel.
    Rgba,
}

impl ChannelLayout {
    pub fn channel_count(self) -> u32 {
        match self {
            ChannelLayout::Luma => 1,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }
}

/// A dense pixel matrix: width, height, stride, and channel layout, with
/// owned row-major pixel bytes. Immutable once constructed — a frame is
/// processed to completion before being replaced by the next one.
#[derive(Debug, Clone)]
pub struct ImageView {
    width: u32,
    height: u32,
    stride: u32,
    channels: ChannelLayout,
    data: Vec<u8>,
}

impl ImageView {
    /// Construct an `ImageView`, validating dimensions and buffer size.
    ///
    /// `stride` is the number of bytes per row (must be >= `width *
    /// channel_count`); it may exceed the tightly-packed row size when the
    /// host's frame buffer has row padding.
    pub fn new(
        width: u32,
        height: u32,
        stride: u32,
        channels: ChannelLayout,
        data: Vec<u8>,
    ) -> Result<Self, DocScanError> {
        if width == 0 || height == 0 {
            return Err(DocScanError::InvalidFrame(format!(
                "zero-dimension frame: {width}x{height}"
            )));
        }
        let min_stride = width * channels.channel_count();
        if stride < min_stride {
            return Err(DocScanError::InvalidFrame(format!(
                "stride {stride} too small for width {width} with {} channels",
                channels.channel_count()
            )));
        }
        let required = stride as usize * height as usize;
        if data.len() < required {
            return Err(DocScanError::InvalidFrame(format!(
                "buffer too small: got {} bytes, need {}",
                data.len(),
                required
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            channels,
            data,
        })
    }

    /// Construct a tightly-packed `ImageView` (`stride == width *
    /// channel_count`) from already-validated data. Convenience for hosts
    /// and tests that don't have row padding to worry about.
    pub fn packed(
        width: u32,
        height: u32,
        channels: ChannelLayout,
        data: Vec<u8>,
    ) -> Result<Self, DocScanError> {
        let stride = width * channels.channel_count();
        Self::new(width, height, stride, channels, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn channels(&self) -> ChannelLayout {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Row `y` as a byte slice (of length `stride`), or `None` if out of
    /// bounds.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride as usize;
        let end = start + self.stride as usize;
        self.data.get(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_rejects_undersized_buffer() {
        let result = ImageView::packed(10, 10, ChannelLayout::Luma, vec![0u8; 5]);
        assert!(result.is_err());
    }

    #[test]
    fn packed_accepts_exact_buffer() {
        let view = ImageView::packed(4, 4, ChannelLayout::Rgba, vec![0u8; 4 * 4 * 4]).unwrap();
        assert_eq!(view.width(), 4);
        assert_eq!(view.stride(), 16);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let result = ImageView::packed(0, 10, ChannelLayout::Luma, vec![]);
        assert!(matches!(result, Err(DocScanError::InvalidFrame(_))));
    }

    #[test]
    fn row_returns_none_out_of_bounds() {
        let view = ImageView::packed(2, 2, ChannelLayout::Luma, vec![0u8; 4]).unwrap();
        assert!(view.row(5).is_none());
        assert!(view.row(1).is_some());
    }
}
