// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::{Error, Result};
use core::fmt;

/// Output pixel formats produced by the multiplexer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 16-bit little-endian intensity (depth in millimetres, raw infrared)
    Gray16LE,
    /// 8-bit intensity
    Gray8,
    /// 24-bit packed RGB (8 bits per channel, no alpha)
    RGB24,
}

impl PixelFormat {
    pub const fn bits_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray16LE => 16,
            PixelFormat::Gray8 => 8,
            PixelFormat::RGB24 => 24,
        }
    }

    /// Bytes in one row of `width` pixels, rounded up to a whole byte.
    pub const fn row_stride(self, width: u32) -> usize {
        (width as usize)
            .saturating_mul(self.bits_per_pixel())
            .div_ceil(8)
    }

    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Gray16LE => "GRAY16LE",
            PixelFormat::Gray8 => "GRAY8",
            PixelFormat::RGB24 => "RGB24",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Location and shape of one sensor stream inside the packed frame buffer.
///
/// A `StreamInfo` is derived once when the multiplexer is opened and never
/// changes afterwards. The sub-image occupies
/// `buffer[offset() .. offset() + size()]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: usize,
    offset: usize,
}

impl StreamInfo {
    /// Describes a `width` x `height` stream of `format` placed at `offset`.
    pub const fn new(format: PixelFormat, width: u32, height: u32, offset: usize) -> Self {
        Self {
            format,
            width,
            height,
            stride: format.row_stride(width),
            offset,
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Byte offset of this stream within the packed frame buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.stride.saturating_mul(self.height as usize)
    }

    /// Byte range of this stream within the packed frame buffer.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset.saturating_add(self.size())
    }
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {} stride:{} offset:{}",
            self.width, self.height, self.format, self.stride, self.offset
        )
    }
}

/// Packs streams of the given formats back-to-back, in order.
///
/// Each stream starts where the previous one ends. Returns the stream
/// descriptors together with the total frame size in bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidMode`] when the packed frame for a `width` x
/// `height` mode cannot be addressed in memory.
pub fn pack_streams<I>(
    formats: I,
    width: u32,
    height: u32,
) -> Result<(Vec<StreamInfo>, usize)>
where
    I: IntoIterator<Item = PixelFormat>,
{
    let mut size = 0usize;
    let streams = formats
        .into_iter()
        .map(|format| {
            let stride = (width as usize)
                .checked_mul(format.bits_per_pixel())?
                .div_ceil(8);
            let stream_size = stride.checked_mul(height as usize)?;
            let stream = StreamInfo::new(format, width, height, size);
            size = size
                .checked_add(stream_size)
                .filter(|total| *total <= isize::MAX as usize)?;
            Some(stream)
        })
        .collect::<Option<Vec<_>>>();

    match streams {
        Some(streams) => Ok((streams, size)),
        None => Err(Error::InvalidMode { width, height }),
    }
}
