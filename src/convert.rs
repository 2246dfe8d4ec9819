// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Native sample to output format conversion.
//!
//! Conversions are pure arithmetic over buffers whose sizes the caller has
//! already validated, so they have no failure mode.

/// Right shift applied to 16-bit infrared samples to produce 8-bit output.
///
/// The infrared sensor delivers 10 effective bits per sample.
pub const IR_RESCALE_SHIFT: u32 = 2;

/// How a channel's native samples become the stream's output format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// Native bytes are already in the output format.
    Identity,
    /// 16-bit little-endian samples rescaled to 8 bits by
    /// [`IR_RESCALE_SHIFT`].
    Gray16To8,
}

impl Conversion {
    /// Number of native bytes consumed to produce `output_len` bytes.
    pub const fn native_len(self, output_len: usize) -> usize {
        match self {
            Conversion::Identity => output_len,
            Conversion::Gray16To8 => output_len * 2,
        }
    }
}

/// Rescales one infrared sample to 8 bits.
///
/// Samples above the 10-bit range keep only the low byte of the shifted value.
#[inline]
pub const fn ir_sample_to_gray8(sample: u16) -> u8 {
    (sample >> IR_RESCALE_SHIFT) as u8
}

/// Rescales row-major 16-bit little-endian samples in `src` into `dst`.
///
/// Converts `min(src.len() / 2, dst.len())` pixels.
pub fn gray16_to_gray8(src: &[u8], dst: &mut [u8]) {
    for (out, sample) in dst.iter_mut().zip(src.chunks_exact(2)) {
        *out = ir_sample_to_gray8(u16::from_le_bytes([sample[0], sample[1]]));
    }
}
