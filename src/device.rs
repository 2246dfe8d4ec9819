// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Boundary with the RGB-D capture device.
//!
//! A [`DeviceContext`] owns the connection to one physical (or synthetic)
//! device. The multiplexer drives it through this trait only, so any SDK can
//! be plugged in by implementing it.

use crate::role::ChannelKind;
use std::time::Duration;
use thiserror::Error;

/// Map output mode requested from every enabled channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapOutputMode {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl MapOutputMode {
    pub const VGA_30: MapOutputMode = MapOutputMode {
        width: 640,
        height: 480,
        fps: 30,
    };

    pub const fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for MapOutputMode {
    fn default() -> Self {
        Self::VGA_30
    }
}

/// Opaque handle to a channel created on a [`DeviceContext`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelHandle(pub usize);

/// Failure reported by the device layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("device status {code:#x}: {message}")]
    Status { code: u32, message: String },

    #[error("operation not supported by device")]
    Unsupported,

    #[error("device not initialized")]
    NotInitialized,

    #[error("invalid channel handle {0:?}")]
    InvalidHandle(ChannelHandle),

    #[error("timed out")]
    Timeout,
}

/// Connection to a capture device and its sensor channels.
///
/// All channels generate together: [`start_all`](Self::start_all) and
/// [`stop_all`](Self::stop_all) affect every created channel.
pub trait DeviceContext {
    fn initialize(&mut self) -> Result<(), DeviceError>;

    fn create_channel(&mut self, kind: ChannelKind) -> Result<ChannelHandle, DeviceError>;

    fn configure_channel(
        &mut self,
        handle: ChannelHandle,
        mode: MapOutputMode,
    ) -> Result<(), DeviceError>;

    /// Whether the depth channel can be registered to another viewpoint.
    fn supports_viewpoint_alignment(&self, depth: ChannelHandle) -> bool;

    /// Registers depth samples to the color sensor's optical frame.
    fn set_viewpoint_alignment(
        &mut self,
        depth: ChannelHandle,
        color: ChannelHandle,
    ) -> Result<(), DeviceError>;

    fn start_all(&mut self) -> Result<(), DeviceError>;

    fn stop_all(&mut self) -> Result<(), DeviceError>;

    /// Blocks until any generating channel has produced a new frame.
    ///
    /// `None` waits indefinitely. A wait that runs out of time returns
    /// [`DeviceError::Timeout`].
    fn wait_any_updated(&mut self, timeout: Option<Duration>) -> Result<(), DeviceError>;

    /// Most recent native frame of a channel, `None` before its first frame.
    ///
    /// Depth and infrared frames are row-major 16-bit little-endian samples,
    /// color frames are packed RGB bytes.
    fn latest_frame(&self, handle: ChannelHandle) -> Option<&[u8]>;

    /// Releases the device. No other call is valid afterwards.
    fn release(&mut self);
}

impl<D: DeviceContext + ?Sized> DeviceContext for &mut D {
    fn initialize(&mut self) -> Result<(), DeviceError> {
        (**self).initialize()
    }

    fn create_channel(&mut self, kind: ChannelKind) -> Result<ChannelHandle, DeviceError> {
        (**self).create_channel(kind)
    }

    fn configure_channel(
        &mut self,
        handle: ChannelHandle,
        mode: MapOutputMode,
    ) -> Result<(), DeviceError> {
        (**self).configure_channel(handle, mode)
    }

    fn supports_viewpoint_alignment(&self, depth: ChannelHandle) -> bool {
        (**self).supports_viewpoint_alignment(depth)
    }

    fn set_viewpoint_alignment(
        &mut self,
        depth: ChannelHandle,
        color: ChannelHandle,
    ) -> Result<(), DeviceError> {
        (**self).set_viewpoint_alignment(depth, color)
    }

    fn start_all(&mut self) -> Result<(), DeviceError> {
        (**self).start_all()
    }

    fn stop_all(&mut self) -> Result<(), DeviceError> {
        (**self).stop_all()
    }

    fn wait_any_updated(&mut self, timeout: Option<Duration>) -> Result<(), DeviceError> {
        (**self).wait_any_updated(timeout)
    }

    fn latest_frame(&self, handle: ChannelHandle) -> Option<&[u8]> {
        (**self).latest_frame(handle)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
