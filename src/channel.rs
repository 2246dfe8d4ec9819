// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    device::{ChannelHandle, DeviceContext, MapOutputMode},
    error::{Error, Result},
    role::ChannelKind,
};
use tracing::debug;

#[derive(Debug)]
enum ChannelState {
    Active(ChannelHandle),
    Failed(Error),
}

/// One sensor endpoint of the capture device.
///
/// A channel that failed bring-up is kept around with its error so the
/// multiplexer can report it, but it never yields frames.
#[derive(Debug)]
pub struct SensorChannel {
    kind: ChannelKind,
    state: ChannelState,
}

impl SensorChannel {
    /// Creates the channel on `device` and configures its output mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelCreateFailed`] or [`Error::ChannelConfigFailed`]
    /// when the device rejects the request.
    pub fn open<D>(device: &mut D, kind: ChannelKind, mode: MapOutputMode) -> Result<Self>
    where
        D: DeviceContext + ?Sized,
    {
        let handle = device
            .create_channel(kind)
            .map_err(|source| Error::ChannelCreateFailed { kind, source })?;
        device
            .configure_channel(handle, mode)
            .map_err(|source| Error::ChannelConfigFailed { kind, source })?;
        debug!(
            "{} channel {:?} configured {}x{}@{}",
            kind, handle, mode.width, mode.height, mode.fps
        );
        Ok(Self {
            kind,
            state: ChannelState::Active(handle),
        })
    }

    /// A channel left unusable by `error`.
    pub fn failed(kind: ChannelKind, error: Error) -> Self {
        Self {
            kind,
            state: ChannelState::Failed(error),
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ChannelState::Active(_))
    }

    pub fn handle(&self) -> Option<ChannelHandle> {
        match self.state {
            ChannelState::Active(handle) => Some(handle),
            ChannelState::Failed(_) => None,
        }
    }

    /// The bring-up error of a failed channel.
    pub fn failure(&self) -> Option<&Error> {
        match &self.state {
            ChannelState::Active(_) => None,
            ChannelState::Failed(err) => Some(err),
        }
    }

    /// The channel's most recent native frame, borrowed from the device.
    pub fn latest<'a, D>(&self, device: &'a D) -> Option<&'a [u8]>
    where
        D: DeviceContext + ?Sized,
    {
        device.latest_frame(self.handle()?)
    }
}
