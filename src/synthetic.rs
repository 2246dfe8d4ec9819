// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Software RGB-D device.
//!
//! [`SyntheticDevice`] implements [`DeviceContext`] without hardware. Every
//! channel renders a deterministic test pattern and runs on its own clock at
//! the configured frame rate, which reproduces the unsynchronized channel
//! updates of a real sensor. Faults can be injected for every device call.

use crate::{
    device::{ChannelHandle, DeviceContext, DeviceError, MapOutputMode},
    role::{ChannelKind, ChannelSet},
};
use std::{
    thread,
    time::{Duration, Instant},
};
use tracing::trace;

const STATUS_INIT_FAILED: u32 = 0x1_0001;
const STATUS_CREATE_FAILED: u32 = 0x1_0002;
const STATUS_CONFIG_FAILED: u32 = 0x1_0003;
const STATUS_ALIGNMENT_FAILED: u32 = 0x1_0004;
const STATUS_START_FAILED: u32 = 0x1_0005;
const STATUS_NOT_GENERATING: u32 = 0x1_0006;
const STATUS_WAIT_FAILED: u32 = 0x1_0007;
const STATUS_STALLED: u32 = 0x1_0008;

fn status(code: u32, message: &str) -> DeviceError {
    DeviceError::Status {
        code,
        message: message.to_string(),
    }
}

/// Failures to inject into a [`SyntheticDevice`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Faults {
    pub init: bool,
    /// Channels whose creation fails
    pub create: ChannelSet,
    /// Channels whose output mode is rejected
    pub configure: ChannelSet,
    /// Report no viewpoint alignment capability
    pub alignment_unsupported: bool,
    pub alignment: bool,
    pub start: bool,
    /// Every wait reports a device error
    pub wait: bool,
    /// No channel ever updates; waits time out
    pub stall: bool,
    /// Channels that deliver frames one row short
    pub short_frames: ChannelSet,
    /// Channels that keep their last frame and never update again
    pub frozen: ChannelSet,
}

#[derive(Debug)]
struct Channel {
    kind: ChannelKind,
    mode: Option<MapOutputMode>,
    frame: Vec<u8>,
    frame_id: u64,
    next_due: Instant,
}

impl Channel {
    fn period(&self) -> Duration {
        let fps = self.mode.map_or(0, |mode| mode.fps).max(1);
        Duration::from_secs(1) / fps
    }

    fn render(&mut self, short: bool) {
        let Some(mode) = self.mode else {
            return;
        };
        let width = mode.width as usize;
        let rows = if short {
            (mode.height as usize).saturating_sub(1)
        } else {
            mode.height as usize
        };
        let len = width * rows * self.kind.native_bytes_per_pixel();
        self.frame.resize(len, 0);
        render_pattern(self.kind, self.frame_id, width, &mut self.frame);
    }
}

/// Fills `frame` with the test pattern of `kind` for frame number `n`.
///
/// - depth: millimetre ramp between 500 and 4499
/// - infrared: 10-bit checker ramp
/// - color: moving RGB gradient
pub fn render_pattern(kind: ChannelKind, n: u64, width: usize, frame: &mut [u8]) {
    let bpp = kind.native_bytes_per_pixel();
    let width = width.max(1);
    for (i, pixel) in frame.chunks_exact_mut(bpp).enumerate() {
        let x = (i % width) as u64;
        let y = (i / width) as u64;
        match kind {
            ChannelKind::Depth => {
                let mm = 500 + ((x + 2 * y + 8 * n) % 4000) as u16;
                pixel.copy_from_slice(&mm.to_le_bytes());
            }
            ChannelKind::Infrared => {
                let ir = (((x ^ y) + n) & 0x3ff) as u16;
                pixel.copy_from_slice(&ir.to_le_bytes());
            }
            ChannelKind::Color => {
                pixel[0] = (x + n) as u8;
                pixel[1] = (y + n) as u8;
                pixel[2] = (x + y) as u8;
            }
        }
    }
}

/// A software capture device with depth, infrared and color channels.
#[derive(Debug)]
pub struct SyntheticDevice {
    faults: Faults,
    paced: bool,
    initialized: bool,
    generating: bool,
    released: bool,
    channels: Vec<Channel>,
    alignment: Option<(ChannelHandle, ChannelHandle)>,
    alignment_requests: usize,
    start_count: usize,
    stop_count: usize,
}

impl Default for SyntheticDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticDevice {
    /// A fault-free device whose channels update at their configured rate.
    pub fn new() -> Self {
        Self {
            faults: Faults::default(),
            paced: true,
            initialized: false,
            generating: false,
            released: false,
            channels: Vec::new(),
            alignment: None,
            alignment_requests: 0,
            start_count: 0,
            stop_count: 0,
        }
    }

    /// Every wait returns immediately with a new frame on every channel.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.faults
    }

    /// Channels created so far, in creation order.
    pub fn created(&self) -> Vec<ChannelKind> {
        self.channels.iter().map(|channel| channel.kind).collect()
    }

    /// Number of viewpoint alignment requests received.
    pub fn alignment_requests(&self) -> usize {
        self.alignment_requests
    }

    /// The registered `(depth, color)` pair, if alignment succeeded.
    pub fn alignment(&self) -> Option<(ChannelHandle, ChannelHandle)> {
        self.alignment
    }

    pub fn start_count(&self) -> usize {
        self.start_count
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Latest frame of the first channel of `kind`.
    pub fn frame(&self, kind: ChannelKind) -> Option<&[u8]> {
        self.channels
            .iter()
            .position(|channel| channel.kind == kind)
            .and_then(|index| self.latest_frame(ChannelHandle(index)))
    }

    /// Frame counter of the first channel of `kind`.
    pub fn frame_id(&self, kind: ChannelKind) -> Option<u64> {
        self.channels
            .iter()
            .find(|channel| channel.kind == kind)
            .map(|channel| channel.frame_id)
    }

    fn channel_mut(&mut self, handle: ChannelHandle) -> Result<&mut Channel, DeviceError> {
        self.channels
            .get_mut(handle.0)
            .ok_or(DeviceError::InvalidHandle(handle))
    }

    fn check_initialized(&self) -> Result<(), DeviceError> {
        if self.initialized && !self.released {
            Ok(())
        } else {
            Err(DeviceError::NotInitialized)
        }
    }

    /// Configured channels that still produce frames.
    fn live(&self) -> impl Iterator<Item = &Channel> {
        let frozen = self.faults.frozen;
        self.channels
            .iter()
            .filter(move |c| c.mode.is_some() && !frozen.contains(c.kind))
    }

    /// Advances every live channel that is due at `now`.
    fn update_due(&mut self, now: Instant) -> usize {
        let paced = self.paced;
        let short_frames = self.faults.short_frames;
        let frozen = self.faults.frozen;
        let mut updated = 0;
        for channel in self
            .channels
            .iter_mut()
            .filter(|c| c.mode.is_some() && !frozen.contains(c.kind))
        {
            if paced && channel.next_due > now {
                continue;
            }
            channel.frame_id += 1;
            channel.next_due = now + channel.period();
            channel.render(short_frames.contains(channel.kind));
            trace!("{} frame {}", channel.kind, channel.frame_id);
            updated += 1;
        }
        updated
    }
}

impl DeviceContext for SyntheticDevice {
    fn initialize(&mut self) -> Result<(), DeviceError> {
        if self.faults.init {
            return Err(status(STATUS_INIT_FAILED, "no device connected"));
        }
        self.initialized = true;
        self.released = false;
        Ok(())
    }

    fn create_channel(&mut self, kind: ChannelKind) -> Result<ChannelHandle, DeviceError> {
        self.check_initialized()?;
        if self.faults.create.contains(kind) {
            return Err(status(
                STATUS_CREATE_FAILED,
                "can't create any node of the requested type",
            ));
        }
        self.channels.push(Channel {
            kind,
            mode: None,
            frame: Vec::new(),
            frame_id: 0,
            next_due: Instant::now(),
        });
        Ok(ChannelHandle(self.channels.len() - 1))
    }

    fn configure_channel(
        &mut self,
        handle: ChannelHandle,
        mode: MapOutputMode,
    ) -> Result<(), DeviceError> {
        self.check_initialized()?;
        let fault = self.faults.configure;
        let channel = self.channel_mut(handle)?;
        if fault.contains(channel.kind) || mode.fps == 0 {
            return Err(status(STATUS_CONFIG_FAILED, "unsupported map output mode"));
        }
        channel.mode = Some(mode);
        Ok(())
    }

    fn supports_viewpoint_alignment(&self, depth: ChannelHandle) -> bool {
        !self.faults.alignment_unsupported
            && self
                .channels
                .get(depth.0)
                .is_some_and(|channel| channel.kind == ChannelKind::Depth)
    }

    fn set_viewpoint_alignment(
        &mut self,
        depth: ChannelHandle,
        color: ChannelHandle,
    ) -> Result<(), DeviceError> {
        self.check_initialized()?;
        self.alignment_requests += 1;
        if self.faults.alignment {
            return Err(status(STATUS_ALIGNMENT_FAILED, "viewpoint not supported"));
        }
        self.channel_mut(depth)?;
        self.channel_mut(color)?;
        self.alignment = Some((depth, color));
        Ok(())
    }

    fn start_all(&mut self) -> Result<(), DeviceError> {
        self.check_initialized()?;
        if self.faults.start {
            return Err(status(STATUS_START_FAILED, "device is busy"));
        }
        let now = Instant::now();
        for channel in &mut self.channels {
            channel.next_due = now + channel.period();
        }
        self.generating = true;
        self.start_count += 1;
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), DeviceError> {
        self.check_initialized()?;
        self.generating = false;
        self.stop_count += 1;
        Ok(())
    }

    fn wait_any_updated(&mut self, timeout: Option<Duration>) -> Result<(), DeviceError> {
        self.check_initialized()?;
        if self.faults.wait {
            return Err(status(STATUS_WAIT_FAILED, "device disconnected"));
        }
        if !self.generating || self.channels.iter().all(|c| c.mode.is_none()) {
            return Err(status(STATUS_NOT_GENERATING, "no generating channels"));
        }
        if self.faults.stall || self.live().next().is_none() {
            return match timeout {
                Some(timeout) => {
                    thread::sleep(timeout);
                    Err(DeviceError::Timeout)
                }
                None => Err(status(STATUS_STALLED, "device stalled")),
            };
        }

        if self.paced {
            let now = Instant::now();
            let next_due = self
                .live()
                .map(|c| c.next_due)
                .min()
                .unwrap_or(now);
            let wait = next_due.saturating_duration_since(now);
            if let Some(timeout) = timeout {
                if timeout < wait {
                    thread::sleep(timeout);
                    return Err(DeviceError::Timeout);
                }
            }
            thread::sleep(wait);
        }

        self.update_due(Instant::now());
        Ok(())
    }

    fn latest_frame(&self, handle: ChannelHandle) -> Option<&[u8]> {
        let channel = self.channels.get(handle.0)?;
        (channel.frame_id > 0).then_some(channel.frame.as_slice())
    }

    fn release(&mut self) {
        self.generating = false;
        self.released = true;
        self.channels.clear();
        self.alignment = None;
    }
}
