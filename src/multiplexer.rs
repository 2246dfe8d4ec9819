// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    channel::SensorChannel,
    config::CaptureConfig,
    convert::{gray16_to_gray8, Conversion},
    device::{DeviceContext, DeviceError},
    error::{Error, Result},
    role::{classify, ActiveSlot, ChannelKind, RolePair},
    stream::{pack_streams, StreamInfo},
};
use std::{error::Error as StdError, time::Duration};
use tracing::{debug, error, info, instrument, trace, warn};

/// Channel handles owned by a multiplexer, one per physical channel.
#[derive(Debug, Default)]
struct Channels {
    depth: Option<SensorChannel>,
    infrared: Option<SensorChannel>,
    color: Option<SensorChannel>,
}

impl Channels {
    fn get(&self, kind: ChannelKind) -> Option<&SensorChannel> {
        match kind {
            ChannelKind::Depth => self.depth.as_ref(),
            ChannelKind::Infrared => self.infrared.as_ref(),
            ChannelKind::Color => self.color.as_ref(),
        }
    }

    fn slot(&mut self, kind: ChannelKind) -> &mut Option<SensorChannel> {
        match kind {
            ChannelKind::Depth => &mut self.depth,
            ChannelKind::Infrared => &mut self.infrared,
            ChannelKind::Color => &mut self.color,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &SensorChannel> {
        [&self.color, &self.depth, &self.infrared]
            .into_iter()
            .flatten()
    }
}

/// Formats an error with its source chain on one line.
fn describe(err: &Error) -> String {
    let mut msg = err.to_string();
    let mut source = StdError::source(err);
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

/// Packs up to two sensor streams of an RGB-D device into one frame buffer.
///
/// The layout is computed once by [`open`](Self::open): active slots are
/// placed back-to-back in slot order and never move afterwards. Each
/// [`grab`](Self::grab) waits for any channel to update and then copies the
/// latest frame of every active slot into its region of the caller's buffer.
///
/// Streams are not synchronized with each other. Any channel update wakes the
/// grab and all slots are read, so one slot may hold a frame from the
/// previous cycle of its channel.
///
/// # Thread Safety
///
/// A `FrameMultiplexer` exclusively owns its device and is meant to be driven
/// from a single capture thread.
///
/// # Example
///
/// ```no_run
/// use edgefirst_rgbd::{CaptureConfig, FrameMultiplexer, RolePair, SensorRole, SyntheticDevice};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let roles = RolePair::new(SensorRole::Depth, SensorRole::Color);
/// let mut mux = FrameMultiplexer::open(SyntheticDevice::new(), roles, CaptureConfig::default())?;
///
/// let mut frame = vec![0u8; mux.size()];
/// mux.grab(&mut frame, mux.config().timeout)?;
/// for stream in mux.streams() {
///     println!("{}", stream);
/// }
/// # Ok(())
/// # }
/// ```
pub struct FrameMultiplexer<D: DeviceContext> {
    device: D,
    roles: RolePair,
    config: CaptureConfig,
    slots: Vec<ActiveSlot>,
    streams: Vec<StreamInfo>,
    size: usize,
    channels: Channels,
    alignment_failure: Option<Error>,
    scratch: Vec<u8>,
    generating: bool,
}

impl<D: DeviceContext> FrameMultiplexer<D> {
    /// Initializes `device`, brings up the channels `roles` need and starts
    /// generating.
    ///
    /// Channel bring-up follows `config.allow_degraded`: when false the first
    /// channel or alignment failure is returned, when true failures are
    /// logged, kept for [`failures`](Self::failures) and capture continues
    /// without that channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMode`] before touching the device when the
    /// packed frame of `config.mode` does not fit in memory,
    /// [`Error::InitFailed`] when the device cannot be initialized,
    /// [`Error::StartFailed`] when it cannot start generating, and channel or
    /// alignment errors in strict mode.
    pub fn open(mut device: D, roles: RolePair, config: CaptureConfig) -> Result<Self> {
        let classification = classify(roles);
        let (streams, size) = pack_streams(
            classification.formats(),
            config.mode.width,
            config.mode.height,
        )?;

        device.initialize().map_err(Error::InitFailed)?;

        let scratch_len = classification
            .slots
            .iter()
            .zip(&streams)
            .filter(|(slot, _)| slot.spec.conversion == Conversion::Gray16To8)
            .map(|(_, stream)| stream.size())
            .max()
            .unwrap_or(0);

        let mut mux = Self {
            device,
            roles,
            config,
            slots: classification.slots,
            streams,
            size,
            channels: Channels::default(),
            alignment_failure: None,
            scratch: vec![0; scratch_len],
            generating: false,
        };

        for kind in classification.channels.iter() {
            mux.bring_up(kind)?;
            if kind == ChannelKind::Depth && classification.align_depth_to_color {
                mux.align_depth_to_color()?;
            }
        }

        mux.start()?;

        info!(
            "capturing {} as {} stream(s), {} bytes per frame",
            mux.roles,
            mux.streams.len(),
            mux.size
        );
        for stream in &mux.streams {
            debug!("stream {}", stream);
        }

        Ok(mux)
    }

    fn bring_up(&mut self, kind: ChannelKind) -> Result<()> {
        let channel = match SensorChannel::open(&mut self.device, kind, self.config.mode) {
            Ok(channel) => channel,
            Err(err) if self.config.allow_degraded => {
                warn!("{}, continuing without {} channel", describe(&err), kind);
                SensorChannel::failed(kind, err)
            }
            Err(err) => return Err(err),
        };
        *self.channels.slot(kind) = Some(channel);
        Ok(())
    }

    fn align_depth_to_color(&mut self) -> Result<()> {
        let depth = self.channels.get(ChannelKind::Depth).and_then(|c| c.handle());
        let color = self.channels.get(ChannelKind::Color).and_then(|c| c.handle());
        let (depth, color) = match (depth, color) {
            (Some(depth), Some(color)) => (depth, color),
            (None, _) => return self.skip_alignment(ChannelKind::Depth),
            (_, None) => return self.skip_alignment(ChannelKind::Color),
        };

        let result = if self.device.supports_viewpoint_alignment(depth) {
            self.device.set_viewpoint_alignment(depth, color)
        } else {
            Err(DeviceError::Unsupported)
        };

        match result {
            Ok(()) => {
                debug!("depth registered to color viewpoint");
                Ok(())
            }
            Err(source) => {
                let err = Error::AlignmentFailed(source);
                if !self.config.allow_degraded {
                    return Err(err);
                }
                warn!("{}, depth stays in its own viewpoint", describe(&err));
                self.alignment_failure = Some(err);
                Ok(())
            }
        }
    }

    /// Records that a registered-depth slot will carry unregistered depth.
    fn skip_alignment(&mut self, missing: ChannelKind) -> Result<()> {
        let err = Error::AlignmentSkipped { missing };
        warn!("{}, registered depth stays in its own viewpoint", err);
        self.alignment_failure = Some(err);
        Ok(())
    }

    /// Starts generating on every created channel.
    pub fn start(&mut self) -> Result<()> {
        if self.generating {
            return Ok(());
        }
        self.device.start_all().map_err(Error::StartFailed)?;
        self.generating = true;
        Ok(())
    }

    /// Stops generating on every created channel.
    pub fn stop(&mut self) -> Result<()> {
        if !self.generating {
            return Ok(());
        }
        self.device.stop_all().map_err(Error::StopFailed)?;
        self.generating = false;
        Ok(())
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn roles(&self) -> RolePair {
        self.roles
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Streams in the packed frame, in slot order.
    pub fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    /// Size in bytes of one packed frame.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The channel of `kind`, if the roles required it.
    pub fn channel(&self, kind: ChannelKind) -> Option<&SensorChannel> {
        self.channels.get(kind)
    }

    /// Bring-up failures tolerated in degraded mode.
    pub fn failures(&self) -> Vec<&Error> {
        self.channels
            .iter()
            .filter_map(|channel| channel.failure())
            .chain(self.alignment_failure.as_ref())
            .collect()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Waits for any channel to update and writes every active stream into
    /// `buffer` at its offset.
    ///
    /// `timeout` of `None` blocks until the device reports an update or an
    /// error. Slots whose channel failed bring-up, or has not produced a
    /// frame yet, are zero-filled.
    ///
    /// # Errors
    ///
    /// - [`Error::BufferTooSmall`] when `buffer` is shorter than
    ///   [`size`](Self::size); nothing is written.
    /// - [`Error::Timeout`] when no channel updated in time.
    /// - [`Error::WaitFailed`] when the device reported an error while
    ///   waiting.
    /// - [`Error::FrameSizeMismatch`] when a native frame does not match the
    ///   configured mode; earlier slots may already have been written.
    #[instrument(level = "trace", skip_all)]
    pub fn grab(&mut self, buffer: &mut [u8], timeout: Option<Duration>) -> Result<()> {
        if buffer.len() < self.size {
            return Err(Error::BufferTooSmall {
                required: self.size,
                actual: buffer.len(),
            });
        }

        match self.device.wait_any_updated(timeout) {
            Ok(()) => {}
            Err(DeviceError::Timeout) => return Err(Error::Timeout),
            Err(source) => {
                error!("failed updating data: {}", source);
                return Err(Error::WaitFailed(source));
            }
        }

        for (slot, stream) in self.slots.iter().zip(&self.streams) {
            let out = &mut buffer[stream.range()];
            let kind = slot.spec.source;
            let native = self
                .channels
                .get(kind)
                .and_then(|channel| channel.latest(&self.device));

            let Some(native) = native else {
                trace!("no {} frame for slot {}, zero-filling", kind, slot.slot);
                out.fill(0);
                continue;
            };

            let expected = slot.spec.conversion.native_len(out.len());
            if native.len() != expected {
                return Err(Error::FrameSizeMismatch {
                    kind,
                    expected,
                    actual: native.len(),
                });
            }

            match slot.spec.conversion {
                Conversion::Identity => out.copy_from_slice(native),
                Conversion::Gray16To8 => {
                    let scratch = &mut self.scratch[..out.len()];
                    gray16_to_gray8(native, scratch);
                    out.copy_from_slice(scratch);
                }
            }
        }

        Ok(())
    }

    /// Same as [`grab`](Self::grab).
    ///
    /// The device exposes no frame queue, so the latest frame is always the
    /// newest one.
    pub fn grab_newest(&mut self, buffer: &mut [u8], timeout: Option<Duration>) -> Result<()> {
        self.grab(buffer, timeout)
    }
}

impl<D: DeviceContext> Drop for FrameMultiplexer<D> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("{}", describe(&err));
        }
        self.device.release();
        debug!("device context released");
    }
}
