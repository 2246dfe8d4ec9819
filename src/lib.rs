// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # EdgeFirst RGB-D Capture Library
//!
//! This library drives up to two sensor streams of an RGB-D camera (depth,
//! infrared, color) and packs them into a single contiguous frame buffer.
//!
//! ## Features
//!
//! - **Role Classification**: Each of the two capture slots is assigned a
//!   [`SensorRole`] which determines its output [`PixelFormat`] and the
//!   device channels that must run for it.
//! - **Packed Layout**: Active streams are placed back-to-back; the
//!   [`StreamInfo`] of each stream gives its offset, stride and size.
//! - **Frame Acquisition**: [`FrameMultiplexer::grab`] waits for any channel
//!   to update and writes every active stream, converting 16-bit infrared to
//!   8 bits where the role asks for it.
//! - **Device Abstraction**: Hardware is reached only through the
//!   [`DeviceContext`] trait. [`SyntheticDevice`] provides a software device
//!   with fault injection.
//!
//! ## Example
//!
//! ```no_run
//! use edgefirst_rgbd::{CaptureConfig, FrameMultiplexer, RolePair, SensorRole, SyntheticDevice};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let roles = RolePair::new(SensorRole::DepthRegisteredToColor, SensorRole::Color);
//! let mut mux = FrameMultiplexer::open(SyntheticDevice::new(), roles, CaptureConfig::default())?;
//!
//! // 640x480 GRAY16LE depth at offset 0, RGB24 color at offset 614400
//! let mut frame = vec![0u8; mux.size()];
//! mux.grab(&mut frame, mux.config().timeout)?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod convert;
pub mod device;
pub mod error;
pub mod multiplexer;
pub mod record;
pub mod role;
pub mod stream;
pub mod synthetic;

pub use channel::SensorChannel;
pub use config::CaptureConfig;
pub use device::{ChannelHandle, DeviceContext, DeviceError, MapOutputMode};
pub use error::{Error, Result};
pub use multiplexer::FrameMultiplexer;
pub use record::Recorder;
pub use role::{classify, ChannelKind, ChannelSet, Classification, RolePair, SensorRole};
pub use stream::{pack_streams, PixelFormat, StreamInfo};
pub use synthetic::{Faults, SyntheticDevice};
