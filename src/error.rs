// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{device::DeviceError, role::ChannelKind};
use thiserror::Error;

/// Errors reported by the capture multiplexer.
///
/// Device-layer status codes never surface directly, they are carried as the
/// [`DeviceError`] source of the operation that failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("device context initialization failed")]
    InitFailed(#[source] DeviceError),

    #[error("failed to create {kind} channel")]
    ChannelCreateFailed {
        kind: ChannelKind,
        #[source]
        source: DeviceError,
    },

    #[error("failed to configure {kind} channel")]
    ChannelConfigFailed {
        kind: ChannelKind,
        #[source]
        source: DeviceError,
    },

    #[error("depth to color viewpoint alignment failed")]
    AlignmentFailed(#[source] DeviceError),

    #[error("depth to color viewpoint alignment skipped, {missing} channel unavailable")]
    AlignmentSkipped { missing: ChannelKind },

    #[error("failed to start generating")]
    StartFailed(#[source] DeviceError),

    #[error("failed to stop generating")]
    StopFailed(#[source] DeviceError),

    #[error("failed updating data")]
    WaitFailed(#[source] DeviceError),

    #[error("timed out waiting for a channel update")]
    Timeout,

    #[error("frame buffer too small: required {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("{kind} frame is {actual} bytes, expected {expected}")]
    FrameSizeMismatch {
        kind: ChannelKind,
        expected: usize,
        actual: usize,
    },

    #[error("output mode {width}x{height} is too large to pack")]
    InvalidMode { width: u32, height: u32 },

    #[error("unsupported sensor role: {0}")]
    UnsupportedRole(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
