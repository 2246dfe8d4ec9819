// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::device::MapOutputMode;
use std::time::Duration;

/// Default time to wait for any channel update before giving up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Capture configuration for a [`FrameMultiplexer`](crate::FrameMultiplexer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Resolution and frame rate requested from every enabled channel
    pub mode: MapOutputMode,
    /// Wait limit used by callers that do not pass their own, `None` blocks
    pub timeout: Option<Duration>,
    /// Keep going when a channel fails bring-up instead of returning the
    /// error. Slots fed by a failed channel are zero-filled on grab.
    pub allow_degraded: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mode: MapOutputMode::default(),
            timeout: Some(DEFAULT_TIMEOUT),
            allow_degraded: false,
        }
    }
}

impl CaptureConfig {
    pub fn with_mode(mut self, width: u32, height: u32, fps: u32) -> Self {
        self.mode = MapOutputMode { width, height, fps };
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_degraded(mut self, allow: bool) -> Self {
        self.allow_degraded = allow;
        self
    }
}
