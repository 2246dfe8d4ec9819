// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_rgbd::{CaptureConfig, RolePair, SensorRole};
use std::{path::PathBuf, time::Duration};

/// Command-line arguments for the EdgeFirst RGB-D capture tool.
///
/// Arguments can be specified via command line or environment variables.
///
/// # Example
///
/// ```bash
/// # Registered depth and color, 100 frames to disk
/// edgefirst-rgbd --roles "depth-reg rgb" --frames 100 --output capture.raw
///
/// # Via environment variables
/// export ROLES="ir8-proj none"
/// edgefirst-rgbd
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Sensor roles for the two capture slots (none, depth, depth-reg, ir,
    /// ir8, ir-proj, ir8-proj, rgb)
    #[arg(
        long,
        env = "ROLES",
        default_value = "depth rgb",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub roles: Vec<SensorRole>,

    /// Capture resolution in pixels (width height)
    #[arg(
        long,
        env = "RESOLUTION",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub resolution: Vec<u32>,

    /// Channel frame rate
    #[arg(long, env = "FPS", default_value = "30")]
    pub fps: u32,

    /// Milliseconds to wait for any channel update (0 blocks indefinitely)
    #[arg(long, env = "TIMEOUT_MS", default_value = "2000")]
    pub timeout_ms: u64,

    /// Keep capturing when a channel fails to come up
    #[arg(long, env = "DEGRADED")]
    pub degraded: bool,

    /// Number of frames to capture (0 captures until an error)
    #[arg(short = 'n', long, env = "FRAMES", default_value = "0")]
    pub frames: u64,

    /// Record packed frames to this raw file (layout in <file>.json)
    #[arg(short, long, env = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Frames buffered between capture and the recorder
    #[arg(long, env = "QUEUE", default_value = "4")]
    pub queue: usize,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

impl Args {
    pub fn role_pair(&self) -> RolePair {
        let role = |i: usize| self.roles.get(i).copied().unwrap_or_default();
        RolePair::new(role(0), role(1))
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl From<&Args> for CaptureConfig {
    fn from(args: &Args) -> Self {
        let width = args.resolution.first().copied().unwrap_or(640);
        let height = args.resolution.get(1).copied().unwrap_or(480);

        CaptureConfig::default()
            .with_mode(width, height, args.fps)
            .with_timeout(args.timeout())
            .with_degraded(args.degraded)
    }
}
