// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Raw packed-frame recording.
//!
//! Frames are appended back-to-back to a raw file. A JSON sidecar next to it
//! (`<file>.json`) describes the packed layout so each sub-image can be
//! located without knowing the roles that produced it.

use crate::{
    error::{Error, Result},
    role::RolePair,
    stream::StreamInfo,
};
use serde_json::{json, Value};
use std::{
    ffi::OsString,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::debug;

/// Path of the layout sidecar for the recording at `path`.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".json");
    PathBuf::from(name)
}

/// JSON description of a packed frame layout.
pub fn layout_json(roles: RolePair, streams: &[StreamInfo], frame_size: usize, frames: u64) -> Value {
    let streams: Vec<Value> = streams
        .iter()
        .map(|stream| {
            json!({
                "format": stream.format().name(),
                "width": stream.width(),
                "height": stream.height(),
                "stride": stream.stride(),
                "offset": stream.offset(),
                "size": stream.size(),
            })
        })
        .collect();

    json!({
        "roles": [roles.first.name(), roles.second.name()],
        "frame_size": frame_size,
        "frames": frames,
        "streams": streams,
    })
}

/// Appends packed frames to a raw file.
pub struct Recorder {
    path: PathBuf,
    writer: BufWriter<File>,
    roles: RolePair,
    streams: Vec<StreamInfo>,
    frame_size: usize,
    frames: u64,
}

impl Recorder {
    /// Creates (or truncates) the recording at `path` and writes its sidecar.
    pub fn create<P: AsRef<Path>>(
        path: P,
        roles: RolePair,
        streams: &[StreamInfo],
        frame_size: usize,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = BufWriter::new(File::create(&path)?);
        let recorder = Self {
            path,
            writer,
            roles,
            streams: streams.to_vec(),
            frame_size,
            frames: 0,
        };
        recorder.write_sidecar()?;
        debug!("recording {} byte frames to {}", frame_size, recorder.path.display());
        Ok(recorder)
    }

    fn write_sidecar(&self) -> Result<()> {
        let layout = layout_json(self.roles, &self.streams, self.frame_size, self.frames);
        let file = File::create(sidecar_path(&self.path))?;
        serde_json::to_writer_pretty(file, &layout)?;
        Ok(())
    }

    /// Appends the first `frame_size` bytes of `frame`.
    pub fn write(&mut self, frame: &[u8]) -> Result<()> {
        let frame = frame.get(..self.frame_size).ok_or(Error::BufferTooSmall {
            required: self.frame_size,
            actual: frame.len(),
        })?;
        self.writer.write_all(frame)?;
        self.frames += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Flushes the recording and updates the sidecar's frame count.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        self.write_sidecar()?;
        Ok(self.frames)
    }
}
