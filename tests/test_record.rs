// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use edgefirst_rgbd::{
    record::{layout_json, sidecar_path},
    CaptureConfig, Error, FrameMultiplexer, Recorder, RolePair, SensorRole, SyntheticDevice,
};
use serial_test::serial;
use std::{error::Error as StdError, fs, path::PathBuf, time::Duration};

fn recording_path() -> PathBuf {
    std::env::temp_dir().join("edgefirst-rgbd-test.raw")
}

#[test]
fn test_sidecar_path() {
    assert_eq!(
        sidecar_path(&PathBuf::from("/tmp/capture.raw")),
        PathBuf::from("/tmp/capture.raw.json")
    );
}

#[test]
fn test_layout_json() -> Result<(), Box<dyn StdError>> {
    let mux = FrameMultiplexer::open(
        SyntheticDevice::new().unpaced(),
        RolePair::new(SensorRole::Infrared8Projective, SensorRole::Color),
        CaptureConfig::default(),
    )?;
    let layout = layout_json(mux.roles(), mux.streams(), mux.size(), 0);

    assert_eq!(layout["roles"][0], "ir8-proj");
    assert_eq!(layout["roles"][1], "rgb");
    assert_eq!(layout["frame_size"], 307200 + 921600);
    assert_eq!(layout["streams"][0]["format"], "GRAY8");
    assert_eq!(layout["streams"][0]["stride"], 640);
    assert_eq!(layout["streams"][1]["format"], "RGB24");
    assert_eq!(layout["streams"][1]["offset"], 307200);
    assert_eq!(layout["streams"][1]["size"], 921600);
    Ok(())
}

#[test]
#[serial]
fn test_record_frames() -> Result<(), Box<dyn StdError>> {
    let path = recording_path();
    let mut mux = FrameMultiplexer::open(
        SyntheticDevice::new().unpaced(),
        RolePair::new(SensorRole::Depth, SensorRole::Color),
        CaptureConfig::default(),
    )?;

    let mut recorder = Recorder::create(&path, mux.roles(), mux.streams(), mux.size())?;
    let mut frame = vec![0u8; mux.size()];
    let mut frames = Vec::new();
    for _ in 0..3 {
        mux.grab(&mut frame, Some(Duration::from_secs(1)))?;
        recorder.write(&frame)?;
        frames.push(frame.clone());
    }
    assert_eq!(recorder.frames(), 3);
    assert_eq!(recorder.finish()?, 3);

    let raw = fs::read(&path)?;
    assert_eq!(raw.len(), 3 * 1536000);
    for (i, expected) in frames.iter().enumerate() {
        assert_eq!(&raw[i * 1536000..(i + 1) * 1536000], &expected[..]);
    }

    let sidecar: serde_json::Value = serde_json::from_slice(&fs::read(sidecar_path(&path))?)?;
    assert_eq!(sidecar["frames"], 3);
    assert_eq!(sidecar["frame_size"], 1536000);
    assert_eq!(sidecar["streams"][1]["offset"], 614400);

    fs::remove_file(sidecar_path(&path))?;
    fs::remove_file(&path)?;
    Ok(())
}

#[test]
#[serial]
fn test_record_short_frame() -> Result<(), Box<dyn StdError>> {
    let path = recording_path();
    let mut mux = FrameMultiplexer::open(
        SyntheticDevice::new().unpaced(),
        RolePair::new(SensorRole::Infrared16, SensorRole::Unassigned),
        CaptureConfig::default().with_mode(32, 24, 30),
    )?;
    let mut recorder = Recorder::create(&path, mux.roles(), mux.streams(), mux.size())?;

    let err = recorder.write(&[0u8; 16]).unwrap_err();
    assert!(matches!(
        err,
        Error::BufferTooSmall {
            required: 1536,
            actual: 16
        }
    ));

    let mut frame = vec![0u8; mux.size() + 8];
    mux.grab(&mut frame, None)?;
    recorder.write(&frame)?;
    assert_eq!(recorder.finish()?, 1);
    assert_eq!(fs::metadata(&path)?.len(), 1536);

    fs::remove_file(sidecar_path(&path))?;
    fs::remove_file(&path)?;
    Ok(())
}
