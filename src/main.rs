// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use args::Args;
use clap::Parser;
use edgefirst_rgbd::{
    CaptureConfig, Error as CaptureError, FrameMultiplexer, Recorder, SyntheticDevice,
};
use kanal::{Receiver, Sender};
use std::{
    error::Error,
    thread::{self, JoinHandle},
    time::Instant,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, Layer};

mod args;

fn init_tracing(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    if args.tracy {
        tracy_client::Client::start();
    }

    let stdout_log = tracing_subscriber::fmt::layer().with_filter(level);
    let journald = match tracing_journald::layer() {
        Ok(journald) => Some(journald.with_filter(level)),
        Err(_) => None,
    };
    let tracy = if args.tracy {
        Some(tracing_tracy::TracyLayer::default().with_filter(level))
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(stdout_log)
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    Ok(())
}

fn update_fps(prev: &mut Instant, history: &mut [i64], index: &mut usize) -> i64 {
    let now = Instant::now();

    let elapsed = now.duration_since(*prev);
    *prev = now;

    history[*index] = 1e9 as i64 / elapsed.as_nanos().max(1) as i64;
    *index = (*index + 1) % history.len();

    (history.iter().sum::<i64>() as f64 / history.len() as f64).round() as i64
}

/// Recorder thread: writes queued frames and hands the buffers back.
fn spawn_writer(
    mut recorder: Recorder,
    frames: Receiver<Vec<u8>>,
    free: Sender<Vec<u8>>,
) -> JoinHandle<Result<u64, CaptureError>> {
    thread::spawn(move || {
        while let Ok(frame) = frames.recv() {
            recorder.write(&frame)?;
            if free.send(frame).is_err() {
                break;
            }
        }
        recorder.finish()
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(&args)?;
    info!("EdgeFirst RGB-D Capture");

    let config = CaptureConfig::from(&args);
    let timeout = config.timeout;
    let mut mux = FrameMultiplexer::open(SyntheticDevice::new(), args.role_pair(), config)?;
    for failure in mux.failures() {
        warn!("degraded: {}", failure);
    }

    let (frame_tx, frame_rx) = kanal::bounded::<Vec<u8>>(args.queue);
    let (free_tx, free_rx) = kanal::bounded::<Vec<u8>>(args.queue + 1);
    let writer = match &args.output {
        Some(path) => {
            let recorder = Recorder::create(path, mux.roles(), mux.streams(), mux.size())?;
            info!("recording to {}", recorder.path().display());
            for _ in 0..=args.queue {
                free_tx.send(vec![0; mux.size()])?;
            }
            Some(spawn_writer(recorder, frame_rx, free_tx))
        }
        None => None,
    };

    let mut frame = vec![0; mux.size()];
    let mut prev = Instant::now();
    let mut history = vec![0; 30];
    let mut index = 0;
    let mut captured = 0u64;

    while args.frames == 0 || captured < args.frames {
        let now = Instant::now();
        match mux.grab(&mut frame, timeout) {
            Ok(()) => {}
            Err(CaptureError::Timeout) => {
                warn!("no channel updated within {:?}", timeout);
                continue;
            }
            Err(e) => {
                error!("capture stopped: {}", e);
                break;
            }
        }
        let capture_time = now.elapsed();
        let fps = update_fps(&mut prev, &mut history, &mut index);
        captured += 1;

        if let Some(client) = tracy_client::Client::running() {
            client.frame_mark();
        }
        debug!("frame {} capture: {:?} fps: {}", captured, capture_time, fps);

        if writer.is_some() {
            match free_rx.try_recv() {
                Ok(Some(mut out)) => {
                    std::mem::swap(&mut frame, &mut out);
                    if frame_tx.send(out).is_err() {
                        error!("recorder exited");
                        break;
                    }
                }
                Ok(None) => warn!("recorder is behind, dropping frame {}", captured),
                Err(e) => {
                    error!("recorder exited: {:?}", e);
                    break;
                }
            }
        }
    }

    drop(frame_tx);
    if let Some(writer) = writer {
        match writer.join() {
            Ok(Ok(frames)) => info!("recorded {} frames", frames),
            Ok(Err(e)) => error!("recording failed: {}", e),
            Err(_) => error!("recorder thread panicked"),
        }
    }

    mux.stop()?;
    info!("captured {} frames", captured);
    Ok(())
}
