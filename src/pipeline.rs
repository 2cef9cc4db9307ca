use anyhow::Result;
use log::{debug, error, info, warn};
use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::actions::{MouseSink, UinputSink};
use crate::config::Settings;
use crate::dispatch::dispatch_action;
use crate::engine::{Button, GestureEngine};
use crate::tracker::{FrameReader, TrackerProcess};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub frames: u64,
    pub hand_frames: u64,
    pub actions: u64,
}

pub struct RunOptions {
    /// Tracker command; `None` or `"-"` reads frames from stdin.
    pub source: Option<String>,
    pub dry_run: bool,
}

pub fn run(settings: Settings, opts: RunOptions) -> Result<RunStats> {
    let stop = Arc::new(AtomicBool::new(false));
    register_stop_signals(
        &[signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM],
        &stop,
    )?;

    let mut sink = if opts.dry_run {
        info!("dry run: pointer commands are logged only");
        UinputSink::noop()
    } else {
        UinputSink::new(settings.engine.screen)?
    };
    let mut engine = GestureEngine::new(settings.engine);

    let source = opts
        .source
        .or(settings.tracker_command)
        .filter(|s| s != "-");
    let stats = match source {
        Some(cmd) => {
            let (_tracker, mut frames) = TrackerProcess::spawn(&cmd)?;
            run_loop(&mut frames, &mut engine, &mut sink, &stop)?
        }
        None => {
            info!("reading frames from stdin");
            let mut frames = FrameReader::new(io::stdin().lock());
            run_loop(&mut frames, &mut engine, &mut sink, &stop)?
        }
    };

    info!(
        "stopped after {} frames ({} with a hand), {} actions",
        stats.frames, stats.hand_frames, stats.actions
    );
    Ok(stats)
}

/// First signal raises `stop`; a second one while `stop` is already set
/// terminates, so a stalled frame source can still be interrupted.
fn register_stop_signals(signals: &[i32], stop: &Arc<AtomicBool>) -> Result<()> {
    for &sig in signals {
        // conditional shutdown first, so it sees `stop` before this signal sets it
        signal_hook::flag::register_conditional_shutdown(sig, 1, Arc::clone(stop))?;
        signal_hook::flag::register(sig, Arc::clone(stop))?;
    }
    Ok(())
}

/// Drive the engine until the stream ends, a read fails, or `stop` is
/// raised. An active left-button hold is released on every exit path.
pub fn run_loop<R, S>(
    frames: &mut FrameReader<R>,
    engine: &mut GestureEngine,
    sink: &mut S,
    stop: &AtomicBool,
) -> Result<RunStats>
where
    R: BufRead,
    S: MouseSink + ?Sized,
{
    let result = drive(frames, engine, sink, stop);

    // don't leave the OS with a stuck button
    if engine.state().left_click_hold {
        warn!("releasing left-button hold on exit");
        if let Err(e) = sink.set_button_down(Button::Left, false) {
            error!("failed to release left button: {e}");
            if result.is_ok() {
                return Err(e);
            }
        }
    }
    result
}

fn drive<R, S>(
    frames: &mut FrameReader<R>,
    engine: &mut GestureEngine,
    sink: &mut S,
    stop: &AtomicBool,
) -> Result<RunStats>
where
    R: BufRead,
    S: MouseSink + ?Sized,
{
    let mut stats = RunStats::default();
    let mut window_start = Instant::now();
    let mut window_frames = 0u32;

    while !stop.load(Ordering::Relaxed) {
        let Some(frame) = frames.next_frame()? else {
            info!("frame stream ended");
            break;
        };
        stats.frames += 1;
        if frame.has_hand() {
            stats.hand_frames += 1;
        }

        if let Some(action) = engine.step(&frame) {
            stats.actions += 1;
            if let Err(e) = dispatch_action(&action, sink) {
                error!("dispatch failed: {e}");
            }
        }

        window_frames += 1;
        let elapsed = window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            debug!(
                "{:.1} fps, gesture {}",
                f64::from(window_frames) / elapsed.as_secs_f64(),
                engine.last_gesture().as_str()
            );
            window_start = Instant::now();
            window_frames = 0;
        }
    }
    Ok(stats)
}
