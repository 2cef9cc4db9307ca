//! Hand frames produced by the external landmark tracker.
//!
//! The tracker is a separate process (typically a MediaPipe script) that
//! prints one JSON object per captured frame:
//!
//! ```text
//! {"landmarks": [{"id": 8, "x": 320, "y": 200}, ...], "fingers": [0,1,0,0,0]}
//! ```
//!
//! Coordinates are camera-frame pixels. An empty `landmarks` list means no
//! hand was detected in that frame.

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::gestures::FingerVector;
use crate::smoothing::Point;

/// MediaPipe hand landmark indices for the fingertips.
#[allow(dead_code)]
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Landmark {
    pub id: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandFrame {
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub fingers: FingerVector,
}

impl HandFrame {
    pub fn has_hand(&self) -> bool {
        !self.landmarks.is_empty()
    }

    pub fn point(&self, id: usize) -> Option<Point> {
        self.landmarks
            .iter()
            .find(|lm| lm.id == id)
            .map(|lm| Point::new(lm.x, lm.y))
    }

    /// Pixel distance between two landmarks, if both are present.
    pub fn distance(&self, a: usize, b: usize) -> Option<f64> {
        Some(self.point(a)?.distance(&self.point(b)?))
    }
}

/// Reads frames from any line-oriented reader. Malformed lines are logged and
/// skipped; `Ok(None)` means the stream ended.
pub struct FrameReader<R> {
    reader: R,
    line: Vec<u8>,
    lineno: u64,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            lineno: 0,
        }
    }

    pub fn next_frame(&mut self) -> Result<Option<HandFrame>> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut self.line)
                .context("failed to read from tracker")?;
            if n == 0 {
                return Ok(None);
            }
            self.lineno += 1;
            // bytes, not str: a non-UTF-8 line is just another bad frame
            let text = self.line.trim_ascii();
            if text.is_empty() {
                continue;
            }
            match serde_json::from_slice::<HandFrame>(text) {
                Ok(frame) => return Ok(Some(frame)),
                Err(e) => warn!("tracker line {}: skipping malformed frame: {e}", self.lineno),
            }
        }
    }
}

/// Tracker subprocess; its stdout is the frame stream.
pub struct TrackerProcess {
    child: Child,
}

impl TrackerProcess {
    /// Spawn `command` through `sh -c` and hand back its frame reader.
    pub fn spawn(command: &str) -> Result<(Self, FrameReader<BufReader<ChildStdout>>)> {
        info!("starting tracker: {command}");
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start tracker '{command}'"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("tracker stdout not captured"))?;
        debug!("tracker pid={}", child.id());
        Ok((Self { child }, FrameReader::new(BufReader::new(stdout))))
    }
}

impl Drop for TrackerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
