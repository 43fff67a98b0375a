//! Keypoint sources: anything that turns a video frame into hand keypoints.
//!
//! The landmark model itself lives outside this crate. [`SubprocessDetector`]
//! talks to it over stdin/stdout; [`ReplayDetector`] plays back recorded
//! keypoints so the pipeline can run without a camera or a model.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::types::{FrameBuffer, HandKeypoints, Keypoint, landmarks};

/// Minimum detector confidence for a hand to count.
pub const MIN_HAND_SCORE: f32 = 0.5;

/// Produces at most one hand per frame.
///
/// `Ok(None)` means no hand was seen. Callers treat `Err` the same way.
pub trait KeypointSource {
    fn detect(&mut self, frame: &FrameBuffer) -> impl Future<Output = Result<Option<HandKeypoints>, Error>>;
}

// ---------------------------------------------------------------------------
// Subprocess detector
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionJson {
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Pick the first confident, complete hand out of one JSON response line.
fn parse_detection(line: &str) -> Result<Option<HandKeypoints>, Error> {
    let result: DetectionJson = serde_json::from_str(line.trim())
        .map_err(|e| Error::Detector(format!("bad response {line:?}: {e}")))?;

    if let Some(error) = result.error {
        return Err(Error::Detector(error));
    }

    for hand in result.hands {
        if hand.score < MIN_HAND_SCORE {
            continue;
        }
        if hand.landmarks.len() != landmarks::COUNT {
            warn!(got = hand.landmarks.len(), "expected 21 landmarks, skipping hand");
            continue;
        }
        let points: Vec<Keypoint> = hand.landmarks.iter().map(|l| Keypoint::new(l.x, l.y, l.z)).collect();
        debug!(handedness = %hand.handedness, score = hand.score, "hand detected");
        return Ok(HandKeypoints::from_slice(&points));
    }
    Ok(None)
}

/// Runs an external hand-landmark process and exchanges one frame per request.
///
/// Request: width, height, channel count (little-endian `u32`s) then raw RGB bytes.
/// Response: one JSON line `{"hands": [{"handedness", "score", "landmarks": [{x,y,z}; 21]}], "error": null}`.
pub struct SubprocessDetector {
    _child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl SubprocessDetector {
    /// Start `program args..` and wait for it to print `READY`.
    pub async fn spawn(program: &str, args: &[String]) -> Result<Self, Error> {
        info!(program, ?args, "starting hand detector");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Detector(format!("spawn {program}: {e}")))?;

        let stdin = child.stdin.take().ok_or_else(|| Error::Detector("no stdin".into()))?;
        let stdout = child.stdout.take().ok_or_else(|| Error::Detector("no stdout".into()))?;
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        stdout
            .read_line(&mut ready)
            .await
            .map_err(|e| Error::Detector(format!("waiting for READY: {e}")))?;
        if ready.trim() != "READY" {
            return Err(Error::Detector(format!("detector did not signal ready, got {ready:?}")));
        }
        info!("hand detector ready");

        Ok(Self { _child: child, stdin, stdout })
    }

    /// Split a shell-like command line on whitespace and spawn it.
    pub async fn from_command_line(cmd: &str) -> Result<Self, Error> {
        let mut parts = cmd.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| Error::Detector("empty detector command".into()))?;
        let args: Vec<String> = parts.collect();
        Self::spawn(&program, &args).await
    }
}

impl KeypointSource for SubprocessDetector {
    async fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<HandKeypoints>, Error> {
        if frame.pixels.is_empty() {
            return Ok(None);
        }
        let mut request = Vec::with_capacity(12 + frame.pixels.len() * 3);
        request.extend_from_slice(&(frame.width as u32).to_le_bytes());
        request.extend_from_slice(&(frame.height as u32).to_le_bytes());
        request.extend_from_slice(&3u32.to_le_bytes());
        request.extend_from_slice(&frame.to_rgb_bytes());
        let closed = |e: std::io::Error| Error::Detector(format!("detector pipe: {e}"));
        self.stdin.write_all(&request).await.map_err(closed)?;
        self.stdin.flush().await.map_err(closed)?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line).await.map_err(closed)? == 0 {
            return Err(Error::Detector("detector closed its output".into()));
        }
        parse_detection(&line)
    }
}

// ---------------------------------------------------------------------------
// Replay detector
// ---------------------------------------------------------------------------

/// Plays back recorded keypoints, one entry per frame, ignoring the frame itself.
///
/// File format: JSON lines, each `null` (no hand) or an array of 21 `[x, y, z]`.
/// Blank lines are skipped. Once exhausted every frame reports no hand.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    frames: std::collections::VecDeque<Option<HandKeypoints>>,
}

impl ReplayDetector {
    pub fn new(frames: impl IntoIterator<Item = Option<HandKeypoints>>) -> Self {
        Self { frames: frames.into_iter().collect() }
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut frames = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry: Option<Vec<[f32; 3]>> = serde_json::from_str(line)
                .map_err(|e| Error::Replay(format!("line {}: {e}", n + 1)))?;
            let hand = match entry {
                None => None,
                Some(points) => {
                    let points: Vec<Keypoint> = points.iter().map(|p| Keypoint::new(p[0], p[1], p[2])).collect();
                    let hand = HandKeypoints::from_slice(&points).ok_or_else(|| {
                        Error::Replay(format!("line {}: expected 21 keypoints, got {}", n + 1, points.len()))
                    })?;
                    Some(hand)
                }
            };
            frames.push(hand);
        }
        Ok(Self::new(frames))
    }

    pub async fn load(path: &Path) -> Result<Self, Error> {
        let text = tokio::fs::read_to_string(path).await?;
        let replay = Self::parse(&text)?;
        info!(path = %path.display(), frames = replay.remaining(), "loaded keypoint replay");
        Ok(replay)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl KeypointSource for ReplayDetector {
    async fn detect(&mut self, _frame: &FrameBuffer) -> Result<Option<HandKeypoints>, Error> {
        Ok(self.frames.pop_front().flatten())
    }
}
