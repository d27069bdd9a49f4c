use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::time::{Duration, Interval, MissedTickBehavior};

use super::landmarks::{HandObservation, Landmark, LandmarkFrame};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Supplier of per-frame landmark observations.
///
/// `Ok(None)` means the stream has ended. `Err` is a transient acquisition
/// failure: the caller skips the frame and asks again.
pub trait FrameSource {
    fn next_frame(&mut self) -> impl Future<Output = Result<Option<LandmarkFrame>>>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLandmark {
    Planar([f32; 2]),
    Spatial([f32; 3]),
    Named(Landmark),
}

impl From<RawLandmark> for Landmark {
    fn from(raw: RawLandmark) -> Self {
        match raw {
            RawLandmark::Planar([x, y]) => Landmark::new(x, y),
            RawLandmark::Spatial([x, y, z]) => Landmark { x, y, z },
            RawLandmark::Named(lm) => lm,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    #[serde(default)]
    hands: Vec<Vec<RawLandmark>>,
}

/// Parse one JSON-lines record into a frame, dropping incomplete hands.
pub fn parse_frame_record(line: &str) -> Result<LandmarkFrame> {
    let record: ReplayRecord =
        serde_json::from_str(line).context("malformed landmark record")?;

    let mut frame = LandmarkFrame::empty();
    for raw_hand in record.hands {
        let points: Vec<Landmark> = raw_hand.into_iter().map(Landmark::from).collect();
        match HandObservation::from_landmarks(&points) {
            Some(hand) => frame.hands.push(hand),
            None => {
                log_debug!("dropping hand with {} usable landmarks", points.len());
                frame.dropped_hands += 1;
            }
        }
    }
    Ok(frame)
}

/// Replays recorded detector output from a JSON-lines file.
///
/// Each line looks like `{"hands": [[[x, y], [x, y, z], ...], ...]}`.
pub struct ReplaySource {
    lines: Lines<BufReader<File>>,
    ticker: Option<Interval>,
    line_no: usize,
}

impl ReplaySource {
    /// Open a replay file; `fps == 0` disables pacing.
    pub async fn open(path: &Path, fps: u32) -> Result<Self> {
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open landmark replay {}", path.display()))?;

        let ticker = (fps > 0).then(|| {
            let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        Ok(Self {
            lines: BufReader::new(file).lines(),
            ticker,
            line_no: 0,
        })
    }
}

impl FrameSource for ReplaySource {
    async fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.tick().await;
        }

        loop {
            let Some(line) = self
                .lines
                .next_line()
                .await
                .context("failed to read landmark replay")?
            else {
                return Ok(None);
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            return parse_frame_record(&line)
                .map(Some)
                .with_context(|| format!("replay line {}", self.line_no));
        }
    }
}

/// In-memory source fed with a fixed script of acquisition results.
#[derive(Default)]
pub struct ScriptedSource {
    script: VecDeque<Result<LandmarkFrame>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self, frame: LandmarkFrame) -> &mut Self {
        self.script.push_back(Ok(frame));
        self
    }

    pub fn push_failure(&mut self, reason: &str) -> &mut Self {
        self.script.push_back(Err(anyhow!("{reason}")));
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl FrameSource for ScriptedSource {
    async fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        match self.script.pop_front() {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }
}
