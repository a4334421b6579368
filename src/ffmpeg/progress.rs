//! Progress extraction from FFmpeg's diagnostic stream.
//!
//! FFmpeg's stats line is heuristic text (`frame=  90 fps=... time=00:00:03.00 ...`).
//! Each stage owns an extractor that turns one line into a fraction; lines that
//! don't parse yield `None` and are skipped by the runner.

use regex::Regex;
use std::sync::LazyLock;

static FRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"frame=\s*(\d+)").expect("invalid frame regex"));
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=\s*(\d+):(\d{1,2}):(\d{1,2}(?:\.\d+)?)").expect("invalid time regex")
});

pub trait ProgressExtractor {
    /// Fraction in [0,1] for a line that carries progress, `None` otherwise.
    fn extract(&mut self, line: &str) -> Option<f64>;
}

/// Current output frame count from a `frame=<n>` token.
pub fn parse_frame_token(line: &str) -> Option<u64> {
    FRAME_RE.captures(line)?[1].parse().ok()
}

/// Elapsed output time in seconds from a `time=HH:MM:SS[.fraction]` token.
pub fn parse_time_token(line: &str) -> Option<f64> {
    let caps = TIME_RE.captures(line)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Frame count over the expected total, `round(total_secs * fps)`.
#[derive(Debug, Clone)]
pub struct FrameProgress {
    total_frames: u64,
}

impl FrameProgress {
    pub fn new(total_secs: f64, fps: u32) -> Self {
        let total = (total_secs * fps as f64).round();
        Self {
            total_frames: if total.is_finite() && total > 0.0 {
                total as u64
            } else {
                0
            },
        }
    }
}

impl ProgressExtractor for FrameProgress {
    fn extract(&mut self, line: &str) -> Option<f64> {
        if self.total_frames == 0 {
            return None;
        }
        let frame = parse_frame_token(line)?;
        Some((frame as f64 / self.total_frames as f64).min(1.0))
    }
}

/// Elapsed time over the target duration.
#[derive(Debug, Clone)]
pub struct TimeProgress {
    total_secs: f64,
}

impl TimeProgress {
    pub fn new(total_secs: f64) -> Self {
        Self { total_secs }
    }
}

impl ProgressExtractor for TimeProgress {
    fn extract(&mut self, line: &str) -> Option<f64> {
        if self.total_secs.is_nan() || self.total_secs <= 0.0 {
            return None;
        }
        let elapsed = parse_time_token(line)?;
        Some((elapsed / self.total_secs).min(1.0))
    }
}

/// For runs whose output carries no usable progress (audio concat).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressExtractor for NoProgress {
    fn extract(&mut self, _line: &str) -> Option<f64> {
        None
    }
}
