//! Per-segment fade timings and the `-filter_complex` graph built from them.
//!
//! Everything here is pure. Numbers written into the graph are rounded to two
//! decimals so the same durations always produce the same expression.

use std::fmt;
use std::path::PathBuf;

/// Upper bound for fade-in and fade-out length, in seconds.
pub const MAX_FADE_SECS: f64 = 1.0;

const OUTPUT_LABEL: &str = "v";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeTiming {
    pub fade_in_len: f64,
    pub fade_out_start: f64,
}

impl FadeTiming {
    pub fn for_duration(duration: f64) -> Self {
        let fade_in_len = MAX_FADE_SECS.min(duration / 2.0);
        Self {
            fade_in_len,
            fade_out_start: duration - fade_in_len,
        }
    }
}

/// One image shown for one audio clip's duration.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub image_path: PathBuf,
    pub duration: f64,
    pub fade_in_len: f64,
    pub fade_out_start: f64,
}

impl Segment {
    pub fn new(image_path: PathBuf, duration: f64) -> Self {
        let fade = FadeTiming::for_duration(duration);
        Self {
            image_path,
            duration,
            fade_in_len: fade.fade_in_len,
            fade_out_start: fade.fade_out_start,
        }
    }
}

/// Pairs images with durations index by index. Images beyond the last
/// duration are ignored.
pub fn build_segments(images: &[PathBuf], durations: &[f64]) -> Vec<Segment> {
    images
        .iter()
        .zip(durations)
        .map(|(image, &duration)| Segment::new(image.clone(), duration))
        .collect()
}

pub fn total_duration(durations: &[f64]) -> f64 {
    durations.iter().sum()
}

/// Fade-in then fade-out on input `index`, labelled `[v<index>]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentFilter {
    pub index: usize,
    pub fade: FadeTiming,
}

impl fmt::Display for SegmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{i}:v]fade=t=in:st=0:d={d:.2},fade=t=out:st={st:.2}:d={d:.2}[v{i}]",
            i = self.index,
            d = self.fade.fade_in_len,
            st = self.fade.fade_out_start
        )
    }
}

/// Joins `[v0]..[v<n-1>]` in order into the single output pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatStep {
    pub count: usize,
}

impl fmt::Display for ConcatStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.count {
            write!(f, "[v{}]", i)?;
        }
        write!(f, "concat=n={}:v=1:a=0[{}]", self.count, OUTPUT_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphDescription {
    pub filters: Vec<SegmentFilter>,
    pub concat: ConcatStep,
}

impl GraphDescription {
    /// Pad to pass to `-map`.
    pub fn output_pad(&self) -> String {
        format!("[{}]", OUTPUT_LABEL)
    }
}

impl fmt::Display for GraphDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for filter in &self.filters {
            write!(f, "{};", filter)?;
        }
        write!(f, "{}", self.concat)
    }
}

pub fn build_filter_graph(durations: &[f64]) -> GraphDescription {
    GraphDescription {
        filters: durations
            .iter()
            .enumerate()
            .map(|(index, &d)| SegmentFilter {
                index,
                fade: FadeTiming::for_duration(d),
            })
            .collect(),
        concat: ConcatStep {
            count: durations.len(),
        },
    }
}
