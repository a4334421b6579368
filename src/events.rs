//! Progress events emitted while a pipeline run advances through its stages.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Precondition checks, tool resolution and working-directory setup.
    Setup,
    Probe,
    Video,
    Audio,
    Merge,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Probe => "probe",
            Stage::Video => "video",
            Stage::Audio => "audio",
            Stage::Merge => "merge",
        }
    }

    pub(crate) fn failure_prefix(self) -> &'static str {
        match self {
            Stage::Setup => "Setup:",
            Stage::Probe => "Duration probe:",
            Stage::Video => "Video creation:",
            Stage::Audio => "Audio concatenation:",
            Stage::Merge => "Final merge:",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for progress events: `(stage, fraction)` with fraction in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub stage: Stage,
    pub progress: f64,
}

pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Collects every event it receives. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct ProgressRecorder {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> ProgressCallback {
        let events = Arc::clone(&self.events);
        Arc::new(move |event: ProgressEvent| events.lock().push(event))
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    /// Fractions reported for one stage, in emission order.
    pub fn for_stage(&self, stage: Stage) -> Vec<f64> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.stage == stage)
            .map(|e| e.progress)
            .collect()
    }
}

/// Progress state of one stage. Clamps to [0,1], drops values that would go
/// backwards and repeats of the last value. A fresh instance starts each stage.
pub struct StageProgress<'a> {
    stage: Stage,
    last: Option<f64>,
    callback: Option<&'a ProgressCallback>,
}

impl<'a> StageProgress<'a> {
    pub fn new(stage: Stage, callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            stage,
            last: None,
            callback,
        }
    }

    pub fn report(&mut self, fraction: f64) {
        if !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        if let Some(last) = self.last
            && fraction <= last
        {
            return;
        }
        self.last = Some(fraction);
        if let Some(cb) = self.callback {
            cb(ProgressEvent {
                stage: self.stage,
                progress: fraction,
            });
        }
    }

    /// Marks the stage complete; the last emitted value is always 1.0.
    pub fn finish(&mut self) {
        self.report(1.0);
    }
}
