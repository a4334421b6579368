//! FFprobe-based duration probing for audio assets.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use crate::error::PipelineError;
use crate::events::{ProgressCallback, Stage, StageProgress};

/// ffprobe prints numbers as JSON strings; accept plain numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DurationField {
    Text(String),
    Number(f64),
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<DurationField>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

/// Reads `format.duration` (seconds) from ffprobe JSON output.
pub fn parse_ffprobe_duration(json: &str) -> Result<f64, String> {
    let output: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| format!("Failed to parse ffprobe JSON: {}", e))?;
    let field = output
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| "ffprobe output has no format.duration".to_string())?;
    let duration = match field {
        DurationField::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Unparsable duration {:?}", s))?,
        DurationField::Number(n) => n,
    };
    if duration.is_finite() && duration > 0.0 {
        Ok(duration)
    } else {
        Err(format!("Duration must be positive, got {}", duration))
    }
}

/// Run ffprobe on one asset and return its container duration.
pub fn probe_duration(ffprobe: &Path, asset: &Path) -> Result<f64, PipelineError> {
    let path_str = asset.to_string_lossy();
    log::debug!(
        target: "slidecast::ffmpeg::ffprobe",
        "probe_duration: path={}",
        path_str
    );

    let mut cmd = Command::new(ffprobe);
    cmd.args([
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        path_str.as_ref(),
    ]);
    #[cfg(windows)]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
    let output = cmd.output().map_err(|e| {
        PipelineError::launch(Stage::Probe, ffprobe.to_string_lossy(), e.to_string())
    })?;

    let probe_error = |reason: String| PipelineError::Probe {
        asset: asset.to_path_buf(),
        reason,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match output.status.code() {
            Some(code) => format!("ffprobe exited with code {}: {}", code, stderr.trim()),
            None => format!("ffprobe was terminated: {}", stderr.trim()),
        };
        return Err(probe_error(reason));
    }

    let json = String::from_utf8(output.stdout).map_err(|_| {
        probe_error("ffprobe output was not valid UTF-8".to_string())
    })?;
    parse_ffprobe_duration(&json).map_err(probe_error)
}

/// Probe every asset in order. The first failure aborts with no partial result.
pub fn probe_durations(
    ffprobe: &Path,
    assets: &[PathBuf],
    progress: Option<&ProgressCallback>,
) -> Result<Vec<f64>, PipelineError> {
    let mut stage = StageProgress::new(Stage::Probe, progress);
    let mut durations = Vec::with_capacity(assets.len());
    for (i, asset) in assets.iter().enumerate() {
        let duration = probe_duration(ffprobe, asset).inspect_err(|e| {
            log::error!(target: "slidecast::ffmpeg::ffprobe", "{}", e);
        })?;
        durations.push(duration);
        stage.report((i + 1) as f64 / assets.len() as f64);
    }
    stage.finish();
    log::info!(
        target: "slidecast::ffmpeg::ffprobe",
        "Probed {} audio file(s), total {:.2}s",
        durations.len(),
        durations.iter().sum::<f64>()
    );
    Ok(durations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_duration() {
        let json = r#"{
            "format": {
                "filename": "clip1.mp3",
                "format_name": "mp3",
                "duration": "2.037551",
                "size": "32853"
            }
        }"#;
        assert_eq!(parse_ffprobe_duration(json), Ok(2.037551));
    }

    #[test]
    fn parses_numeric_duration() {
        assert_eq!(
            parse_ffprobe_duration(r#"{"format":{"duration":3}}"#),
            Ok(3.0)
        );
    }

    #[test]
    fn missing_duration_is_error() {
        let err = parse_ffprobe_duration(r#"{"format": {}, "streams": []}"#).unwrap_err();
        assert!(err.contains("format.duration"));
        assert!(parse_ffprobe_duration("{}").is_err());
    }

    #[test]
    fn unparsable_inputs_are_errors() {
        for json in [
            "not json",
            r#"{"format":{"duration":"N/A"}}"#,
            r#"{"format":{"duration":"0.000000"}}"#,
            r#"{"format":{"duration":"-1"}}"#,
        ] {
            assert!(parse_ffprobe_duration(json).is_err(), "{}", json);
        }
    }

    #[test]
    fn missing_ffprobe_is_launch_error() {
        let missing = Path::new("/definitely/not/here/ffprobe");
        let err = probe_duration(missing, Path::new("a.mp3")).unwrap_err();
        assert!(matches!(err, PipelineError::Launch { .. }));
        assert_eq!(err.stage(), Stage::Probe);
    }
}
