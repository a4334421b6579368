//! Concatenation of the audio clips into one continuous track.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::events::{ProgressCallback, Stage, StageProgress};
use crate::ffmpeg::{EncodeSettings, NoProgress, build_audio_concat_args, run_ffmpeg_blocking};
use crate::workdir::WorkDir;

/// Concat-demuxer playlist: one `file '<absolute-path>'` line per clip, in order.
pub fn concat_manifest(audio_paths: &[PathBuf]) -> io::Result<String> {
    let mut manifest = String::new();
    for path in audio_paths {
        let absolute = std::path::absolute(path)?;
        let quoted = absolute.to_string_lossy().replace('\'', r"'\''");
        manifest.push_str(&format!("file '{}'\n", quoted));
    }
    Ok(manifest)
}

pub fn write_concat_manifest(manifest_path: &Path, audio_paths: &[PathBuf]) -> io::Result<()> {
    fs::write(manifest_path, concat_manifest(audio_paths)?)
}

/// Writes the manifest and transcodes the playlist into `work_dir`'s audio file.
pub fn mux_audio(
    ffmpeg: &Path,
    audio_paths: &[PathBuf],
    work_dir: &WorkDir,
    settings: &EncodeSettings,
    progress: Option<&ProgressCallback>,
) -> Result<PathBuf, PipelineError> {
    let manifest_path = work_dir.manifest_path();
    let output_path = work_dir.audio_path();
    write_concat_manifest(&manifest_path, audio_paths).map_err(PipelineError::io(Stage::Audio))?;
    log::info!(
        target: "slidecast::audio",
        "Concatenating {} audio file(s)",
        audio_paths.len()
    );

    let args = build_audio_concat_args(&manifest_path, &output_path, settings);
    let mut stage = StageProgress::new(Stage::Audio, progress);
    if let Err(e) = run_ffmpeg_blocking(ffmpeg, &args, &mut NoProgress, |p| stage.report(p)) {
        let _ = fs::remove_file(&output_path);
        return Err(e.into_pipeline_error(Stage::Audio));
    }
    stage.finish();
    Ok(output_path)
}
