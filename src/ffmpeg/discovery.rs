//! Locating the `ffmpeg` and `ffprobe` executables.
//!
//! Order: explicit override from the run config, then the `FFMPEG_PATH` /
//! `FFPROBE_PATH` env vars, then (ffprobe only) the directory of the resolved
//! ffmpeg, then common install paths, then `PATH`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::PipelineError;
use crate::events::Stage;

const INSTALL_HINT: &str = "Please install FFmpeg on your system:\n  - macOS: brew install ffmpeg\n  - Linux: sudo apt install ffmpeg\n  - Windows: Download from https://ffmpeg.org/download.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

impl Tool {
    pub fn binary_name(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }

    fn env_var(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "FFMPEG_PATH",
            Tool::Ffprobe => "FFPROBE_PATH",
        }
    }
}

/// Resolved encoder and prober for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Toolchain {
    pub fn resolve(
        ffmpeg_override: Option<&Path>,
        ffprobe_override: Option<&Path>,
    ) -> Result<Self, PipelineError> {
        let ffmpeg = resolve_tool(Tool::Ffmpeg, ffmpeg_override, None)?;
        let ffprobe = resolve_tool(Tool::Ffprobe, ffprobe_override, Some(&ffmpeg))?;
        log::debug!(
            target: "slidecast::ffmpeg::discovery",
            "Using ffmpeg={}, ffprobe={}",
            ffmpeg.display(),
            ffprobe.display()
        );
        Ok(Self { ffmpeg, ffprobe })
    }
}

#[cfg(target_os = "windows")]
fn find_in_path(name: &str) -> Option<PathBuf> {
    let output = Command::new("where").arg(name).output().ok()?;
    first_output_line(&output)
}

#[cfg(not(target_os = "windows"))]
fn find_in_path(name: &str) -> Option<PathBuf> {
    let output = Command::new("which").arg(name).output().ok()?;
    first_output_line(&output)
}

fn first_output_line(output: &std::process::Output) -> Option<PathBuf> {
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let first = text.lines().next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(PathBuf::from(first))
    }
}

fn first_existing(paths: Vec<PathBuf>) -> Option<PathBuf> {
    paths.into_iter().find(|p| p.exists())
}

fn common_paths(name: &str) -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        ["/opt/homebrew/bin", "/usr/local/bin", "/opt/local/bin"]
            .iter()
            .map(|dir| Path::new(dir).join(name))
            .collect()
    }

    #[cfg(target_os = "windows")]
    {
        ["C:\\ffmpeg\\bin", "C:\\Program Files\\ffmpeg\\bin"]
            .iter()
            .map(|dir| Path::new(dir).join(format!("{}.exe", name)))
            .collect()
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        ["/usr/bin", "/usr/local/bin"]
            .iter()
            .map(|dir| Path::new(dir).join(name))
            .collect()
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", unix)))]
    {
        let _ = name;
        vec![]
    }
}

/// Paths to try for ffprobe given an ffmpeg binary path (suffixed first, then plain).
pub fn ffprobe_candidates(ffmpeg_path: &Path) -> Vec<PathBuf> {
    let Some(parent) = ffmpeg_path.parent() else {
        return vec![];
    };
    let exe = if cfg!(target_os = "windows") { ".exe" } else { "" };
    let mut candidates = Vec::with_capacity(2);
    // `file_stem` would eat the `.1` of `ffmpeg-7.1`; only `.exe` is an extension here.
    if let Some(suffix) = ffmpeg_path
        .file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.strip_suffix(exe).unwrap_or(name))
        .and_then(|stem| stem.strip_prefix("ffmpeg"))
        && !suffix.is_empty()
    {
        candidates.push(parent.join(format!("ffprobe{suffix}{exe}")));
    }
    candidates.push(parent.join(format!("ffprobe{exe}")));
    candidates
}

fn not_found(tool: Tool, reason: String) -> PipelineError {
    log::error!(
        target: "slidecast::ffmpeg::discovery",
        "{} not found: {}",
        tool.binary_name(),
        reason
    );
    PipelineError::launch(Stage::Setup, tool.binary_name(), reason)
}

/// Resolve one tool. An override that does not exist is an error, not a
/// signal to keep searching.
pub fn resolve_tool(
    tool: Tool,
    override_path: Option<&Path>,
    ffmpeg_hint: Option<&Path>,
) -> Result<PathBuf, PipelineError> {
    if let Some(path) = override_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(not_found(
            tool,
            format!("configured path {} does not exist", path.display()),
        ));
    }

    if let Ok(env_path) = std::env::var(tool.env_var()) {
        let p = PathBuf::from(&env_path);
        if p.exists() {
            log::debug!(
                target: "slidecast::ffmpeg::discovery",
                "{} path from {} env: {}",
                tool.binary_name(),
                tool.env_var(),
                p.display()
            );
            return Ok(p);
        }
        log::warn!(
            target: "slidecast::ffmpeg::discovery",
            "{}={} does not exist, searching elsewhere",
            tool.env_var(),
            env_path
        );
    }

    if tool == Tool::Ffprobe
        && let Some(ffmpeg) = ffmpeg_hint
        && let Some(p) = first_existing(ffprobe_candidates(ffmpeg))
    {
        return Ok(p);
    }

    if let Some(p) = first_existing(common_paths(tool.binary_name())) {
        return Ok(p);
    }

    if let Some(p) = find_in_path(tool.binary_name()).filter(|p| p.exists()) {
        return Ok(p);
    }

    Err(not_found(
        tool,
        format!(
            "{} not found in PATH or common locations. {}",
            tool.binary_name(),
            INSTALL_HINT
        ),
    ))
}
