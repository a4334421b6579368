//! Map FFmpeg exit codes to short messages.
//!
//! Exit codes are from ffmpeg.c: 1 (general), 69 (rate exceeded),
//! 123 (hard exit), 255 (signal). -1 stands for "no exit code" (killed by a
//! signal). The diagnostic tail is kept as detail.

use serde::Serialize;

/// Lines of diagnostic output kept in `detail`.
const DETAIL_MAX_LINES: usize = 20;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FfmpegErrorPayload {
    pub summary: String,
    pub detail: String,
}

/// Builds a summary from the exit code and a detail from the end of `stderr`.
pub fn parse_ffmpeg_error(stderr: &str, exit_code: i32) -> FfmpegErrorPayload {
    let summary = match known_exit_code_summary(exit_code) {
        Some(summary) => summary,
        None => format!("FFmpeg failed (exit code {}).", exit_code),
    };
    FfmpegErrorPayload {
        summary,
        detail: tail_lines(stderr, DETAIL_MAX_LINES),
    }
}

fn known_exit_code_summary(code: i32) -> Option<String> {
    match code {
        -1 => Some("FFmpeg did not exit normally.".into()),
        1 => Some("FFmpeg failed.".into()),
        69 => Some("Encoding rate limit exceeded.".into()),
        123 | 255 => Some("Encoding was stopped.".into()),
        _ => None,
    }
}

fn tail_lines(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
