use std::path::Path;

use super::filter_graph::{GraphDescription, Segment};
use super::path_to_string;

/// Fixed encoder settings shared by the video and final-merge passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    pub video_codec: &'static str,
    pub preset: &'static str,
    pub crf: u32,
    pub fps: u32,
    pub audio_codec: &'static str,
    pub audio_bitrate_kbps: u32,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264",
            preset: "fast",
            crf: 23,
            fps: 30,
            audio_codec: "aac",
            audio_bitrate_kbps: 192,
        }
    }
}

impl EncodeSettings {
    fn video_codec_args(&self) -> [String; 6] {
        [
            "-c:v".to_string(),
            self.video_codec.to_string(),
            "-preset".to_string(),
            self.preset.to_string(),
            "-crf".to_string(),
            self.crf.to_string(),
        ]
    }

    fn audio_codec_args(&self) -> [String; 4] {
        [
            "-c:a".to_string(),
            self.audio_codec.to_string(),
            "-b:a".to_string(),
            format!("{}k", self.audio_bitrate_kbps),
        ]
    }
}

/// Shortest decimal that round-trips to `secs` (`2.0` → `2`, `2.25` → `2.25`).
pub fn format_seconds(secs: f64) -> String {
    format!("{}", secs)
}

fn common_prefix() -> Vec<String> {
    ["-hide_banner", "-nostdin", "-y"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Video-only pass: one looping still per segment, faded and concatenated.
pub fn build_video_args(
    segments: &[Segment],
    graph: &GraphDescription,
    output_path: &Path,
    settings: &EncodeSettings,
) -> Vec<String> {
    log::debug!(
        target: "slidecast::ffmpeg::builder",
        "Building video command: segments={}, fps={}, output={}",
        segments.len(),
        settings.fps,
        output_path.display()
    );

    let mut args = common_prefix();
    for segment in segments {
        args.extend([
            "-loop".to_string(),
            "1".to_string(),
            "-t".to_string(),
            format_seconds(segment.duration),
            "-i".to_string(),
            path_to_string(&segment.image_path),
        ]);
    }
    args.extend([
        "-filter_complex".to_string(),
        graph.to_string(),
        "-map".to_string(),
        graph.output_pad(),
    ]);
    args.extend(settings.video_codec_args());
    args.extend(["-r".to_string(), settings.fps.to_string()]);
    args.push(path_to_string(output_path));
    args
}

/// Audio pass: concat demuxer over the playlist manifest, transcoded once.
pub fn build_audio_concat_args(
    manifest_path: &Path,
    output_path: &Path,
    settings: &EncodeSettings,
) -> Vec<String> {
    let mut args = common_prefix();
    args.extend([
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        path_to_string(manifest_path),
    ]);
    args.extend(settings.audio_codec_args());
    args.push(path_to_string(output_path));
    args
}

/// Final mux: re-encode both streams, clamp to `total_secs`, fast-start layout.
pub fn build_merge_args(
    video_path: &Path,
    audio_path: &Path,
    total_secs: f64,
    output_path: &Path,
    settings: &EncodeSettings,
) -> Vec<String> {
    let mut args = common_prefix();
    args.extend([
        "-i".to_string(),
        path_to_string(video_path),
        "-i".to_string(),
        path_to_string(audio_path),
    ]);
    args.extend(settings.video_codec_args());
    args.extend(settings.audio_codec_args());
    args.extend([
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-t".to_string(),
        format_seconds(total_secs),
    ]);
    args.push(path_to_string(output_path));
    args
}

/// Single-line, shell-like rendering of an argument list for logs.
pub fn format_args_for_display(args: &[String]) -> String {
    args.iter()
        .map(|a| {
            if a.is_empty() || a.contains([' ', '\'', '"', ';', '[', ']']) {
                format!("'{}'", a.replace('\'', r"'\''"))
            } else {
                a.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
