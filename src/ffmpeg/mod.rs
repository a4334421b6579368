mod builder;
pub mod discovery;
mod error;
pub mod ffprobe;
pub mod filter_graph;
mod progress;
mod runner;

pub use builder::{
    EncodeSettings, build_audio_concat_args, build_merge_args, build_video_args,
    format_args_for_display, format_seconds,
};
pub use discovery::Toolchain;
pub use error::{FfmpegErrorPayload, parse_ffmpeg_error};
pub use progress::{
    FrameProgress, NoProgress, ProgressExtractor, TimeProgress, parse_frame_token,
    parse_time_token,
};
pub use runner::run_ffmpeg_blocking;

/// Path to string for FFmpeg args or logging.
pub fn path_to_string(path: &(impl AsRef<std::path::Path> + ?Sized)) -> String {
    path.as_ref().to_string_lossy().to_string()
}
