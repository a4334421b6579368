#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use slidecast_core::PipelineConfig;
use tempfile::TempDir;

/// Stage at which the fake ffmpeg exits with code 1.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailAt {
    Nowhere,
    Video,
    Audio,
    Merge,
}

impl FailAt {
    fn as_str(self) -> &'static str {
        match self {
            Self::Nowhere => "none",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Merge => "merge",
        }
    }
}

/// Temp directory with fake `ffmpeg`/`ffprobe` scripts and input files.
///
/// The fake ffprobe prints the content of the probed file, so an "audio" file
/// is just the ffprobe JSON it should produce. The fake ffmpeg logs its args,
/// appends concat manifests to `manifests.log`, prints canned stats lines and
/// touches its last argument (the output path).
pub struct IntegrationEnv {
    pub dir: TempDir,
}

const FAKE_FFPROBE: &str = "#!/bin/sh\nfor last; do :; done\ncat \"$last\"\n";

const STATS_TOTAL_6S: &str = "printf 'frame=    0 fps=0.0 q=0.0 size=       0kB time=00:00:00.00 bitrate=N/A speed=   0x\\r' >&2
printf 'frame=   90 fps= 45 q=28.0 size=     256kB time=00:00:03.00 bitrate= 699.1kbits/s speed=1.5x\\r' >&2
printf 'Past duration 0.999992 too large\\n' >&2
printf 'frame=   60 fps= 45 q=28.0 size=     200kB time=00:00:02.00 bitrate= 699.1kbits/s speed=1.5x\\r' >&2
printf 'frame=  180 fps= 45 q=-1.0 Lsize=     512kB time=00:00:06.00 bitrate= 699.1kbits/s speed=1.5x\\n' >&2";

impl IntegrationEnv {
    pub fn new() -> Self {
        Self::with_failure(FailAt::Nowhere)
    }

    pub fn with_failure(fail_at: FailAt) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let env = Self { dir };
        env.write_script("ffprobe", FAKE_FFPROBE);
        env.write_script("ffmpeg", &env.fake_ffmpeg_script(fail_at));
        fs::create_dir_all(env.path("in")).expect("create input dir");
        env
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_script(&self, name: &str, body: &str) {
        let path = self.path(name);
        fs::write(&path, body).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    }

    fn fake_ffmpeg_script(&self, fail_at: FailAt) -> String {
        format!(
            r#"#!/bin/sh
printf '%s\n' "$*" >> '{log}'
stage=''
prev=''
input=''
for arg; do
  if [ "$prev" = "-f" ] && [ "$arg" = "concat" ]; then stage=audio; fi
  if [ "$arg" = "-filter_complex" ]; then stage=video; fi
  if [ "$arg" = "-movflags" ]; then stage=merge; fi
  if [ "$prev" = "-i" ] && [ -z "$input" ]; then input="$arg"; fi
  prev="$arg"
  last="$arg"
done
if [ "$stage" = audio ]; then
  cat "$input" >> '{manifests}'
  printf '%s\n' '--' >> '{manifests}'
fi
if [ "$stage" = '{fail}' ]; then
  printf 'partial' > "$last"
  printf 'frame=   30 fps=0.0 q=0.0 size=       0kB time=00:00:01.00 bitrate=N/A\r' >&2
  printf 'Error while processing the decoded data\n' >&2
  exit 1
fi
{stats}
printf 'encoded' > "$last"
exit 0
"#,
            log = self.path("ffmpeg_args.log").display(),
            manifests = self.path("manifests.log").display(),
            fail = fail_at.as_str(),
            stats = STATS_TOTAL_6S,
        )
    }

    /// Writes an "audio" file the fake ffprobe reports as `duration` seconds.
    pub fn audio(&self, name: &str, duration: f64) -> PathBuf {
        let path = self.path("in").join(name);
        fs::write(
            &path,
            format!(
                r#"{{"format": {{"filename": "{}", "duration": "{:.6}"}}}}"#,
                name, duration
            ),
        )
        .expect("write audio");
        path
    }

    /// Writes an "audio" file the fake ffprobe can't produce a duration for.
    pub fn broken_audio(&self, name: &str) -> PathBuf {
        let path = self.path("in").join(name);
        fs::write(&path, "Invalid data found when processing input").expect("write audio");
        path
    }

    pub fn image(&self, name: &str) -> PathBuf {
        let path = self.path("in").join(name);
        fs::write(&path, b"\x89PNG").expect("write image");
        path
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            ffmpeg_path: Some(self.path("ffmpeg")),
            ffprobe_path: Some(self.path("ffprobe")),
            ..PipelineConfig::new(self.work_dir(), self.output())
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.path("work")
    }

    pub fn output(&self) -> PathBuf {
        self.path("out/output.mp4")
    }

    /// Argument lines of every fake ffmpeg invocation, in order.
    pub fn ffmpeg_calls(&self) -> Vec<String> {
        read_or_empty(&self.path("ffmpeg_args.log"))
            .lines()
            .map(String::from)
            .collect()
    }

    /// Concat manifests seen by the fake ffmpeg, one entry per audio pass.
    pub fn manifests(&self) -> Vec<String> {
        read_or_empty(&self.path("manifests.log"))
            .split("--\n")
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

fn read_or_empty(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}
