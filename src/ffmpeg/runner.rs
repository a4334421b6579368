//! FFmpeg process spawning and progress parsing.
//!
//! Spawns FFmpeg as a blocking child process and reads its diagnostic stream
//! (stderr) on the calling thread. FFmpeg rewrites its stats line with `\r`,
//! so both `\r` and `\n` terminate a line. Every line goes through the stage's
//! progress extractor; parsed fractions are handed to `on_progress` before the
//! next line is read.

use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use super::builder::format_args_for_display;
use super::path_to_string;
use super::progress::ProgressExtractor;
use crate::error::ProcessError;

/// Keep only the last N bytes of stderr to avoid unbounded memory growth.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Bounded tail of a process's diagnostic output.
struct DiagnosticTail {
    buf: Vec<u8>,
    max_bytes: usize,
}

impl DiagnosticTail {
    fn new(max_bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(4096),
            max_bytes,
        }
    }

    fn push(&mut self, line: &str) {
        self.buf.extend_from_slice(line.as_bytes());
        self.buf.push(b'\n');
        if self.buf.len() > self.max_bytes {
            let excess = self.buf.len() - self.max_bytes;
            self.buf.drain(..excess);
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}

/// Calls `f` with every non-empty line of `reader`, splitting on `\r` and `\n`.
pub(crate) fn for_each_line<R: BufRead>(mut reader: R, mut f: impl FnMut(&str)) -> io::Result<()> {
    let mut line_buf = Vec::with_capacity(256);
    loop {
        let (consumed, line_done) = {
            let available = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(i) => {
                    line_buf.extend_from_slice(&available[..i]);
                    (i + 1, true)
                }
                None => {
                    line_buf.extend_from_slice(available);
                    (available.len(), false)
                }
            }
        };
        reader.consume(consumed);
        if line_done {
            flush_line(&mut line_buf, &mut f);
        }
    }
    flush_line(&mut line_buf, &mut f);
    Ok(())
}

fn flush_line(line_buf: &mut Vec<u8>, f: &mut impl FnMut(&str)) {
    if !line_buf.is_empty() {
        let line = String::from_utf8_lossy(line_buf);
        let line = line.trim();
        if !line.is_empty() {
            f(line);
        }
    }
    line_buf.clear();
}

/// Run FFmpeg (or any encoder binary) and block until it exits.
///
/// Progress fractions from `extractor` are passed to `on_progress` as lines
/// arrive; lines the extractor can't parse are skipped. On non-zero exit the
/// error carries the tail of the diagnostic stream.
pub fn run_ffmpeg_blocking(
    ffmpeg: &Path,
    args: &[String],
    extractor: &mut dyn ProgressExtractor,
    mut on_progress: impl FnMut(f64),
) -> Result<(), ProcessError> {
    let program = path_to_string(ffmpeg);
    log::debug!(
        target: "slidecast::ffmpeg::runner",
        "Spawning FFmpeg: {} {}",
        program,
        format_args_for_display(args)
    );

    let mut cmd = Command::new(ffmpeg);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    #[cfg(windows)]
    cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
    let mut child = cmd.spawn().map_err(|source| {
        log::error!(
            target: "slidecast::ffmpeg::runner",
            "Failed to spawn {}: {}",
            program,
            source
        );
        ProcessError::Spawn {
            program: program.clone(),
            source,
        }
    })?;

    let Some(stderr) = child.stderr.take() else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(ProcessError::Read {
            program,
            source: io::Error::other("Failed to capture stderr"),
        });
    };

    let mut tail = DiagnosticTail::new(MAX_STDERR_BYTES);
    let read_result = for_each_line(BufReader::new(stderr), |line| {
        tail.push(line);
        if let Some(p) = extractor.extract(line) {
            on_progress(p);
        }
    });
    if let Err(source) = read_result {
        let _ = child.kill();
        let _ = child.wait();
        return Err(ProcessError::Read { program, source });
    }

    let status = child.wait().map_err(|source| ProcessError::Read {
        program: program.clone(),
        source,
    })?;
    let stderr = tail.into_string();

    if status.success() {
        log::info!(
            target: "slidecast::ffmpeg::runner",
            "FFmpeg completed successfully"
        );
        Ok(())
    } else {
        let code = status.code().unwrap_or(-1);
        let last_lines: Vec<&str> = stderr.lines().rev().take(3).collect();
        let err_preview = last_lines.join("; ");
        log::error!(
            target: "slidecast::ffmpeg::runner",
            "FFmpeg failed (code={}): {}",
            code,
            err_preview
        );
        Err(ProcessError::Failed {
            program,
            code,
            stderr,
        })
    }
}
