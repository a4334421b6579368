//! Per-run working directory and cleanup.
//!
//! All intermediate artifacts live under one directory so a single recursive
//! removal clears them. `RunGuard` performs that removal on every exit path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "audio_list.txt";
pub const VIDEO_FILE: &str = "video.mp4";
pub const AUDIO_FILE: &str = "audio.m4a";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn video_path(&self) -> PathBuf {
        self.root.join(VIDEO_FILE)
    }

    pub fn audio_path(&self) -> PathBuf {
        self.root.join(AUDIO_FILE)
    }

    pub fn create(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    /// Recursively remove the directory. Missing is fine.
    pub fn remove(&self) -> io::Result<()> {
        remove_if_exists(fs::remove_dir_all(&self.root))
    }
}

fn remove_if_exists(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Remove a file left behind by an earlier run. Missing is fine.
pub fn remove_stale_file(path: &Path) -> io::Result<()> {
    remove_if_exists(fs::remove_file(path))
}

/// Removes the working directory when dropped, and the output file as well
/// unless the run was committed.
pub struct RunGuard<'a> {
    work_dir: &'a WorkDir,
    output: &'a Path,
    committed: bool,
}

impl<'a> RunGuard<'a> {
    pub fn new(work_dir: &'a WorkDir, output: &'a Path) -> Self {
        Self {
            work_dir,
            output,
            committed: false,
        }
    }

    /// Keep the output file; only the working directory is removed on drop.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.work_dir.remove() {
            log::warn!(
                target: "slidecast::workdir",
                "Failed to remove working directory {}: {}",
                self.work_dir.root().display(),
                e
            );
        }
        if !self.committed
            && let Err(e) = remove_stale_file(self.output)
        {
            log::warn!(
                target: "slidecast::workdir",
                "Failed to remove incomplete output {}: {}",
                self.output.display(),
                e
            );
        }
    }
}
