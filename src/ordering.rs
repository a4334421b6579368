//! Asset collection and ordering for callers that start from files on disk.
//!
//! The pipeline pairs the i-th image with the i-th audio clip, so the order
//! chosen here decides the output.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "flac", "ogg"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetOrder {
    /// Plain string order of the full path (`clip10` before `clip2`).
    #[default]
    Lexical,
    /// Digit runs compare by value (`clip2` before `clip10`).
    Natural,
    /// Keep the order the paths were supplied in.
    Given,
}

pub fn sort_assets(paths: &mut [PathBuf], order: AssetOrder) {
    match order {
        AssetOrder::Lexical => paths.sort(),
        AssetOrder::Natural => {
            paths.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()))
        }
        AssetOrder::Given => {}
    }
}

/// Compares strings chunk by chunk; runs of ASCII digits compare numerically.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        let (chunk_a, rest_a) = split_chunk(a);
        let (chunk_b, rest_b) = split_chunk(b);
        let ord = match (is_digits(chunk_a), is_digits(chunk_b)) {
            (true, true) => cmp_digit_runs(chunk_a, chunk_b),
            _ => chunk_a.cmp(chunk_b),
        };
        if ord != Ordering::Equal {
            return ord;
        }
        a = rest_a;
        b = rest_b;
    }
}

fn is_digits(s: &str) -> bool {
    s.bytes().next().is_some_and(|c| c.is_ascii_digit())
}

/// Leading run of digits, or of non-digits.
fn split_chunk(s: &str) -> (&str, &str) {
    let digits = is_digits(s);
    let end = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() != digits)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s.split_at(end)
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Expands directories into their files with a matching extension, keeps plain
/// file arguments as given, then orders the whole list.
pub fn collect_assets(
    inputs: &[PathBuf],
    extensions: &[&str],
    order: AssetOrder,
) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in fs::read_dir(input)? {
                let path = entry?.path();
                if path.is_file() && has_extension(&path, extensions) {
                    found.push(path);
                }
            }
            // read_dir order is platform dependent; `Given` still needs a stable base.
            found.sort();
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    sort_assets(&mut paths, order);
    Ok(paths)
}
