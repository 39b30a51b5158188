//! Utility functions for locating download artifacts on disk

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Whether a client-supplied filename is safe to resolve inside a directory.
///
/// Rejects empty names, path separators, and parent-directory components so
/// the file-serving endpoint can never be walked out of its download
/// directory.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

/// Find the most recently modified file in `dir` with the given extension.
///
/// Used for artifact reconciliation after a download reports success: the
/// tool's final merged filename is not reliably known up front when
/// intermediate format-suffixed files exist, so the newest matching file is
/// taken as the artifact. Ties are broken arbitrarily. Returns `None` when
/// the directory is unreadable or holds no matching file.
pub fn latest_file_with_extension(dir: &Path, extension: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;

    entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            if !path.is_file() {
                return None;
            }
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension));
            if !matches {
                return None;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            Some((modified, path))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

/// Resolve a requested filename inside `dir`, falling back to a prefix match.
///
/// The exact name is tried first. If it does not exist, the directory is
/// scanned for files with the same extension whose stem is a prefix of the
/// requested stem (or vice versa) — this finds `title.mp4` when the client
/// asks for a format-suffixed intermediate like `title.f140.mp4`, and the
/// other way around. The candidate with the longest stem overlap wins.
///
/// # Examples
///
/// ```no_run
/// use tube_dl::utils::resolve_served_file;
/// use std::path::Path;
///
/// // Only "title.mp4" exists on disk:
/// let found = resolve_served_file(Path::new("/downloads"), "title.f140.mp4");
/// // found == Some("/downloads/title.mp4")
/// ```
pub fn resolve_served_file(dir: &Path, filename: &str) -> Option<PathBuf> {
    let exact = dir.join(filename);
    if exact.is_file() {
        return Some(exact);
    }

    let requested = Path::new(filename);
    let requested_stem = requested.file_stem()?.to_str()?;
    let requested_ext = requested.extension()?.to_str()?;

    let mut best: Option<(usize, PathBuf)> = None;
    for entry in fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let same_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(requested_ext));
        if !same_ext {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let is_prefix_match =
            requested_stem.starts_with(stem) || stem.starts_with(requested_stem);
        if !is_prefix_match {
            continue;
        }

        // Overlap is the shorter of the two stems; longest overlap wins
        let overlap = stem.len().min(requested_stem.len());
        if best.as_ref().is_none_or(|(score, _)| overlap > *score) {
            best = Some((overlap, path));
        }
    }

    best.map(|(_, path)| path)
}
