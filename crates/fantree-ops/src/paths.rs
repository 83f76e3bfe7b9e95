//! Lexical path helpers.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Drop trailing and repeated separators and interior `.` components.
///
/// Purely lexical: `..` is kept and symlinks are not resolved.
pub fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

/// `dir` with `suffix` appended to its final component (`a/b` -> `a/b.old`).
pub fn with_suffix(dir: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(normalize(dir));
    name.push(suffix);
    PathBuf::from(name)
}
