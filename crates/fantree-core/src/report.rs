//! Aggregated results of tree operations.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// What a tree operation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeReport {
    /// Regular files removed or written.
    pub files: u64,
    /// Directories removed or created.
    pub directories: u64,
    /// Bytes of file content removed or written.
    pub bytes: u64,
}

impl TreeReport {
    /// Report for a single file of `bytes` length.
    pub fn file(bytes: u64) -> Self {
        Self {
            files: 1,
            directories: 0,
            bytes,
        }
    }

    /// Report for a single directory.
    pub fn directory() -> Self {
        Self {
            files: 0,
            directories: 1,
            bytes: 0,
        }
    }

    /// Total entries touched.
    pub fn total_items(&self) -> u64 {
        self.files + self.directories
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }

    /// Short human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} files, {} directories, {} bytes",
            self.files, self.directories, self.bytes
        )
    }
}

impl Add for TreeReport {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            files: self.files + rhs.files,
            directories: self.directories + rhs.directories,
            bytes: self.bytes + rhs.bytes,
        }
    }
}

impl AddAssign for TreeReport {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for TreeReport {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
