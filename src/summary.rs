//! Summary of the optimized output directory.
//!
//! Lists what is on disk without reprocessing anything: each regular file of
//! the directory (not recursive) with its size, the total, and how that total
//! compares to the original sources that are still in the project root.

use crate::imaging::savings_percent;
use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub bytes: u64,
}

/// Original sources against the optimized directory as a whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Savings {
    pub original_bytes: u64,
    pub optimized_bytes: u64,
    /// Negative when the outputs outweigh the originals.
    pub saved_bytes: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Files sorted by name.
    pub files: Vec<FileEntry>,
    pub total_bytes: u64,
    /// `None` when none of the listed originals exist.
    pub savings: Option<Savings>,
}

impl Summary {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Summarize `optimized_dir`, comparing against `originals` under `root`.
///
/// Returns `None` if the directory does not exist.
pub fn summarize(optimized_dir: &Path, root: &Path, originals: &[String]) -> Option<Summary> {
    if !optimized_dir.is_dir() {
        return None;
    }

    let mut files: Vec<FileEntry> = WalkDir::new(optimized_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let bytes = e.metadata().ok()?.len();
            Some(FileEntry {
                name: e.file_name().to_string_lossy().into_owned(),
                bytes,
            })
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let total_bytes = files.iter().map(|f| f.bytes).sum();

    let existing: Vec<u64> = originals
        .iter()
        .filter_map(|source| std::fs::metadata(root.join(source)).ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .collect();
    let savings = (!existing.is_empty()).then(|| {
        let original_bytes: u64 = existing.iter().sum();
        Savings {
            original_bytes,
            optimized_bytes: total_bytes,
            saved_bytes: original_bytes as i64 - total_bytes as i64,
            percent: savings_percent(original_bytes, total_bytes),
        }
    });

    Some(Summary {
        files,
        total_bytes,
        savings,
    })
}
