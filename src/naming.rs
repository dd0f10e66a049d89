//! Output filename conventions.
//!
//! Every generated file is named from a logical base name plus a suffix that
//! identifies the variant. Given distinct base names and distinct size labels,
//! no two outputs can collide:
//!
//! | Output | Name |
//! |---|---|
//! | Responsive variant | `<base>_<label>.webp` |
//! | Fallback | `<base>_fallback.jpg` |
//! | Project full size | `<base>.webp`, `<base>.jpg` |
//! | Project thumbnail | `<base>_thumb.webp` |
//! | Vector pass-through | `<base>.svg` |
//! | Sprite | `<base>.png` |

use crate::imaging::OutputFormat;
use std::path::Path;

/// Base name of a source file: its file name without the final extension.
///
/// `CMC_ppol_aligned.jpg` → `CMC_ppol_aligned`, `archive.tar.gz` → `archive.tar`.
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lowercased extension of a path, empty if there is none.
pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

pub fn responsive_filename(base: &str, label: &str, format: OutputFormat) -> String {
    format!("{}_{}.{}", base, label, format.extension())
}

pub fn fallback_filename(base: &str) -> String {
    format!("{}_fallback.{}", base, OutputFormat::Jpeg.extension())
}

pub fn project_filename(base: &str, format: OutputFormat) -> String {
    format!("{}.{}", base, format.extension())
}

pub fn project_thumb_filename(base: &str) -> String {
    format!("{}_thumb.{}", base, OutputFormat::WebP.extension())
}

pub fn vector_filename(base: &str) -> String {
    format!("{}.svg", base)
}

pub fn sprite_filename(base: &str) -> String {
    format!("{}.{}", base, OutputFormat::Png.extension())
}

/// Return the first name that occurs more than once, if any.
pub fn first_duplicate<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}
