//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides which variants to create) and the [`backend`](super::backend)
//! (which does the actual pixel and codec work). This separation allows swapping
//! backends (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`SizeSpec`] — One named breakpoint of the responsive size table.
//! - [`OutputFormat`] — Encoded file format, which also fixes the file extension.
//! - [`EncodeParams`] — Full specification for an encode: output path, format, quality.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// A named target width in the responsive size table.
///
/// The label ends up in the output filename (`<base>_<name>.webp`), so table
/// order only matters for deterministic processing and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeSpec {
    pub name: String,
    pub width: u32,
}

impl SizeSpec {
    pub fn new(name: &str, width: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
        }
    }
}

/// Output encodings the backend knows how to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy WebP, the preferred responsive format.
    WebP,
    /// Baseline JPEG, the universally supported fallback.
    Jpeg,
    /// Lossless PNG (sprites keep their alpha channel).
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    /// MIME type, used for `<source type=...>` markup.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

/// Parameters for a single encode-to-disk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub output: PathBuf,
    pub format: OutputFormat,
    /// Ignored for lossless formats.
    pub quality: Quality,
}
