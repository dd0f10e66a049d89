//! Source-kind detection.
//!
//! Each input is routed down exactly one of three pipelines, chosen from its
//! extension before anything is decoded:
//!
//! - [`SourceKind::Vector`]: already resolution-independent; copied verbatim.
//! - [`SourceKind::NativeRaster`]: decoded directly by the image backend.
//! - [`SourceKind::BridgedRaster`]: needs an external converter first
//!   (camera-native containers such as HEIC).

use crate::naming;
use serde::Serialize;
use std::fmt;
use std::path::Path;

const VECTOR_EXTENSIONS: &[&str] = &["svg"];
const BRIDGED_EXTENSIONS: &[&str] = &["heic", "heif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Vector,
    NativeRaster,
    BridgedRaster,
}

impl SourceKind {
    /// Classify a source by extension (case-insensitive).
    ///
    /// Unknown extensions are treated as native rasters; the decoder sniffs
    /// the content and reports a decode error if it cannot read it.
    pub fn detect(path: &Path) -> Self {
        let ext = naming::extension(path);
        if VECTOR_EXTENSIONS.contains(&ext.as_str()) {
            SourceKind::Vector
        } else if BRIDGED_EXTENSIONS.contains(&ext.as_str()) {
            SourceKind::BridgedRaster
        } else {
            SourceKind::NativeRaster
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Vector => "vector",
            SourceKind::NativeRaster => "raster",
            SourceKind::BridgedRaster => "bridged raster",
        };
        f.write_str(name)
    }
}
