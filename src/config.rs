//! Tool configuration module.
//!
//! Handles loading, validating, and merging `respimg.toml`. Stock defaults are
//! serialized to a TOML value and the user file is deep-merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! By default the file is read from the project root:
//!
//! ```text
//! project/
//! ├── respimg.toml             # Optional; stock defaults apply without it
//! ├── CMC_ppol_aligned.jpg     # Sources referenced by the config
//! └── assets/images/
//!     ├── originals/           # Verbatim backups
//!     ├── optimized/           # Responsive variants + sprites
//!     └── projects/            # Project card images
//! ```
//!
//! A different file can be passed with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! [paths]
//! originals = "assets/images/originals"
//! optimized = "assets/images/optimized"
//! projects = "assets/images/projects"
//!
//! [responsive]
//! fallback_width = 1920
//! webp_quality = 80
//! jpeg_quality = 85
//! background = [255, 255, 255]
//! images = ["CMC_ppol_aligned.jpg"]
//!
//! [[responsive.sizes]]
//! name = "small"
//! width = 640
//!
//! [projects]
//! full_size = [800, 600]
//! thumb_size = [400, 300]
//!
//! [[projects.images]]
//! source = "APEX.png"
//! name = "apex_osiris"
//!
//! [[sprites]]
//! source = "lutetia_globe_rosetta_8bit.png"
//! name = "asteroid_sprite"
//!
//! [bridge]
//! tools = ["sips", "magick", "convert"]
//! ```
//!
//! Arrays replace their default wholesale: setting `[[responsive.sizes]]`
//! defines the complete size table. Unknown keys are rejected to catch typos
//! early.

use crate::bridge;
use crate::imaging::{ProjectConfig, Quality, ResponsiveConfig, SizeSpec, WHITE};
use crate::naming;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config filename, looked up in the project root.
pub const CONFIG_FILENAME: &str = "respimg.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `respimg.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Output and backup directories, relative to the project root.
    pub paths: PathsConfig,
    /// Responsive variant generation (size table, qualities, sources).
    pub responsive: ResponsiveSection,
    /// Project card images (full + thumbnail + fallback).
    pub projects: ProjectsSection,
    /// Sprites to re-encode losslessly.
    pub sprites: Vec<AssetEntry>,
    /// External converters for non-native formats.
    pub bridge: BridgeConfig,
}

/// Directory layout, relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Verbatim backup copies of responsive sources.
    pub originals: String,
    /// Responsive variants, fallbacks and sprites.
    pub optimized: String,
    /// Project card images.
    pub projects: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            originals: "assets/images/originals".to_string(),
            optimized: "assets/images/optimized".to_string(),
            projects: "assets/images/projects".to_string(),
        }
    }
}

/// Directories resolved against a project root.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaths {
    pub root: PathBuf,
    pub originals: PathBuf,
    pub optimized: PathBuf,
    pub projects: PathBuf,
}

impl PathsConfig {
    pub fn resolve(&self, root: &Path) -> ResolvedPaths {
        ResolvedPaths {
            root: root.to_path_buf(),
            originals: root.join(&self.originals),
            optimized: root.join(&self.optimized),
            projects: root.join(&self.projects),
        }
    }
}

/// Responsive image generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponsiveSection {
    /// Named target widths, processed in order.
    pub sizes: Vec<SizeSpec>,
    /// Width of the JPEG fallback (sources narrower than this keep their width).
    pub fallback_width: u32,
    /// Lossy WebP quality (1-100).
    pub webp_quality: u32,
    /// JPEG fallback quality (1-100).
    pub jpeg_quality: u32,
    /// RGB fill used under transparent pixels.
    pub background: [u8; 3],
    /// Source files, relative to the project root.
    pub images: Vec<String>,
}

impl Default for ResponsiveSection {
    fn default() -> Self {
        Self {
            sizes: vec![
                SizeSpec::new("small", 640),
                SizeSpec::new("medium", 1280),
                SizeSpec::new("large", 1920),
            ],
            fallback_width: 1920,
            webp_quality: 80,
            jpeg_quality: 85,
            background: WHITE,
            images: Vec::new(),
        }
    }
}

impl ResponsiveSection {
    /// Generator parameters for this section.
    pub fn generator_config(&self) -> ResponsiveConfig {
        ResponsiveConfig {
            sizes: self.sizes.clone(),
            fallback_width: self.fallback_width,
            webp_quality: Quality::new(self.webp_quality),
            jpeg_quality: Quality::new(self.jpeg_quality),
            background: self.background,
        }
    }
}

/// A source file paired with the base name its outputs get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetEntry {
    pub source: String,
    pub name: String,
}

impl AssetEntry {
    pub fn new(source: &str, name: &str) -> Self {
        Self {
            source: source.to_string(),
            name: name.to_string(),
        }
    }
}

/// Project card image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectsSection {
    /// Bounding box `[width, height]` of the full-size image.
    pub full_size: [u32; 2],
    /// Bounding box `[width, height]` of the thumbnail.
    pub thumb_size: [u32; 2],
    pub full_quality: u32,
    pub thumb_quality: u32,
    pub fallback_quality: u32,
    /// RGB fill used under transparent pixels.
    pub background: [u8; 3],
    pub images: Vec<AssetEntry>,
}

impl Default for ProjectsSection {
    fn default() -> Self {
        Self {
            full_size: [800, 600],
            thumb_size: [400, 300],
            full_quality: 85,
            thumb_quality: 80,
            fallback_quality: 85,
            background: WHITE,
            images: Vec::new(),
        }
    }
}

impl ProjectsSection {
    /// Generator parameters for this section.
    pub fn generator_config(&self) -> ProjectConfig {
        ProjectConfig {
            full_box: (self.full_size[0], self.full_size[1]),
            thumb_box: (self.thumb_size[0], self.thumb_size[1]),
            full_quality: Quality::new(self.full_quality),
            thumb_quality: Quality::new(self.thumb_quality),
            fallback_quality: Quality::new(self.fallback_quality),
            background: self.background,
        }
    }
}

/// External converter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Tools tried in order for HEIC/HEIF sources.
    pub tools: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            tools: bridge::default_tools(),
        }
    }
}

fn check_quality(key: &str, value: u32) -> Result<(), ConfigError> {
    if !(1..=100).contains(&value) {
        return Err(ConfigError::Validation(format!("{key} must be 1-100")));
    }
    Ok(())
}

fn check_output_name(key: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(ConfigError::Validation(format!(
            "{key} '{name}' must be a non-empty file name without separators"
        )));
    }
    Ok(())
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges and that no two
    /// outputs would share a filename.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.responsive;
        check_quality("responsive.webp_quality", r.webp_quality)?;
        check_quality("responsive.jpeg_quality", r.jpeg_quality)?;
        if r.fallback_width == 0 {
            return Err(ConfigError::Validation(
                "responsive.fallback_width must be non-zero".into(),
            ));
        }
        if r.sizes.is_empty() {
            return Err(ConfigError::Validation(
                "responsive.sizes must not be empty".into(),
            ));
        }
        for size in &r.sizes {
            check_output_name("responsive.sizes name", &size.name)?;
            if size.width == 0 {
                return Err(ConfigError::Validation(format!(
                    "responsive.sizes '{}' must have a non-zero width",
                    size.name
                )));
            }
        }
        if let Some(dup) = naming::first_duplicate(r.sizes.iter().map(|s| s.name.as_str())) {
            return Err(ConfigError::Validation(format!(
                "responsive.sizes name '{dup}' is used twice"
            )));
        }
        let bases: Vec<String> = r
            .images
            .iter()
            .map(|source| naming::base_name(Path::new(source)))
            .collect();
        if let Some(dup) = naming::first_duplicate(bases.iter().map(String::as_str)) {
            return Err(ConfigError::Validation(format!(
                "responsive.images contains two sources with base name '{dup}'"
            )));
        }

        let p = &self.projects;
        check_quality("projects.full_quality", p.full_quality)?;
        check_quality("projects.thumb_quality", p.thumb_quality)?;
        check_quality("projects.fallback_quality", p.fallback_quality)?;
        if p.full_size.contains(&0) || p.thumb_size.contains(&0) {
            return Err(ConfigError::Validation(
                "projects.full_size and projects.thumb_size must be non-zero".into(),
            ));
        }
        for entry in &p.images {
            check_output_name("projects.images name", &entry.name)?;
        }
        if let Some(dup) = naming::first_duplicate(p.images.iter().map(|e| e.name.as_str())) {
            return Err(ConfigError::Validation(format!(
                "projects.images name '{dup}' is used twice"
            )));
        }

        for entry in &self.sprites {
            check_output_name("sprites name", &entry.name)?;
        }
        if let Some(dup) = naming::first_duplicate(self.sprites.iter().map(|e| e.name.as_str())) {
            return Err(ConfigError::Validation(format!(
                "sprites name '{dup}' is used twice"
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, toml::ser::Error> {
    toml::Value::try_from(ToolConfig::default())
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (including arrays) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ToolConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value()
        .map_err(|e| ConfigError::Validation(format!("stock defaults: {e}")))?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `respimg.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# respimg configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Paths are relative to the project root (--root). Arrays replace their
# default entirely, so [[responsive.sizes]] defines the whole size table.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Directories
# ---------------------------------------------------------------------------
[paths]
# Verbatim backups of responsive sources (skipped with --skip-copy).
originals = "assets/images/originals"

# Responsive WebP variants, JPEG fallbacks and sprites.
optimized = "assets/images/optimized"

# Project card images.
projects = "assets/images/projects"

# ---------------------------------------------------------------------------
# Responsive images
# ---------------------------------------------------------------------------
[responsive]
# Width of the <base>_fallback.jpg re-encode. Narrower sources keep their width.
fallback_width = 1920

# Lossy WebP quality (1 = worst, 100 = best).
webp_quality = 80

# JPEG fallback quality (1 = worst, 100 = best).
jpeg_quality = 85

# RGB fill composited under transparent pixels.
background = [255, 255, 255]

# Source files to process, e.g. ["CMC_ppol_aligned.jpg", "CMC_xpol_aligned.jpg"].
images = []

# Size table: one <base>_<name>.webp per entry narrower than the source.
[[responsive.sizes]]
name = "small"
width = 640

[[responsive.sizes]]
name = "medium"
width = 1280

[[responsive.sizes]]
name = "large"
width = 1920

# ---------------------------------------------------------------------------
# Project images: <name>.webp, <name>_thumb.webp, <name>.jpg
# ---------------------------------------------------------------------------
[projects]
# Bounding boxes as [width, height]. Aspect ratio is preserved, never upscaled.
full_size = [800, 600]
thumb_size = [400, 300]

full_quality = 85
thumb_quality = 80
fallback_quality = 85

background = [255, 255, 255]

# One entry per project image, e.g.:
# [[projects.images]]
# source = "APEX.png"
# name = "apex_osiris"
images = []

# ---------------------------------------------------------------------------
# Bridging for HEIC/HEIF sources
# ---------------------------------------------------------------------------
[bridge]
# Converters tried in order; the first one on PATH that succeeds wins.
tools = ["sips", "magick", "convert"]

# ---------------------------------------------------------------------------
# Sprites: lossless PNG re-encode to <name>.png in the optimized directory
# ---------------------------------------------------------------------------
# [[sprites]]
# source = "lutetia_globe_rosetta_8bit.png"
# name = "asteroid_sprite"
"##
}
