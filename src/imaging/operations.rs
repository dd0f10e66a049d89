//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take a
//! decoded [`SourceImage`] plus configuration, compute what to write, and call
//! the backend once per output file. A failed encode is recorded and the
//! remaining variants are still attempted.

use super::backend::{BackendError, Dimensions, ImageBackend, SourceImage};
use super::calculations::{PlannedSize, fallback_dimensions, fit_within, plan_responsive_sizes};
use super::flatten::{WHITE, flatten_onto};
use super::params::{EncodeParams, OutputFormat, Quality, SizeSpec};
use crate::naming;
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A file the generator wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantOutput {
    pub label: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: u32,
    pub byte_size: u64,
}

/// What happened to one planned output of a source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VariantOutcome {
    Written(VariantOutput),
    /// Target width was not below the source width.
    Skipped { label: String, target_width: u32 },
    /// Encoding failed; the other variants were still attempted.
    Failed {
        label: String,
        path: PathBuf,
        error: String,
    },
}

impl VariantOutcome {
    pub fn label(&self) -> &str {
        match self {
            VariantOutcome::Written(v) => &v.label,
            VariantOutcome::Skipped { label, .. } | VariantOutcome::Failed { label, .. } => label,
        }
    }

    pub fn written(&self) -> Option<&VariantOutput> {
        match self {
            VariantOutcome::Written(v) => Some(v),
            _ => None,
        }
    }
}

/// Per-source result of a generator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub original: Dimensions,
    pub variants: Vec<VariantOutcome>,
}

impl GenerationReport {
    pub fn written(&self) -> impl Iterator<Item = &VariantOutput> {
        self.variants.iter().filter_map(VariantOutcome::written)
    }

    pub fn failed_count(&self) -> usize {
        self.variants
            .iter()
            .filter(|v| matches!(v, VariantOutcome::Failed { .. }))
            .count()
    }

    /// The fallback variant, if it was written.
    pub fn fallback(&self) -> Option<&VariantOutput> {
        self.written().find(|v| v.label == FALLBACK_LABEL)
    }
}

/// Label used for the fallback re-encode in reports and filenames.
pub const FALLBACK_LABEL: &str = "fallback";

/// Configuration for responsive image generation.
#[derive(Debug, Clone)]
pub struct ResponsiveConfig {
    pub sizes: Vec<SizeSpec>,
    pub fallback_width: u32,
    pub webp_quality: Quality,
    pub jpeg_quality: Quality,
    pub background: [u8; 3],
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        Self {
            sizes: vec![
                SizeSpec::new("small", 640),
                SizeSpec::new("medium", 1280),
                SizeSpec::new("large", 1920),
            ],
            fallback_width: 1920,
            webp_quality: Quality::new(80),
            jpeg_quality: Quality::new(85),
            background: WHITE,
        }
    }
}

/// Encode `image` and turn the result into an outcome.
fn write_variant(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    label: &str,
    output: PathBuf,
    format: OutputFormat,
    quality: Quality,
) -> VariantOutcome {
    let params = EncodeParams {
        output,
        format,
        quality,
    };
    match backend.encode(image, &params) {
        Ok(byte_size) => VariantOutcome::Written(VariantOutput {
            label: label.to_string(),
            width: image.width(),
            height: image.height(),
            format,
            quality: quality.value(),
            byte_size,
            path: params.output,
        }),
        Err(e) => VariantOutcome::Failed {
            label: label.to_string(),
            path: params.output,
            error: e.to_string(),
        },
    }
}

/// Resize unless the target already matches the raster.
fn resized(backend: &impl ImageBackend, base: &RgbImage, dims: (u32, u32)) -> RgbImage {
    if base.dimensions() == dims {
        base.clone()
    } else {
        backend.resize(base, dims.0, dims.1)
    }
}

/// Create responsive WebP variants plus one JPEG fallback.
///
/// Sizes not narrower than the source are skipped. The fallback is always
/// attempted, at `fallback_width` or at the original width when the source
/// is narrower.
pub fn create_responsive_images(
    backend: &impl ImageBackend,
    source: SourceImage,
    output_dir: &Path,
    base_name: &str,
    config: &ResponsiveConfig,
) -> GenerationReport {
    let original = source.dimensions();
    let flat = flatten_onto(source.pixels, config.background);
    let mut variants = Vec::new();

    for planned in plan_responsive_sizes(original.as_tuple(), &config.sizes) {
        match planned {
            PlannedSize::Skip { label, target } => {
                variants.push(VariantOutcome::Skipped {
                    label,
                    target_width: target,
                });
            }
            PlannedSize::Resize {
                label,
                width,
                height,
            } => {
                let image = DynamicImage::ImageRgb8(backend.resize(&flat, width, height));
                let output = output_dir.join(naming::responsive_filename(
                    base_name,
                    &label,
                    OutputFormat::WebP,
                ));
                variants.push(write_variant(
                    backend,
                    &image,
                    &label,
                    output,
                    OutputFormat::WebP,
                    config.webp_quality,
                ));
            }
        }
    }

    let fallback = match fallback_dimensions(original.as_tuple(), config.fallback_width) {
        Some((w, h)) => backend.resize(&flat, w, h),
        None => flat,
    };
    let output = output_dir.join(naming::fallback_filename(base_name));
    variants.push(write_variant(
        backend,
        &DynamicImage::ImageRgb8(fallback),
        FALLBACK_LABEL,
        output,
        OutputFormat::Jpeg,
        config.jpeg_quality,
    ));

    GenerationReport { original, variants }
}

/// Configuration for the dual-size project image set.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Bounding box of the full-size WebP and its JPEG fallback.
    pub full_box: (u32, u32),
    /// Bounding box of the thumbnail WebP.
    pub thumb_box: (u32, u32),
    pub full_quality: Quality,
    pub thumb_quality: Quality,
    pub fallback_quality: Quality,
    pub background: [u8; 3],
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            full_box: (800, 600),
            thumb_box: (400, 300),
            full_quality: Quality::new(85),
            thumb_quality: Quality::new(80),
            fallback_quality: Quality::new(85),
            background: WHITE,
        }
    }
}

/// Create `<name>.webp`, `<name>_thumb.webp` and `<name>.jpg` for a project card.
///
/// The JPEG fallback reuses the full-size raster.
pub fn create_project_images(
    backend: &impl ImageBackend,
    source: SourceImage,
    output_dir: &Path,
    name: &str,
    config: &ProjectConfig,
) -> GenerationReport {
    let original = source.dimensions();
    let flat = flatten_onto(source.pixels, config.background);

    let full = DynamicImage::ImageRgb8(resized(
        backend,
        &flat,
        fit_within(original.as_tuple(), config.full_box),
    ));
    let thumb = DynamicImage::ImageRgb8(resized(
        backend,
        &flat,
        fit_within(original.as_tuple(), config.thumb_box),
    ));

    let variants = vec![
        write_variant(
            backend,
            &full,
            "full",
            output_dir.join(naming::project_filename(name, OutputFormat::WebP)),
            OutputFormat::WebP,
            config.full_quality,
        ),
        write_variant(
            backend,
            &thumb,
            "thumb",
            output_dir.join(naming::project_thumb_filename(name)),
            OutputFormat::WebP,
            config.thumb_quality,
        ),
        write_variant(
            backend,
            &full,
            FALLBACK_LABEL,
            output_dir.join(naming::project_filename(name, OutputFormat::Jpeg)),
            OutputFormat::Jpeg,
            config.fallback_quality,
        ),
    ];

    GenerationReport { original, variants }
}

/// Losslessly re-encode a sprite as PNG, keeping its alpha channel.
pub fn optimize_sprite(
    backend: &impl ImageBackend,
    source: SourceImage,
    output_dir: &Path,
    name: &str,
) -> Result<VariantOutput, BackendError> {
    let output = output_dir.join(naming::sprite_filename(name));
    let params = EncodeParams {
        output,
        format: OutputFormat::Png,
        quality: Quality::default(),
    };
    let byte_size = backend.encode(&source.pixels, &params)?;
    Ok(VariantOutput {
        label: "sprite".to_string(),
        width: source.pixels.width(),
        height: source.pixels.height(),
        format: OutputFormat::Png,
        quality: 100,
        byte_size,
        path: params.output,
    })
}
