//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: decode, resize, and encode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate plus `webp` for lossy WebP output.

use super::params::EncodeParams;
use image::{ColorType, DynamicImage, RgbImage};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Channel layout of a decoded source.
///
/// Palette-indexed files are expanded by the decoder, so they show up here as
/// `Rgb` or `Rgba` depending on whether the palette carried transparency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum PixelMode {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl PixelMode {
    pub fn from_color_type(color: ColorType) -> Self {
        match (color.has_color(), color.has_alpha()) {
            (false, false) => PixelMode::Gray,
            (false, true) => PixelMode::GrayAlpha,
            (true, false) => PixelMode::Rgb,
            (true, true) => PixelMode::Rgba,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, PixelMode::GrayAlpha | PixelMode::Rgba)
    }
}

/// A decoded source raster.
///
/// Owned by the generation call that decoded it and dropped once every
/// variant derived from it has been written.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub mode: PixelMode,
    pub pixels: DynamicImage,
}

impl SourceImage {
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            mode: PixelMode::from_color_type(pixels.color()),
            pixels,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.pixels.width(), self.pixels.height())
    }
}

/// Trait for image processing backends.
///
/// Every backend must implement all three operations so the variant
/// generators in [`operations`](super::operations) stay backend-agnostic.
pub trait ImageBackend {
    /// Read and decode a source file.
    fn decode(&self, path: &Path) -> Result<SourceImage, BackendError>;

    /// Resample an opaque raster to exact dimensions.
    fn resize(&self, image: &RgbImage, width: u32, height: u32) -> RgbImage;

    /// Encode a raster to disk. Returns the number of bytes written.
    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<u64, BackendError>;
}
