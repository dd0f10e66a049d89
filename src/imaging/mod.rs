//! Image processing on the `image` crate plus libwebp.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from content) |
//! | **Flatten alpha** | `imageops::overlay` onto a solid background |
//! | **Resize** | Lanczos3 via `imageops::resize` |
//! | **Encode WebP** | `webp::Encoder`, lossy |
//! | **Encode JPEG / PNG** | `image` codecs |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Flatten**: Alpha compositing before lossy or opaque encodes
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod flatten;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, PixelMode, SourceImage};
pub use calculations::{
    PlannedSize, average_savings_percent, fallback_dimensions, fit_within, plan_responsive_sizes,
    savings_percent, scale_to_width,
};
pub use flatten::{WHITE, flatten_onto};
pub use operations::{
    FALLBACK_LABEL, GenerationReport, ProjectConfig, ResponsiveConfig, VariantOutcome,
    VariantOutput, create_project_images, create_responsive_images, optimize_sprite,
};
pub use params::{EncodeParams, OutputFormat, Quality, SizeSpec};
pub use rust_backend::{RustBackend, supported_input_extensions};
