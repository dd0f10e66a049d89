//! Production image backend on the `image` crate ecosystem.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → WebP (lossy) | `webp::Encoder::encode_advanced` (libwebp, method 6) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → PNG (lossless) | `image::codecs::png::PngEncoder`, best compression + adaptive filter |
//!
//! HEIC/HEIF is not decodable here; those sources go through
//! [`bridge`](crate::bridge) first.

use super::backend::{BackendError, ImageBackend, SourceImage};
use super::params::{EncodeParams, OutputFormat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const RASTER_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    RASTER_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of raster file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Backend using the `image` crate for decode/resize and `webp` for lossy WebP.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// libwebp effort level; 6 is the slowest and smallest.
const WEBP_METHOD: i32 = 6;

/// Lossy libwebp settings for one encode.
fn lossy_webp_config(quality: u32) -> Result<webp::WebPConfig, BackendError> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| BackendError::Encode("libwebp rejected its default config".into()))?;
    config.lossless = 0;
    config.quality = quality as f32;
    config.method = WEBP_METHOD;
    Ok(config)
}

fn save_webp(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let config = lossy_webp_config(quality)?;
    let encoded = match img {
        DynamicImage::ImageRgba8(rgba) => {
            webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                .encode_advanced(&config)
        }
        other => {
            let rgb = other.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
                .encode_advanced(&config)
        }
    }
    .map_err(|e| BackendError::Encode(format!("WebP encode failed: {e:?}")))?;

    std::fs::write(path, &*encoded)?;
    Ok(())
}

fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100) as u8);
    // JPEG has no alpha channel; callers hand us flattened rasters already.
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))
}

fn save_png(img: &DynamicImage, path: &Path) -> Result<(), BackendError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, CompressionType::Best, PngFilter::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("PNG encode failed: {e}")))
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<SourceImage, BackendError> {
        let pixels = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))?;
        Ok(SourceImage::new(pixels))
    }

    fn resize(&self, image: &RgbImage, width: u32, height: u32) -> RgbImage {
        image::imageops::resize(image, width, height, FilterType::Lanczos3)
    }

    fn encode(&self, image: &DynamicImage, params: &EncodeParams) -> Result<u64, BackendError> {
        let quality = params.quality.value();
        match params.format {
            OutputFormat::WebP => save_webp(image, &params.output, quality)?,
            OutputFormat::Jpeg => save_jpeg(image, &params.output, quality)?,
            OutputFormat::Png => save_png(image, &params.output)?,
        }
        Ok(std::fs::metadata(&params.output)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::PixelMode;
    use crate::imaging::params::Quality;
    use crate::test_helpers::{
        create_test_jpeg, create_test_png_indexed, create_test_png_rgba, write_corrupt_file,
    };

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = super::supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn decode_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let source = RustBackend::new().decode(&path).unwrap();
        assert_eq!(source.dimensions().as_tuple(), (200, 150));
        assert_eq!(source.mode, PixelMode::Rgb);
    }

    #[test]
    fn decode_png_with_alpha_reports_rgba() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("sprite.png");
        create_test_png_rgba(&path, 32, 16);

        let source = RustBackend::new().decode(&path).unwrap();
        assert_eq!(source.mode, PixelMode::Rgba);
    }

    #[test]
    fn decode_indexed_png_with_transparency_reports_rgba() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("indexed.png");
        create_test_png_indexed(&path, 40, 20);

        let source = RustBackend::new().decode(&path).unwrap();
        assert_eq!(source.mode, PixelMode::Rgba);
        assert!(source.mode.has_alpha());
        let rgba = source.pixels.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0).0[3], 0);
        assert_eq!(rgba.get_pixel(20, 10).0, [220, 30, 30, 255]);
    }

    #[test]
    fn decode_sniffs_content_not_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("actually-a-jpeg.png");
        create_test_jpeg(&path, 20, 10);

        let source = RustBackend::new().decode(&path).unwrap();
        assert_eq!(source.dimensions().as_tuple(), (20, 10));
    }

    #[test]
    fn decode_nonexistent_file_is_io_error() {
        let result = RustBackend::new().decode(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn decode_corrupt_file_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        write_corrupt_file(&path);

        let result = RustBackend::new().decode(&path);
        assert!(result.is_err());
    }

    #[test]
    fn resize_produces_exact_dimensions() {
        let src = RgbImage::from_pixel(400, 300, image::Rgb([90, 120, 200]));
        let out = RustBackend::new().resize(&src, 160, 120);
        assert_eq!(out.dimensions(), (160, 120));
    }

    #[test]
    fn encode_webp_writes_file_and_reports_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.webp");
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 48, |x, y| {
            image::Rgb([(x * 4) as u8, (y * 5) as u8, 128])
        }));

        let bytes = RustBackend::new()
            .encode(
                &img,
                &EncodeParams {
                    output: output.clone(),
                    format: OutputFormat::WebP,
                    quality: Quality::new(80),
                },
            )
            .unwrap();

        assert!(bytes > 0);
        assert_eq!(bytes, std::fs::metadata(&output).unwrap().len());
        assert_eq!(image::image_dimensions(&output).unwrap(), (64, 48));
    }

    #[test]
    fn lossy_webp_config_uses_slowest_method() {
        let config = lossy_webp_config(72).unwrap();
        assert_eq!(config.method, 6);
        assert_eq!(config.lossless, 0);
        assert_eq!(config.quality, 72.0);
    }

    #[test]
    fn encode_jpeg_roundtrips_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.jpg");
        let img = DynamicImage::ImageRgb8(RgbImage::new(33, 17));

        RustBackend::new()
            .encode(
                &img,
                &EncodeParams {
                    output: output.clone(),
                    format: OutputFormat::Jpeg,
                    quality: Quality::new(85),
                },
            )
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (33, 17));
    }

    #[test]
    fn encode_png_keeps_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("in.png");
        let output = tmp.path().join("out.png");
        create_test_png_rgba(&source, 24, 24);

        let backend = RustBackend::new();
        let decoded = backend.decode(&source).unwrap();
        backend
            .encode(
                &decoded.pixels,
                &EncodeParams {
                    output: output.clone(),
                    format: OutputFormat::Png,
                    quality: Quality::default(),
                },
            )
            .unwrap();

        let roundtrip = backend.decode(&output).unwrap();
        assert_eq!(roundtrip.mode, PixelMode::Rgba);
        assert_eq!(roundtrip.pixels.to_rgba8(), decoded.pixels.to_rgba8());
    }

    #[test]
    fn encode_into_missing_directory_errors() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(8, 8));
        let result = RustBackend::new().encode(
            &img,
            &EncodeParams {
                output: "/nonexistent/dir/out.jpg".into(),
                format: OutputFormat::Jpeg,
                quality: Quality::default(),
            },
        );
        assert!(result.is_err());
    }
}
