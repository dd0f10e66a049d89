//! Shared test utilities for the respimg test suite.
//!
//! Synthetic fixture images written straight to disk, so tests never depend
//! on checked-in binaries.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let photo = tmp.path().join("CMC_ppol_aligned.jpg");
//! create_test_jpeg(&photo, 300, 200);
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Fixture writers
// =========================================================================

/// Write a gradient JPEG of the given size.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    DynamicImage::ImageRgb8(img)
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
}

/// Write an RGBA PNG: an opaque red square centered on a fully transparent
/// field. Transparent pixels carry black color data.
pub fn create_test_png_rgba(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let inside = x >= width / 4 && x < width * 3 / 4 && y >= height / 4 && y < height * 3 / 4;
        if inside {
            Rgba([220, 30, 30, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    DynamicImage::ImageRgba8(img)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Write an 8-bit indexed PNG with a `tRNS` chunk. Palette entry 0 is fully
/// transparent black and fills the border; entry 1 is opaque red and fills
/// the centered square.
pub fn create_test_png_indexed(path: &Path, width: u32, height: u32) {
    let indices: Vec<u8> = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let inside =
                    x >= width / 4 && x < width * 3 / 4 && y >= height / 4 && y < height * 3 / 4;
                u8::from(inside)
            })
        })
        .collect();

    let file = std::fs::File::create(path).unwrap();
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(vec![0, 0, 0, 220, 30, 30]);
    encoder.set_trns(vec![0, 255]);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(&indices).unwrap();
}

/// Write a file with an image extension whose content is not an image.
pub fn write_corrupt_file(path: &Path) {
    std::fs::write(path, b"this is not an image at all").unwrap();
}

/// Write a minimal SVG document.
pub fn write_test_svg(path: &Path) {
    std::fs::write(
        path,
        br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10"/></svg>"#,
    )
    .unwrap();
}
