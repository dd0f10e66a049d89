//! Color-mode normalization.
//!
//! Lossy targets here (WebP variants, JPEG fallback) are written without an
//! alpha channel, so transparent sources are composited onto an opaque
//! background first. Dropping alpha without compositing would expose whatever
//! color data sits under fully transparent pixels, usually black.

use image::imageops;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// Flatten any decoded image to opaque RGB8.
///
/// Images without alpha are converted directly. Images with alpha (including
/// expanded palettes with transparency) are alpha-blended over `background`.
pub fn flatten_onto(image: DynamicImage, background: [u8; 3]) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let overlay = image.into_rgba8();
    let (w, h) = overlay.dimensions();
    let [r, g, b] = background;
    let mut canvas = RgbaImage::from_pixel(w, h, Rgba([r, g, b, 255]));
    imageops::overlay(&mut canvas, &overlay, 0, 0);

    DynamicImage::ImageRgba8(canvas).into_rgb8()
}

/// Opaque white, the default fill.
pub const WHITE: [u8; 3] = [255, 255, 255];

/// True when every pixel of `image` equals `color`.
#[cfg(test)]
pub(crate) fn is_uniform(image: &RgbImage, color: [u8; 3]) -> bool {
    image.pixels().all(|p| *p == Rgb(color))
}
