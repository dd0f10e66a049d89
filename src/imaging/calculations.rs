//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::SizeSpec;

/// Scale an image to a target width, preserving aspect ratio.
///
/// Height is rounded to the nearest pixel and never drops below 1.
///
/// # Examples
/// ```
/// # use respimg::imaging::scale_to_width;
/// assert_eq!(scale_to_width((3000, 2000), 640), (640, 427));
/// assert_eq!(scale_to_width((3000, 2000), 1280), (1280, 853));
/// ```
pub fn scale_to_width(original: (u32, u32), width: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let h = (width as f64 * orig_h as f64 / orig_w as f64).round() as u32;
    (width, h.max(1))
}

/// Fit an image inside a bounding box, preserving aspect ratio.
///
/// When the source is relatively wider than the box, the box width is the
/// limiting edge; otherwise the box height is. Sources that already fit are
/// returned unchanged (never upscaled).
pub fn fit_within(original: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let (box_w, box_h) = bounds;

    if orig_w <= box_w && orig_h <= box_h {
        return original;
    }

    let src_aspect = orig_w as f64 / orig_h as f64;
    let box_aspect = box_w as f64 / box_h as f64;

    if src_aspect > box_aspect {
        // Width is the limiting edge
        let h = (box_w as f64 / src_aspect).round() as u32;
        (box_w, h.max(1))
    } else {
        // Height is the limiting edge
        let w = (box_h as f64 * src_aspect).round() as u32;
        (w.max(1), box_h)
    }
}

/// One row of the responsive plan for a single source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedSize {
    /// Generate a variant at these dimensions.
    Resize {
        label: String,
        width: u32,
        height: u32,
    },
    /// Target is not narrower than the source; nothing is written.
    Skip { label: String, target: u32 },
}

/// Decide, for every entry of the size table, whether to resize or skip.
///
/// Entries keep their table order. A target width greater than or equal to
/// the original width is skipped rather than upscaled.
pub fn plan_responsive_sizes(original: (u32, u32), sizes: &[SizeSpec]) -> Vec<PlannedSize> {
    let (orig_w, _) = original;
    sizes
        .iter()
        .map(|spec| {
            if spec.width >= orig_w {
                PlannedSize::Skip {
                    label: spec.name.clone(),
                    target: spec.width,
                }
            } else {
                let (width, height) = scale_to_width(original, spec.width);
                PlannedSize::Resize {
                    label: spec.name.clone(),
                    width,
                    height,
                }
            }
        })
        .collect()
}

/// Dimensions of the fallback re-encode.
///
/// `None` means the source is already narrow enough and is re-encoded as-is.
pub fn fallback_dimensions(original: (u32, u32), fallback_width: u32) -> Option<(u32, u32)> {
    if original.0 > fallback_width {
        Some(scale_to_width(original, fallback_width))
    } else {
        None
    }
}

/// Percentage of `original` saved by a file of size `optimized`.
///
/// Negative when the output grew.
pub fn savings_percent(original: u64, optimized: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - optimized as f64) / original as f64 * 100.0
}

/// Average per-variant savings against the original byte size.
///
/// Averages over the variants actually written; `None` if there are none.
pub fn average_savings_percent(original: u64, variant_sizes: &[u64]) -> Option<f64> {
    if variant_sizes.is_empty() || original == 0 {
        return None;
    }
    let total: f64 = variant_sizes
        .iter()
        .map(|&size| original as f64 - size as f64)
        .sum();
    Some(total / (original as f64 * variant_sizes.len() as f64) * 100.0)
}
