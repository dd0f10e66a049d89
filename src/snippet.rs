//! HTML usage snippets for generated images.
//!
//! Printed after a run so the variants can be pasted into a page. Rendered
//! with maud, so file names and alt text are escaped.

use crate::imaging::{FALLBACK_LABEL, GenerationReport, OutputFormat, VariantOutput};
use maud::{Markup, html};
use std::path::Path;

/// Public URL of a generated file under `url_prefix`.
fn public_url(url_prefix: &str, path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = url_prefix.trim_end_matches('/');
    if prefix.is_empty() {
        file
    } else {
        format!("{prefix}/{file}")
    }
}

/// `srcset` value listing WebP variants by ascending width.
fn webp_srcset(report: &GenerationReport, url_prefix: &str) -> String {
    let mut webp: Vec<&VariantOutput> = report
        .written()
        .filter(|v| v.format == OutputFormat::WebP && v.label != FALLBACK_LABEL)
        .collect();
    webp.sort_by_key(|v| v.width);
    webp.iter()
        .map(|v| format!("{} {}w", public_url(url_prefix, &v.path), v.width))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `<picture>` element for a processed source.
///
/// Returns `None` when no fallback was written, since the `<img>` needs one.
pub fn picture_snippet(report: &GenerationReport, url_prefix: &str, alt: &str) -> Option<Markup> {
    let fallback = report.fallback()?;
    let srcset = webp_srcset(report, url_prefix);
    Some(html! {
        picture {
            @if !srcset.is_empty() {
                source type=(OutputFormat::WebP.mime_type()) srcset=(srcset) sizes="100vw";
            }
            img src=(public_url(url_prefix, &fallback.path))
                width=(fallback.width)
                height=(fallback.height)
                alt=(alt)
                loading="lazy";
        }
    })
}

/// Plain `<img>` for a sprite.
pub fn sprite_snippet(output: &VariantOutput, url_prefix: &str, alt: &str) -> Markup {
    html! {
        img src=(public_url(url_prefix, &output.path))
            width=(output.width)
            height=(output.height)
            alt=(alt);
    }
}
