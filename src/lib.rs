//! # respimg
//!
//! Batch generator for responsive web image variants. A project lists its
//! source images in `respimg.toml`; each run turns them into lossy WebP files
//! at a table of breakpoint widths plus a single JPEG fallback, so a page can
//! serve them through `<picture>` with `srcset`.
//!
//! # Pipeline
//!
//! ```text
//! source ──► SourceKind::detect
//!              ├─ Vector         ──► copied verbatim
//!              ├─ BridgedRaster  ──► external converter ──► temp JPEG ─┐
//!              └─ NativeRaster   ─────────────────────────────────────┴─► decode
//!                                                                          │
//!                      flatten alpha onto background ◄──────────────────────┘
//!                                  │
//!                 ┌────────────────┼─────────────────┐
//!           <base>_<size>.webp  (skip ≥ source)  <base>_fallback.jpg
//! ```
//!
//! Every source is independent: a corrupt file, a missing converter or a
//! failed encode is recorded for that source and the batch moves on.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`process`] | Batch drivers (responsive, projects, sprites, backup), per-item error taxonomy, progress events |
//! | [`imaging`] | Dimension math, alpha flattening, backend trait + `image`/libwebp implementation, variant generators |
//! | [`bridge`] | External conversion of HEIC/HEIF into a scoped temporary JPEG |
//! | [`kind`] | Source-kind detection from the file extension |
//! | [`naming`] | Output filename conventions |
//! | [`config`] | `respimg.toml` loading, merging over stock defaults, validation |
//! | [`summary`] | Listing of the optimized directory with savings against originals |
//! | [`snippet`] | `<picture>` / `<img>` markup for generated files, rendered with Maud |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## No Upscaling
//!
//! A size entry at or above the source width is skipped rather than
//! enlarged, and the fallback never exceeds the source width. Re-running the
//! tool on its own fallback therefore reproduces the same dimensions.
//!
//! ## Alpha Is Composited, Not Dropped
//!
//! WebP variants and JPEG fallbacks are written without an alpha channel.
//! Transparent sources are composited onto a configurable background (white
//! by default) first; sprites are the exception and keep their alpha.
//!
//! ## Swappable Backend
//!
//! All pixel work goes through [`imaging::ImageBackend`]. Batch logic is
//! tested against a recording mock without encoding real images, and the
//! production [`imaging::RustBackend`] is exercised separately.

pub mod bridge;
pub mod config;
pub mod imaging;
pub mod kind;
pub mod naming;
pub mod output;
pub mod process;
pub mod snippet;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_helpers;
