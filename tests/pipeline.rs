//! End-to-end tests against the production backend.
//!
//! Real images are synthesized into a temp directory, run through the public
//! batch API, and the written files are decoded again to check dimensions
//! and pixels.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use respimg::bridge::ExternalConverter;
use respimg::config::{self, AssetEntry, PathsConfig, ToolConfig};
use respimg::imaging::{ImageBackend, ResponsiveConfig, RustBackend};
use respimg::process::{self, ItemError, ItemOutcome};
use respimg::summary;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    DynamicImage::ImageRgb8(img)
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
}

/// Opaque blue disc-ish square in the middle, transparent (black) elsewhere.
fn write_transparent_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let inside = x > width / 3 && x < width * 2 / 3 && y > height / 3 && y < height * 2 / 3;
        if inside {
            Rgba([20, 40, 200, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    DynamicImage::ImageRgba8(img)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// 8-bit indexed PNG: palette entry 0 is fully transparent and fills the
/// border, entry 1 is opaque green and fills the middle third.
fn write_indexed_png(path: &Path, width: u32, height: u32) {
    let indices: Vec<u8> = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                u8::from(x > width / 3 && x < width * 2 / 3 && y > height / 3 && y < height * 2 / 3)
            })
        })
        .collect();
    let file = fs::File::create(path).unwrap();
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(vec![0, 0, 0, 30, 160, 40]);
    encoder.set_trns(vec![0, 255]);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(&indices).unwrap();
}

fn no_tools() -> ExternalConverter {
    ExternalConverter::new(Vec::new())
}

fn run_responsive(root: &Path, sources: &[&str], out: &Path) -> process::BatchReport {
    let sources: Vec<String> = sources.iter().map(|s| s.to_string()).collect();
    process::process_responsive(
        &RustBackend::new(),
        &no_tools(),
        root,
        &sources,
        out,
        &ResponsiveConfig::default(),
        None,
    )
    .unwrap()
}

// =============================================================================
// Responsive batch
// =============================================================================

#[test]
fn large_source_produces_every_size_and_fallback() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let out = root.join("optimized");
    write_jpeg(&root.join("wide.jpg"), 2400, 1600);

    let report = run_responsive(root, &["wide.jpg"], &out);

    assert_eq!(report.error_count(), 0);
    for (file, dims) in [
        ("wide_small.webp", (640, 427)),
        ("wide_medium.webp", (1280, 853)),
        ("wide_large.webp", (1920, 1280)),
        ("wide_fallback.jpg", (1920, 1280)),
    ] {
        assert_eq!(
            image::image_dimensions(out.join(file)).unwrap(),
            dims,
            "{file}"
        );
    }
}

#[test]
fn fallback_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_jpeg(&root.join("photo.jpg"), 2400, 1600);

    run_responsive(root, &["photo.jpg"], &root.join("first"));
    let first = root.join("first/photo_fallback.jpg");
    let first_dims = image::image_dimensions(&first).unwrap();

    fs::copy(&first, root.join("again.jpg")).unwrap();
    run_responsive(root, &["again.jpg"], &root.join("second"));
    let second_dims = image::image_dimensions(root.join("second/again_fallback.jpg")).unwrap();

    assert_eq!(first_dims, second_dims);
}

#[test]
fn transparent_source_gets_white_fallback() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let out = root.join("optimized");
    write_transparent_png(&root.join("logo.png"), 300, 300);

    run_responsive(root, &["logo.png"], &out);

    let fallback = image::open(out.join("logo_fallback.jpg")).unwrap().to_rgb8();
    let corner = fallback.get_pixel(2, 2);
    assert!(
        corner.0.iter().all(|&c| c > 240),
        "transparent area should be white, got {corner:?}"
    );
    let center = fallback.get_pixel(150, 150);
    assert!(center.0[2] > 150 && center.0[0] < 80, "center was {center:?}");
}

#[test]
fn palette_source_with_transparency_is_flattened_to_white() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let out = root.join("optimized");
    write_indexed_png(&root.join("badge.png"), 800, 600);

    let decoded = RustBackend::new().decode(&root.join("badge.png")).unwrap();
    assert!(decoded.mode.has_alpha());

    let report = run_responsive(root, &["badge.png"], &out);
    assert_eq!(report.error_count(), 0);

    for file in ["badge_fallback.jpg", "badge_small.webp"] {
        let img = image::open(out.join(file)).unwrap().to_rgb8();
        let corner = img.get_pixel(3, 3);
        assert!(
            corner.0.iter().all(|&c| c > 240),
            "{file}: transparent palette entry should be white, got {corner:?}"
        );
    }
    assert_eq!(
        image::image_dimensions(out.join("badge_small.webp")).unwrap(),
        (640, 480)
    );
}

#[test]
fn corrupt_source_does_not_stop_batch() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let out = root.join("optimized");
    write_jpeg(&root.join("one.jpg"), 1000, 800);
    fs::write(root.join("two.jpg"), b"definitely not a jpeg").unwrap();
    write_jpeg(&root.join("three.jpg"), 1000, 800);

    let report = run_responsive(root, &["one.jpg", "two.jpg", "three.jpg"], &out);

    assert!(matches!(
        report.items[1].errors().as_slice(),
        [ItemError::Decode(_)]
    ));
    let written: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(written.iter().all(|name| !name.starts_with("two")));
    // small (640 < 1000) + fallback for each good source
    assert_eq!(written.len(), 4);
}

#[test]
fn heic_without_tools_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("phone.HEIC"), b"ftypheic").unwrap();

    let report = run_responsive(root, &["phone.HEIC"], &root.join("optimized"));

    assert!(matches!(
        &report.items[0].outcome,
        ItemOutcome::Skipped {
            error: ItemError::ConversionToolUnavailable(_)
        }
    ));
}

// =============================================================================
// Full optimize run driven by a config file
// =============================================================================

#[test]
fn optimize_from_config_file() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_jpeg(&root.join("CMC_ppol_aligned.jpg"), 1500, 1000);
    write_transparent_png(&root.join("lutetia.png"), 64, 64);
    let config_path = root.join(config::CONFIG_FILENAME);
    fs::write(
        &config_path,
        r#"
[responsive]
images = ["CMC_ppol_aligned.jpg"]

[[responsive.sizes]]
name = "thumb"
width = 300

[[sprites]]
source = "lutetia.png"
name = "asteroid_sprite"
"#,
    )
    .unwrap();

    let tool_config = config::load_config(&config_path).unwrap();
    let paths = tool_config.paths.resolve(root);
    let report =
        process::optimize_with(&RustBackend::new(), &no_tools(), &paths, &tool_config, false, None)
            .unwrap();

    assert_eq!(report.backups.len(), 1);
    assert!(paths.originals.join("CMC_ppol_aligned.jpg").exists());
    assert_eq!(
        image::image_dimensions(paths.optimized.join("CMC_ppol_aligned_thumb.webp")).unwrap(),
        (300, 200)
    );

    // Sprite keeps its alpha channel
    let sprite = RustBackend::new()
        .decode(&paths.optimized.join("asteroid_sprite.png"))
        .unwrap();
    assert!(sprite.mode.has_alpha());

    let listing = summary::summarize(&paths.optimized, root, &tool_config.responsive.images)
        .unwrap();
    let names: Vec<&str> = listing.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "CMC_ppol_aligned_fallback.jpg",
            "CMC_ppol_aligned_thumb.webp",
            "asteroid_sprite.png",
        ]
    );
    assert!(listing.savings.is_some());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["responsive"]["batch"], "responsive");
}

#[test]
fn projects_batch_fits_boxes() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_jpeg(&root.join("APEX.jpg"), 1000, 1000);
    let paths = PathsConfig::default().resolve(root);
    let mut tool_config = ToolConfig::default();
    tool_config.projects.images = vec![AssetEntry::new("APEX.jpg", "apex_osiris")];

    let report = process::projects(&paths, &tool_config, None).unwrap();

    assert_eq!(report.error_count(), 0);
    assert_eq!(
        image::image_dimensions(paths.projects.join("apex_osiris.webp")).unwrap(),
        (600, 600)
    );
    assert_eq!(
        image::image_dimensions(paths.projects.join("apex_osiris_thumb.webp")).unwrap(),
        (300, 300)
    );
    assert_eq!(
        image::image_dimensions(paths.projects.join("apex_osiris.jpg")).unwrap(),
        (600, 600)
    );
}
