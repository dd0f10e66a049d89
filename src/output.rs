//! CLI output formatting for all commands.
//!
//! # Entity Display Contract
//!
//! Every source follows the same two-level pattern:
//!
//! 1. **Header line**: positional index + output name + source kind
//! 2. **Context lines**: indented `Source:`, one line per variant, errors,
//!    and a savings line
//!
//! # Output Format
//!
//! ## Optimize
//!
//! ```text
//! Backing up 2 originals
//!     CMC_ppol_aligned.jpg: copied
//!     CMC_xpol_aligned.jpg: already backed up
//! Responsive images (2 sources)
//!     001 CMC_ppol_aligned (raster)
//!         Source: CMC_ppol_aligned.jpg
//!         small: 640x427, 0.04 MB
//!         medium: skipped (1280px not below source width)
//!         fallback: 1000x667, 0.11 MB
//!         Savings: 91.3% average over 2 files (original 1.71 MB)
//! ```
//!
//! ## Summary
//!
//! ```text
//! Optimized files
//!     CMC_ppol_aligned_fallback.jpg  0.11 MB
//!     CMC_ppol_aligned_small.webp  0.04 MB
//! Total: 0.15 MB in 2 files
//! Savings: 1.56 MB (91.2%) against 1.71 MB of originals
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::{VariantOutcome, VariantOutput, average_savings_percent};
use crate::process::{
    BackupStatus, BatchKind, BatchReport, ItemOutcome, ItemReport, ProcessEvent,
};
use crate::snippet;
use crate::summary::Summary;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Byte count as megabytes with two decimals.
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn batch_title(batch: BatchKind) -> &'static str {
    match batch {
        BatchKind::Responsive => "Responsive images",
        BatchKind::Projects => "Project images",
        BatchKind::Sprites => "Sprites",
    }
}

fn variant_line(v: &VariantOutput) -> String {
    format!("{}: {}x{}, {}", v.label, v.width, v.height, format_mb(v.byte_size))
}

// ============================================================================
// Processing output
// ============================================================================

/// Format one finished item as display lines.
pub fn format_item(index: usize, item: &ItemReport) -> Vec<String> {
    let ctx = indent(2);
    let mut lines = vec![
        format!("{}{} {} ({})", indent(1), format_index(index), item.name, item.kind),
        format!("{}Source: {}", ctx, file_name(&item.source)),
    ];

    match &item.outcome {
        ItemOutcome::Generated {
            report,
            bridged_with,
        } => {
            if let Some(tool) = bridged_with {
                lines.push(format!("{}Converted with: {}", ctx, tool));
            }
            for variant in &report.variants {
                lines.push(match variant {
                    VariantOutcome::Written(v) => format!("{}{}", ctx, variant_line(v)),
                    VariantOutcome::Skipped {
                        label,
                        target_width,
                    } => format!(
                        "{}{}: skipped ({}px not below source width)",
                        ctx, label, target_width
                    ),
                    VariantOutcome::Failed { label, error, .. } => {
                        format!("{}{}: failed: {}", ctx, label, error)
                    }
                });
            }
        }
        ItemOutcome::Optimized { output } => {
            lines.push(format!("{}{}", ctx, variant_line(output)));
        }
        ItemOutcome::Copied { path, byte_size } => {
            lines.push(format!(
                "{}copied: {}, {}",
                ctx,
                file_name(path),
                format_mb(*byte_size)
            ));
        }
        ItemOutcome::Skipped { error } => {
            lines.push(format!("{}skipped: {}", ctx, error));
        }
    }

    let sizes = item.written_sizes();
    if let Some(avg) = average_savings_percent(item.original_bytes, &sizes) {
        lines.push(format!(
            "{}Savings: {:.1}% average over {} {} (original {})",
            ctx,
            avg,
            sizes.len(),
            if sizes.len() == 1 { "file" } else { "files" },
            format_mb(item.original_bytes)
        ));
    }
    lines
}

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BackupStarted { count } => {
            vec![format!("Backing up {} originals", count)]
        }
        ProcessEvent::BackedUp(entry) => {
            let status = match &entry.status {
                BackupStatus::Copied => "copied".to_string(),
                BackupStatus::AlreadyBackedUp => "already backed up".to_string(),
                BackupStatus::Missing => "not found, skipped".to_string(),
                BackupStatus::Failed(msg) => format!("failed: {}", msg),
            };
            vec![format!("{}{}: {}", indent(1), entry.source, status)]
        }
        ProcessEvent::BatchStarted { batch, item_count } => {
            vec![format!("{} ({} sources)", batch_title(*batch), item_count)]
        }
        ProcessEvent::ItemFinished { index, item } => format_item(*index, item),
    }
}

/// One-line tally for a finished batch.
pub fn format_batch_totals(report: &BatchReport) -> Vec<String> {
    let total = report.items.len();
    let skipped = report.skipped_count();
    vec![format!(
        "{}: {} of {} processed, {} skipped, {} errors",
        batch_title(report.batch),
        total - skipped,
        total,
        skipped,
        report.error_count()
    )]
}

/// Print a batch tally to stdout.
pub fn print_batch_totals(report: &BatchReport) {
    for line in format_batch_totals(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Summary output
// ============================================================================

/// Format the optimized-directory summary.
pub fn format_summary(summary: Option<&Summary>) -> Vec<String> {
    let summary = match summary {
        Some(s) if s.file_count() > 0 => s,
        _ => return vec!["No optimized files found.".to_string()],
    };

    let mut lines = vec!["Optimized files".to_string()];
    for file in &summary.files {
        lines.push(format!("{}{}  {}", indent(1), file.name, format_mb(file.bytes)));
    }
    lines.push(format!(
        "Total: {} in {} files",
        format_mb(summary.total_bytes),
        summary.file_count()
    ));
    if let Some(savings) = &summary.savings {
        let saved = format_mb(savings.saved_bytes.unsigned_abs());
        let sign = if savings.saved_bytes < 0 { "-" } else { "" };
        lines.push(format!(
            "Savings: {}{} ({:.1}%) against {} of originals",
            sign,
            saved,
            savings.percent,
            format_mb(savings.original_bytes)
        ));
    }
    lines
}

/// Print the summary to stdout.
pub fn print_summary(summary: Option<&Summary>) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Markup snippets
// ============================================================================

/// HTML snippets for every item that produced usable output.
///
/// `url_prefix` is the public path of the output directory.
pub fn format_snippets(report: &BatchReport, url_prefix: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for item in &report.items {
        let markup = match &item.outcome {
            ItemOutcome::Generated { report, .. } => {
                snippet::picture_snippet(report, url_prefix, &item.name)
            }
            ItemOutcome::Optimized { output } => {
                Some(snippet::sprite_snippet(output, url_prefix, &item.name))
            }
            _ => None,
        };
        if let Some(markup) = markup {
            lines.push(format!("<!-- {} -->", item.name));
            lines.push(markup.into_string());
        }
    }
    lines
}

/// Print snippets to stdout under a heading, if there are any.
pub fn print_snippets(report: &BatchReport, url_prefix: &str) {
    let lines = format_snippets(report, url_prefix);
    if lines.is_empty() {
        return;
    }
    println!("HTML usage ({})", batch_title(report.batch));
    for line in lines {
        println!("{}", line);
    }
}
