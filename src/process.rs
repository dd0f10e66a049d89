//! Batch processing of configured image sources.
//!
//! Drives the three batches the tool knows about:
//!
//! | Batch | Output directory | Per-source outputs |
//! |---|---|---|
//! | Responsive | `optimized/` | `<base>_<label>.webp` per size + `<base>_fallback.jpg` |
//! | Projects | `projects/` | `<name>.webp`, `<name>_thumb.webp`, `<name>.jpg` |
//! | Sprites | `optimized/` | `<name>.png` (lossless, alpha kept) |
//!
//! Every source is routed by [`SourceKind`]: vectors are copied verbatim,
//! native rasters are decoded directly, bridged rasters go through a
//! [`FormatConverter`] into a temporary JPEG first.
//!
//! ## Failure Model
//!
//! Problems with one source never stop the batch. They are recorded as an
//! [`ItemError`] on that item's report and processing moves on. Only setup
//! failures (an output directory that cannot be created) surface as a
//! [`ProcessError`].
//!
//! ## Progress
//!
//! Batches optionally take an mpsc [`Sender`] and emit a [`ProcessEvent`] as
//! each item finishes. The CLI prints them from a separate thread.

use crate::bridge::{self, BridgeError, ExternalConverter, FormatConverter};
use crate::config::{AssetEntry, ResolvedPaths, ToolConfig};
use crate::imaging::{
    BackendError, GenerationReport, ImageBackend, ProjectConfig, ResponsiveConfig, RustBackend,
    SourceImage, VariantOutcome, VariantOutput, create_project_images, create_responsive_images,
    optimize_sprite,
};
use crate::kind::SourceKind;
use crate::naming;
use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Why one source produced less than it should have.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ItemError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("{label}: encode failed: {message}")]
    Encode { label: String, message: String },
    #[error("{0}")]
    ConversionToolUnavailable(String),
    #[error("conversion failed: {0}")]
    ConversionFailed(String),
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<BackendError> for ItemError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Io(io) => ItemError::Io(io.to_string()),
            BackendError::Decode(msg) => ItemError::Decode(msg),
            BackendError::Encode(msg) => ItemError::Encode {
                label: "output".to_string(),
                message: msg,
            },
        }
    }
}

impl From<BridgeError> for ItemError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::ToolUnavailable(_) => ItemError::ConversionToolUnavailable(e.to_string()),
            BridgeError::Failed { .. } => ItemError::ConversionFailed(e.to_string()),
            BridgeError::Io(io) => ItemError::Io(io.to_string()),
        }
    }
}

/// Which batch an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Responsive,
    Projects,
    Sprites,
}

/// What a single source turned into.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Raster pipeline ran; individual variants may still have failed.
    Generated {
        report: GenerationReport,
        /// Converter used for a bridged source.
        #[serde(skip_serializing_if = "Option::is_none")]
        bridged_with: Option<String>,
    },
    /// Sprite re-encoded losslessly.
    Optimized { output: VariantOutput },
    /// Vector copied verbatim.
    Copied { path: PathBuf, byte_size: u64 },
    /// Nothing was written for this source.
    Skipped { error: ItemError },
}

/// Result for one configured source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub source: PathBuf,
    /// Base name of every output of this source.
    pub name: String,
    pub kind: SourceKind,
    /// Size of the source file, 0 if it could not be read.
    pub original_bytes: u64,
    pub outcome: ItemOutcome,
}

impl ItemReport {
    /// Every error recorded for this item, including failed variants.
    pub fn errors(&self) -> Vec<ItemError> {
        match &self.outcome {
            ItemOutcome::Skipped { error } => vec![error.clone()],
            ItemOutcome::Generated { report, .. } => report
                .variants
                .iter()
                .filter_map(|v| match v {
                    VariantOutcome::Failed { label, error, .. } => Some(ItemError::Encode {
                        label: label.clone(),
                        message: error.clone(),
                    }),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Byte sizes of every file written for this item.
    pub fn written_sizes(&self) -> Vec<u64> {
        match &self.outcome {
            ItemOutcome::Generated { report, .. } => report.written().map(|v| v.byte_size).collect(),
            ItemOutcome::Optimized { output } => vec![output.byte_size],
            ItemOutcome::Copied { byte_size, .. } => vec![*byte_size],
            ItemOutcome::Skipped { .. } => Vec::new(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Skipped { .. })
    }
}

/// All items of one batch, in configuration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub batch: BatchKind,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn error_count(&self) -> usize {
        self.items.iter().map(|i| i.errors().len()).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_skipped()).count()
    }
}

/// How the backup of one source went.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum BackupStatus {
    Copied,
    AlreadyBackedUp,
    Missing,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupEntry {
    pub source: String,
    pub status: BackupStatus,
}

/// Everything one `optimize` run did, as written by `--report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeReport {
    pub backups: Vec<BackupEntry>,
    pub responsive: BatchReport,
    pub sprites: BatchReport,
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    BackupStarted {
        count: usize,
    },
    BackedUp(BackupEntry),
    BatchStarted {
        batch: BatchKind,
        item_count: usize,
    },
    /// One item finished; `index` is 1-based within its batch.
    ItemFinished {
        index: usize,
        item: ItemReport,
    },
}

fn emit(progress: Option<&Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = progress {
        // A closed receiver only means nobody is printing.
        tx.send(event).ok();
    }
}

fn ensure_dir(path: &Path) -> Result<(), ProcessError> {
    fs::create_dir_all(path).map_err(|source| ProcessError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Create the originals and optimized directories if they do not exist yet.
pub fn ensure_directories(paths: &ResolvedPaths) -> Result<(), ProcessError> {
    ensure_dir(&paths.originals)?;
    ensure_dir(&paths.optimized)
}

// ============================================================================
// Originals backup
// ============================================================================

/// Copy each listed source from `root` into `originals_dir` verbatim.
///
/// Files already present in the backup directory are left untouched.
pub fn backup_originals(
    sources: &[String],
    root: &Path,
    originals_dir: &Path,
    progress: Option<&Sender<ProcessEvent>>,
) -> Result<Vec<BackupEntry>, ProcessError> {
    ensure_dir(originals_dir)?;
    emit(
        progress,
        ProcessEvent::BackupStarted {
            count: sources.len(),
        },
    );

    let mut entries = Vec::new();
    for source in sources {
        let src = root.join(source);
        let file_name = Path::new(source)
            .file_name()
            .unwrap_or(OsStr::new(source));
        let dest = originals_dir.join(file_name);

        let status = if dest.exists() {
            BackupStatus::AlreadyBackedUp
        } else if !src.is_file() {
            BackupStatus::Missing
        } else {
            match fs::copy(&src, &dest) {
                Ok(_) => BackupStatus::Copied,
                Err(e) => BackupStatus::Failed(e.to_string()),
            }
        };

        let entry = BackupEntry {
            source: source.clone(),
            status,
        };
        emit(progress, ProcessEvent::BackedUp(entry.clone()));
        entries.push(entry);
    }
    Ok(entries)
}

// ============================================================================
// Source preparation
// ============================================================================

/// A source ready for a pipeline branch.
enum Prepared {
    Vector,
    Raster {
        image: SourceImage,
        bridged_with: Option<String>,
    },
}

/// Resolve a source into decoded pixels, or mark it for verbatim copy.
///
/// The bridged intermediate only lives for the duration of this call.
fn prepare(
    backend: &impl ImageBackend,
    converter: &impl FormatConverter,
    path: &Path,
    kind: SourceKind,
) -> Result<Prepared, ItemError> {
    match kind {
        SourceKind::Vector => Ok(Prepared::Vector),
        SourceKind::NativeRaster => Ok(Prepared::Raster {
            image: backend.decode(path)?,
            bridged_with: None,
        }),
        SourceKind::BridgedRaster => {
            let intermediate = bridge::bridge_to_intermediate(converter, path)?;
            let image = backend.decode(intermediate.path())?;
            Ok(Prepared::Raster {
                image,
                bridged_with: Some(intermediate.tool.clone()),
            })
        }
    }
}

fn copy_vector(path: &Path, output_dir: &Path, name: &str) -> Result<ItemOutcome, ItemError> {
    let dest = output_dir.join(naming::vector_filename(name));
    let byte_size = fs::copy(path, &dest).map_err(|e| ItemError::Io(e.to_string()))?;
    Ok(ItemOutcome::Copied {
        path: dest,
        byte_size,
    })
}

/// Run one source through the branch its kind selects.
fn process_item(
    backend: &impl ImageBackend,
    converter: &impl FormatConverter,
    path: &Path,
    name: &str,
    output_dir: &Path,
    generate: impl FnOnce(SourceImage) -> Result<ItemOutcome, ItemError>,
) -> ItemReport {
    let kind = SourceKind::detect(path);
    let original_bytes = fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let outcome = if !path.is_file() {
        Err(ItemError::SourceNotFound(path.to_path_buf()))
    } else {
        prepare(backend, converter, path, kind).and_then(|prepared| match prepared {
            Prepared::Vector => copy_vector(path, output_dir, name),
            Prepared::Raster {
                image,
                bridged_with,
            } => generate(image).map(|outcome| match outcome {
                ItemOutcome::Generated { report, .. } => ItemOutcome::Generated {
                    report,
                    bridged_with,
                },
                other => other,
            }),
        })
    };

    ItemReport {
        source: path.to_path_buf(),
        name: name.to_string(),
        kind,
        original_bytes,
        outcome: outcome.unwrap_or_else(|error| ItemOutcome::Skipped { error }),
    }
}

// ============================================================================
// Batches
// ============================================================================

/// Generate responsive variants for every listed source.
///
/// Outputs are named after each source's base name.
pub fn process_responsive(
    backend: &impl ImageBackend,
    converter: &impl FormatConverter,
    root: &Path,
    sources: &[String],
    output_dir: &Path,
    config: &ResponsiveConfig,
    progress: Option<&Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    ensure_dir(output_dir)?;
    emit(
        progress,
        ProcessEvent::BatchStarted {
            batch: BatchKind::Responsive,
            item_count: sources.len(),
        },
    );

    let mut items = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        let path = root.join(source);
        let base = naming::base_name(&path);
        let item = process_item(backend, converter, &path, &base, output_dir, |image| {
            Ok(ItemOutcome::Generated {
                report: create_responsive_images(backend, image, output_dir, &base, config),
                bridged_with: None,
            })
        });
        emit(
            progress,
            ProcessEvent::ItemFinished {
                index: i + 1,
                item: item.clone(),
            },
        );
        items.push(item);
    }

    Ok(BatchReport {
        batch: BatchKind::Responsive,
        items,
    })
}

/// Generate full, thumbnail and fallback images for every project entry.
pub fn process_projects(
    backend: &impl ImageBackend,
    converter: &impl FormatConverter,
    root: &Path,
    entries: &[AssetEntry],
    output_dir: &Path,
    config: &ProjectConfig,
    progress: Option<&Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    ensure_dir(output_dir)?;
    emit(
        progress,
        ProcessEvent::BatchStarted {
            batch: BatchKind::Projects,
            item_count: entries.len(),
        },
    );

    let mut items = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let path = root.join(&entry.source);
        let item = process_item(backend, converter, &path, &entry.name, output_dir, |image| {
            Ok(ItemOutcome::Generated {
                report: create_project_images(backend, image, output_dir, &entry.name, config),
                bridged_with: None,
            })
        });
        emit(
            progress,
            ProcessEvent::ItemFinished {
                index: i + 1,
                item: item.clone(),
            },
        );
        items.push(item);
    }

    Ok(BatchReport {
        batch: BatchKind::Projects,
        items,
    })
}

/// Losslessly re-encode every sprite entry.
pub fn process_sprites(
    backend: &impl ImageBackend,
    converter: &impl FormatConverter,
    root: &Path,
    entries: &[AssetEntry],
    output_dir: &Path,
    progress: Option<&Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    ensure_dir(output_dir)?;
    emit(
        progress,
        ProcessEvent::BatchStarted {
            batch: BatchKind::Sprites,
            item_count: entries.len(),
        },
    );

    let mut items = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let path = root.join(&entry.source);
        let item = process_item(backend, converter, &path, &entry.name, output_dir, |image| {
            let output = optimize_sprite(backend, image, output_dir, &entry.name)?;
            Ok(ItemOutcome::Optimized { output })
        });
        emit(
            progress,
            ProcessEvent::ItemFinished {
                index: i + 1,
                item: item.clone(),
            },
        );
        items.push(item);
    }

    Ok(BatchReport {
        batch: BatchKind::Sprites,
        items,
    })
}

// ============================================================================
// Entry points used by the CLI
// ============================================================================

/// Backup, responsive batch and sprites with explicit backend and converter.
pub fn optimize_with(
    backend: &impl ImageBackend,
    converter: &impl FormatConverter,
    paths: &ResolvedPaths,
    config: &ToolConfig,
    skip_copy: bool,
    progress: Option<&Sender<ProcessEvent>>,
) -> Result<OptimizeReport, ProcessError> {
    ensure_directories(paths)?;
    let backups = if skip_copy {
        Vec::new()
    } else {
        backup_originals(
            &config.responsive.images,
            &paths.root,
            &paths.originals,
            progress,
        )?
    };

    let responsive = process_responsive(
        backend,
        converter,
        &paths.root,
        &config.responsive.images,
        &paths.optimized,
        &config.responsive.generator_config(),
        progress,
    )?;

    let sprites = process_sprites(
        backend,
        converter,
        &paths.root,
        &config.sprites,
        &paths.optimized,
        progress,
    )?;

    Ok(OptimizeReport {
        backups,
        responsive,
        sprites,
    })
}

/// Run the `optimize` command with the production backend and host tools.
pub fn optimize(
    paths: &ResolvedPaths,
    config: &ToolConfig,
    skip_copy: bool,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<OptimizeReport, ProcessError> {
    let backend = RustBackend::new();
    let converter = ExternalConverter::new(config.bridge.tools.clone());
    optimize_with(
        &backend,
        &converter,
        paths,
        config,
        skip_copy,
        progress.as_ref(),
    )
}

/// Run the `projects` command with the production backend and host tools.
pub fn projects(
    paths: &ResolvedPaths,
    config: &ToolConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    let backend = RustBackend::new();
    let converter = ExternalConverter::new(config.bridge.tools.clone());
    process_projects(
        &backend,
        &converter,
        &paths.root,
        &config.projects.images,
        &paths.projects,
        &config.projects.generator_config(),
        progress.as_ref(),
    )
}
