use clap::{Parser, Subcommand};
use respimg::{config, output, process, summary};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

#[derive(Parser)]
#[command(name = "respimg")]
#[command(about = "Responsive image variant generator")]
#[command(long_about = "\
Responsive image variant generator

Turns a handful of source images into web-ready variants: lossy WebP at a
set of breakpoint widths plus one JPEG fallback per source, fixed-box
project cards, and losslessly recompressed sprites.

Project layout:

  project/
  ├── respimg.toml                 # Sources and settings (optional)
  ├── CMC_ppol_aligned.jpg         # Sources listed in the config
  └── assets/images/
      ├── originals/               # Verbatim backups of responsive sources
      ├── optimized/               # <base>_<size>.webp, <base>_fallback.jpg, sprites
      └── projects/                # <name>.webp, <name>_thumb.webp, <name>.jpg

Source kinds:
  .svg          copied verbatim
  .heic/.heif   converted with sips or ImageMagick, then processed
  anything else decoded directly

Run 'respimg gen-config' to generate a documented respimg.toml.")]
#[command(version)]
struct Cli {
    /// Project root; sources and output directories are relative to it
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file [default: <root>/respimg.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Back up originals, generate responsive variants and optimize sprites
    Optimize {
        /// Do not copy sources into the originals directory
        #[arg(long)]
        skip_copy: bool,
        /// Write the batch report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Generate full-size, thumbnail and fallback images for project cards
    Projects,
    /// List the optimized directory without reprocessing
    Summary,
    /// Print a stock respimg.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Optimize { skip_copy, report } => {
            let (tool_config, paths) = load(&cli.root, cli.config.as_deref())?;
            let (tx, printer) = spawn_printer();
            let result = process::optimize(&paths, &tool_config, skip_copy, Some(tx));
            join_printer(printer);
            let result = result?;

            output::print_batch_totals(&result.responsive);
            output::print_batch_totals(&result.sprites);

            let found = summary::summarize(
                &paths.optimized,
                &paths.root,
                &tool_config.responsive.images,
            );
            output::print_summary(found.as_ref());

            let prefix = url_prefix(&tool_config.paths.optimized);
            output::print_snippets(&result.responsive, &prefix);
            output::print_snippets(&result.sprites, &prefix);

            if let Some(report_path) = report {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&report_path, json)?;
                println!("Report: {}", report_path.display());
            }
        }
        Command::Projects => {
            let (tool_config, paths) = load(&cli.root, cli.config.as_deref())?;
            let (tx, printer) = spawn_printer();
            let result = process::projects(&paths, &tool_config, Some(tx));
            join_printer(printer);
            let result = result?;

            output::print_batch_totals(&result);
            output::print_snippets(&result, &url_prefix(&tool_config.paths.projects));
        }
        Command::Summary => {
            let (tool_config, paths) = load(&cli.root, cli.config.as_deref())?;
            process::ensure_directories(&paths)?;
            let found = summary::summarize(
                &paths.optimized,
                &paths.root,
                &tool_config.responsive.images,
            );
            output::print_summary(found.as_ref());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file (default `<root>/respimg.toml`) and resolve output paths.
fn load(
    root: &Path,
    config_path: Option<&Path>,
) -> Result<(config::ToolConfig, config::ResolvedPaths), config::ConfigError> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(config::CONFIG_FILENAME));
    let tool_config = config::load_config(&config_path)?;
    let paths = tool_config.paths.resolve(root);
    Ok((tool_config, paths))
}

/// Print progress events from a separate thread as they arrive.
fn spawn_printer() -> (Sender<process::ProcessEvent>, JoinHandle<()>) {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    (tx, printer)
}

fn join_printer(printer: JoinHandle<()>) {
    if printer.join().is_err() {
        eprintln!("progress printer panicked");
    }
}

/// Site-absolute URL prefix for an output directory given relative to the root.
fn url_prefix(dir: &str) -> String {
    format!("/{}", dir.trim_matches('/'))
}
