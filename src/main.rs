//! dirmap - map a directory subtree by entry type.
//!
//! Usage:
//!   dirmap [PATH]                      Walk and print a summary
//!   dirmap [PATH] --fingerprint        Also compute MD5 fingerprints
//!   dirmap [PATH] --format json        Export entries and failures as JSON
//!   dirmap --help                      Show help

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use dirmap_scan::{
    AcceptAll, DirMap, EntryKind, EntryRecord, IgnoreFailures, SessionState, WalkConfig,
    WalkFailure, WalkSummary,
};

#[derive(Parser)]
#[command(
    name = "dirmap",
    version,
    about = "Walk a directory tree and classify every entry",
    long_about = "dirmap walks a directory subtree, classifies each entry by type, \
                  decodes its permissions and optionally fingerprints regular files.\n\n\
                  Press Ctrl-C to stop descending; the walk finishes the current \
                  directory and reports what it found."
)]
struct Cli {
    /// Path to walk (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Compute MD5 fingerprints for regular files
    #[arg(short, long)]
    fingerprint: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Output file for JSON export (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of largest files to list in text output
    #[arg(short = 'n', long, default_value = "10")]
    top: usize,

    /// Read buffer size for fingerprinting, in bytes
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// JSON export document.
#[derive(Serialize)]
struct Export<'a> {
    summary: WalkSummary,
    entries: Vec<&'a EntryRecord>,
    failures: Vec<&'a WalkFailure>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let mut builder = WalkConfig::builder();
    builder
        .root(cli.path.clone())
        .compute_fingerprints(cli.fingerprint);
    if let Some(size) = cli.buffer_size {
        builder.hash_buffer_size(size);
    }
    let config = builder.build().context("Invalid configuration")?;

    let mut dirmap = DirMap::from_config(&config);
    let stop = dirmap.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing current directory");
            stop.stop();
        }
    });

    eprintln!("Walking {}...", config.root.display());
    dirmap
        .run(&config.root, config.options(), AcceptAll, IgnoreFailures)
        .await;

    match cli.format {
        OutputFormat::Text => print_summary(&dirmap, cli.top),
        OutputFormat::Json => export_json(&dirmap, cli.output.as_deref())?,
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("dirmap=debug,dirmap_scan=debug,warn")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("dirmap=info,dirmap_scan=warn,warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Ok(())
}

/// Print per-type counts, largest files and failures.
fn print_summary(dirmap: &DirMap, top_n: usize) {
    let summary = dirmap.summary();
    let root = summary
        .root
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    println!();
    println!("{}", "─".repeat(60));
    println!(" {} - {}", root, format_size(summary.total_size));
    println!(
        " {} entries recorded, {} failures",
        summary.total_entries, summary.total_failures
    );
    println!(" Walked in {:.2}s", summary.elapsed.as_secs_f64());
    if dirmap.state() == SessionState::Stopped {
        println!(" Stopped early");
    }
    println!("{}", "─".repeat(60));
    println!();

    for kind in EntryKind::ALL {
        let count = dirmap.of_kind(kind).len();
        if count > 0 {
            println!("   {:<20} {:>10}", kind.label(), count);
        }
    }

    let mut files: Vec<_> = dirmap.files().values().collect();
    files.sort_by(|a, b| b.size().cmp(&a.size()));
    if !files.is_empty() && top_n > 0 {
        println!();
        println!(" Largest files:");
        for entry in files.iter().take(top_n) {
            let fingerprint = entry
                .fingerprint
                .map(|fp| fp.to_hex())
                .unwrap_or_default();
            println!(
                "   {:>10}  {:<32}  {}",
                format_size(entry.size()),
                fingerprint,
                entry.relative_path.display()
            );
        }
    }

    if !dirmap.failures().is_empty() {
        println!();
        println!(" Failures:");
        for failure in dirmap.failures().values() {
            println!("   [{}] {}", failure.kind, failure.error);
        }
    }
}

/// Serialize the session's collections as JSON.
fn export_json(dirmap: &DirMap, output: Option<&Path>) -> Result<()> {
    let export = Export {
        summary: dirmap.summary(),
        entries: dirmap.results().values().map(|e| e.as_ref()).collect(),
        failures: dirmap.failures().values().collect(),
    };
    let json = serde_json::to_string_pretty(&export)?;

    match output {
        Some(output_path) => {
            std::fs::write(output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
