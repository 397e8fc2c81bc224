//! # CLI Module
//!
//! Command-line interface for the photo triage engine.
//!
//! ## Usage
//! ```bash
//! # Analyze a directory for duplicates
//! photo-triage analyze ~/Photos
//!
//! # Stricter near-duplicate matching
//! photo-triage analyze ~/Photos --threshold 0.15
//!
//! # JSON output
//! photo-triage analyze ~/Photos --output json
//!
//! # Show the default configuration
//! photo-triage config
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_triage::core::group::DuplicateGroup;
use photo_triage::core::pipeline::{
    AnalysisConfig, Analyzer, RunSnapshot, DEFAULT_CHECK_INTERVAL, DEFAULT_DISTANCE_THRESHOLD,
};
use photo_triage::core::scanner::{ImageScanner, ScanConfig, WalkDirScanner};
use photo_triage::core::source::ImageRef;
use photo_triage::error::Result;
use photo_triage::events::{self, Event, RunEvent, RunPhase, RunSummary};
use std::path::PathBuf;
use std::thread;

/// Photo Triage - Find duplicate photos and keep the best one
#[derive(Parser, Debug)]
#[command(name = "photo-triage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze directories for duplicate photos
    Analyze {
        /// Directories (or single photos) to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Near-duplicate distance threshold (lower = stricter)
        #[arg(short, long, default_value_t = DEFAULT_DISTANCE_THRESHOLD)]
        threshold: f64,

        /// Worker threads per stage (defaults to the number of CPUs)
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Completed photos between cancellation checks
        #[arg(long, default_value_t = DEFAULT_CHECK_INTERVAL)]
        check_interval: usize,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print the default analysis configuration as JSON
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths of photos that are not the keeper)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            paths,
            threshold,
            concurrency,
            check_interval,
            output,
            include_hidden,
            verbose,
        } => {
            photo_triage::init_tracing(if verbose { "photo_triage=debug" } else { "warn" });

            let mut config = AnalysisConfig::new()
                .distance_threshold(threshold)
                .cancellation_check_interval(check_interval);
            if let Some(concurrency) = concurrency {
                config = config.stage_concurrency(concurrency);
            }

            run_analyze(paths, config, output, include_hidden, verbose)
        }
        Commands::Config => {
            match serde_json::to_value(AnalysisConfig::default()) {
                Ok(value) => print_json(&value),
                Err(e) => eprintln!("Failed to render JSON: {}", e),
            }
            Ok(())
        }
    }
}

fn run_analyze(
    paths: Vec<PathBuf>,
    config: AnalysisConfig,
    output: OutputFormat,
    include_hidden: bool,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);

    // Print header
    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Photo Triage").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Discover photos
    let scanner = WalkDirScanner::new(ScanConfig {
        include_hidden,
        ..Default::default()
    });
    let scan = scanner.scan(&paths);

    for error in &scan.errors {
        term.write_line(&format!("{} {}", style("!").yellow().bold(), error))
            .ok();
    }

    // Set up event handling
    let (sender, receiver) = events::channel();

    // Progress bar for pretty output
    let progress = if pretty {
        let pb = ProgressBar::new(1000);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.until_terminal() {
            let Some(ref pb) = progress_clone else {
                continue;
            };

            match event {
                Event::Run(RunEvent::Progress(p)) => {
                    pb.set_position((p.fraction * 1000.0).round() as u64);
                    pb.set_message(p.message);
                }
                Event::Run(RunEvent::Completed { .. }) | Event::Run(RunEvent::Cancelled) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the analysis; the sender is owned by the run and closes with it
    let analyzer = Analyzer::default();
    let handle = analyzer.start_run(scan.images, config, sender)?;
    let snapshot = handle.wait();
    event_thread.join().ok();

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if snapshot.phase != RunPhase::Completed {
        term.write_line(&format!(
            "{} {}",
            style("✗").red().bold(),
            snapshot.message
        ))
        .ok();
        return Ok(());
    }

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &snapshot, verbose),
        OutputFormat::Json => print_json_results(&snapshot),
        OutputFormat::Minimal => print_minimal_results(&snapshot),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, snapshot: &RunSnapshot, verbose: bool) {
    let summary = snapshot.summary.clone().unwrap_or_default();
    let groups = snapshot.groups.as_deref().unwrap_or_default();

    term.write_line("").ok();
    term.write_line(&format!(
        "{} Analysis Complete",
        style("✓").green().bold()
    ))
    .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} photos analyzed in {:.1}s",
        style(summary.total_items).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} exact and {} near-duplicate groups found",
        style(summary.exact_groups).cyan(),
        style(summary.near_groups).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} duplicate photos",
        style(summary.duplicate_count).cyan()
    ))
    .ok();

    if summary.skipped_items > 0 {
        term.write_line(&format!(
            "  {} photos could not be analyzed",
            style(summary.skipped_items).dim()
        ))
        .ok();
    }

    term.write_line("").ok();

    // Show groups
    if groups.is_empty() {
        term.write_line(&format!(
            "  {} No duplicates found!",
            style("🎉").green()
        ))
        .ok();
    } else {
        term.write_line(&format!(
            "{}",
            style("Duplicate Groups:").bold().underlined()
        ))
        .ok();
        term.write_line("").ok();

        for (i, group) in groups.iter().enumerate() {
            term.write_line(&format!(
                "  {} {} ({} photos)",
                style(format!("Group {}:", i + 1)).bold(),
                style(group.kind()).yellow(),
                group.members().len(),
            ))
            .ok();

            for (photo, score) in group.members().iter().zip(group.scores()) {
                let marker = if Some(photo) == group.representative() {
                    style("★").green().to_string()
                } else {
                    style("○").dim().to_string()
                };

                let line = match (verbose, score) {
                    (true, Some(score)) => format!(
                        "    {} {} {}",
                        marker,
                        display_path(photo),
                        style(format!("(sharpness {:.2})", score.value())).dim()
                    ),
                    _ => format!("    {} {}", marker, display_path(photo)),
                };
                term.write_line(&line).ok();
            }

            if verbose {
                term.write_line(&format!(
                    "    {} {}",
                    style("Recommended:").dim(),
                    style("Keep the starred (★) photo").dim()
                ))
                .ok();
            }

            term.write_line("").ok();
        }
    }

    // Footer
    term.write_line(&format!(
        "{}",
        style("Remember: No files were deleted. Review carefully before taking action.").dim()
    ))
    .ok();
}

fn print_json_results(snapshot: &RunSnapshot) {
    let summary = snapshot.summary.clone().unwrap_or_default();
    let groups = snapshot.groups.as_deref().unwrap_or_default();

    let output = serde_json::json!({
        "run_id": snapshot.run_id.to_string(),
        "summary": summary_json(&summary),
        "groups": groups.iter().map(group_json).collect::<Vec<_>>(),
    });

    print_json(&output);
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    serde_json::json!({
        "total_photos": summary.total_items,
        "exact_groups": summary.exact_groups,
        "near_groups": summary.near_groups,
        "duplicate_count": summary.duplicate_count,
        "skipped_photos": summary.skipped_items,
        "duration_ms": summary.duration_ms,
    })
}

fn group_json(group: &DuplicateGroup) -> serde_json::Value {
    serde_json::json!({
        "id": group.id().to_string(),
        "kind": group.kind().to_string(),
        "photos": group.members(),
        "representative": group.representative(),
        "scores": group.scores(),
    })
}

fn print_minimal_results(snapshot: &RunSnapshot) {
    for group in snapshot.groups.iter().flatten() {
        for photo in group.duplicates() {
            println!("{}", photo.path().display());
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to render JSON: {}", e),
    }
}

fn display_path(photo: &ImageRef) -> String {
    let path = photo.path();
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(PathBuf::from)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}
