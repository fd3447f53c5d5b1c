//! DocChecker - streaming client for Smart Doc Checker
//!
//! Uploads a batch of documents to the analysis backend, follows the
//! contradiction stream live, and writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success (no contradictions above threshold, or no --fail-on set)
//!   1 - Runtime error (upload failure, WebSocket error, interrupted, etc.)
//!   2 - Contradictions found at or above the --fail-on threshold

mod analysis;
mod cli;
mod config;
mod display;
mod error;
mod models;
mod report;
mod scanner;
mod session;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use display::{LiveView, ViewOptions};
use models::{ContradictionSummary, Report, ReportMetadata, Severity};
use scanner::{DocumentFile, DocumentScanner, ScanConfig};
use session::{Endpoints, SessionInitiator, SessionManager, SessionState, Status};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `general.verbose` applies
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("DocChecker v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    log_config_source(&config_source);

    match run_check(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Check failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .docchecker.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    println!("   Edit it to point at your backend and tune document selection.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete check workflow. Returns the exit code.
async fn run_check(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    if args.health {
        return handle_health(&config).await;
    }

    // Step 1: Select documents
    let scanner = DocumentScanner::new(ScanConfig::from(&config.scanner));
    let documents = scanner.collect(&args.paths)?;

    if args.dry_run {
        return handle_dry_run(&documents);
    }

    if documents.is_empty() {
        println!("📭 No documents selected, nothing to analyze.");
        return Ok(0);
    }

    // Step 2: Upload and follow the stream
    println!(
        "📤 Uploading {} document(s) to {}",
        documents.len(),
        config.server.base_url
    );

    let mut manager = SessionManager::new(&config.server)?;
    let view = LiveView::spawn(
        manager.watch(),
        ViewOptions {
            quiet: args.quiet,
            show_sentences: config.report.include_sentences,
        },
    );

    let final_state = tokio::select! {
        state = manager.run(&documents) => state,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, abandoning session");
            manager.abandon();
            manager.snapshot()
        }
    };

    // Dropping the manager ends the live view.
    drop(manager);
    view.finish().await;

    if let Status::SubmissionFailed(_) = final_state.status {
        return Err(anyhow::anyhow!("{}", final_state.status));
    }

    // Step 3: Build and save the report
    let duration = start_time.elapsed().as_secs_f64();
    let report = build_report(&args, &config, &documents, &final_state, duration);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, report::MarkdownOptions::from(&config.report))
        }
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    let summary = &report.summary;
    println!("\n📊 Check Summary:");
    println!("   Session: {}", report.metadata.session_id.as_deref().unwrap_or("-"));
    println!("   Documents: {}", documents.len());
    println!("   Contradictions: {}", summary.total);
    println!(
        "   - {} High: {} | {} Medium: {} | {} Low: {}",
        Severity::High.emoji(),
        summary.high,
        Severity::Medium.emoji(),
        summary.medium,
        Severity::Low.emoji(),
        summary.low
    );
    println!("   Duration: {:.1}s", duration);

    if !report.metadata.complete {
        eprintln!(
            "\n⚠️  Analysis did not finish ({}). Partial report saved to: {}",
            final_state.status,
            output_path.display()
        );
        return Ok(1);
    }

    println!("\n✅ Check complete! Report saved to: {}", output_path.display());

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        if analysis::any_at_or_above(&report.contradictions, fail_level.into()) {
            eprintln!(
                "\n⛔ Contradictions found at or above {:?} severity. Failing (exit code 2).",
                fail_level
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Turn the final session state into a report.
fn build_report(
    args: &Args,
    config: &Config,
    documents: &[DocumentFile],
    state: &SessionState,
    duration: f64,
) -> Report {
    let mut contradictions = state.results_in_arrival_order();

    if let Some(min_level) = args.min_severity {
        analysis::filter_min_severity(&mut contradictions, min_level.into());
    }
    analysis::sort_by_severity(&mut contradictions);

    let summary = ContradictionSummary::from_records(&contradictions);

    let metadata = ReportMetadata {
        server_url: config.server.base_url.clone(),
        session_id: state.session_id.as_ref().map(|id| id.to_string()),
        analysis_date: Utc::now(),
        documents: documents.iter().map(|d| d.name.clone()).collect(),
        final_status: state.status.to_string(),
        complete: state.status == Status::Done,
        total_received: state.results.len(),
        duration_seconds: duration,
    };

    Report {
        metadata,
        contradictions,
        summary,
    }
}

/// Handle --health: probe the backend and exit.
async fn handle_health(config: &Config) -> Result<i32> {
    let endpoints = Endpoints::from_config(&config.server)?;
    println!("🩺 Checking backend at {}", endpoints.health);

    let initiator = SessionInitiator::new(endpoints, config.server.timeout_seconds)?;
    initiator.health().await?;

    println!("✅ Backend is healthy.");
    Ok(0)
}

/// Handle --dry-run: list selected documents, exit.
fn handle_dry_run(documents: &[DocumentFile]) -> Result<i32> {
    println!("\n🔍 Dry run: selecting documents (no upload)...\n");

    if documents.is_empty() {
        println!("   No matching documents found.");
    } else {
        println!("   {} document(s) would be uploaded:\n", documents.len());
        for doc in documents {
            println!("     📄 {} ({} bytes)", doc.path.display(), doc.size);
        }
    }

    println!("\n✅ Dry run complete. Nothing was uploaded.");
    Ok(0)
}

/// Where the configuration was loaded from.
enum ConfigSource {
    File(PathBuf),
    Defaults,
    /// The default config file exists but could not be loaded.
    Fallback(String),
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so the outcome is returned for
/// [`log_config_source`] to report.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((
            config,
            ConfigSource::File(PathBuf::from(config::CONFIG_FILE_NAME)),
        )),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(format!("{:#}", e)))),
    }
}

fn log_config_source(source: &ConfigSource) {
    match source {
        ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
        ConfigSource::Defaults => debug!("No config file found, using defaults"),
        ConfigSource::Fallback(reason) => warn!("Failed to load config: {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContradictionRecord;
    use clap::Parser;
    use std::collections::VecDeque;

    fn record(sentence: &str, severity: Severity) -> ContradictionRecord {
        ContradictionRecord {
            doc1: "a.txt".to_string(),
            doc2: "b.txt".to_string(),
            sentence1: sentence.to_string(),
            sentence2: format!("not {}", sentence),
            severity,
            confidence: 75.0,
            similarity: 0.4,
        }
    }

    fn documents() -> Vec<DocumentFile> {
        vec![DocumentFile {
            path: PathBuf::from("a.txt"),
            name: "a.txt".to_string(),
            size: 1,
        }]
    }

    #[test]
    fn test_build_report_from_partial_session() {
        let args = Args::parse_from(["docchecker", "--min-severity", "medium", "a.txt"]);
        let config = Config::default();
        let state = SessionState {
            status: Status::ChannelFailed,
            progress: None,
            results: VecDeque::from(vec![
                record("newest", Severity::Medium),
                record("middle", Severity::Low),
                record("oldest", Severity::High),
            ]),
            session_id: None,
        };

        let report = build_report(&args, &config, &documents(), &state, 1.0);

        assert!(!report.metadata.complete);
        assert_eq!(report.metadata.final_status, "WebSocket error");
        assert_eq!(report.metadata.total_received, 3);
        let sentences: Vec<_> = report
            .contradictions
            .iter()
            .map(|r| r.sentence1.as_str())
            .collect();
        assert_eq!(sentences, vec!["oldest", "newest"]);
        assert_eq!(report.summary.total, 2);
    }

    #[test]
    fn test_build_report_complete_session() {
        let args = Args::parse_from(["docchecker", "a.txt"]);
        let config = Config::default();
        let state = SessionState {
            status: Status::Done,
            ..SessionState::default()
        };

        let report = build_report(&args, &config, &documents(), &state, 1.0);

        assert!(report.metadata.complete);
        assert_eq!(report.metadata.documents, vec!["a.txt"]);
        assert!(report.contradictions.is_empty());
    }
}
