//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Severity;
use clap::Parser;
use std::path::PathBuf;

/// DocChecker - find contradictions across a set of documents
///
/// Uploads PDF, DOCX and text documents to a Smart Doc Checker backend
/// and streams detected contradictions as the analysis runs.
///
/// Examples:
///   docchecker policy.pdf handbook.docx
///   docchecker ./contracts --server http://checker:8000 --format json
///   docchecker ./contracts --dry-run
///   docchecker --health
///   docchecker --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Documents or directories to analyze, in upload order
    #[arg(
        value_name = "PATHS",
        required_unless_present_any = ["init_config", "health"]
    )]
    pub paths: Vec<PathBuf>,

    /// Base URL of the analysis backend
    ///
    /// Overrides the [server] base_url from .docchecker.toml.
    #[arg(short, long, value_name = "URL", env = "DOCCHECKER_SERVER")]
    pub server: Option<String>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .docchecker.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (no live output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Extensions picked up from directories (comma-separated)
    ///
    /// Example: --extensions pdf,txt
    #[arg(long, value_name = "EXTS", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Names to skip when walking directories (comma-separated)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Maximum number of documents to upload
    #[arg(long, value_name = "COUNT")]
    pub max_files: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Upload request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Give up on the stream after this many idle seconds
    ///
    /// By default the stream waits for the backend's `done` message forever.
    #[arg(long, value_name = "SECS")]
    pub idle_timeout: Option<u64>,

    /// Fail if contradictions at or above this severity are found
    ///
    /// Useful for CI pipelines. Exit code 2 when threshold is exceeded.
    /// Values: high, medium, low
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<SeverityLevel>,

    /// Minimum severity to include in the report
    #[arg(long, value_name = "LEVEL")]
    pub min_severity: Option<SeverityLevel>,

    /// Dry run: list the documents that would be uploaded and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Check that the backend is reachable and exit
    #[arg(long)]
    pub health: bool,

    /// Generate a default .docchecker.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Severity level for --fail-on and --min-severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
}

impl From<SeverityLevel> for Severity {
    fn from(level: SeverityLevel) -> Self {
        match level {
            SeverityLevel::Low => Severity::Low,
            SeverityLevel::Medium => Severity::Medium,
            SeverityLevel::High => Severity::High,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref server) = self.server {
            if !server.starts_with("http://") && !server.starts_with("https://") {
                return Err("Server URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.idle_timeout == Some(0) {
            return Err("Idle timeout must be at least 1 second".to_string());
        }

        if self.max_files == Some(0) {
            return Err("Max files must be at least 1".to_string());
        }

        for path in &self.paths {
            if !path.exists() {
                return Err(format!("Path does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `general.verbose` setting; `--quiet` wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
