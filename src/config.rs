//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.docchecker.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".docchecker.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backend settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Document selection settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "doccheck_report.md".to_string()
}

/// Analysis backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the backend (http or https).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the upload endpoint.
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Path of the WebSocket result stream.
    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    /// Path of the health endpoint.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Upload request timeout in seconds.
    ///
    /// The backend parses every document before answering, so large
    /// PDFs can take a while.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Close the stream after this many seconds without a frame.
    /// Unset means wait for `done` indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_seconds: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            upload_path: default_upload_path(),
            stream_path: default_stream_path(),
            health_path: default_health_path(),
            timeout_seconds: default_timeout(),
            idle_timeout_seconds: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_upload_path() -> String {
    "/upload".to_string()
}

fn default_stream_path() -> String {
    "/ws/contradictions".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_timeout() -> u64 {
    300
}

/// Document selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Maximum documents to upload.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Extensions picked up when walking a directory.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory or file names to skip when walking.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,

    /// Maximum document size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            extensions: default_extensions(),
            excludes: default_excludes(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_max_files() -> usize {
    50
}

fn default_extensions() -> Vec<String> {
    vec!["pdf", "docx", "txt"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_excludes() -> Vec<String> {
    vec![".git", "node_modules", "target", "__pycache__", ".venv"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_file_size() -> u64 {
    20 * 1024 * 1024 // 20MB
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the conflicting sentences in the Markdown report.
    #[serde(default = "default_true")]
    pub include_sentences: bool,

    /// Number of documents listed in the "most conflicted" table.
    #[serde(default = "default_top_documents")]
    pub top_documents: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_sentences: true,
            top_documents: default_top_documents(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_top_documents() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref server) = args.server {
            self.server.base_url = server.clone();
        }
        if let Some(timeout) = args.timeout {
            self.server.timeout_seconds = timeout;
        }
        if let Some(idle) = args.idle_timeout {
            self.server.idle_timeout_seconds = Some(idle);
        }

        if let Some(max_files) = args.max_files {
            self.scanner.max_files = max_files;
        }
        if let Some(ref extensions) = args.extensions {
            self.scanner.extensions = extensions.clone();
        }
        if let Some(ref excludes) = args.exclude {
            self.scanner.excludes = excludes.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
