//! Document selection.
//!
//! Turns the paths given on the command line into the ordered list of
//! documents that gets uploaded. Explicit files are always taken;
//! directories are walked and filtered by extension, excludes and size.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for document selection.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Extensions picked up from directories (e.g., ["pdf", "docx", "txt"])
    pub extensions: Vec<String>,
    /// Names to skip while walking (e.g., [".git", "node_modules"])
    pub excludes: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: u64,
    /// Maximum number of documents to select
    pub max_files: usize,
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excludes: config.excludes.clone(),
            max_file_size: config.max_file_size,
            max_files: config.max_files,
        }
    }
}

/// A document selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    /// Path on disk
    pub path: PathBuf,
    /// File name sent to the backend
    pub name: String,
    /// File size in bytes
    pub size: u64,
}

impl DocumentFile {
    fn from_path(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)
            .with_context(|| format!("Cannot read metadata for {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
        })
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}

/// Selects documents from user-supplied paths.
pub struct DocumentScanner {
    config: ScanConfig,
}

impl DocumentScanner {
    /// Create a new document scanner.
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Collect documents from the given paths, preserving their order.
    pub fn collect(&self, paths: &[PathBuf]) -> Result<Vec<DocumentFile>> {
        let mut documents = Vec::new();
        let mut seen = HashSet::new();

        for path in paths {
            if path.is_dir() {
                for file in self.walk_dir(path)? {
                    self.push_unique(file, &mut documents, &mut seen);
                }
            } else if path.is_file() {
                let file = DocumentFile::from_path(path)?;
                if file.size > self.config.max_file_size {
                    warn!(
                        "{} is {} bytes, larger than the {} byte limit",
                        file.name, file.size, self.config.max_file_size
                    );
                }
                self.push_unique(file, &mut documents, &mut seen);
            } else {
                return Err(anyhow::anyhow!("Not a file or directory: {}", path.display()));
            }
        }

        if documents.len() > self.config.max_files {
            warn!(
                "Selected {} documents, uploading only the first {}",
                documents.len(),
                self.config.max_files
            );
            documents.truncate(self.config.max_files);
        }

        Ok(documents)
    }

    fn push_unique(
        &self,
        file: DocumentFile,
        documents: &mut Vec<DocumentFile>,
        seen: &mut HashSet<PathBuf>,
    ) {
        let key = fs::canonicalize(&file.path).unwrap_or_else(|_| file.path.clone());
        if seen.insert(key) {
            documents.push(file);
        } else {
            debug!("Skipping duplicate selection: {}", file.path.display());
        }
    }

    /// Check if a directory entry is a document we should pick up.
    pub fn matches(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !self.config.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            return false;
        }

        match fs::metadata(path) {
            Ok(metadata) => metadata.len() <= self.config.max_file_size,
            Err(_) => false,
        }
    }

    /// Check if a name matches exclusion patterns.
    fn is_excluded(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return true;
        }

        self.config.excludes.iter().any(|pattern| name == pattern)
    }

    fn walk_dir(&self, root: &Path) -> Result<Vec<DocumentFile>> {
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded_entry(entry));

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Cannot read entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.matches(entry.path()) {
                files.push(DocumentFile::from_path(entry.path())?);
            }
        }

        Ok(files)
    }

    fn is_excluded_entry(&self, entry: &DirEntry) -> bool {
        self.is_excluded(&entry.file_name().to_string_lossy())
    }
}
