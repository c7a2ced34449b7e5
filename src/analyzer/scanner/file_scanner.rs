use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::analyzer::parser::{Language, detect_language};
use crate::constants::index::{MAX_FILE_SIZE, SKIP_DIRS};
use crate::types::{Result, TreeError, log_filter_warn};

/// Walks a directory for files with a supported language.
///
/// Hidden entries and the usual build/dependency directories are skipped,
/// `.gitignore` rules apply even outside a git checkout.
pub struct FileScanner {
    root: PathBuf,
    exclude: Vec<String>,
    max_file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the scan root
    pub relative: PathBuf,
    pub language: Language,
    pub size: u64,
}

impl FileScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            exclude: Vec::new(),
            max_file_size: MAX_FILE_SIZE,
        }
    }

    /// Glob patterns matched against paths relative to the root.
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Supported files under the root, sorted by relative path.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        if !self.root.is_dir() {
            return Err(TreeError::PathNotFound(self.root.clone()));
        }

        let exclude: Vec<glob::Pattern> = self
            .exclude
            .iter()
            .filter_map(|p| log_filter_warn(glob::Pattern::new(p), "Invalid exclude pattern"))
            .collect();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false)
            .filter_entry(|entry| {
                let skipped = entry.file_type().is_some_and(|t| t.is_dir())
                    && SKIP_DIRS.contains(&entry.file_name().to_string_lossy().as_ref());
                !skipped
            })
            .build();

        let mut files = Vec::new();
        for entry in walker.filter_map(|e| log_filter_warn(e, "Skipping unreadable entry")) {
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
            if exclude
                .iter()
                .any(|p| p.matches_path(&relative))
            {
                tracing::debug!("Excluded {}", relative.display());
                continue;
            }

            let Some(language) = detect_language(path) else {
                tracing::debug!("Skipping unsupported file {}", relative.display());
                continue;
            };

            let Some(metadata) = log_filter_warn(entry.metadata(), "Failed to read metadata")
            else {
                continue;
            };
            if metadata.len() > self.max_file_size {
                tracing::debug!(
                    "Skipping {} ({} bytes > {} limit)",
                    relative.display(),
                    metadata.len(),
                    self.max_file_size
                );
                continue;
            }

            files.push(ScannedFile {
                path: path.to_path_buf(),
                relative,
                language,
                size: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(files)
    }
}
