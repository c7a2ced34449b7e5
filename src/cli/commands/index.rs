//! Index Command
//!
//! Builds the structural tree of a file or directory and writes it as JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cli::ui::output;
use crate::config::{Config, ConfigLoader};
use crate::constants::output::FILE_SUFFIX;
use crate::indexer::Indexer;
use crate::types::{Document, Result};

/// Command-line overrides for one index run
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub path: PathBuf,
    /// Config file used instead of the layered lookup
    pub config: Option<PathBuf>,
    pub model: Option<String>,
    pub summaries: bool,
    pub doc_description: bool,
    pub text: bool,
    pub no_node_ids: bool,
    pub thinning: bool,
    pub thinning_threshold: Option<usize>,
    pub workers: Option<usize>,
    pub output: Option<PathBuf>,
    pub stdout: bool,
}

impl IndexOptions {
    /// Flags win over every config layer; unset flags leave the config alone.
    pub fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.summary.model = model.clone();
        }
        if self.summaries {
            config.summary.enabled = true;
        }
        if self.doc_description {
            config.summary.doc_description = true;
        }
        if self.text {
            config.index.include_text = true;
        }
        if self.no_node_ids {
            config.index.node_ids = false;
        }
        if self.thinning {
            config.index.thinning = true;
        }
        if let Some(threshold) = self.thinning_threshold {
            config.index.thinning_threshold = threshold;
        }
        if let Some(workers) = self.workers {
            config.index.max_workers = workers;
        }
    }
}

pub async fn run(options: IndexOptions) -> Result<()> {
    let mut config = match &options.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    options.apply(&mut config);

    let started = Instant::now();
    let output_dir = config.output.dir.clone();
    let document = Indexer::new(config).run(&options.path).await?;
    let json = serde_json::to_string_pretty(&document)?;

    if options.stdout {
        println!("{}", json);
        return Ok(());
    }

    let target = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&output_dir, &document));
    write_document(&target, &json)?;

    output::indexed(document.file_count(), started.elapsed(), &target);
    Ok(())
}

/// `<dir>/<doc_name>_code_structure.json`
pub fn default_output_path(dir: &Path, document: &Document) -> PathBuf {
    dir.join(format!("{}{}", document.doc_name, FILE_SUFFIX))
}

fn write_document(target: &Path, json: &str) -> Result<()> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_apply_overrides() {
        let options = IndexOptions {
            model: Some("gpt-4o-mini".to_string()),
            summaries: true,
            text: true,
            no_node_ids: true,
            thinning_threshold: Some(100),
            workers: Some(2),
            ..Default::default()
        };
        let mut config = Config::default();
        options.apply(&mut config);

        assert_eq!(config.summary.model, "gpt-4o-mini");
        assert!(config.summary.enabled);
        assert!(!config.summary.doc_description);
        assert!(config.index.include_text);
        assert!(!config.index.node_ids);
        assert!(!config.index.thinning);
        assert_eq!(config.index.thinning_threshold, 100);
        assert_eq!(config.index.max_workers, 2);
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let mut config = Config::default();
        config.index.thinning = true;
        IndexOptions::default().apply(&mut config);
        assert!(config.index.thinning);
        assert!(config.index.node_ids);
    }

    #[test]
    fn test_default_output_path() {
        let doc = Document::new("proj", Vec::new());
        assert_eq!(
            default_output_path(Path::new("results"), &doc),
            PathBuf::from("results/proj_code_structure.json")
        );
    }

    #[test]
    fn test_write_document_creates_dirs() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out").join("doc.json");
        write_document(&target, "{}").unwrap();
        assert_eq!(fs::read_to_string(target).unwrap(), "{}");
    }
}
