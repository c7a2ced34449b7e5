//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/codetree/) and project (.codetree/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{index, output, summary};
use crate::types::{NodeKind, Result, TreeError};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction and tree shaping
    pub index: IndexConfig,

    /// Summary annotation
    pub summary: SummaryConfig,

    /// Output location
    pub output: OutputConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `TreeError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.index.max_workers == 0 {
            return Err(TreeError::Config(
                "index.max_workers must be greater than 0".to_string(),
            ));
        }

        if self.summary.max_concurrency == 0 {
            return Err(TreeError::Config(
                "summary.max_concurrency must be greater than 0".to_string(),
            ));
        }

        if self.summary.timeout_secs == 0 {
            return Err(TreeError::Config(
                "summary.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.summary.model.trim().is_empty() {
            return Err(TreeError::Config(
                "summary.model must not be empty".to_string(),
            ));
        }

        self.summary.node_kinds()?;
        Ok(())
    }
}

// =============================================================================
// Index Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Keep node source text in the output
    pub include_text: bool,

    /// Assign preorder node ids
    pub node_ids: bool,

    /// Merge small class/function subtrees
    pub thinning: bool,

    /// Token threshold for thinning
    pub thinning_threshold: usize,

    /// Files analyzed in parallel
    pub max_workers: usize,

    /// Maximum file size in bytes
    pub max_file_size: u64,

    /// Glob patterns to exclude, relative to the indexed directory
    pub exclude: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            include_text: false,
            node_ids: true,
            thinning: false,
            thinning_threshold: index::THINNING_THRESHOLD,
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            max_file_size: index::MAX_FILE_SIZE,
            exclude: Vec::new(),
        }
    }
}

// =============================================================================
// Summary Configuration
// =============================================================================

/// Summarization backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(format!(
                "Unknown provider: {}. Valid values: openai, ollama",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Annotate nodes with summaries
    pub enabled: bool,

    /// Generate a one-sentence document description
    pub doc_description: bool,

    /// Provider name
    pub provider: ProviderKind,

    /// Model name
    pub model: String,

    /// Override for the provider endpoint
    pub api_base: Option<String>,

    /// API key; falls back to the provider's environment variable.
    /// Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,

    /// Concurrent summarizer calls
    pub max_concurrency: usize,

    /// Retries for recoverable failures
    pub max_retries: usize,

    /// Nodes below this many tokens get a local summary
    pub token_threshold: usize,

    /// Node types that receive summaries
    pub node_types: Vec<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            doc_description: false,
            provider: ProviderKind::default(),
            model: summary::DEFAULT_MODEL.to_string(),
            api_base: None,
            api_key: None,
            timeout_secs: crate::constants::network::DEFAULT_TIMEOUT_SECS,
            max_concurrency: summary::MAX_CONCURRENCY,
            max_retries: summary::MAX_RETRIES,
            token_threshold: summary::TOKEN_THRESHOLD,
            node_types: summary::NODE_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SummaryConfig {
    /// Parsed `node_types`.
    pub fn node_kinds(&self) -> Result<Vec<NodeKind>> {
        self.node_types
            .iter()
            .map(|t| t.parse::<NodeKind>().map_err(TreeError::Config))
            .collect()
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for written documents
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(output::DEFAULT_DIR),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.index.include_text);
        assert!(config.index.node_ids);
        assert!(!config.summary.enabled);
        assert_eq!(config.summary.provider, ProviderKind::OpenAi);
        assert_eq!(config.summary.model, "gpt-4o-2024-11-20");
        assert_eq!(config.output.dir, PathBuf::from("results"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.index.max_workers = 0;
        assert!(matches!(config.validate(), Err(TreeError::Config(_))));

        let mut config = Config::default();
        config.summary.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.summary.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_node_type_rejected() {
        let mut config = Config::default();
        config.summary.node_types = vec!["class".to_string(), "module".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_node_kinds_default() {
        let kinds = SummaryConfig::default().node_kinds().unwrap();
        assert!(kinds.contains(&NodeKind::Method));
        assert!(kinds.contains(&NodeKind::File));
        assert!(!kinds.contains(&NodeKind::Directory));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = Config::default();
        config.summary.api_key = Some("sk-secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn test_provider_kind() {
        assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
        assert_eq!("Ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert!("claude".parse::<ProviderKind>().is_err());
    }
}
