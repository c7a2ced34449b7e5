//! Summarizer Providers
//!
//! Defines the narrow `Summarizer` boundary used by the summary annotator.
//! Providers turn a prompt into a short plain-text answer; all retry and
//! timeout policy lives in the annotator.

mod ollama;
mod openai;

pub use ollama::OllamaSummarizer;
pub use openai::OpenAiSummarizer;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{ProviderKind, SummaryConfig};
use crate::types::Result;

/// Summarization service boundary.
///
/// Any error counts as a failed summary: timeouts, rate limits and malformed
/// responses alike.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Answer `text` (a complete prompt) with `model`.
    async fn summarize(&self, text: &str, model: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Shared summarizer for concurrent annotation tasks.
pub type SharedSummarizer = Arc<dyn Summarizer>;

/// Create a shared summarizer from configuration
pub fn create_summarizer(config: &SummaryConfig) -> Result<SharedSummarizer> {
    match config.provider {
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiSummarizer::new(config)?)),
        ProviderKind::Ollama => Ok(Arc::new(OllamaSummarizer::new(config)?)),
    }
}

/// Map a transport failure onto a classified error.
pub(crate) fn request_error(err: reqwest::Error, provider: &str) -> LlmError {
    if err.is_timeout() || err.is_connect() {
        LlmError::with_provider(ErrorCategory::Network, err.to_string(), provider)
    } else {
        ErrorClassifier::classify(&err.to_string(), provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_summarizer() {
        let config = SummaryConfig {
            provider: ProviderKind::Ollama,
            ..Default::default()
        };
        let summarizer = create_summarizer(&config).unwrap();
        assert_eq!(summarizer.name(), "ollama");
    }

    #[test]
    fn test_create_openai_summarizer_with_key() {
        let config = SummaryConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let summarizer = create_summarizer(&config).unwrap();
        assert_eq!(summarizer.name(), "openai");
    }

    #[test]
    fn test_invalid_ollama_endpoint() {
        let config = SummaryConfig {
            provider: ProviderKind::Ollama,
            api_base: Some("ftp://localhost:11434".to_string()),
            ..Default::default()
        };
        assert!(create_summarizer(&config).is_err());
    }
}
