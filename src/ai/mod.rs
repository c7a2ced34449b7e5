//! AI Integration Layer
//!
//! Node summaries and the document description.

pub mod provider;
pub mod summarizer;
pub mod timeout;
pub mod tokenizer;

pub use provider::{
    ErrorCategory, ErrorClassifier, LlmError, OllamaSummarizer, OpenAiSummarizer,
    SharedSummarizer, Summarizer, create_summarizer,
};
pub use summarizer::{AnnotationStats, SummaryAnnotator};
pub use timeout::with_timeout;
pub use tokenizer::TokenCounter;
