pub mod error;
pub mod node;

pub use error::{ErrorCategory, ErrorClassifier, LlmError, Result, TreeError};
pub use node::{Document, NodeKind, RawNode, StructuralNode, clamp_spans};

/// Log and drop an error, keeping the success value.
pub fn log_filter_warn<T, E: std::fmt::Display>(
    result: std::result::Result<T, E>,
    context: &str,
) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}: {}", context, e);
            None
        }
    }
}
