//! Timeout helpers for summarizer calls
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::with_timeout;
//!
//! let summary = with_timeout(
//!     Duration::from_secs(60),
//!     summarizer.summarize(&prompt, model),
//!     "summarize",
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::types::{Result, TreeError};

/// Execute an async operation with a timeout
///
/// Returns `TreeError::Timeout` if the operation doesn't complete within the
/// specified duration.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(TreeError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, TreeError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, TreeError>(42)
            },
            "slow operation",
        )
        .await;
        let err = result.unwrap_err();
        assert!(matches!(err, TreeError::Timeout { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: Result<()> = with_timeout(
            Duration::from_secs(1),
            async { Err(TreeError::LlmApi("boom".to_string())) },
            "failing operation",
        )
        .await;
        assert!(matches!(result, Err(TreeError::LlmApi(_))));
    }
}
