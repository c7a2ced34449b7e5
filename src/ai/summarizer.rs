//! Summary Annotator
//!
//! Attaches one-sentence summaries to eligible nodes of an assembled tree.
//! Small nodes are summarized locally from their docstring or leading text;
//! larger ones go through the [`Summarizer`] with bounded concurrency, a
//! per-call timeout and exponential backoff on recoverable errors.
//!
//! A failed summary never fails the run: the node keeps no summary and a
//! warning is logged.

use backon::{ExponentialBuilder, Retryable};
use futures::StreamExt;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::provider::SharedSummarizer;
use super::timeout::with_timeout;
use super::tokenizer::TokenCounter;
use crate::config::SummaryConfig;
use crate::constants::{retry, summary};
use crate::types::{NodeKind, Result, StructuralNode, TreeError};

/// Outcome counts of one annotation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationStats {
    /// Summaries taken from docstrings or leading text
    pub local: usize,
    /// Summaries produced by the summarizer
    pub generated: usize,
    /// Nodes left without a summary after a failed call
    pub failed: usize,
}

/// Where a node's summary comes from
enum Job {
    Local(String),
    Remote(String),
}

/// Location of a node inside a structure array
type NodePath = (usize, Vec<usize>);

pub struct SummaryAnnotator {
    summarizer: SharedSummarizer,
    model: String,
    node_kinds: Vec<NodeKind>,
    token_threshold: usize,
    max_concurrency: usize,
    max_retries: usize,
    timeout: Duration,
    retry_delay: Duration,
    counter: TokenCounter,
}

impl SummaryAnnotator {
    pub fn new(summarizer: SharedSummarizer, config: &SummaryConfig) -> Result<Self> {
        if config.max_concurrency == 0 {
            return Err(TreeError::Config(
                "summary.max_concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            summarizer,
            model: config.model.clone(),
            node_kinds: config.node_kinds()?,
            token_threshold: config.token_threshold,
            max_concurrency: config.max_concurrency,
            max_retries: config.max_retries,
            timeout: Duration::from_secs(config.timeout_secs),
            retry_delay: Duration::from_millis(retry::BASE_DELAY_MS),
            counter: TokenCounter::default(),
        })
    }

    /// Override the first backoff delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Summarize every eligible node of `structure` in place.
    pub async fn annotate(&self, structure: &mut [StructuralNode]) -> AnnotationStats {
        let mut stats = AnnotationStats::default();
        let mut remote: Vec<(NodePath, String)> = Vec::new();

        for (top, node) in structure.iter_mut().enumerate() {
            for path in node.paths() {
                let Some(target) = node.get_mut(&path) else {
                    continue;
                };
                if !self.node_kinds.contains(&target.kind) {
                    continue;
                }
                match self.plan(target) {
                    Job::Local(text) => {
                        stats.local += 1;
                        place_summary(target, text);
                    }
                    Job::Remote(prompt) => remote.push(((top, path), prompt)),
                }
            }
        }

        if remote.is_empty() {
            return stats;
        }
        info!(
            "Summarizing {} nodes with {} (model: {})",
            remote.len(),
            self.summarizer.name(),
            self.model
        );

        let results: Vec<(NodePath, Result<String>)> = futures::stream::iter(remote)
            .map(|(location, prompt)| async move {
                let result = self.call(&prompt).await;
                (location, result)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        for ((top, path), result) in results {
            let Some(target) = structure.get_mut(top).and_then(|n| n.get_mut(&path)) else {
                continue;
            };
            match result {
                Ok(text) => {
                    stats.generated += 1;
                    place_summary(target, text);
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!("Failed to summarize {} '{}': {}", target.kind, target.title, e);
                }
            }
        }

        stats
    }

    /// One-sentence description of the whole document, from its titles only.
    pub async fn describe(&self, structure: &[StructuralNode]) -> Option<String> {
        let outline = Value::Array(structure.iter().map(outline).collect());
        let outline = match serde_json::to_string_pretty(&outline) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to render document outline: {}", e);
                return None;
            }
        };
        let prompt = format!(
            "You are given the structure of a codebase as a tree of files, classes and functions.\n\
             Generate a one-sentence description of what the codebase does.\n\n\
             Structure:\n{}\n\n\
             Directly return the description, do not include any other text.",
            outline
        );

        match self.call(&prompt).await {
            Ok(description) => Some(description),
            Err(e) => {
                warn!("Failed to generate document description: {}", e);
                None
            }
        }
    }

    fn plan(&self, node: &StructuralNode) -> Job {
        let text = node.text.as_deref().unwrap_or_default();
        if self.counter.is_below(text, self.token_threshold) {
            Job::Local(local_summary(node))
        } else {
            Job::Remote(build_prompt(node))
        }
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry_delay)
            .with_max_delay(Duration::from_secs(retry::MAX_DELAY_SECS))
            .with_factor(retry::BACKOFF_FACTOR)
            .with_max_times(self.max_retries);

        let attempt = move || async move {
            with_timeout(
                self.timeout,
                self.summarizer.summarize(prompt, &self.model),
                "summarize",
            )
            .await
        };

        attempt
            .retry(backoff)
            .when(|e: &TreeError| e.is_recoverable())
            .notify(|e: &TreeError, delay: Duration| {
                debug!("Retrying summary in {:?}: {}", delay, e);
            })
            .await
    }
}

/// Nodes with children carry a prefix summary, leaves a summary.
fn place_summary(node: &mut StructuralNode, text: String) {
    if text.is_empty() {
        return;
    }
    if node.children.is_empty() {
        node.summary = Some(text);
    } else {
        node.prefix_summary = Some(text);
    }
}

/// First docstring line, else the leading characters of the node text.
fn local_summary(node: &StructuralNode) -> String {
    if let Some(first) = node
        .docstring
        .as_deref()
        .and_then(|d| d.trim().lines().next())
        .filter(|line| !line.trim().is_empty())
    {
        return first.trim().to_string();
    }
    node.text
        .as_deref()
        .unwrap_or_default()
        .chars()
        .take(summary::LOCAL_SUMMARY_CHARS)
        .collect()
}

fn build_prompt(node: &StructuralNode) -> String {
    let text = node.text.as_deref().unwrap_or_default();
    let mut code: String = text.chars().take(summary::PROMPT_CODE_CHARS).collect();
    if code.len() < text.len() {
        code.push_str("...");
    }

    let mut prompt = format!(
        "You are given a {} from a source file. Generate a concise one-sentence summary of what it does.\n\n",
        node.kind
    );
    if let Some(signature) = node.signature.as_deref().filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("Signature: {}\n", signature));
    }
    if let Some(docstring) = node.docstring.as_deref().filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("Docstring: {}\n", docstring));
    }
    prompt.push_str(&format!(
        "\nCode:\n{}\n\nDirectly return the summary, do not include any other text.",
        code
    ));
    prompt
}

/// Titles-and-types view of a subtree.
fn outline(node: &StructuralNode) -> Value {
    let mut value = json!({ "title": node.title, "type": node.kind });
    if !node.children.is_empty() {
        value["nodes"] = Value::Array(node.children.iter().map(outline).collect());
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::Summarizer;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoSummarizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Summarizer for EchoSummarizer {
        async fn summarize(&self, text: &str, model: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(model, "test-model");
            assert!(text.contains("Code:"));
            Ok("Does the thing.".to_string())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _text: &str, _model: &str) -> Result<String> {
            Err(TreeError::LlmApi("service exploded".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Fails with a recoverable error until `failures` calls have been made.
    struct FlakySummarizer {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Summarizer for FlakySummarizer {
        async fn summarize(&self, _text: &str, _model: &str) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(TreeError::timeout("summarize", Duration::from_millis(1)))
            } else {
                Ok("Recovered.".to_string())
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn config() -> SummaryConfig {
        SummaryConfig {
            model: "test-model".to_string(),
            token_threshold: 20,
            ..Default::default()
        }
    }

    fn node(kind: NodeKind, title: &str, text: &str) -> StructuralNode {
        let mut n = StructuralNode::new(kind, title).with_span(1, 1);
        n.text = Some(text.to_string());
        n
    }

    fn big_text() -> String {
        "value = compute(first, second) + transform(third)\n".repeat(20)
    }

    #[tokio::test]
    async fn test_small_nodes_summarized_locally() {
        let stub = Arc::new(EchoSummarizer {
            calls: AtomicUsize::new(0),
        });
        let annotator = SummaryAnnotator::new(stub.clone(), &config()).unwrap();

        let mut documented = node(NodeKind::Function, "f()", "def f(): pass");
        documented.docstring = Some("Adds one.\n\nMore detail.".to_string());
        let mut structure = vec![
            node(NodeKind::File, "a.py", "def f(): pass").with_children(vec![documented]),
        ];

        let stats = annotator.annotate(&mut structure).await;
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
        assert_eq!(stats.local, 2);

        let file = &structure[0];
        assert_eq!(file.prefix_summary.as_deref(), Some("def f(): pass"));
        assert!(file.summary.is_none());
        assert_eq!(file.children[0].summary.as_deref(), Some("Adds one."));
    }

    #[tokio::test]
    async fn test_large_nodes_use_summarizer() {
        let stub = Arc::new(EchoSummarizer {
            calls: AtomicUsize::new(0),
        });
        let annotator = SummaryAnnotator::new(stub.clone(), &config()).unwrap();

        let mut structure = vec![
            StructuralNode::new(NodeKind::Directory, "src").with_children(vec![
                node(NodeKind::Class, "Big", &big_text()),
            ]),
        ];
        let stats = annotator.annotate(&mut structure).await;

        assert_eq!(stats.generated, 1);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        // Directories are not eligible
        assert!(structure[0].prefix_summary.is_none());
        assert_eq!(
            structure[0].children[0].summary.as_deref(),
            Some("Does the thing.")
        );
    }

    #[tokio::test]
    async fn test_failing_summarizer_leaves_summary_empty() {
        let annotator = SummaryAnnotator::new(Arc::new(FailingSummarizer), &config()).unwrap();
        let mut structure = vec![node(NodeKind::Method, "m()", &big_text())];

        let stats = annotator.annotate(&mut structure).await;
        assert_eq!(stats.failed, 1);
        assert!(structure[0].summary.is_none());
        assert!(annotator.describe(&structure).await.is_none());
    }

    #[tokio::test]
    async fn test_recoverable_errors_are_retried() {
        let stub = Arc::new(FlakySummarizer {
            failures: 2,
            calls: AtomicUsize::new(0),
        });
        let annotator = SummaryAnnotator::new(stub.clone(), &config())
            .unwrap()
            .with_retry_delay(Duration::from_millis(1));
        let mut structure = vec![node(NodeKind::Function, "f()", &big_text())];

        let stats = annotator.annotate(&mut structure).await;
        assert_eq!(stats.generated, 1);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
        assert_eq!(structure[0].summary.as_deref(), Some("Recovered."));
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let stub = Arc::new(FlakySummarizer {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
        });
        let annotator = SummaryAnnotator::new(stub.clone(), &config())
            .unwrap()
            .with_retry_delay(Duration::from_millis(1));
        let mut structure = vec![node(NodeKind::Function, "f()", &big_text())];

        let stats = annotator.annotate(&mut structure).await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1 + config().max_retries);
    }

    #[test]
    fn test_prompt_contents() {
        let mut n = node(NodeKind::Method, "run()", &"x".repeat(4000));
        n.signature = Some("run(self)".to_string());
        let prompt = build_prompt(&n);
        assert!(prompt.starts_with("You are given a method"));
        assert!(prompt.contains("Signature: run(self)"));
        assert!(!prompt.contains("Docstring:"));
        assert!(prompt.contains(&format!("{}...", "x".repeat(3000))));
    }

    #[test]
    fn test_outline_has_titles_only() {
        let mut file = node(NodeKind::File, "a.py", "secret source")
            .with_children(vec![node(NodeKind::Function, "f()", "secret")]);
        file.summary = Some("s".to_string());
        let value = outline(&file);
        let rendered = value.to_string();
        assert!(!rendered.contains("secret"));
        assert_eq!(value["nodes"][0]["title"], "f()");
        assert_eq!(value["type"], "file");
    }
}
