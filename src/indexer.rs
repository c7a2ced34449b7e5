//! Index Pipeline
//!
//! Orchestrates a full run over a file or directory:
//! scan → analyze (parallel) → assemble → thin → annotate → node ids → strip text.
//!
//! Configuration and input path are checked before any file is touched; after
//! that, per-file and per-summary failures are recorded in the tree and the
//! run carries on.

use futures::StreamExt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::ai::{SharedSummarizer, SummaryAnnotator, TokenCounter, create_summarizer};
use crate::analyzer::{
    FileScanner, Language, ScannedFile, analyze_source, assemble, assign_node_ids,
    detect_language, failed_file, thin_tree,
};
use crate::config::Config;
use crate::types::{Document, Result, StructuralNode, TreeError};

pub struct Indexer {
    config: Config,
    summarizer: Option<SharedSummarizer>,
}

impl Indexer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            summarizer: None,
        }
    }

    /// Use a specific summarizer instead of the configured provider.
    pub fn with_summarizer(mut self, summarizer: SharedSummarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Build the document for a file or directory.
    pub async fn run<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let path = path.as_ref();
        self.config.validate()?;
        if !path.exists() {
            return Err(TreeError::PathNotFound(path.to_path_buf()));
        }
        let annotator = self.annotator()?;
        let started = Instant::now();

        let (doc_name, mut structure) = if path.is_file() {
            self.index_file(path).await?
        } else {
            self.index_directory(path).await?
        };

        if self.config.index.thinning {
            let counter = TokenCounter::default();
            for node in &mut structure {
                thin_tree(node, self.config.index.thinning_threshold, &counter);
            }
        }

        let mut document = Document::new(doc_name, Vec::new());
        if let Some(annotator) = &annotator {
            if self.config.summary.enabled {
                let stats = annotator.annotate(&mut structure).await;
                info!(
                    "Summaries: {} local, {} generated, {} failed",
                    stats.local, stats.generated, stats.failed
                );
            }
            if self.config.summary.doc_description {
                document.doc_description = annotator.describe(&structure).await;
            }
        }

        if self.config.index.node_ids {
            assign_node_ids(&mut structure);
        }
        if !self.config.index.include_text {
            for node in &mut structure {
                node.strip_text();
            }
        }

        document.structure = structure;
        info!(
            "Indexed {} files in {:.2}s",
            document.file_count(),
            started.elapsed().as_secs_f64()
        );
        Ok(document)
    }

    /// Annotator, when summaries or a description are requested.
    fn annotator(&self) -> Result<Option<SummaryAnnotator>> {
        let summary = &self.config.summary;
        if !summary.enabled && !summary.doc_description {
            return Ok(None);
        }
        let summarizer = match &self.summarizer {
            Some(summarizer) => summarizer.clone(),
            None => create_summarizer(summary)?,
        };
        Ok(Some(SummaryAnnotator::new(summarizer, summary)?))
    }

    async fn index_file(&self, path: &Path) -> Result<(String, Vec<StructuralNode>)> {
        let doc_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some(language) = detect_language(path) else {
            info!("Unsupported file type, nothing to index: {}", path.display());
            return Ok((doc_name, Vec::new()));
        };

        let size = tokio::fs::metadata(path).await?.len();
        if size > self.config.index.max_file_size {
            info!(
                "Skipping file over size limit ({} > {} bytes): {}",
                size,
                self.config.index.max_file_size,
                path.display()
            );
            return Ok((doc_name, Vec::new()));
        }

        let file = ScannedFile {
            path: path.to_path_buf(),
            relative: PathBuf::from(path.file_name().unwrap_or_default()),
            language,
            size,
        };
        let (_, node) = analyze_in_background(file).await;
        Ok((doc_name, vec![node]))
    }

    async fn index_directory(&self, path: &Path) -> Result<(String, Vec<StructuralNode>)> {
        let doc_name = directory_name(path);

        let scanner = FileScanner::new(path)
            .with_exclude(self.config.index.exclude.clone())
            .with_max_file_size(self.config.index.max_file_size);
        let files = tokio::task::spawn_blocking(move || scanner.scan()).await??;
        info!("Found {} source files in {}", files.len(), path.display());

        let nodes: BTreeMap<PathBuf, StructuralNode> = futures::stream::iter(files)
            .map(analyze_in_background)
            .buffer_unordered(self.config.index.max_workers)
            .collect()
            .await;

        let root = assemble(&doc_name, nodes);
        Ok((doc_name, root.children))
    }
}

/// Read and analyze one file on the blocking pool.
async fn analyze_in_background(file: ScannedFile) -> (PathBuf, StructuralNode) {
    let file_name = file
        .relative
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let relative = file.relative.clone();

    let name = file_name.clone();
    let task = tokio::task::spawn_blocking(move || analyze_file(&file.path, &name, file.language));
    let node = match task.await {
        Ok(node) => node,
        Err(e) => {
            warn!("Analysis task for {} failed: {}", relative.display(), e);
            failed_file(&file_name, "", e.to_string())
        }
    };
    (relative, node)
}

fn analyze_file(path: &Path, file_name: &str, language: Language) -> StructuralNode {
    match std::fs::read(path) {
        Ok(bytes) => {
            debug!("Analyzing {} as {}", path.display(), language);
            let source = String::from_utf8_lossy(&bytes);
            analyze_source(file_name, language, &source)
        }
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            failed_file(file_name, "", e.to_string())
        }
    }
}

/// Last component of the canonical directory path.
fn directory_name(path: &Path) -> String {
    std::fs::canonicalize(path)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "root".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Summarizer;
    use crate::types::NodeKind;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const SAMPLE_JAVA: &str = r#"package com.example;

public class Sample {
    private final String name;

    public Sample(String name) {
        this.name = name;
    }

    public void process() {
        System.out.println("{" + name);
    }
}

enum Status { ACTIVE, INACTIVE }

interface Processor {
    void handle();
}
"#;

    const SAMPLE_KOTLIN: &str = r#"package demo

data class User(val name: String, val age: Int)

enum class Role { ADMIN, USER }

interface Service {
    fun serve()
}

object AppConfig {
    val url = "http://{host}"
}

fun main() {
    println("hello {")
}

class Processor {
    fun process(input: String): String {
        return input.trim()
    }
}
"#;

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _text: &str, _model: &str) -> Result<String> {
            Err(TreeError::LlmApi("unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn titles(nodes: &[StructuralNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_missing_path_is_fatal() {
        let result = Indexer::new(Config::default())
            .run("/definitely/not/a/real/path")
            .await;
        assert!(matches!(result, Err(TreeError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.index.max_workers = 0;
        let result = Indexer::new(config).run(temp.path()).await;
        assert!(matches!(result, Err(TreeError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "README.txt", "nothing here\n");

        let doc = Indexer::new(Config::default()).run(temp.path()).await.unwrap();
        assert!(doc.structure.is_empty());
        assert!(doc.doc_description.is_none());
    }

    #[tokio::test]
    async fn test_java_file_input() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Sample.java", SAMPLE_JAVA);

        let doc = Indexer::new(Config::default())
            .run(temp.path().join("Sample.java"))
            .await
            .unwrap();
        assert_eq!(doc.doc_name, "Sample");
        assert_eq!(doc.structure.len(), 1);

        let file = &doc.structure[0];
        assert_eq!(file.kind, NodeKind::File);
        assert_eq!(file.title, "Sample.java");
        assert_eq!(titles(&file.children), vec!["Sample", "Status", "Processor"]);

        let sample = &file.children[0];
        let methods: Vec<_> = sample
            .children
            .iter()
            .filter(|c| !c.tags.iter().any(|t| t == "constructor"))
            .collect();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].title, "process()");
        assert_eq!(methods[0].kind, NodeKind::Method);
        assert_eq!(file.children[1].kind, NodeKind::Enum);
        assert_eq!(file.children[2].kind, NodeKind::Interface);

        // Text is stripped and ids assigned by default
        assert!(file.text.is_none());
        assert_eq!(file.node_id.as_deref(), Some("0000"));
    }

    #[tokio::test]
    async fn test_kotlin_directory_run() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "app/src/Main.kt", SAMPLE_KOTLIN);
        write(temp.path(), "app/notes.txt", "skip me\n");

        let mut config = Config::default();
        config.index.include_text = true;
        let doc = Indexer::new(config).run(temp.path()).await.unwrap();

        assert_eq!(titles(&doc.structure), vec!["app"]);
        let app = &doc.structure[0];
        assert_eq!(app.kind, NodeKind::Directory);
        assert_eq!(titles(&app.children), vec!["src"]);

        let file = &app.children[0].children[0];
        assert_eq!(file.title, "Main.kt");
        assert!(file.text.as_deref().unwrap().contains("data class User"));
        assert_eq!(
            titles(&file.children),
            vec!["User", "Role", "Service", "AppConfig", "main()", "Processor"]
        );
        assert_eq!(file.children[0].tags, vec!["data"]);
        assert_eq!(file.children[3].kind, NodeKind::Object);
        assert_eq!(titles(&file.children[5].children), vec!["process()"]);
        assert_eq!(doc.file_count(), 1);
    }

    #[tokio::test]
    async fn test_spans_contained_in_parent() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Main.kt", SAMPLE_KOTLIN);
        write(temp.path(), "Sample.java", SAMPLE_JAVA);

        let doc = Indexer::new(Config::default()).run(temp.path()).await.unwrap();
        fn check(node: &StructuralNode, bounds: (usize, usize)) {
            let (start, end) = (node.start_line.unwrap(), node.end_line.unwrap());
            assert!(1 <= start && start <= end);
            assert!(bounds.0 <= start && end <= bounds.1, "{} escapes parent", node.title);
            for child in &node.children {
                check(child, (start, end));
            }
        }
        for file in &doc.structure {
            check(file, (file.start_line.unwrap(), file.end_line.unwrap()));
        }
    }

    #[tokio::test]
    async fn test_unsupported_single_file() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "notes.txt", "text\n");

        let doc = Indexer::new(Config::default())
            .run(temp.path().join("notes.txt"))
            .await
            .unwrap();
        assert_eq!(doc.doc_name, "notes");
        assert!(doc.structure.is_empty());
    }

    #[tokio::test]
    async fn test_size_limit_applies_to_single_file_and_directory() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "big.py", &"x = 1\n".repeat(40));
        write(temp.path(), "small.py", "def f():\n    pass\n");

        let mut config = Config::default();
        config.index.max_file_size = 64;
        let indexer = Indexer::new(config);

        let single = indexer.run(temp.path().join("big.py")).await.unwrap();
        assert_eq!(single.doc_name, "big");
        assert!(single.structure.is_empty());

        let small = indexer.run(temp.path().join("small.py")).await.unwrap();
        assert_eq!(small.structure.len(), 1);

        let dir = indexer.run(temp.path()).await.unwrap();
        let titles: Vec<&str> = dir.structure.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["small.py"]);
    }

    #[tokio::test]
    async fn test_failing_summarizer_does_not_fail_run() {
        let temp = TempDir::new().unwrap();
        let body = "    total = compute(first, second) + transform(third)\n".repeat(30);
        write(
            temp.path(),
            "big.py",
            &format!("def crunch():\n{}\n", body),
        );

        let mut config = Config::default();
        config.summary.enabled = true;
        config.summary.doc_description = true;
        let doc = Indexer::new(config)
            .with_summarizer(Arc::new(FailingSummarizer))
            .run(temp.path())
            .await
            .unwrap();

        let file = &doc.structure[0];
        assert!(file.error.is_none());
        assert!(file.prefix_summary.is_none());
        assert!(file.children[0].summary.is_none());
        assert!(doc.doc_description.is_none());
    }

    #[tokio::test]
    async fn test_thinning_and_ids() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "small.py",
            "class A:\n    def f(self):\n        pass\n\n    def g(self):\n        pass\n",
        );

        let mut config = Config::default();
        config.index.thinning = true;
        let doc = Indexer::new(config).run(temp.path()).await.unwrap();

        let file = &doc.structure[0];
        assert_eq!(titles(&file.children), vec!["A"]);
        assert!(file.children[0].children.is_empty());
        assert_eq!(file.node_id.as_deref(), Some("0000"));
        assert_eq!(file.children[0].node_id.as_deref(), Some("0001"));
    }
}
