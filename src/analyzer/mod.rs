//! Code Analyzer Module
//!
//! Turns source files into structural trees:
//! - Per-language analyzers producing raw declaration forests
//! - Normalization onto the common node taxonomy
//! - Directory tree assembly and post-processing
//! - File scanning with gitignore support

pub mod assembler;
pub mod normalizer;
pub mod parser;
pub mod postprocess;
pub mod scanner;

pub use assembler::assemble;
pub use normalizer::{failed_file, normalize, normalize_file};
pub use parser::{Analyzer, Language, create_analyzer, detect_language};
pub use postprocess::{assign_node_ids, thin_tree};
pub use scanner::{FileScanner, ScannedFile};

use crate::types::{StructuralNode, TreeError};

/// File node for one source file.
///
/// Analysis failures do not propagate: the file node is returned without
/// children and with `error` set.
pub fn analyze_source(file_name: &str, language: Language, source: &str) -> StructuralNode {
    let forest = create_analyzer(language).and_then(|analyzer| analyzer.analyze(source));
    match forest {
        Ok(forest) => normalize_file(file_name, language, forest, source),
        Err(e) => {
            let message = match e {
                TreeError::Parse { message, .. } => message,
                other => other.to_string(),
            };
            tracing::warn!("Failed to analyze {}: {}", file_name, message);
            failed_file(file_name, source, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;

    #[test]
    fn test_analyze_source_python() {
        let source = "class A:\n    def run(self):\n        pass\n\ndef main():\n    A().run()\n";
        let file = analyze_source("a.py", Language::Python, source);

        assert_eq!(file.kind, NodeKind::File);
        assert_eq!((file.start_line, file.end_line), (Some(1), Some(6)));
        assert!(file.error.is_none());
        assert_eq!(file.children.len(), 2);
        assert_eq!(file.children[0].title, "A");
        assert_eq!(file.children[0].children[0].title, "run()");
        assert_eq!(file.children[0].children[0].kind, NodeKind::Method);
        assert_eq!(file.children[1].kind, NodeKind::Function);
    }

    #[test]
    fn test_analyze_source_unknown_language_is_failed_file() {
        let file = analyze_source("notes.txt", Language::Unknown, "hello\n");
        assert!(file.children.is_empty());
        assert!(file.error.is_some());
    }

    #[test]
    fn test_analyze_source_empty_file() {
        let file = analyze_source("empty.kt", Language::Kotlin, "");
        assert_eq!((file.start_line, file.end_line), (Some(1), Some(1)));
        assert!(file.children.is_empty());
        assert!(file.error.is_none());
    }
}
