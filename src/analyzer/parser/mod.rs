//! Language Analyzer Module
//!
//! Per-language structural analyzers producing a [`RawNode`] forest.
//! Python and Java run on tree-sitter grammars; Kotlin and C/C++ run on the
//! lexical masker plus brace-depth scanning.
//!
//! ## Analyzer Factory
//!
//! ```rust,ignore
//! use codetree::analyzer::parser::{Language, create_analyzer};
//!
//! let analyzer = create_analyzer(Language::Kotlin)?;
//! let forest = analyzer.analyze(source)?;
//! ```
//!
//! [`RawNode`]: crate::types::RawNode

pub mod cfamily;
pub mod java;
pub mod kotlin;
pub mod language;
pub mod lexer;
pub mod python;
pub mod scope;
pub mod traits;

pub use cfamily::CFamilyAnalyzer;
pub use java::JavaAnalyzer;
pub use kotlin::KotlinAnalyzer;
pub use language::{Language, detect_language};
pub use python::PythonAnalyzer;
pub use traits::{
    Analyzer, clean_doc_comment, collapse_whitespace, create_ts_parser, finish_forest,
    get_node_position, get_node_text, line_count,
};

use crate::types::{Result, TreeError};

/// Create an analyzer for the given language.
///
/// Returns an error for [`Language::Unknown`].
pub fn create_analyzer(language: Language) -> Result<Box<dyn Analyzer>> {
    match language {
        Language::Python => Ok(Box::new(PythonAnalyzer::new()?)),
        Language::Java => Ok(Box::new(JavaAnalyzer::new()?)),
        Language::Kotlin => Ok(Box::new(KotlinAnalyzer::new()?)),
        Language::C | Language::Cpp => Ok(Box::new(CFamilyAnalyzer::new(language)?)),
        Language::Unknown => Err(TreeError::Config(format!(
            "No analyzer for language: {}",
            language
        ))),
    }
}
