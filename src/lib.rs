//! codetree - Multi-Language Structural Code Trees
//!
//! Turns Python, Java, Kotlin and C/C++ sources into one hierarchical tree of
//! structural elements (directories, files, classes, functions, methods, ...)
//! so that agents can navigate a codebase by structure instead of flat text.
//!
//! ## Quick Start
//!
//! ```ignore
//! use codetree::{Config, Indexer};
//!
//! let document = Indexer::new(Config::default()).run("src").await?;
//! println!("{}", serde_json::to_string_pretty(&document)?);
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: Per-language analyzers, normalization, assembly, scanning
//! - [`ai`]: Summarizer providers and the summary annotator
//! - [`indexer`]: End-to-end pipeline
//! - [`config`]: Layered configuration
//! - [`types`]: Node model and errors

pub mod ai;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod indexer;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use indexer::Indexer;
pub use types::{Document, NodeKind, Result, StructuralNode, TreeError};

pub use ai::{SharedSummarizer, Summarizer, SummaryAnnotator};
pub use analyzer::{
    FileScanner, Language, analyze_source, assemble, detect_language, normalize,
};
