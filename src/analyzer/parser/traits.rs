use crate::types::{RawNode, Result, TreeError, clamp_spans};

/// Per-language structural analyzer.
///
/// Implementations are stateless; a fresh parser is built per call so a single
/// analyzer can be shared across blocking worker threads.
pub trait Analyzer: Send + Sync {
    /// Extract the declaration forest of one source file.
    fn analyze(&self, source: &str) -> Result<Vec<RawNode>>;
    fn language(&self) -> super::Language;
}

/// Extract text content from a tree-sitter node.
/// Returns empty string if extraction fails (with debug logging).
#[inline]
pub fn get_node_text<'a>(node: tree_sitter::Node, content: &'a [u8]) -> &'a str {
    node.utf8_text(content).unwrap_or_else(|e| {
        tracing::debug!(
            "UTF-8 extraction failed at {}:{}-{}:{}: {}",
            node.start_position().row + 1,
            node.start_position().column,
            node.end_position().row + 1,
            node.end_position().column,
            e
        );
        ""
    })
}

/// 1-based inclusive line span of a tree-sitter node.
pub fn get_node_position(node: tree_sitter::Node) -> (usize, usize) {
    let start = node.start_position();
    let end = node.end_position();
    // A node ending at column 0 stops on the previous line's newline.
    let end_row = if end.column == 0 && end.row > start.row {
        end.row - 1
    } else {
        end.row
    };
    (start.row + 1, end_row + 1)
}

/// Create a tree-sitter parser for the given language.
/// This helper reduces boilerplate in language-specific analyzers.
pub fn create_ts_parser<L: Into<tree_sitter::Language>>(
    language: L,
    lang_name: &str,
) -> Result<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.into())
        .map_err(|e| TreeError::Config(format!("Failed to set {} language: {}", lang_name, e)))?;
    Ok(parser)
}

/// Collapse every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip the delimiters and leading `*` gutters of a `/** */` block.
pub fn clean_doc_comment(text: &str) -> String {
    let inner = text
        .trim()
        .trim_start_matches("/**")
        .trim_start_matches("/*!")
        .trim_end_matches("*/");
    inner
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').unwrap_or(line).trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Number of lines in a source text; an empty file counts as one line.
pub fn line_count(source: &str) -> usize {
    source.lines().count().max(1)
}

/// Final step shared by every analyzer.
///
/// Clamps spans into the file and decides whether a damaged parse still
/// produced something usable. Only a non-blank file with syntax errors and
/// no recovered declaration is reported as a failure.
pub fn finish_forest(
    mut forest: Vec<RawNode>,
    source: &str,
    had_errors: bool,
    lang_name: &str,
) -> Result<Vec<RawNode>> {
    if had_errors && forest.is_empty() && !source.trim().is_empty() {
        return Err(TreeError::parse(
            "",
            format!("{} source has syntax errors and no recoverable declarations", lang_name),
        ));
    }
    clamp_spans(&mut forest, 1, line_count(source));
    Ok(forest)
}
