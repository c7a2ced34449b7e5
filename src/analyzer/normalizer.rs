//! Node Normalizer
//!
//! Maps analyzer keywords onto the shared [`NodeKind`] taxonomy. Keywords
//! dropped by the mapping survive as tags, so `data class` becomes a class
//! tagged `data` and `companion object` an object tagged `companion`.

use super::parser::{Language, line_count};
use crate::types::{NodeKind, RawNode, StructuralNode};

/// Class modifiers kept as tags when a `<modifier> class` keyword is mapped.
const CLASS_TAG_MODIFIERS: &[&str] = &[
    "data", "sealed", "abstract", "open", "inner", "value", "inline", "annotation",
];

/// Function-like keywords: these become methods under type-like parents.
fn is_function_keyword(keyword: &str) -> bool {
    matches!(
        keyword,
        "def" | "async def" | "fun" | "function" | "method" | "constructor"
    )
}

/// Map a declaration keyword to its kind and distinguishing tags.
fn classify(language: Language, keyword: &str, parent: NodeKind) -> (NodeKind, Vec<String>) {
    if is_function_keyword(keyword) {
        let kind = if parent.is_type_like() {
            NodeKind::Method
        } else {
            NodeKind::Function
        };
        let tags = match keyword {
            "async def" => vec!["async".to_string()],
            "constructor" => vec!["constructor".to_string()],
            _ => Vec::new(),
        };
        return (kind, tags);
    }

    let tag = |t: &str| vec![t.to_string()];
    match keyword {
        "class" => (NodeKind::Class, Vec::new()),
        "enum" | "enum class" => (NodeKind::Enum, Vec::new()),
        "record" => (NodeKind::Class, tag("record")),
        "interface" => (NodeKind::Interface, Vec::new()),
        "fun interface" => (NodeKind::Interface, tag("fun")),
        "annotation" => (NodeKind::Interface, tag("annotation")),
        "object" => (NodeKind::Object, Vec::new()),
        "companion object" => (NodeKind::Object, tag("companion")),
        "struct" => (NodeKind::Struct, Vec::new()),
        "union" => (NodeKind::Struct, tag("union")),
        "namespace" => (NodeKind::Namespace, Vec::new()),
        other => match other.strip_suffix(" class") {
            Some(modifier) if CLASS_TAG_MODIFIERS.contains(&modifier) => {
                (NodeKind::Class, tag(modifier))
            }
            _ => {
                tracing::debug!("Unmapped {} keyword '{}', keeping as class", language, other);
                (NodeKind::Class, tag(other))
            }
        },
    }
}

/// Source lines `start..=end` (1-based) joined with newlines.
fn slice_lines(lines: &[&str], start: usize, end: usize) -> String {
    let from = start.saturating_sub(1).min(lines.len());
    let to = end.min(lines.len()).max(from);
    lines[from..to].join("\n")
}

fn normalize_node(
    language: Language,
    raw: RawNode,
    parent: NodeKind,
    lines: &[&str],
) -> StructuralNode {
    let (kind, tags) = classify(language, &raw.keyword, parent);
    let title = if matches!(kind, NodeKind::Function | NodeKind::Method) {
        format!("{}()", raw.title)
    } else {
        raw.title
    };

    let children = raw
        .children
        .into_iter()
        .map(|child| normalize_node(language, child, kind, lines))
        .collect();

    let mut node = StructuralNode::new(kind, title)
        .with_span(raw.start_line, raw.end_line)
        .with_children(children);
    node.tags = tags;
    node.signature = raw.signature.filter(|s| !s.is_empty());
    node.docstring = raw.docstring.filter(|d| !d.is_empty());
    node.decorators = raw.decorators;
    node.text = Some(slice_lines(lines, raw.start_line, raw.end_line));
    node
}

/// Normalize an analyzer forest, filling each node's text from `source`.
pub fn normalize(language: Language, forest: Vec<RawNode>, source: &str) -> Vec<StructuralNode> {
    let lines: Vec<&str> = source.lines().collect();
    forest
        .into_iter()
        .map(|raw| normalize_node(language, raw, NodeKind::File, &lines))
        .collect()
}

/// File node spanning the whole source, wrapping the normalized forest.
pub fn normalize_file(
    file_name: &str,
    language: Language,
    forest: Vec<RawNode>,
    source: &str,
) -> StructuralNode {
    let mut node = StructuralNode::new(NodeKind::File, file_name)
        .with_span(1, line_count(source))
        .with_children(normalize(language, forest, source));
    node.text = Some(source.to_string());
    node
}

/// File node for a file whose analysis failed.
pub fn failed_file(file_name: &str, source: &str, error: impl Into<String>) -> StructuralNode {
    let mut node = StructuralNode::new(NodeKind::File, file_name).with_span(1, line_count(source));
    node.text = Some(source.to_string());
    node.error = Some(error.into());
    node
}
