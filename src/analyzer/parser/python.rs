use super::{
    Analyzer, Language, collapse_whitespace, create_ts_parser, finish_forest, get_node_position,
    get_node_text,
};
use crate::types::{RawNode, Result, TreeError};

pub struct PythonAnalyzer;

impl PythonAnalyzer {
    pub fn new() -> Result<Self> {
        // Validate that the language is available
        let _ = create_ts_parser(tree_sitter_python::LANGUAGE, "Python")?;
        Ok(Self)
    }
}

impl Analyzer for PythonAnalyzer {
    fn analyze(&self, source: &str) -> Result<Vec<RawNode>> {
        let mut parser = create_ts_parser(tree_sitter_python::LANGUAGE, "Python")?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| TreeError::parse("", "Failed to parse Python file"))?;

        let root = tree.root_node();
        let forest = extract_block(root, source.as_bytes());
        finish_forest(forest, source, root.has_error(), "Python")
    }

    fn language(&self) -> Language {
        Language::Python
    }
}

/// Collect class and function definitions among the direct statements of a
/// module or block.
fn extract_block(block: tree_sitter::Node, content: &[u8]) -> Vec<RawNode> {
    let mut cursor = block.walk();
    block
        .named_children(&mut cursor)
        .filter_map(|stmt| extract_statement(stmt, content))
        .collect()
}

fn extract_statement(stmt: tree_sitter::Node, content: &[u8]) -> Option<RawNode> {
    match stmt.kind() {
        "class_definition" | "function_definition" => extract_definition(stmt, Vec::new(), content),
        "decorated_definition" => {
            let mut cursor = stmt.walk();
            let decorators = stmt
                .named_children(&mut cursor)
                .filter(|c| c.kind() == "decorator")
                .map(|c| collapse_whitespace(get_node_text(c, content)))
                .collect();
            let definition = stmt.child_by_field_name("definition")?;
            extract_definition(definition, decorators, content)
        }
        _ => None,
    }
}

fn extract_definition(
    def: tree_sitter::Node,
    decorators: Vec<String>,
    content: &[u8],
) -> Option<RawNode> {
    let name = get_node_text(def.child_by_field_name("name")?, content);
    if name.is_empty() {
        return None;
    }
    let (start_line, end_line) = get_node_position(def);
    let body = def.child_by_field_name("body");

    let (keyword, signature) = if def.kind() == "class_definition" {
        let signature = match def.child_by_field_name("superclasses") {
            Some(bases) => format!("class {}{}", name, get_node_text(bases, content)),
            None => format!("class {}", name),
        };
        ("class", collapse_whitespace(&signature))
    } else {
        let is_async = is_async_def(def, content);
        let params = def
            .child_by_field_name("parameters")
            .map(|p| get_node_text(p, content))
            .unwrap_or("()");
        let mut signature = format!(
            "{}def {}{}",
            if is_async { "async " } else { "" },
            name,
            params
        );
        if let Some(ret) = def.child_by_field_name("return_type") {
            signature.push_str(" -> ");
            signature.push_str(get_node_text(ret, content));
        }
        (
            if is_async { "async def" } else { "def" },
            collapse_whitespace(&signature),
        )
    };

    let children = body.map(|b| extract_block(b, content)).unwrap_or_default();
    let docstring = body.and_then(|b| extract_docstring(b, content));

    Some(
        RawNode::new(keyword, name, start_line)
            .with_end_line(end_line)
            .with_signature(signature)
            .with_docstring(docstring)
            .with_decorators(decorators)
            .with_children(children),
    )
}

fn is_async_def(def: tree_sitter::Node, content: &[u8]) -> bool {
    let mut cursor = def.walk();
    def.children(&mut cursor)
        .take_while(|c| c.kind() != "def")
        .any(|c| get_node_text(c, content) == "async")
}

/// First statement of a body when it is a bare string literal.
fn extract_docstring(body: tree_sitter::Node, content: &[u8]) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if literal.kind() != "string" {
        return None;
    }
    let doc = clean_docstring(strip_string_literal(get_node_text(literal, content)));
    (!doc.is_empty()).then_some(doc)
}

fn strip_string_literal(text: &str) -> &str {
    let text = text.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

/// Trim surrounding blank lines and the common indentation of continuation
/// lines.
fn clean_docstring(raw: &str) -> String {
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or("").trim().to_string();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut out = vec![first];
    out.extend(rest.iter().map(|l| dedent(l, indent).trim_end().to_string()));
    out.join("\n").trim().to_string()
}

/// Drop up to `indent` leading whitespace characters.
fn dedent(line: &str, indent: usize) -> &str {
    let cut = line
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .nth(indent)
        .map(|(i, _)| i);
    match cut {
        Some(i) => &line[i..],
        None => line.trim_start(),
    }
}
