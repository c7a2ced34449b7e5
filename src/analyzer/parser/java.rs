use super::{
    Analyzer, Language, clean_doc_comment, collapse_whitespace, create_ts_parser, finish_forest,
    get_node_position, get_node_text,
};
use crate::types::{RawNode, Result, TreeError};

pub struct JavaAnalyzer;

impl JavaAnalyzer {
    pub fn new() -> Result<Self> {
        let _ = create_ts_parser(tree_sitter_java::LANGUAGE, "Java")?;
        Ok(Self)
    }
}

impl Analyzer for JavaAnalyzer {
    fn analyze(&self, source: &str) -> Result<Vec<RawNode>> {
        let mut parser = create_ts_parser(tree_sitter_java::LANGUAGE, "Java")?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| TreeError::parse("", "Failed to parse Java file"))?;

        let root = tree.root_node();
        let forest = extract_members(root, source.as_bytes());
        finish_forest(forest, source, root.has_error(), "Java")
    }

    fn language(&self) -> Language {
        Language::Java
    }
}

/// Language keyword for a declaration node kind, if it is structural.
fn declaration_keyword(kind: &str) -> Option<&'static str> {
    match kind {
        "class_declaration" => Some("class"),
        "interface_declaration" => Some("interface"),
        "enum_declaration" => Some("enum"),
        "record_declaration" => Some("record"),
        "annotation_type_declaration" => Some("annotation"),
        "method_declaration" => Some("method"),
        "constructor_declaration" | "compact_constructor_declaration" => Some("constructor"),
        _ => None,
    }
}

/// Walk the direct members of a program or type body.
fn extract_members(body: tree_sitter::Node, content: &[u8]) -> Vec<RawNode> {
    let mut nodes = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() == "enum_body_declarations" {
            nodes.extend(extract_members(member, content));
            continue;
        }
        if let Some(node) = extract_declaration(member, content) {
            nodes.push(node);
        }
    }
    nodes
}

fn extract_declaration(decl: tree_sitter::Node, content: &[u8]) -> Option<RawNode> {
    let keyword = declaration_keyword(decl.kind())?;
    let name = get_node_text(decl.child_by_field_name("name")?, content);
    if name.is_empty() {
        return None;
    }
    let (start_line, end_line) = get_node_position(decl);

    let signature = match keyword {
        "method" => {
            let ret = decl
                .child_by_field_name("type")
                .map(|t| get_node_text(t, content))
                .unwrap_or("void");
            format!("{} {}{}", ret, name, parameters(decl, content))
        }
        "constructor" => format!("{}{}", name, parameters(decl, content)),
        _ => type_header(decl, keyword, name, content),
    };

    let children = match keyword {
        "method" | "constructor" => Vec::new(),
        _ => decl
            .child_by_field_name("body")
            .map(|b| extract_members(b, content))
            .unwrap_or_default(),
    };

    Some(
        RawNode::new(keyword, name, start_line)
            .with_end_line(end_line)
            .with_signature(collapse_whitespace(&signature))
            .with_docstring(javadoc(decl, content))
            .with_decorators(annotations(decl, content))
            .with_children(children),
    )
}

fn parameters<'a>(decl: tree_sitter::Node, content: &'a [u8]) -> &'a str {
    decl.child_by_field_name("parameters")
        .map(|p| get_node_text(p, content))
        .unwrap_or("()")
}

/// Declaration header of a type, from its keyword to the start of its body.
fn type_header(decl: tree_sitter::Node, keyword: &str, name: &str, content: &[u8]) -> String {
    let keyword = if keyword == "annotation" { "@interface" } else { keyword };
    let mut header = format!("{} {}", keyword, name);
    for field in ["type_parameters", "parameters", "superclass", "interfaces"] {
        if let Some(part) = decl.child_by_field_name(field) {
            header.push(' ');
            header.push_str(get_node_text(part, content));
        }
    }
    header.replace(" (", "(").replace(" <", "<")
}

/// Annotations attached through the `modifiers` child.
fn annotations(decl: tree_sitter::Node, content: &[u8]) -> Vec<String> {
    let mut cursor = decl.walk();
    let Some(modifiers) = decl
        .named_children(&mut cursor)
        .find(|c| c.kind() == "modifiers")
    else {
        return Vec::new();
    };
    let mut cursor = modifiers.walk();
    modifiers
        .named_children(&mut cursor)
        .filter(|c| matches!(c.kind(), "annotation" | "marker_annotation"))
        .map(|c| collapse_whitespace(get_node_text(c, content)))
        .collect()
}

/// Javadoc block comment directly preceding a declaration.
fn javadoc(decl: tree_sitter::Node, content: &[u8]) -> Option<String> {
    let prev = decl.prev_named_sibling()?;
    if prev.kind() != "block_comment" {
        return None;
    }
    let text = get_node_text(prev, content);
    if !text.starts_with("/**") {
        return None;
    }
    let doc = clean_doc_comment(text);
    (!doc.is_empty()).then_some(doc)
}
