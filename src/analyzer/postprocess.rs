//! Tree post-processing: thinning and node ids.

use crate::ai::tokenizer::TokenCounter;
use crate::constants::index::NODE_ID_WIDTH;
use crate::types::{NodeKind, StructuralNode};

fn is_thinnable(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::Class | NodeKind::Function | NodeKind::Method)
}

/// Estimated tokens of a subtree.
///
/// A node's text already covers its children's spans, so the children are
/// only counted when the node itself carries no text.
fn subtree_tokens(node: &StructuralNode, counter: &TokenCounter) -> usize {
    match node.text.as_deref() {
        Some(text) if !text.is_empty() => counter.count(text),
        _ => node
            .children
            .iter()
            .map(|c| subtree_tokens(c, counter))
            .sum(),
    }
}

/// Merge small class and function subtrees into their root node.
///
/// Bottom-up: a class, function or method whose subtree stays below
/// `threshold` tokens absorbs its children's text and drops the children.
pub fn thin_tree(node: &mut StructuralNode, threshold: usize, counter: &TokenCounter) {
    if node.children.is_empty() {
        return;
    }
    for child in &mut node.children {
        thin_tree(child, threshold, counter);
    }
    if !is_thinnable(node.kind) || subtree_tokens(node, counter) >= threshold {
        return;
    }

    let mut merged = node.text.take().unwrap_or_default();
    for child in std::mem::take(&mut node.children) {
        let Some(text) = child.text.filter(|t| !t.is_empty()) else {
            continue;
        };
        if merged.contains(&text) {
            continue;
        }
        if !merged.is_empty() && !merged.ends_with('\n') {
            merged.push('\n');
        }
        merged.push_str(&text);
    }
    node.text = Some(merged);
}

/// Assign zero-padded preorder ids over a whole structure array.
pub fn assign_node_ids(structure: &mut [StructuralNode]) {
    let mut next = 0usize;
    for node in structure {
        node.walk_mut(&mut |n| {
            n.node_id = Some(format!("{:0width$}", next, width = NODE_ID_WIDTH));
            next += 1;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeKind, title: &str, text: &str) -> StructuralNode {
        let mut n = StructuralNode::new(kind, title);
        n.text = Some(text.to_string());
        n
    }

    #[test]
    fn test_assign_node_ids_preorder() {
        let mut structure = vec![
            StructuralNode::new(NodeKind::Directory, "src").with_children(vec![
                node(NodeKind::File, "a.py", "").with_children(vec![node(
                    NodeKind::Function,
                    "f()",
                    "",
                )]),
            ]),
            node(NodeKind::File, "b.py", ""),
        ];
        assign_node_ids(&mut structure);

        let mut ids = Vec::new();
        for n in &structure {
            n.walk(&mut |x| ids.push(x.node_id.clone().unwrap_or_default()));
        }
        assert_eq!(ids, vec!["0000", "0001", "0002", "0003"]);
        assert_eq!(structure[1].node_id.as_deref(), Some("0003"));
    }

    #[test]
    fn test_thin_small_class() {
        let class_text = "class A:\n    def f(self):\n        pass";
        let mut file = node(NodeKind::File, "a.py", class_text).with_children(vec![
            node(NodeKind::Class, "A", class_text).with_children(vec![node(
                NodeKind::Method,
                "f()",
                "    def f(self):\n        pass",
            )]),
        ]);

        thin_tree(&mut file, 1000, &TokenCounter::default());
        // Files are never merged.
        assert_eq!(file.children.len(), 1);
        let class = &file.children[0];
        assert!(class.children.is_empty());
        assert_eq!(class.text.as_deref(), Some(class_text));
    }

    #[test]
    fn test_large_subtree_is_kept() {
        let body = "x = compute(value) + other(value)\n".repeat(50);
        let mut class = node(NodeKind::Class, "Big", &body)
            .with_children(vec![node(NodeKind::Method, "m()", &body)]);
        thin_tree(&mut class, 10, &TokenCounter::default());
        assert_eq!(class.children.len(), 1);
    }

    #[test]
    fn test_child_text_appended_when_missing() {
        let mut func = node(NodeKind::Function, "f()", "def f():")
            .with_children(vec![node(NodeKind::Function, "g()", "def g(): pass")]);
        thin_tree(&mut func, 1000, &TokenCounter::default());
        assert!(func.children.is_empty());
        assert_eq!(func.text.as_deref(), Some("def f():\ndef g(): pass"));
    }
}
