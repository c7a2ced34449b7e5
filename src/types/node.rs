use serde::{Deserialize, Serialize};

/// Common node taxonomy shared by every analyzer after normalization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Directory,
    File,
    Class,
    Interface,
    Enum,
    Function,
    Method,
    Struct,
    Namespace,
    Object,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Directory => "directory",
            NodeKind::File => "file",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
            NodeKind::Enum => "enum",
            NodeKind::Function => "function",
            NodeKind::Method => "method",
            NodeKind::Struct => "struct",
            NodeKind::Namespace => "namespace",
            NodeKind::Object => "object",
        }
    }

    /// Kinds whose function-like children are methods.
    pub fn is_type_like(&self) -> bool {
        matches!(
            self,
            NodeKind::Class
                | NodeKind::Interface
                | NodeKind::Enum
                | NodeKind::Struct
                | NodeKind::Object
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "root" => Ok(NodeKind::Root),
            "directory" => Ok(NodeKind::Directory),
            "file" => Ok(NodeKind::File),
            "class" => Ok(NodeKind::Class),
            "interface" => Ok(NodeKind::Interface),
            "enum" => Ok(NodeKind::Enum),
            "function" => Ok(NodeKind::Function),
            "method" => Ok(NodeKind::Method),
            "struct" => Ok(NodeKind::Struct),
            "namespace" => Ok(NodeKind::Namespace),
            "object" => Ok(NodeKind::Object),
            _ => Err(format!("Unknown node type: {}", s)),
        }
    }
}

/// Analyzer output in the analyzer's own vocabulary.
///
/// `keyword` is the language-specific declaration keyword (`"data class"`,
/// `"companion object"`, `"def"`, `"struct"`, ...). The normalizer maps it onto
/// [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub keyword: String,
    pub title: String,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub decorators: Vec<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(keyword: impl Into<String>, title: impl Into<String>, start_line: usize) -> Self {
        Self {
            keyword: keyword.into(),
            title: title.into(),
            signature: None,
            docstring: None,
            decorators: Vec::new(),
            start_line,
            end_line: start_line,
            children: Vec::new(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_docstring(mut self, docstring: Option<String>) -> Self {
        self.docstring = docstring;
        self
    }

    pub fn with_decorators(mut self, decorators: Vec<String>) -> Self {
        self.decorators = decorators;
        self
    }

    pub fn with_end_line(mut self, end_line: usize) -> Self {
        self.end_line = end_line;
        self
    }

    pub fn with_children(mut self, children: Vec<RawNode>) -> Self {
        self.children = children;
        self
    }
}

/// Pull every span in the forest inside `[lo, hi]` and inside its parent.
///
/// Heuristic analyzers can overshoot on unbalanced input; containment is
/// restored here rather than in each analyzer.
pub fn clamp_spans(nodes: &mut [RawNode], lo: usize, hi: usize) {
    for node in nodes {
        node.start_line = node.start_line.clamp(lo, hi);
        node.end_line = node.end_line.clamp(node.start_line, hi);
        let (start, end) = (node.start_line, node.end_line);
        clamp_spans(&mut node.children, start, end);
    }
}

/// A node of the assembled document tree.
///
/// Field order is the serialized field order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuralNode {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "nodes", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StructuralNode>,
}

impl StructuralNode {
    pub fn new(kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            node_id: None,
            kind,
            tags: Vec::new(),
            signature: None,
            docstring: None,
            decorators: Vec::new(),
            start_line: None,
            end_line: None,
            summary: None,
            prefix_summary: None,
            text: None,
            error: None,
            children: Vec::new(),
        }
    }

    pub fn with_span(mut self, start_line: usize, end_line: usize) -> Self {
        self.start_line = Some(start_line);
        self.end_line = Some(end_line);
        self
    }

    pub fn with_children(mut self, children: Vec<StructuralNode>) -> Self {
        self.children = children;
        self
    }

    /// Preorder visit of this subtree.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a StructuralNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Preorder mutable visit of this subtree.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut StructuralNode)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Resolve a child-index path (as produced by [`StructuralNode::paths`]).
    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut StructuralNode> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self.children.get_mut(*first)?.get_mut(rest),
        }
    }

    /// Child-index paths of every node in preorder; `[]` is this node.
    pub fn paths(&self) -> Vec<Vec<usize>> {
        fn collect(node: &StructuralNode, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            out.push(prefix.clone());
            for (i, child) in node.children.iter().enumerate() {
                prefix.push(i);
                collect(child, prefix, out);
                prefix.pop();
            }
        }
        let mut out = Vec::new();
        collect(self, &mut Vec::new(), &mut out);
        out
    }

    /// Drop the `text` field from the whole subtree.
    pub fn strip_text(&mut self) {
        self.walk_mut(&mut |node| node.text = None);
    }
}

/// Final output document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub doc_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_description: Option<String>,
    pub structure: Vec<StructuralNode>,
}

impl Document {
    pub fn new(doc_name: impl Into<String>, structure: Vec<StructuralNode>) -> Self {
        Self {
            doc_name: doc_name.into(),
            doc_description: None,
            structure,
        }
    }

    /// Number of file nodes in the document.
    pub fn file_count(&self) -> usize {
        let mut count = 0;
        for node in &self.structure {
            node.walk(&mut |n| {
                if n.kind == NodeKind::File {
                    count += 1;
                }
            });
        }
        count
    }
}
