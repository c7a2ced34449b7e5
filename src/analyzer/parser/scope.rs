//! Structural scope stack for the brace-depth analyzers.
//!
//! Each `{` pushes a scope and each `}` pops one. Scopes opened by a
//! declaration carry its node; closing the scope fixes the node's end line
//! and attaches it to the nearest enclosing declaration (or the top level).

use crate::types::RawNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    TopLevel,
    ClassBody,
    FunctionBody,
    Namespace,
    /// `extern "C" { ... }`: transparent for declarations
    Linkage,
    Block,
}

impl ScopeKind {
    /// Scopes whose direct contents are scanned for declarations.
    pub fn allows_declarations(&self) -> bool {
        matches!(
            self,
            ScopeKind::TopLevel | ScopeKind::ClassBody | ScopeKind::Namespace | ScopeKind::Linkage
        )
    }
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    node: Option<RawNode>,
}

#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    forest: Vec<RawNode>,
    unbalanced: bool,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::TopLevel,
                node: None,
            }],
            forest: Vec::new(),
            unbalanced: false,
        }
    }

    pub fn current(&self) -> ScopeKind {
        self.scopes
            .last()
            .map(|s| s.kind)
            .unwrap_or(ScopeKind::TopLevel)
    }

    /// Number of open scopes above the top level.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn push(&mut self, kind: ScopeKind, node: Option<RawNode>) {
        self.scopes.push(Scope { kind, node });
    }

    /// Close the innermost scope at `end_line`.
    ///
    /// A stray `}` at top level is recorded as an imbalance and ignored.
    pub fn pop(&mut self, end_line: usize) {
        if self.scopes.len() <= 1 {
            self.unbalanced = true;
            return;
        }
        if let Some(Scope {
            node: Some(node), ..
        }) = self.scopes.pop()
        {
            self.attach(node.with_end_line(end_line));
        }
    }

    /// Add a finished node to the nearest enclosing declaration.
    pub fn attach(&mut self, node: RawNode) {
        match self.scopes.iter_mut().rev().find_map(|s| s.node.as_mut()) {
            Some(parent) => parent.children.push(node),
            None => self.forest.push(node),
        }
    }

    /// The node most recently attached to the current container.
    pub fn last_attached_mut(&mut self) -> Option<&mut RawNode> {
        match self.scopes.iter_mut().rev().find_map(|s| s.node.as_mut()) {
            Some(parent) => parent.children.last_mut(),
            None => self.forest.last_mut(),
        }
    }

    /// Title of the nearest enclosing declaration.
    pub fn enclosing_title(&self) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.node.as_ref())
            .map(|n| n.title.as_str())
    }

    /// Close every open scope at `last_line` and return the forest with a
    /// flag telling whether braces were balanced.
    pub fn finish(mut self, last_line: usize) -> (Vec<RawNode>, bool) {
        let balanced = !self.unbalanced && self.scopes.len() == 1;
        while self.scopes.len() > 1 {
            self.pop(last_line);
        }
        (self.forest, balanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_scopes_build_tree() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::ClassBody, Some(RawNode::new("class", "A", 1)));
        stack.push(ScopeKind::FunctionBody, Some(RawNode::new("fun", "f", 2)));
        stack.push(ScopeKind::Block, None);
        assert_eq!(stack.depth(), 3);
        stack.pop(4);
        stack.pop(5);
        stack.pop(6);

        let (forest, balanced) = stack.finish(6);
        assert!(balanced);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].end_line, 6);
        assert_eq!(forest[0].children[0].title, "f");
        assert_eq!(forest[0].children[0].end_line, 5);
    }

    #[test]
    fn test_linkage_is_transparent() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Linkage, None);
        assert!(stack.current().allows_declarations());
        stack.attach(RawNode::new("function", "f", 2));
        stack.pop(3);
        let (forest, _) = stack.finish(3);
        assert_eq!(forest[0].title, "f");
    }

    #[test]
    fn test_unbalanced_input() {
        let mut stack = ScopeStack::new();
        stack.pop(1);
        let (_, balanced) = stack.finish(1);
        assert!(!balanced);

        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::ClassBody, Some(RawNode::new("class", "A", 1)));
        let (forest, balanced) = stack.finish(9);
        assert!(!balanced);
        assert_eq!(forest[0].end_line, 9);
    }

    #[test]
    fn test_enclosing_title_and_last_attached() {
        let mut stack = ScopeStack::new();
        assert!(stack.enclosing_title().is_none());
        stack.push(ScopeKind::ClassBody, Some(RawNode::new("class", "A", 1)));
        assert_eq!(stack.enclosing_title(), Some("A"));
        stack.attach(RawNode::new("fun", "f", 2));
        stack.last_attached_mut().unwrap().title = "g".to_string();
        stack.pop(3);
        let (forest, _) = stack.finish(3);
        assert_eq!(forest[0].children[0].title, "g");
    }
}
