//! Kotlin structural analyzer.
//!
//! Works on the masked source from the lexer: declarations are recognized at
//! the start of masked lines, bodies are tracked by brace depth. A matched
//! declaration stays pending until its body opens (`{`), an expression body
//! starts (`=`), or its header ends without a body.

use super::lexer::{Dialect, MaskedSource, mask};
use super::scope::{ScopeKind, ScopeStack};
use super::{Analyzer, Language, collapse_whitespace, finish_forest, line_count};
use crate::types::{RawNode, Result};

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "open", "abstract", "final", "sealed", "data",
    "enum", "annotation", "inner", "value", "inline", "override", "suspend", "tailrec",
    "operator", "infix", "external", "expect", "actual", "lateinit", "const", "companion",
];

/// Class modifiers that distinguish a class kind, most specific first.
const CLASS_MODIFIERS: &[&str] = &[
    "enum", "annotation", "data", "sealed", "value", "inline", "inner", "abstract", "open",
];

pub struct KotlinAnalyzer;

impl KotlinAnalyzer {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }
}

impl Analyzer for KotlinAnalyzer {
    fn analyze(&self, source: &str) -> Result<Vec<RawNode>> {
        let masked = mask(source, Dialect::Kotlin);
        let mut scanner = Scanner::new(source, &masked);
        scanner.run();
        let (forest, balanced) = scanner.finish();
        finish_forest(forest, source, !balanced, "Kotlin")
    }

    fn language(&self) -> Language {
        Language::Kotlin
    }
}

// =============================================================================
// Line matching
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
struct DeclMatch {
    keyword: String,
    name: String,
    is_function: bool,
    /// Column where modifiers or the keyword begin
    header_col: usize,
    /// Column to continue brace scanning from
    resume_col: usize,
    /// Column ranges of annotations before the header
    annotations: Vec<(usize, usize)>,
}

#[derive(Debug, PartialEq, Eq)]
enum LineMatch {
    Declaration(DeclMatch),
    AnnotationsOnly(Vec<(usize, usize)>),
    Other,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'`' || b >= 0x80
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

fn skip_ws(line: &[u8], mut i: usize) -> usize {
    while i < line.len() && line[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// End of the identifier (plain or backticked) starting at `i`.
fn ident_end(line: &[u8], i: usize) -> usize {
    match line.get(i) {
        Some(b'`') => line[i + 1..]
            .iter()
            .position(|b| *b == b'`')
            .map(|p| i + p + 2)
            .unwrap_or(line.len()),
        Some(b) if is_ident_start(*b) => {
            let mut j = i;
            while j < line.len() && is_ident_byte(line[j]) {
                j += 1;
            }
            j
        }
        _ => i,
    }
}

/// Index just past the bracket matching the opener at `i`, or the line end.
fn skip_balanced(line: &[u8], i: usize, open: u8, close: u8) -> usize {
    let mut depth = 0i32;
    let mut j = i;
    while j < line.len() {
        let b = line[j];
        if open == b'<' && b == b'-' && line.get(j + 1) == Some(&b'>') {
            j += 2;
            continue;
        }
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return j + 1;
            }
        }
        j += 1;
    }
    line.len()
}

/// Columns inside backtick-quoted identifiers, which may hold any character.
fn backticked(line: &[u8]) -> Vec<bool> {
    let mut quoted = vec![false; line.len()];
    let mut i = 0;
    while i < line.len() {
        if line[i] == b'`' {
            let end = ident_end(line, i);
            quoted[i..end].iter_mut().for_each(|q| *q = true);
            i = end;
        } else {
            i += 1;
        }
    }
    quoted
}

fn text(line: &[u8], start: usize, end: usize) -> &str {
    line.get(start..end)
        .and_then(|s| std::str::from_utf8(s).ok())
        .unwrap_or("")
}

/// Recognize a declaration at the start of a masked line.
fn match_line(line: &[u8], in_class: bool) -> LineMatch {
    let mut i = skip_ws(line, 0);
    let mut annotations = Vec::new();

    while line.get(i) == Some(&b'@') {
        let mut j = i + 1;
        while j < line.len() && (is_ident_byte(line[j]) || line[j] == b'.' || line[j] == b':') {
            j += 1;
        }
        if line.get(j) == Some(&b'(') {
            j = skip_balanced(line, j, b'(', b')');
        }
        annotations.push((i, j));
        i = skip_ws(line, j);
    }

    let header_col = i;
    let mut modifiers: Vec<&str> = Vec::new();
    loop {
        let end = ident_end(line, i);
        if end == i {
            break;
        }
        let word = text(line, i, end);
        if MODIFIERS.contains(&word) {
            modifiers.push(word);
            i = skip_ws(line, end);
            continue;
        }

        let after = skip_ws(line, end);
        let decl = match word {
            "class" => {
                let keyword = CLASS_MODIFIERS
                    .iter()
                    .find(|m| modifiers.contains(*m))
                    .map(|m| format!("{} class", m))
                    .unwrap_or_else(|| "class".to_string());
                named_type(line, after, keyword, "")
            }
            "interface" => named_type(line, after, "interface".to_string(), ""),
            "object" if modifiers.contains(&"companion") => {
                named_type(line, after, "companion object".to_string(), "Companion")
            }
            "object" => named_type(line, after, "object".to_string(), ""),
            "fun" if text(line, after, ident_end(line, after)) == "interface" => {
                let name_at = skip_ws(line, ident_end(line, after));
                named_type(line, name_at, "fun interface".to_string(), "")
            }
            "fun" => function(line, after),
            "constructor" if in_class => Some(DeclMatch {
                keyword: "constructor".to_string(),
                name: String::new(),
                is_function: true,
                header_col: 0,
                resume_col: end,
                annotations: Vec::new(),
            }),
            _ => None,
        };

        return match decl {
            Some(mut decl) => {
                decl.header_col = header_col;
                decl.annotations = annotations;
                LineMatch::Declaration(decl)
            }
            None => LineMatch::Other,
        };
    }

    if i >= line.len() && modifiers.is_empty() && !annotations.is_empty() {
        LineMatch::AnnotationsOnly(annotations)
    } else {
        LineMatch::Other
    }
}

fn named_type(line: &[u8], at: usize, keyword: String, default_name: &str) -> Option<DeclMatch> {
    let end = ident_end(line, at);
    let name = if end > at {
        text(line, at, end).to_string()
    } else if !default_name.is_empty() {
        default_name.to_string()
    } else {
        return None;
    };
    Some(DeclMatch {
        keyword,
        name,
        is_function: false,
        header_col: 0,
        resume_col: end.max(at),
        annotations: Vec::new(),
    })
}

/// `fun [<T>] [Receiver.]name(` with the name taken after the last
/// top-level dot.
fn function(line: &[u8], at: usize) -> Option<DeclMatch> {
    let mut i = at;
    if line.get(i) == Some(&b'<') {
        i = skip_ws(line, skip_balanced(line, i, b'<', b'>'));
    }

    let start = i;
    let mut depth = 0i32;
    let mut last_dot = None;
    while i < line.len() {
        match line[i] {
            b'`' => {
                i = ident_end(line, i);
                continue;
            }
            b'<' => depth += 1,
            b'>' if depth > 0 => depth -= 1,
            b'.' if depth == 0 => last_dot = Some(i),
            b'(' | b'=' | b'{' | b':' if depth == 0 => break,
            _ => {}
        }
        i += 1;
    }

    let name_start = last_dot.map(|d| d + 1).unwrap_or(start);
    let name = text(line, name_start, i).trim();
    if name.is_empty() || !name.bytes().next().is_some_and(is_ident_start) {
        return None;
    }
    Some(DeclMatch {
        keyword: "fun".to_string(),
        name: name.to_string(),
        is_function: true,
        header_col: 0,
        resume_col: i,
        annotations: Vec::new(),
    })
}

// =============================================================================
// Header / statement continuation
// =============================================================================

/// Whether a body-less header continues on the next line.
fn header_continues(current: &str, next: Option<&str>) -> bool {
    let current = current.trim_end();
    if [",", ":", "(", "<", ".", "->"]
        .iter()
        .any(|t| current.ends_with(t))
    {
        return true;
    }
    next.is_some_and(|n| {
        n.starts_with('{')
            || n.starts_with(':')
            || n.starts_with(',')
            || n.starts_with(')')
            || n.starts_with("where ")
            || (n.starts_with('=') && !n.starts_with("=="))
    })
}

/// Whether an expression body continues on the next line.
fn statement_continues(current: &str, next: Option<&str>) -> bool {
    let current = current.trim_end();
    let dangling = ["=", "(", "[", ",", ".", "->", "&&", "||", "?:", "+", "-", "*", "/", "%"]
        .iter()
        .any(|t| current.ends_with(t))
        && !current.ends_with("++")
        && !current.ends_with("--");
    if dangling {
        return true;
    }
    next.is_some_and(|n| {
        n.starts_with('.')
            || n.starts_with("?.")
            || n.starts_with("?:")
            || n.starts_with("&&")
            || n.starts_with("||")
            || n.starts_with("as ")
            || n.starts_with("as?")
    })
}

fn is_assignment(line: &[u8], col: usize) -> bool {
    let next = line.get(col + 1).copied();
    let prev = col.checked_sub(1).and_then(|p| line.get(p)).copied();
    next != Some(b'=')
        && next != Some(b'>')
        && !matches!(prev, Some(b'=' | b'!' | b'<' | b'>'))
}

// =============================================================================
// Scanner
// =============================================================================

struct Pending {
    node: RawNode,
    is_function: bool,
    header_start: usize,
    parens: i32,
    last_line: usize,
}

struct ExprBody {
    node: RawNode,
    depth: i32,
    last_line: usize,
}

struct Scanner<'a> {
    source: &'a str,
    masked: &'a MaskedSource,
    lines: Vec<&'a str>,
    offsets: Vec<usize>,
    scopes: ScopeStack,
    pending: Option<Pending>,
    expr: Option<ExprBody>,
    annotations: Vec<(usize, String)>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str, masked: &'a MaskedSource) -> Self {
        let lines = masked.lines();
        let mut offsets = Vec::with_capacity(lines.len());
        let mut offset = 0;
        for line in &lines {
            offsets.push(offset);
            offset += line.len() + 1;
        }
        Self {
            source,
            masked,
            lines,
            offsets,
            scopes: ScopeStack::new(),
            pending: None,
            expr: None,
            annotations: Vec::new(),
        }
    }

    fn declarations_allowed(&self) -> bool {
        self.expr.is_none()
            && matches!(
                self.scopes.current(),
                ScopeKind::TopLevel | ScopeKind::ClassBody
            )
            && self.pending.as_ref().is_none_or(|p| p.parens <= 0)
    }

    /// Original source between two offsets, cut where the masked text ends.
    fn header_text(&self, start: usize, end: usize) -> String {
        let masked = self.masked.text.get(start..end).unwrap_or("");
        let end = start + masked.trim_end().len();
        collapse_whitespace(self.source.get(start..end).unwrap_or(""))
    }

    fn run(&mut self) {
        for idx in 0..self.lines.len() {
            let line: &'a str = self.lines[idx];
            let line = line.as_bytes();
            let line_no = idx + 1;
            let mut col = 0;

            if self.declarations_allowed() {
                let in_class = self.scopes.current() == ScopeKind::ClassBody;
                match match_line(line, in_class) {
                    LineMatch::Declaration(decl) => {
                        col = decl.resume_col;
                        self.begin_declaration(idx, decl);
                    }
                    LineMatch::AnnotationsOnly(ranges) => {
                        if self.pending.is_none() {
                            for (start, end) in ranges {
                                let annotation = self.header_text(
                                    self.offsets[idx] + start,
                                    self.offsets[idx] + end,
                                );
                                self.annotations.push((line_no, annotation));
                            }
                        }
                        col = line.len();
                    }
                    LineMatch::Other => {
                        if !self.lines[idx].trim().is_empty() {
                            self.annotations.clear();
                        }
                    }
                }
            }

            // A class body opened mid-line may start with a member.
            while let Some(body) = self.scan(idx, col) {
                col = body;
                if let LineMatch::Declaration(mut decl) = match_line(&line[body..], true) {
                    decl.header_col += body;
                    decl.resume_col += body;
                    for (start, end) in decl.annotations.iter_mut() {
                        *start += body;
                        *end += body;
                    }
                    col = decl.resume_col;
                    self.begin_declaration(idx, decl);
                }
            }
            self.end_of_line(idx);
        }
    }

    fn begin_declaration(&mut self, idx: usize, decl: DeclMatch) {
        if let Some(pending) = self.pending.take() {
            let end = pending.last_line;
            self.finish_leaf(pending, end, self.offsets[idx]);
        }

        let line_no = idx + 1;
        let mut decorators: Vec<(usize, String)> = std::mem::take(&mut self.annotations);
        for (start, end) in &decl.annotations {
            let annotation =
                self.header_text(self.offsets[idx] + start, self.offsets[idx] + end);
            decorators.push((line_no, annotation));
        }
        let first_line = decorators.first().map(|(l, _)| *l).unwrap_or(line_no);

        let name = if decl.keyword == "constructor" {
            self.scopes.enclosing_title().unwrap_or("constructor").to_string()
        } else {
            decl.name
        };

        let node = RawNode::new(decl.keyword, name, first_line)
            .with_docstring(self.masked.doc_above(first_line))
            .with_decorators(decorators.into_iter().map(|(_, a)| a).collect());

        self.pending = Some(Pending {
            node,
            is_function: decl.is_function,
            header_start: self.offsets[idx] + decl.header_col,
            parens: 0,
            last_line: line_no,
        });
    }

    fn finish_leaf(&mut self, pending: Pending, end_line: usize, end_offset: usize) {
        let signature = self.header_text(pending.header_start, end_offset);
        let node = pending
            .node
            .with_signature(signature)
            .with_end_line(end_line);
        self.scopes.attach(node);
    }

    fn finish_expr(&mut self, end_line: usize) {
        if let Some(expr) = self.expr.take() {
            self.scopes.attach(expr.node.with_end_line(end_line));
        }
    }

    /// Track braces from `from` to the end of the line. Stops right after a
    /// `{` that opens a class body and returns the column following it.
    fn scan(&mut self, idx: usize, from: usize) -> Option<usize> {
        let line: &'a str = self.lines[idx];
        let line = line.as_bytes();
        let line_no = idx + 1;
        let quoted = backticked(line);

        for col in from..line.len() {
            if quoted[col] {
                continue;
            }
            let b = line[col];
            let offset = self.offsets[idx] + col;

            if let Some(expr) = self.expr.as_mut() {
                match b {
                    b'{' | b'(' | b'[' => expr.depth += 1,
                    b'}' | b')' | b']' if expr.depth > 0 => expr.depth -= 1,
                    b'}' => {
                        // Closing the enclosing scope ends the expression.
                        self.finish_expr(line_no);
                        self.scopes.pop(line_no);
                    }
                    b';' if expr.depth == 0 => self.finish_expr(line_no),
                    _ => {}
                }
                continue;
            }

            if let Some(pending) = self.pending.as_mut() {
                match b {
                    b'(' => pending.parens += 1,
                    b')' => pending.parens -= 1,
                    _ if pending.parens > 0 => {}
                    b'{' => {
                        if let Some(pending) = self.pending.take() {
                            let kind = if pending.is_function {
                                ScopeKind::FunctionBody
                            } else {
                                ScopeKind::ClassBody
                            };
                            let signature = self.header_text(pending.header_start, offset);
                            self.scopes
                                .push(kind, Some(pending.node.with_signature(signature)));
                            if kind == ScopeKind::ClassBody {
                                return Some(col + 1);
                            }
                        }
                    }
                    b'=' if pending.is_function && is_assignment(line, col) => {
                        if let Some(pending) = self.pending.take() {
                            let signature = self.header_text(pending.header_start, offset);
                            self.expr = Some(ExprBody {
                                node: pending.node.with_signature(signature),
                                depth: 0,
                                last_line: line_no,
                            });
                        }
                    }
                    b';' => {
                        if let Some(pending) = self.pending.take() {
                            self.finish_leaf(pending, line_no, offset);
                        }
                    }
                    b'}' => {
                        if let Some(pending) = self.pending.take() {
                            self.finish_leaf(pending, line_no, offset);
                        }
                        self.scopes.pop(line_no);
                    }
                    _ => {}
                }
                continue;
            }

            match b {
                b'{' => self.scopes.push(ScopeKind::Block, None),
                b'}' => self.scopes.pop(line_no),
                _ => {}
            }
        }
        None
    }

    fn next_code_line(&self, idx: usize) -> Option<&'a str> {
        self.lines[idx + 1..]
            .iter()
            .copied()
            .map(str::trim)
            .find(|l| !l.is_empty())
    }

    fn end_of_line(&mut self, idx: usize) {
        let line_no = idx + 1;
        let current = self.lines[idx];
        let blank = current.trim().is_empty();
        let next = self.next_code_line(idx);

        if let Some(pending) = self.pending.as_mut() {
            if !blank {
                pending.last_line = line_no;
            }
            if pending.parens <= 0 && !blank && !header_continues(current, next) {
                let end = self.offsets[idx] + current.len();
                if let Some(pending) = self.pending.take() {
                    self.finish_leaf(pending, line_no, end);
                }
            }
        }

        if let Some(expr) = self.expr.as_mut() {
            if !blank {
                expr.last_line = line_no;
            }
            if expr.depth <= 0 && !blank && !statement_continues(current, next) {
                self.finish_expr(line_no);
            }
        }
    }

    fn finish(mut self) -> (Vec<RawNode>, bool) {
        if let Some(pending) = self.pending.take() {
            let end = pending.last_line;
            self.finish_leaf(pending, end, self.source.len());
        }
        if let Some(expr) = self.expr.take() {
            self.scopes.attach(expr.node.with_end_line(expr.last_line));
        }
        let total = line_count(self.source);
        self.scopes.finish(total)
    }
}
