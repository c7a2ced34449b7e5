//! Lexical State Machine
//!
//! Masks comments, string/char literal contents and preprocessor directives
//! with spaces so that brace-depth analyzers only ever see structural code.
//! The masked text has exactly the byte length and line layout of the input,
//! so offsets and line numbers carry over unchanged.
//!
//! Comments are collected on the way for doc-comment attachment.

use super::clean_doc_comment;

/// Lexical dialect of a brace-delimited language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Kotlin,
    C,
    Cpp,
}

impl Dialect {
    fn nested_comments(self) -> bool {
        matches!(self, Dialect::Kotlin)
    }

    fn string_templates(self) -> bool {
        matches!(self, Dialect::Kotlin)
    }

    fn preprocessor(self) -> bool {
        matches!(self, Dialect::C | Dialect::Cpp)
    }
}

/// Lexer state. `Template(depth)` is code inside a Kotlin `${...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    Code,
    LineComment,
    BlockComment(u32),
    Str,
    RawStr,
    Char,
    Template(u32),
    Preprocessor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
    /// `/** */`, `///`, `//!` or `/*!` (the latter three only in C dialects)
    pub is_doc: bool,
    pub is_line: bool,
}

/// Source with non-structural bytes replaced by spaces.
#[derive(Debug, Clone)]
pub struct MaskedSource {
    pub text: String,
    pub comments: Vec<Comment>,
}

impl MaskedSource {
    pub fn lines(&self) -> Vec<&str> {
        self.text.split('\n').collect()
    }

    /// Doc comment ending on the line directly above `line`.
    ///
    /// Runs of consecutive `///` line comments are joined into one block.
    pub fn doc_above(&self, line: usize) -> Option<String> {
        if line < 2 {
            return None;
        }
        let idx = self.comments.iter().rposition(|c| c.end_line == line - 1)?;
        let comment = &self.comments[idx];
        if !comment.is_doc {
            return None;
        }
        if !comment.is_line {
            let doc = clean_doc_comment(&comment.text);
            return (!doc.is_empty()).then_some(doc);
        }

        let mut parts = vec![strip_line_doc(&comment.text)];
        let mut expect = comment.start_line;
        for prev in self.comments[..idx].iter().rev() {
            if !(prev.is_line && prev.is_doc && prev.end_line + 1 == expect) {
                break;
            }
            parts.push(strip_line_doc(&prev.text));
            expect = prev.start_line;
        }
        parts.reverse();
        let doc = parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        (!doc.is_empty()).then_some(doc)
    }
}

fn strip_line_doc(text: &str) -> &str {
    text.trim_start_matches("///")
        .trim_start_matches("//!")
        .trim()
}

fn is_doc_comment(text: &str, dialect: Dialect) -> bool {
    let block = text.starts_with("/**") && !text.starts_with("/**/") && !text.starts_with("/**<");
    match dialect {
        Dialect::Kotlin => block,
        Dialect::C | Dialect::Cpp => {
            block
                || (text.starts_with("///")
                    && !text.starts_with("////")
                    && !text.starts_with("///<"))
                || text.starts_with("//!")
                || text.starts_with("/*!")
        }
    }
}

/// Mask a source text for the given dialect.
pub fn mask(source: &str, dialect: Dialect) -> MaskedSource {
    let mut lexer = Lexer::new(source, dialect);
    lexer.run();
    let comments = std::mem::take(&mut lexer.comments);
    let text = String::from_utf8(lexer.out)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
    MaskedSource { text, comments }
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    dialect: Dialect,
    out: Vec<u8>,
    stack: Vec<LexState>,
    raw_delim: String,
    line: usize,
    escaped: bool,
    line_has_code: bool,
    comment_start: Option<(usize, usize)>,
    comments: Vec<Comment>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, dialect: Dialect) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            dialect,
            out: Vec::with_capacity(src.len()),
            stack: vec![LexState::Code],
            raw_delim: String::new(),
            line: 1,
            escaped: false,
            line_has_code: false,
            comment_start: None,
            comments: Vec::new(),
        }
    }

    fn top(&self) -> LexState {
        self.stack.last().copied().unwrap_or(LexState::Code)
    }

    fn set_top(&mut self, state: LexState) {
        if let Some(top) = self.stack.last_mut() {
            *top = state;
        }
    }

    fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    fn at_code_level(&self) -> bool {
        self.stack.len() == 1
    }

    fn starts_with_at(&self, i: usize, pat: &str) -> bool {
        self.bytes
            .get(i..i + pat.len())
            .is_some_and(|s| s == pat.as_bytes())
    }

    fn mask_bytes(&mut self, n: usize) {
        self.out.extend(std::iter::repeat_n(b' ', n));
    }

    /// Literal delimiter: visible only when the literal sits directly in code.
    fn delim(&mut self, b: u8) {
        self.out.push(if self.stack.len() == 2 { b } else { b' ' });
    }

    fn run(&mut self) {
        let mut i = 0;
        while i < self.bytes.len() {
            if self.bytes[i] == b'\n' {
                self.newline(i);
                i += 1;
                continue;
            }
            i = match self.top() {
                LexState::Code | LexState::Template(_) => self.code(i),
                LexState::LineComment => {
                    self.mask_bytes(1);
                    i + 1
                }
                LexState::BlockComment(depth) => self.block_comment(i, depth),
                LexState::Str => self.string(i),
                LexState::RawStr => self.raw_string(i),
                LexState::Char => self.char_literal(i),
                LexState::Preprocessor => self.preprocessor(i),
            };
        }
        if self.top() == LexState::LineComment || matches!(self.top(), LexState::BlockComment(_)) {
            self.end_comment(self.bytes.len());
        }
    }

    fn newline(&mut self, i: usize) {
        self.out.push(b'\n');
        let spliced = self.escaped
            || (i > 0 && self.bytes[i - 1] == b'\\')
            || (i > 1 && self.bytes[i - 1] == b'\r' && self.bytes[i - 2] == b'\\');
        self.escaped = false;

        loop {
            match self.top() {
                LexState::LineComment => {
                    if spliced && self.dialect.preprocessor() {
                        break;
                    }
                    self.end_comment(i);
                    self.pop();
                }
                LexState::Str | LexState::Char | LexState::Preprocessor => {
                    if spliced {
                        break;
                    }
                    self.pop();
                }
                _ => break,
            }
        }

        self.line += 1;
        if !spliced {
            self.line_has_code = false;
        }
    }

    fn begin_comment(&mut self, i: usize, state: LexState) {
        if self.at_code_level() {
            self.comment_start = Some((i, self.line));
        }
        self.stack.push(state);
        self.mask_bytes(2);
    }

    fn end_comment(&mut self, end: usize) {
        // Only comments opened at code level are recorded.
        let Some((start, start_line)) = self.comment_start else {
            return;
        };
        if self.stack.len() != 2 {
            return;
        }
        self.comment_start = None;
        let text = self.src.get(start..end).unwrap_or("").trim_end().to_string();
        let is_line = text.starts_with("//");
        self.comments.push(Comment {
            start_line,
            end_line: self.line,
            is_doc: is_doc_comment(&text, self.dialect),
            is_line,
            text,
        });
    }

    fn code(&mut self, i: usize) -> usize {
        let b = self.bytes[i];
        let next = self.bytes.get(i + 1).copied();
        let visible = self.at_code_level();

        match b {
            b'/' if next == Some(b'/') => {
                self.begin_comment(i, LexState::LineComment);
                return i + 2;
            }
            b'/' if next == Some(b'*') => {
                self.begin_comment(i, LexState::BlockComment(1));
                return i + 2;
            }
            b'"' if self.dialect == Dialect::Kotlin && self.starts_with_at(i, "\"\"\"") => {
                self.stack.push(LexState::RawStr);
                for _ in 0..3 {
                    self.delim(b'"');
                }
                self.line_has_code = true;
                return i + 3;
            }
            b'"' => {
                self.line_has_code = true;
                if self.dialect == Dialect::Cpp
                    && let Some(delim) = self.raw_string_delim(i)
                {
                    let consumed = delim.len() + 2;
                    self.raw_delim = delim;
                    self.stack.push(LexState::RawStr);
                    self.delim(b'"');
                    self.mask_bytes(consumed - 1);
                    return i + consumed;
                }
                self.stack.push(LexState::Str);
                self.delim(b'"');
                return i + 1;
            }
            b'\'' => {
                self.line_has_code = true;
                let digit_separator = self.dialect != Dialect::Kotlin
                    && self.in_number(i)
                    && next.is_some_and(|n| n.is_ascii_alphanumeric());
                if digit_separator {
                    self.out.push(if visible { b } else { b' ' });
                } else {
                    self.stack.push(LexState::Char);
                    self.delim(b'\'');
                }
                return i + 1;
            }
            b'#' if self.dialect.preprocessor() && visible && !self.line_has_code => {
                self.stack.push(LexState::Preprocessor);
                self.mask_bytes(1);
                return i + 1;
            }
            _ => {}
        }

        if let LexState::Template(depth) = self.top() {
            match b {
                b'{' => self.set_top(LexState::Template(depth + 1)),
                b'}' if depth <= 1 => self.pop(),
                b'}' => self.set_top(LexState::Template(depth - 1)),
                _ => {}
            }
        }

        if !b.is_ascii_whitespace() {
            self.line_has_code = true;
        }
        self.out.push(if visible { b } else { b' ' });
        i + 1
    }

    /// Whether the token ending right before `i` is a numeric literal.
    fn in_number(&self, i: usize) -> bool {
        let start = self.bytes[..i]
            .iter()
            .rposition(|c| !c.is_ascii_alphanumeric() && *c != b'\'')
            .map(|p| p + 1)
            .unwrap_or(0);
        start < i && self.bytes[start].is_ascii_digit()
    }

    /// Delimiter of a C++ raw string literal opening at the quote at `i`.
    fn raw_string_delim(&self, i: usize) -> Option<String> {
        let prefix_start = self.bytes[..i]
            .iter()
            .rposition(|c| !(c.is_ascii_alphanumeric() || *c == b'_'))
            .map(|p| p + 1)
            .unwrap_or(0);
        let prefix = self.src.get(prefix_start..i)?;
        if !matches!(prefix, "R" | "u8R" | "uR" | "UR" | "LR") {
            return None;
        }
        let rest = &self.bytes[i + 1..];
        let open = rest.iter().take(17).position(|c| *c == b'(')?;
        let delim = &rest[..open];
        if delim
            .iter()
            .any(|c| c.is_ascii_whitespace() || matches!(c, b'\\' | b')' | b'"'))
        {
            return None;
        }
        std::str::from_utf8(delim).ok().map(str::to_string)
    }

    fn block_comment(&mut self, i: usize, depth: u32) -> usize {
        if self.starts_with_at(i, "*/") {
            self.mask_bytes(2);
            if depth <= 1 {
                self.end_comment(i + 2);
                self.pop();
            } else {
                self.set_top(LexState::BlockComment(depth - 1));
            }
            return i + 2;
        }
        if self.dialect.nested_comments() && self.starts_with_at(i, "/*") {
            self.mask_bytes(2);
            self.set_top(LexState::BlockComment(depth + 1));
            return i + 2;
        }
        self.mask_bytes(1);
        i + 1
    }

    fn string(&mut self, i: usize) -> usize {
        let b = self.bytes[i];
        if self.escaped {
            self.escaped = false;
            self.mask_bytes(1);
            return i + 1;
        }
        match b {
            b'\\' => {
                self.escaped = true;
                self.mask_bytes(1);
                i + 1
            }
            b'"' => {
                self.delim(b'"');
                self.pop();
                i + 1
            }
            b'$' if self.dialect.string_templates() && self.bytes.get(i + 1) == Some(&b'{') => {
                self.stack.push(LexState::Template(1));
                self.mask_bytes(2);
                i + 2
            }
            _ => {
                self.mask_bytes(1);
                i + 1
            }
        }
    }

    fn raw_string(&mut self, i: usize) -> usize {
        let b = self.bytes[i];
        if self.dialect == Dialect::Kotlin {
            if b == b'"' {
                let run = self.bytes[i..].iter().take_while(|c| **c == b'"').count();
                if run >= 3 {
                    self.mask_bytes(run - 3);
                    for _ in 0..3 {
                        self.delim(b'"');
                    }
                    self.pop();
                } else {
                    self.mask_bytes(run);
                }
                return i + run;
            }
            if b == b'$' && self.bytes.get(i + 1) == Some(&b'{') {
                self.stack.push(LexState::Template(1));
                self.mask_bytes(2);
                return i + 2;
            }
        } else if b == b')'
            && self.starts_with_at(i + 1, &self.raw_delim)
            && self.bytes.get(i + 1 + self.raw_delim.len()) == Some(&b'"')
        {
            self.mask_bytes(1 + self.raw_delim.len());
            self.delim(b'"');
            self.pop();
            return i + 2 + self.raw_delim.len();
        }
        self.mask_bytes(1);
        i + 1
    }

    fn char_literal(&mut self, i: usize) -> usize {
        let b = self.bytes[i];
        if self.escaped {
            self.escaped = false;
            self.mask_bytes(1);
            return i + 1;
        }
        match b {
            b'\\' => self.escaped = true,
            b'\'' => {
                self.delim(b'\'');
                self.pop();
                return i + 1;
            }
            _ => {}
        }
        self.mask_bytes(1);
        i + 1
    }

    fn preprocessor(&mut self, i: usize) -> usize {
        if self.starts_with_at(i, "/*") {
            self.stack.push(LexState::BlockComment(1));
            self.mask_bytes(2);
            return i + 2;
        }
        if self.starts_with_at(i, "//") {
            self.stack.push(LexState::LineComment);
            self.mask_bytes(2);
            return i + 2;
        }
        self.mask_bytes(1);
        i + 1
    }
}
