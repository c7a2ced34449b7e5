//! C and C++ structural analyzer.
//!
//! Runs on the masked source from the lexer. In declaration scopes, text
//! accumulates into a statement header until `;` (prototype, field or forward
//! declaration, dropped) or `{`, where the header is classified. Function
//! bodies, enum bodies and opaque blocks are only brace-counted.

use regex::Regex;

use super::lexer::{Dialect, MaskedSource, mask};
use super::scope::{ScopeKind, ScopeStack};
use super::{Analyzer, Language, collapse_whitespace, finish_forest, line_count};
use crate::types::{RawNode, Result, TreeError};

const ANONYMOUS: &str = "<anonymous>";

const TYPE_KEYWORDS: &[&str] = &["class", "struct", "union", "enum"];

/// Specifiers allowed in front of a type keyword.
const TYPE_PREFIXES: &[&str] = &[
    "typedef", "static", "const", "volatile", "extern", "inline", "constexpr", "export",
];

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "do", "else", "return", "sizeof", "decltype",
    "alignas", "static_assert", "__attribute__", "__declspec",
];

const ACCESS_LABELS: &[&str] = &[
    "public", "private", "protected", "signals", "slots", "Q_SIGNALS", "Q_SLOTS",
];

pub struct CFamilyAnalyzer {
    language: Language,
    dialect: Dialect,
    namespace_re: Regex,
    linkage_re: Regex,
}

impl CFamilyAnalyzer {
    pub fn new(language: Language) -> Result<Self> {
        let dialect = match language {
            Language::C => Dialect::C,
            Language::Cpp => Dialect::Cpp,
            other => {
                return Err(TreeError::Config(format!(
                    "{} is not a C-family language",
                    other
                )));
            }
        };
        Ok(Self {
            language,
            dialect,
            namespace_re: compile(r"^(?:inline )?namespace\b(?: ([\w:]+))?$")?,
            linkage_re: compile(r#"^extern ?"[^"]*"$"#)?,
        })
    }

    fn classify(&self, header: &str) -> Classified {
        let text = strip_prefixes(header);
        if text.is_empty() {
            return Classified::Block;
        }
        if let Some(caps) = self.namespace_re.captures(text) {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or(ANONYMOUS);
            return Classified::Namespace(name.to_string());
        }
        if self.linkage_re.is_match(text) {
            return Classified::Linkage;
        }
        if let Some(classified) = type_header(text) {
            return classified;
        }
        match function_name(text) {
            Some(name) => Classified::Function(name),
            None => Classified::Block,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| TreeError::Config(format!("Invalid pattern {}: {}", pattern, e)))
}

impl Analyzer for CFamilyAnalyzer {
    fn analyze(&self, source: &str) -> Result<Vec<RawNode>> {
        let masked = mask(source, self.dialect);
        let mut scanner = Scanner::new(self, source, &masked);
        scanner.run();
        let (forest, balanced) = scanner.scopes.finish(line_count(source));
        finish_forest(forest, source, !balanced, self.language.as_str())
    }

    fn language(&self) -> Language {
        self.language
    }
}

// =============================================================================
// Header classification
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum Classified {
    Namespace(String),
    /// `extern "C" { ... }`
    Linkage,
    Type {
        keyword: &'static str,
        name: String,
        typedef: bool,
    },
    Function(String),
    Block,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_identifier(text: &str) -> bool {
    let mut bytes = text.bytes();
    bytes
        .next()
        .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        && bytes.all(is_name_byte)
}

/// Index just past the group opened at `open`, or `None` when unclosed.
fn skip_group(bytes: &[u8], open: usize, left: u8, right: u8) -> Option<usize> {
    let mut depth = 0i32;
    for (i, b) in bytes.iter().enumerate().skip(open) {
        if *b == left {
            depth += 1;
        } else if *b == right {
            depth -= 1;
            if depth == 0 {
                return Some(i + 1);
            }
        }
    }
    None
}

/// Index of the `<` matching the `>` at `close`.
fn matching_open_angle(bytes: &[u8], close: usize) -> Option<usize> {
    let mut depth = 0i32;
    for i in (0..=close).rev() {
        match bytes[i] {
            b'>' => depth += 1,
            b'<' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drop leading `template<...>`, `[[...]]`, `__attribute__((...))`,
/// `__declspec(...)` and `export` from a collapsed header.
fn strip_prefixes(mut text: &str) -> &str {
    loop {
        text = text.trim_start();
        let bytes = text.as_bytes();
        let skipped = if let Some(rest) = text.strip_prefix("template") {
            let lt = text.len() - rest.trim_start().len();
            if rest.trim_start().starts_with('<') {
                skip_group(bytes, lt, b'<', b'>')
            } else {
                None
            }
        } else if text.starts_with("[[") {
            text.find("]]").map(|i| i + 2)
        } else if text.starts_with("__attribute__") || text.starts_with("__declspec") {
            text.find('(').and_then(|open| skip_group(bytes, open, b'(', b')'))
        } else {
            text.strip_prefix("export ").map(|rest| text.len() - rest.len())
        };
        match skipped {
            Some(end) => text = &text[end..],
            None => return text.trim(),
        }
    }
}

/// First `:` that is not part of a `::`.
fn single_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            if bytes.get(i + 1) == Some(&b':') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Start of a constructor initializer list: a single `:` after the
/// parameter list.
fn init_list_start(text: &str) -> Option<usize> {
    let open = text.find('(')?;
    let close = skip_group(text.as_bytes(), open, b'(', b')')?;
    single_colon(&text[close..]).map(|i| close + i)
}

/// `class|struct|union|enum [class] Name [final] [: bases]`
fn type_header(text: &str) -> Option<Classified> {
    let head = text[..single_colon(text).unwrap_or(text.len())].trim();
    if head.contains('(') || head.contains('=') {
        return None;
    }
    let tokens: Vec<&str> = head.split(' ').collect();
    let pos = tokens.iter().position(|t| TYPE_KEYWORDS.contains(t))?;
    if !tokens[..pos].iter().all(|t| TYPE_PREFIXES.contains(t)) {
        return None;
    }
    let keyword: &'static str = TYPE_KEYWORDS.iter().copied().find(|k| *k == tokens[pos])?;

    let mut rest = &tokens[pos + 1..];
    if keyword == "enum" && rest.first().is_some_and(|t| *t == "class" || *t == "struct") {
        rest = &rest[1..];
    }
    if rest.last() == Some(&"final") {
        rest = &rest[..rest.len() - 1];
    }
    let rest = rest.join(" ");

    Some(Classified::Type {
        keyword,
        name: type_name(&rest).unwrap_or_else(|| ANONYMOUS.to_string()),
        typedef: tokens[..pos].contains(&"typedef"),
    })
}

/// Last name of a type head, keeping template arguments of a specialization.
fn type_name(rest: &str) -> Option<String> {
    let rest = rest.trim();
    if rest.ends_with('>') {
        let lt = matching_open_angle(rest.as_bytes(), rest.len() - 1)?;
        let base = rest[..lt].trim_end().rsplit(' ').next()?;
        return (!base.is_empty()).then(|| format!("{}{}", base, &rest[lt..]));
    }
    let name = rest.rsplit(' ').next()?;
    name.bytes()
        .next()
        .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        .then(|| name.to_string())
}

/// Start of the qualified name (`ns::Type::~name`) ending at `end`.
fn qualified_start(bytes: &[u8], end: usize) -> usize {
    let mut start = end;
    while start > 0 && (is_name_byte(bytes[start - 1]) || matches!(bytes[start - 1], b':' | b'~'))
    {
        start -= 1;
    }
    start
}

/// Whether the keyword `operator` starts at `i`.
fn is_operator_at(bytes: &[u8], i: usize) -> bool {
    bytes[i..].starts_with(b"operator")
        && (i == 0 || !is_name_byte(bytes[i - 1]))
        && !bytes.get(i + 8).copied().is_some_and(is_name_byte)
}

/// Name span `(start, end)` of the function declared by a header.
fn find_call(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut angle = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        if is_operator_at(bytes, i) {
            let mut j = i + 8;
            while bytes.get(j) == Some(&b' ') {
                j += 1;
            }
            if bytes[j..].starts_with(b"()") {
                j += 2;
            }
            let paren = j + bytes[j..].iter().position(|c| *c == b'(')?;
            return Some((qualified_start(bytes, i), paren));
        }
        match b {
            b'<' => angle += 1,
            b'>' if angle > 0 => angle -= 1,
            b'(' if angle == 0 => {
                let mut end = text[..i].trim_end().len();
                // explicit specialization: name<Args>(...)
                if end > 0 && bytes[end - 1] == b'>' {
                    end = matching_open_angle(bytes, end - 1)?;
                }
                return Some((qualified_start(bytes, end), end));
            }
            _ => {}
        }
    }
    None
}

/// `... name(params) [qualifiers] [: init-list]`
fn function_name(text: &str) -> Option<String> {
    let (start, end) = find_call(text)?;
    if start >= end || text[..start].contains('=') {
        return None;
    }
    let raw = text[start..end].trim();
    let operator = (0..raw.len()).find(|at| is_operator_at(raw.as_bytes(), *at));
    let name = match operator {
        Some(at) => {
            let op = raw[at + 8..].trim();
            let sep = if op.starts_with(|c: char| c.is_ascii_alphabetic()) {
                " "
            } else {
                ""
            };
            format!("{}operator{}{}", &raw[..at], sep, op.replace(' ', ""))
        }
        None => raw.to_string(),
    };

    let last = name.rsplit("::").next().unwrap_or(&name);
    let last = last.trim_start_matches('~');
    if last.is_empty()
        || last.starts_with(|c: char| c.is_ascii_digit())
        || CONTROL_KEYWORDS.contains(&last)
    {
        return None;
    }
    Some(name)
}

// =============================================================================
// Scanner
// =============================================================================

struct Header {
    start: usize,
    line: usize,
}

struct Scanner<'a> {
    analyzer: &'a CFamilyAnalyzer,
    source: &'a str,
    masked: &'a MaskedSource,
    scopes: ScopeStack,
    header: Option<Header>,
    parens: i32,
    /// Braces inside a header: brace-init members, lambdas in arguments
    inline_braces: i32,
    /// Depths of open anonymous `typedef struct { ... }` bodies
    typedef_depths: Vec<usize>,
    typedef_pending: bool,
}

impl<'a> Scanner<'a> {
    fn new(analyzer: &'a CFamilyAnalyzer, source: &'a str, masked: &'a MaskedSource) -> Self {
        Self {
            analyzer,
            source,
            masked,
            scopes: ScopeStack::new(),
            header: None,
            parens: 0,
            inline_braces: 0,
            typedef_depths: Vec::new(),
            typedef_pending: false,
        }
    }

    fn masked_text(&self, start: usize, end: usize) -> &'a str {
        let masked: &'a MaskedSource = self.masked;
        masked.text.get(start..end).unwrap_or("")
    }

    /// Original source between two offsets, cut where the masked text ends.
    fn source_text(&self, start: usize, end: usize) -> String {
        let end = start + self.masked_text(start, end).trim_end().len();
        collapse_whitespace(self.source.get(start..end).unwrap_or(""))
    }

    fn run(&mut self) {
        let masked: &'a MaskedSource = self.masked;
        let bytes = masked.text.as_bytes();
        let mut line = 1;

        for (offset, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                line += 1;
                continue;
            }

            if !self.scopes.current().allows_declarations() {
                match b {
                    b'{' => self.scopes.push(ScopeKind::Block, None),
                    b'}' => self.close(line),
                    _ => {}
                }
                continue;
            }

            if b.is_ascii_whitespace() {
                continue;
            }
            if self.header.is_none() {
                self.header = Some(Header {
                    start: offset,
                    line,
                });
            }

            let top_level = self.parens == 0 && self.inline_braces == 0;
            match b {
                b'(' => self.parens += 1,
                b')' => self.parens = (self.parens - 1).max(0),
                b'{' if !top_level || self.brace_initializer(offset) => self.inline_braces += 1,
                b'{' => self.open(offset),
                b'}' if self.inline_braces > 0 => self.inline_braces -= 1,
                b'}' => self.close(line),
                b';' if top_level => self.end_statement(offset),
                b':' if top_level && self.is_access_label(offset) => self.reset(),
                _ => {}
            }
        }
    }

    fn reset(&mut self) {
        self.header = None;
        self.parens = 0;
        self.inline_braces = 0;
    }

    fn header_so_far(&self, offset: usize) -> &'a str {
        match &self.header {
            Some(header) => self.masked_text(header.start, offset),
            None => "",
        }
    }

    /// `public:`, `private slots:` and friends.
    fn is_access_label(&self, offset: usize) -> bool {
        let bytes = self.masked.text.as_bytes();
        if bytes.get(offset + 1) == Some(&b':') || (offset > 0 && bytes[offset - 1] == b':') {
            return false;
        }
        let text = self.header_so_far(offset);
        text.split_whitespace()
            .last()
            .is_some_and(|last| ACCESS_LABELS.contains(&last))
    }

    /// `{` of a brace-initialized member in a constructor initializer list.
    fn brace_initializer(&self, offset: usize) -> bool {
        let text = self.header_so_far(offset).trim_end();
        let ends_with_name = text
            .bytes()
            .last()
            .is_some_and(|b| is_name_byte(b) || b == b'>');
        ends_with_name && init_list_start(text).is_some()
    }

    fn end_statement(&mut self, offset: usize) {
        if std::mem::take(&mut self.typedef_pending) {
            let alias = self
                .header_so_far(offset)
                .split(',')
                .next()
                .unwrap_or("")
                .trim()
                .trim_start_matches('*')
                .trim();
            if is_identifier(alias)
                && let Some(node) = self.scopes.last_attached_mut()
            {
                node.title = alias.to_string();
            }
        }
        self.reset();
    }

    fn open(&mut self, offset: usize) {
        self.typedef_pending = false;
        let Some(header) = self.header.take() else {
            self.scopes.push(ScopeKind::Block, None);
            return;
        };
        let raw = self.masked_text(header.start, offset);
        let classified = self.analyzer.classify(&collapse_whitespace(raw));
        let docstring = self.masked.doc_above(header.line);

        match classified {
            Classified::Block => self.scopes.push(ScopeKind::Block, None),
            Classified::Linkage => self.scopes.push(ScopeKind::Linkage, None),
            Classified::Namespace(name) => {
                let node = RawNode::new("namespace", name, header.line)
                    .with_signature(self.source_text(header.start, offset))
                    .with_docstring(docstring);
                self.scopes.push(ScopeKind::Namespace, Some(node));
            }
            Classified::Type {
                keyword,
                name,
                typedef,
            } => {
                let anonymous = name == ANONYMOUS;
                let node = RawNode::new(keyword, name, header.line)
                    .with_signature(self.source_text(header.start, offset))
                    .with_docstring(docstring);
                let kind = if keyword == "enum" {
                    ScopeKind::Block
                } else {
                    ScopeKind::ClassBody
                };
                self.scopes.push(kind, Some(node));
                if typedef && anonymous {
                    self.typedef_depths.push(self.scopes.depth());
                }
            }
            Classified::Function(name) => {
                let end = init_list_start(raw)
                    .map(|i| header.start + i)
                    .unwrap_or(offset);
                let node = RawNode::new("function", name, header.line)
                    .with_signature(self.source_text(header.start, end))
                    .with_docstring(docstring);
                self.scopes.push(ScopeKind::FunctionBody, Some(node));
            }
        }
        self.reset();
    }

    fn close(&mut self, line: usize) {
        if self.typedef_depths.last() == Some(&self.scopes.depth()) {
            self.typedef_depths.pop();
            self.typedef_pending = true;
        }
        self.scopes.pop(line);
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE_CPP: &str = r#"#include <iostream>
#include <vector>
#include <string>

namespace MyLib {

class Calculator {
public:
  int add(int a, int b) { return a + b; }
};

struct Vector {
  float x, y, z;
};

} // namespace MyLib

int main() {
  MyLib::Calculator calc;
  std::cout << calc.add(1, 2) << std::endl;
  return 0;
}
"#;

    const SAMPLE_C: &str = r#"#include <stdio.h>
#define MAX(a, b) ((a) > (b) ? (a) : (b))

/** Greets. */
void greet(const char *name)
{
    printf("Hello {%s}\n", name);
}

typedef struct {
    int x, y;
} Point;

struct Node {
    struct Node *next;
};

int main(void) {
    greet("world");
    return 0;
}
"#;

    fn cpp(source: &str) -> Vec<RawNode> {
        CFamilyAnalyzer::new(Language::Cpp)
            .unwrap()
            .analyze(source)
            .unwrap()
    }

    fn c(source: &str) -> Vec<RawNode> {
        CFamilyAnalyzer::new(Language::C)
            .unwrap()
            .analyze(source)
            .unwrap()
    }

    fn span(node: &RawNode) -> (usize, usize) {
        (node.start_line, node.end_line)
    }

    fn titles(nodes: &[RawNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn test_rejects_other_languages() {
        assert!(CFamilyAnalyzer::new(Language::Kotlin).is_err());
        let analyzer = CFamilyAnalyzer::new(Language::Cpp).unwrap();
        assert_eq!(analyzer.language(), Language::Cpp);
    }

    #[test]
    fn test_cpp_namespace_and_classes() {
        let forest = cpp(SAMPLE_CPP);
        assert_eq!(titles(&forest), vec!["MyLib", "main"]);

        let ns = &forest[0];
        assert_eq!(ns.keyword, "namespace");
        assert_eq!(span(ns), (5, 16));
        assert_eq!(ns.signature.as_deref(), Some("namespace MyLib"));
        assert_eq!(titles(&ns.children), vec!["Calculator", "Vector"]);

        let calc = &ns.children[0];
        assert_eq!(calc.keyword, "class");
        assert_eq!(span(calc), (7, 10));
        assert_eq!(calc.children.len(), 1);
        assert_eq!(calc.children[0].title, "add");
        assert_eq!(calc.children[0].keyword, "function");
        assert_eq!(span(&calc.children[0]), (9, 9));
        assert_eq!(
            calc.children[0].signature.as_deref(),
            Some("int add(int a, int b)")
        );

        assert_eq!(ns.children[1].keyword, "struct");
        assert_eq!(span(&ns.children[1]), (12, 14));
        assert!(ns.children[1].children.is_empty());

        assert_eq!(span(&forest[1]), (18, 22));
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn test_c_functions_typedefs_and_docs() {
        let forest = c(SAMPLE_C);
        assert_eq!(titles(&forest), vec!["greet", "Point", "Node", "main"]);

        assert_eq!(span(&forest[0]), (5, 8));
        assert_eq!(forest[0].docstring.as_deref(), Some("Greets."));
        assert_eq!(
            forest[0].signature.as_deref(),
            Some("void greet(const char *name)")
        );

        assert_eq!(forest[1].keyword, "struct");
        assert_eq!(span(&forest[1]), (10, 12));
        assert_eq!(span(&forest[2]), (14, 16));
        assert_eq!(span(&forest[3]), (18, 21));
        assert!(forest[3].docstring.is_none());
    }

    #[test]
    fn test_braces_in_literals_do_not_count() {
        let source = r#"const char *s = "{";
char c = '}';
auto r = R"x(}{)x";
// {
/* } */
void after() {}
"#;
        let forest = cpp(source);
        assert_eq!(titles(&forest), vec!["after"]);
        assert_eq!(span(&forest[0]), (6, 6));
    }

    #[test]
    fn test_extern_c_is_transparent() {
        let source = "extern \"C\" {\nint c_api(int x) { return x; }\n}\n";
        let forest = cpp(source);
        assert_eq!(titles(&forest), vec!["c_api"]);
        assert_eq!(span(&forest[0]), (2, 2));
    }

    #[test]
    fn test_templates() {
        let source = r#"template <typename T>
T max_of(T a, T b) {
    return a > b ? a : b;
}
template <typename K, typename V>
class Cache final : public Base<K> {
};
template <>
struct hash<Widget> {
};
"#;
        let forest = cpp(source);
        assert_eq!(titles(&forest), vec!["max_of", "Cache", "hash<Widget>"]);
        assert_eq!(span(&forest[0]), (1, 4));
        assert_eq!(
            forest[0].signature.as_deref(),
            Some("template <typename T> T max_of(T a, T b)")
        );
        assert_eq!(forest[1].keyword, "class");
        assert_eq!(span(&forest[1]), (5, 7));
    }

    #[test]
    fn test_class_members() {
        let source = r#"class Widget {
public:
    Widget(int w) : width_{w}, height_(0) {
        resize();
    }
    ~Widget() {}
    bool operator==(const Widget &other) const { return width_ == other.width_; }
    int operator()(int x) { return x; }
private:
    int width_{0};
    int height_;
};
"#;
        let forest = cpp(source);
        assert_eq!(forest.len(), 1);
        let widget = &forest[0];
        assert_eq!(
            titles(&widget.children),
            vec!["Widget", "~Widget", "operator==", "operator()"]
        );
        assert_eq!(span(&widget.children[0]), (3, 5));
        assert_eq!(
            widget.children[0].signature.as_deref(),
            Some("Widget(int w)")
        );
        assert_eq!(span(&widget.children[1]), (6, 6));
        assert_eq!(span(widget), (1, 12));
    }

    #[test]
    fn test_namespaces_and_out_of_line_definitions() {
        let source = r#"namespace a::b {
namespace {
/// Internal helper.
/// Second line.
int Foo::bar(int x) const {
    return x;
}
}
inline namespace v1 {
struct P { int get() const { return 1; } };
}
}
"#;
        let forest = cpp(source);
        assert_eq!(titles(&forest), vec!["a::b"]);
        let outer = &forest[0];
        assert_eq!(titles(&outer.children), vec![ANONYMOUS, "v1"]);

        let bar = &outer.children[0].children[0];
        assert_eq!(bar.title, "Foo::bar");
        assert_eq!(span(bar), (5, 7));
        assert_eq!(bar.docstring.as_deref(), Some("Internal helper.\nSecond line."));

        let p = &outer.children[1].children[0];
        assert_eq!(p.title, "P");
        assert_eq!(titles(&p.children), vec!["get"]);
    }

    #[test]
    fn test_enums_are_leaves() {
        let source = "enum class Color : unsigned char { Red, Green };\nenum Mode {\n    ON,\n    OFF\n};\n";
        let forest = cpp(source);
        assert_eq!(titles(&forest), vec!["Color", "Mode"]);
        assert!(forest.iter().all(|n| n.keyword == "enum" && n.children.is_empty()));
        assert_eq!(span(&forest[1]), (2, 5));
    }

    #[test]
    fn test_opaque_blocks_and_declarations() {
        let source = r#"int table[] = { 1, 2, { 3 } };
struct Point origin = { 0, 0 };
class Forward;
int prototype(int x);
static int counter{0};
void real() {}
"#;
        let forest = cpp(source);
        assert_eq!(titles(&forest), vec!["real"]);
        assert_eq!(span(&forest[0]), (6, 6));
    }

    #[test]
    fn test_unbalanced_input() {
        let analyzer = CFamilyAnalyzer::new(Language::Cpp).unwrap();
        assert!(analyzer.analyze("}}}\n").is_err());

        let forest = analyzer.analyze("class A {\n  void f() {\n").unwrap();
        assert_eq!(titles(&forest), vec!["A"]);
        assert_eq!(span(&forest[0]), (1, 2));
        assert_eq!(forest[0].children[0].title, "f");

        assert!(analyzer.analyze("").unwrap().is_empty());
    }

    #[test]
    fn test_function_name() {
        assert_eq!(function_name("static int *make_list(void)").as_deref(), Some("make_list"));
        assert_eq!(function_name("if (x)"), None);
        assert_eq!(function_name("int x = compute(1)"), None);
        assert_eq!(function_name("__attribute__((unused))"), None);
        assert_eq!(
            function_name("Foo &Foo::operator<<(int x)").as_deref(),
            Some("Foo::operator<<")
        );
        assert_eq!(
            function_name("void *operator new(size_t n)").as_deref(),
            Some("operator new")
        );
        assert_eq!(function_name("void swap<Foo>(Foo &a, Foo &b)").as_deref(), Some("swap"));
    }

    #[test]
    fn test_strip_prefixes() {
        assert_eq!(strip_prefixes("template <typename T> class A"), "class A");
        assert_eq!(strip_prefixes("[[nodiscard]] int f()"), "int f()");
        assert_eq!(
            strip_prefixes("__attribute__((visibility(\"default\"))) void g()"),
            "void g()"
        );
        assert_eq!(strip_prefixes("templated_thing x"), "templated_thing x");
    }

    #[test]
    fn test_idempotent() {
        assert_eq!(cpp(SAMPLE_CPP), cpp(SAMPLE_CPP));
        assert_eq!(c(SAMPLE_C), c(SAMPLE_C));
    }

    fn check_spans(nodes: &[RawNode], lo: usize, hi: usize) {
        for node in nodes {
            assert!(lo <= node.start_line && node.start_line <= node.end_line);
            assert!(node.end_line <= hi);
            check_spans(&node.children, node.start_line, node.end_line);
        }
    }

    proptest! {
        #[test]
        fn prop_spans_are_nested(parts in proptest::collection::vec(
            prop_oneof![
                Just("namespace n {\n"),
                Just("class A {\n"),
                Just("public:\n"),
                Just("};\n"),
                Just("}\n"),
                Just("int f(int x) {\n"),
                Just("const char *s = \"{\";\n"),
                Just("// }\n"),
                Just("#define X {\n"),
                Just("typedef struct {\n"),
                Just("} T;\n"),
                Just("\n"),
            ],
            0..30,
        )) {
            let source: String = parts.concat();
            if let Ok(forest) = CFamilyAnalyzer::new(Language::Cpp).unwrap().analyze(&source) {
                check_spans(&forest, 1, line_count(&source));
            }
        }
    }
}
