//! Language Detection Module
//!
//! **Single source of truth** for mapping file paths to analyzers.
//! The scanner, the indexer and the analyzer factory all go through here.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use codetree::analyzer::parser::language::{Language, detect_language};
//!
//! assert_eq!(Language::from_path("src/App.kt"), Language::Kotlin);
//! assert_eq!(detect_language("notes.txt"), None);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Language Metadata Table - Single Source of Truth
// =============================================================================

/// Language metadata entry containing all language-specific information
struct LanguageMeta {
    /// Display name (human-readable)
    display_name: &'static str,
    /// Lowercase identifier used in config and logs
    ident: &'static str,
    /// File extensions that map to this language
    extensions: &'static [&'static str],
    /// Alternative names for parsing from string
    aliases: &'static [&'static str],
}

/// Macro to define language metadata concisely
macro_rules! lang_meta {
    ($display:literal, $ident:literal, [$($ext:literal),*], [$($alias:literal),*]) => {
        LanguageMeta {
            display_name: $display,
            ident: $ident,
            extensions: &[$($ext),*],
            aliases: &[$($alias),*],
        }
    };
}

impl Language {
    /// Get metadata for this language variant
    fn meta(&self) -> LanguageMeta {
        match self {
            Language::Python => lang_meta!("Python", "python", ["py", "pyi", "pyw"], ["python", "py"]),
            Language::Java => lang_meta!("Java", "java", ["java"], ["java"]),
            Language::Kotlin => lang_meta!("Kotlin", "kotlin", ["kt", "kts"], ["kotlin", "kt"]),
            Language::C => lang_meta!("C", "c", ["c", "h"], ["c"]),
            Language::Cpp => lang_meta!("C++", "cpp", ["cpp", "cc", "cxx", "c++", "hpp", "hh", "hxx", "h++"], ["cpp", "c++", "cxx"]),
            Language::Unknown => lang_meta!("Unknown", "text", [], ["unknown", "text", ""]),
        }
    }
}

// =============================================================================
// Language Enum Definition
// =============================================================================

/// Languages with a structural analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    Python,
    Java,
    Kotlin,
    C,
    Cpp,

    #[default]
    Unknown,
}

// =============================================================================
// Language Methods (using metadata table)
// =============================================================================

impl Language {
    /// Display name (human-readable)
    pub fn as_str(&self) -> &'static str {
        self.meta().display_name
    }

    /// Lowercase identifier
    pub fn ident(&self) -> &'static str {
        self.meta().ident
    }

    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        let ext_lower = ext.to_lowercase();

        for lang in Self::all_variants() {
            let meta = lang.meta();
            if meta.extensions.iter().any(|e| *e == ext_lower) {
                return *lang;
            }
        }

        Language::Unknown
    }

    /// Detect language from file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Check if this is a known language (not Unknown)
    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Unknown)
    }

    /// Get all supported language variants for iteration
    pub fn all_variants() -> &'static [Language] {
        &[
            Language::Python,
            Language::Java,
            Language::Kotlin,
            Language::C,
            Language::Cpp,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s_lower = s.to_lowercase();

        for lang in Self::all_variants() {
            let meta = lang.meta();
            if meta.aliases.iter().any(|a| *a == s_lower) {
                return Ok(*lang);
            }
        }

        if s_lower.is_empty() || s_lower == "unknown" || s_lower == "text" {
            return Ok(Language::Unknown);
        }

        Err(())
    }
}

// =============================================================================
// Standalone Functions
// =============================================================================

/// Detect the analyzer language for a path.
///
/// Returns `None` for unsupported files; callers skip them. Pure and
/// infallible.
///
/// ```rust,ignore
/// assert_eq!(detect_language("Main.java"), Some(Language::Java));
/// assert_eq!(detect_language("README.md"), None);
/// ```
pub fn detect_language<P: AsRef<Path>>(path: P) -> Option<Language> {
    let lang = Language::from_path(path);
    lang.is_known().then_some(lang)
}
