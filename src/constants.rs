//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Indexing constants
pub mod index {
    /// Maximum file size to analyze (1 MiB)
    pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

    /// Token threshold below which class/function subtrees are merged
    pub const THINNING_THRESHOLD: usize = 5000;

    /// Directory names never descended into
    pub const SKIP_DIRS: &[&str] = &[
        "__pycache__",
        "node_modules",
        "venv",
        ".venv",
        "env",
        "target",
        "build",
        "out",
        ".git",
    ];

    /// Width of the zero-padded preorder node id
    pub const NODE_ID_WIDTH: usize = 4;
}

/// Summary annotation constants
pub mod summary {
    /// Default model for the remote summarizer
    pub const DEFAULT_MODEL: &str = "gpt-4o-2024-11-20";

    /// Nodes below this many tokens get a local summary
    pub const TOKEN_THRESHOLD: usize = 200;

    /// Characters of node text kept in a local summary
    pub const LOCAL_SUMMARY_CHARS: usize = 200;

    /// Characters of code included in a summary prompt
    pub const PROMPT_CODE_CHARS: usize = 3000;

    /// Maximum concurrent summarizer calls
    pub const MAX_CONCURRENCY: usize = 8;

    /// Retries for recoverable summarizer failures
    pub const MAX_RETRIES: usize = 2;

    /// Node kinds summarized by default
    pub const NODE_TYPES: &[&str] = &["class", "interface", "enum", "function", "method", "file"];
}

/// Retry constants
pub mod retry {
    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}

/// Output constants
pub mod output {
    /// Default output directory
    pub const DEFAULT_DIR: &str = "results";

    /// Suffix of the written document file
    pub const FILE_SUFFIX: &str = "_code_structure.json";
}
