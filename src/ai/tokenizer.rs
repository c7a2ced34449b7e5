//! Token Estimation
//!
//! Approximate token counts for deciding which nodes get a local summary
//! and which subtrees are small enough to thin. No model tokenizer is
//! loaded; the estimate only needs to be stable and roughly proportional.

/// Code-aware token counter for summary and thinning thresholds
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCounter;

impl TokenCounter {
    /// Estimate token count for a string; empty text counts as zero.
    pub fn count(&self, text: &str) -> usize {
        if text.trim().is_empty() {
            return 0;
        }
        self.count_code_aware(text)
    }

    /// Punctuation and operators count as one token each, identifiers by
    /// length.
    fn count_code_aware(&self, text: &str) -> usize {
        let mut tokens = 0;
        let mut word_len = 0;

        for ch in text.chars() {
            match ch {
                '(' | ')' | '{' | '}' | '[' | ']' | ';' | ':' | ',' | '.' | '+' | '-' | '*'
                | '/' | '=' | '<' | '>' | '!' | '&' | '|' | '@' | '#' | '$' | '%' | '^' | '~'
                | '?' | '\\' | '"' | '\'' => {
                    tokens += estimate_word_tokens(word_len);
                    word_len = 0;
                    tokens += 1;
                }
                c if c.is_whitespace() => {
                    tokens += estimate_word_tokens(word_len);
                    word_len = 0;
                }
                c => word_len += c.len_utf8(),
            }
        }
        tokens += estimate_word_tokens(word_len);

        tokens.max(1)
    }

    /// Whether the text stays strictly below `threshold` tokens.
    pub fn is_below(&self, text: &str, threshold: usize) -> bool {
        self.count(text) < threshold
    }
}

/// Tokens for a single word of `len` bytes
fn estimate_word_tokens(len: usize) -> usize {
    match len {
        0 => 0,
        1..=4 => 1,
        5..=8 => 2,
        _ => len.div_ceil(4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_aware_counting() {
        let counter = TokenCounter::default();

        let simple = "def main(): pass";
        let tokens = counter.count(simple);
        assert!(tokens > 0 && tokens <= 10);

        let complex = r#"
            public int calculate(int value) throws InvalidException {
                if (value < 0) {
                    throw new InvalidException("negative");
                }
                return value * 2;
            }
        "#;
        assert!(counter.count(complex) > tokens);
    }

    #[test]
    fn test_empty_text_is_zero() {
        let counter = TokenCounter::default();
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("  \n"), 0);
        assert!(counter.is_below("", 1));
        assert!(!counter.is_below("x", 1));
    }
}
