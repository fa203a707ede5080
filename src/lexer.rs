//! Delimiter tokenizer for release titles.
//!
//! Splits a raw title into an ordered token sequence on a fixed delimiter
//! class. Token order is the only positional information classifiers get;
//! no case or width normalization happens here.

use once_cell::sync::Lazy;
use regex::Regex;

static SPLIT_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.|\s+|\(|\)|\[|]|-|\+|【|】|/|～|;|&|\||#|_|「|」|（|）|~").unwrap()
});

/// Split `text` into non-empty tokens on the fixed delimiter class.
pub fn tokenize(text: &str) -> Vec<String> {
    SPLIT_CHARS
        .split(text)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Sequential token consumer with one token of lookahead.
///
/// The read index only ever advances; [`TokenCursor::peek`] never moves it
/// and [`TokenCursor::next`] returns `None` exactly once the sequence is
/// exhausted.
#[derive(Debug, Clone)]
pub struct TokenCursor {
    tokens: Vec<String>,
    index: usize,
}

impl TokenCursor {
    /// Tokenize `text` and position the cursor at the first token.
    pub fn new(text: &str) -> Self {
        Self {
            tokens: tokenize(text),
            index: 0,
        }
    }

    /// The next unconsumed token, without advancing.
    pub fn peek(&self) -> Option<&str> {
        self.tokens.get(self.index).map(String::as_str)
    }

    /// Consume and return the next token.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<String> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Total number of tokens in the sequence.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when the input produced no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_name() {
        assert_eq!(
            tokenize("The.Matrix.1999.1080p.BluRay.x264-GROUP"),
            vec!["The", "Matrix", "1999", "1080p", "BluRay", "x264", "GROUP"]
        );
    }

    #[test]
    fn test_mixed_delimiters() {
        assert_eq!(
            tokenize("[SubGroup] 某动画 - 12【1080p】"),
            vec!["SubGroup", "某动画", "12", "1080p"]
        );
    }

    #[test]
    fn test_consecutive_delimiters_drop_empty_fragments() {
        assert_eq!(tokenize("a..b--c  d"), vec!["a", "b", "c", "d"]);
        assert!(tokenize("[]()--").is_empty());
    }

    #[test]
    fn test_cursor_peek_does_not_advance() {
        let mut cursor = TokenCursor::new("a.b");
        assert_eq!(cursor.peek(), Some("a"));
        assert_eq!(cursor.peek(), Some("a"));
        assert_eq!(cursor.next().as_deref(), Some("a"));
        assert_eq!(cursor.peek(), Some("b"));
    }

    #[test]
    fn test_cursor_terminates() {
        let mut cursor = TokenCursor::new("only");
        assert_eq!(cursor.next().as_deref(), Some("only"));
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.peek(), None);
    }
}
