use std::collections::HashMap;
use thiserror::Error;

/// Failure reported by an injected tokenizer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("tokenizer '{model}' failed: {reason}")]
pub struct TokenizerError {
    pub model: String,
    pub reason: String,
}

impl TokenizerError {
    pub fn new(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

/// Converts text into a token count.
///
/// Implementations must be deterministic: the same text always yields the
/// same count for a given model. They are shared across worker threads when
/// documents are chunked in parallel, hence the `Send + Sync` bound.
pub trait Tokenizer: Send + Sync {
    /// Identifier of the encoding this tokenizer models
    fn model(&self) -> &str;

    /// Count the tokens in `text`
    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError>;
}

/// Estimates tokens as one token per 4 bytes of text
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenizer;

impl Tokenizer for HeuristicTokenizer {
    fn model(&self) -> &str {
        "heuristic-4b"
    }

    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        if text.is_empty() {
            return Ok(0);
        }
        // Average token is ~4 characters for English text
        Ok((text.len() / 4).max(1))
    }
}

/// Counts whitespace-separated words.
///
/// Counting is additive over space-joined text, which makes window budgets exact.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn model(&self) -> &str {
        "whitespace"
    }

    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(text.split_whitespace().count())
    }
}

/// Per-call memo in front of a tokenizer
pub struct TokenCounter<'a> {
    tokenizer: &'a dyn Tokenizer,
    cache: HashMap<String, usize>,
}

impl<'a> TokenCounter<'a> {
    pub fn new(tokenizer: &'a dyn Tokenizer) -> Self {
        Self {
            tokenizer,
            cache: HashMap::new(),
        }
    }

    pub fn count(&mut self, text: &str) -> Result<usize, TokenizerError> {
        if let Some(&tokens) = self.cache.get(text) {
            return Ok(tokens);
        }
        let tokens = self.tokenizer.count_tokens(text)?;
        self.cache.insert(text.to_string(), tokens);
        Ok(tokens)
    }

    /// Number of distinct texts counted so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
