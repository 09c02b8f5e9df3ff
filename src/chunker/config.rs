use super::ChunkError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Token budgets and switches for one chunking pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Windows reaching this size may close at a good break point
    pub min_tokens: usize,
    /// Hard ceiling for a window, except for a single oversized sentence
    pub max_tokens: usize,
    /// Budget of trailing sentences carried into the next window
    pub overlap_tokens: usize,
    /// Split on sentences; when false, windows are built from words
    pub respect_sentence_boundaries: bool,
    /// Treat blank lines as good break points
    pub respect_paragraph_boundaries: bool,
    /// Detect headings for section titles and hierarchy
    pub detect_structure: bool,
    /// Drop chunks whose content hash was already emitted
    pub enable_deduplication: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            min_tokens: 1000,
            max_tokens: 2000,
            overlap_tokens: 200,
            respect_sentence_boundaries: true,
            respect_paragraph_boundaries: true,
            detect_structure: true,
            enable_deduplication: true,
        }
    }
}

impl ChunkConfig {
    /// Set the token budgets
    pub fn with_tokens(mut self, min_tokens: usize, max_tokens: usize, overlap_tokens: usize) -> Self {
        self.min_tokens = min_tokens;
        self.max_tokens = max_tokens;
        self.overlap_tokens = overlap_tokens;
        self
    }

    pub fn detect_structure(mut self, enabled: bool) -> Self {
        self.detect_structure = enabled;
        self
    }

    pub fn enable_deduplication(mut self, enabled: bool) -> Self {
        self.enable_deduplication = enabled;
        self
    }

    /// Check the budget invariants
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.min_tokens == 0 {
            return Err(ChunkError::InvalidConfig(
                "min_tokens must be positive".to_string(),
            ));
        }
        if self.min_tokens >= self.max_tokens {
            return Err(ChunkError::InvalidConfig(format!(
                "min_tokens ({}) must be less than max_tokens ({})",
                self.min_tokens, self.max_tokens
            )));
        }
        if self.overlap_tokens >= self.max_tokens {
            return Err(ChunkError::InvalidConfig(format!(
                "overlap_tokens ({}) must be less than max_tokens ({})",
                self.overlap_tokens, self.max_tokens
            )));
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys take their defaults.
    ///
    /// Budgets are not validated here so callers can overlay overrides first;
    /// `SemanticChunker::new` validates the final config.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).context("Failed to parse chunker config")?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .context(format!("Failed to read config: {}", path.display()))?;
        Self::from_toml_str(&source).context(format!("Invalid config: {}", path.display()))
    }
}
