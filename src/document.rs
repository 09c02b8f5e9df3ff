use serde::{Deserialize, Serialize};

/// Separator placed between page texts when a document is assembled
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Extracted document text with the byte offsets where pages end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    /// Offset of the end of every page but the last, ascending
    pub page_breaks: Vec<usize>,
}

impl Document {
    pub fn new(text: impl Into<String>, page_breaks: Vec<usize>) -> Self {
        Self {
            text: text.into(),
            page_breaks,
        }
    }

    /// Join per-page text, recording a break at the end of each page's text.
    ///
    /// The separator after a page belongs to the following page.
    pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Self {
        let mut text = String::new();
        let mut page_breaks = Vec::with_capacity(pages.len().saturating_sub(1));

        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                page_breaks.push(text.len());
                text.push_str(PAGE_SEPARATOR);
            }
            text.push_str(page.as_ref());
        }

        Self { text, page_breaks }
    }

    pub fn page_count(&self) -> usize {
        if self.text.is_empty() {
            0
        } else {
            self.page_breaks.len() + 1
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
