mod blocks;
mod headings;


pub use blocks::detect_special_blocks;
pub(crate) use blocks::is_list_item;
pub use headings::extract_structure;

use serde::{Deserialize, Serialize};

/// Classification of a heading line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    Chapter,
    Section,
    Subsection,
    H1,
    H2,
    H3,
    H4,
    Title,
}

/// A heading detected in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralElement {
    /// Zero-based line number of the heading
    pub line_number: usize,
    /// Byte offset where the heading line starts
    pub char_offset: usize,
    pub kind: StructureKind,
    /// Informational nesting depth, never used for token limits
    pub level: u8,
    pub title: String,
}

/// Kind of region the chunker should avoid cutting through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Code,
    Table,
    List,
}

/// A line range `[start_line, end_line)` covered by a code fence, table or list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialBlock {
    pub kind: BlockKind,
    pub start_line: usize,
    pub end_line: usize,
}

impl SpecialBlock {
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line < self.end_line
    }
}
