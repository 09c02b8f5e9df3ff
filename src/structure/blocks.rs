use super::{BlockKind, SpecialBlock};
use regex::Regex;
use std::sync::LazyLock;

static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|.*\|.*\|").expect("valid table pattern"));

/// Bullet, numbered, letter and parenthesised letter items
static LIST_ITEMS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\s*[-*•]\s+",
        r"^\s*\d+\.\s+",
        r"^\s*[a-z]\)\s+",
        r"^\s*\([a-z]\)\s+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid list pattern"))
    .collect()
});

const CODE_FENCE: &str = "```";

/// Line starts with a bullet, number or letter list marker
pub(crate) fn is_list_item(line: &str) -> bool {
    LIST_ITEMS.iter().any(|p| p.is_match(line))
}

/// Tracks which kind of block the scanner is currently inside
#[derive(Default)]
struct BlockScanner {
    in_code: bool,
    in_table: bool,
    in_list: bool,
    code_start: usize,
    table_start: usize,
    list_start: usize,
    blocks: Vec<SpecialBlock>,
}

impl BlockScanner {
    fn emit(&mut self, kind: BlockKind, start_line: usize, end_line: usize) {
        self.blocks.push(SpecialBlock {
            kind,
            start_line,
            end_line,
        });
    }

    fn close_table(&mut self, line: usize) {
        if self.in_table {
            self.in_table = false;
            self.emit(BlockKind::Table, self.table_start, line);
        }
    }

    fn close_list(&mut self, line: usize) {
        if self.in_list {
            self.in_list = false;
            self.emit(BlockKind::List, self.list_start, line);
        }
    }

    fn feed(&mut self, i: usize, line: &str) {
        if line.contains(CODE_FENCE) {
            if self.in_code {
                self.in_code = false;
                self.emit(BlockKind::Code, self.code_start, i + 1);
            } else {
                self.close_table(i);
                self.close_list(i);
                self.in_code = true;
                self.code_start = i;
            }
            return;
        }

        if self.in_code {
            return;
        }

        if TABLE_ROW.is_match(line) {
            if !self.in_table {
                self.in_table = true;
                self.table_start = i;
            }
        } else {
            self.close_table(i);
        }

        if is_list_item(line) {
            if !self.in_list {
                self.in_list = true;
                self.list_start = i;
            }
        } else if !line.trim().is_empty() {
            self.close_list(i);
        }
    }

    fn finish(mut self, line_count: usize) -> Vec<SpecialBlock> {
        // An unterminated fence is left open
        self.close_table(line_count);
        self.close_list(line_count);
        self.blocks
    }
}

/// Find code fences, pipe tables and lists as line ranges
pub fn detect_special_blocks(text: &str) -> Vec<SpecialBlock> {
    let mut scanner = BlockScanner::default();
    let mut line_count = 0;

    for (i, line) in text.split('\n').enumerate() {
        scanner.feed(i, line);
        line_count = i + 1;
    }

    let mut blocks = scanner.finish(line_count);
    blocks.sort_by_key(|b| (b.start_line, b.end_line));
    blocks
}
