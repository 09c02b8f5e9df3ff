use super::{StructuralElement, StructureKind};
use regex::Regex;
use std::sync::LazyLock;

struct HeadingRule {
    pattern: Regex,
    kind: StructureKind,
    level: u8,
}

impl HeadingRule {
    fn new(pattern: &str, kind: StructureKind, level: u8) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("valid heading pattern"),
            kind,
            level,
        }
    }
}

/// Heading rules in priority order; the first match on a line wins.
///
/// Structural markers come before the title heuristics so numbered or
/// keyword headings are never reported as plain titles. Keywords match in
/// any case; the title heuristics are case-sensitive.
static HEADING_RULES: LazyLock<Vec<HeadingRule>> = LazyLock::new(|| {
    use StructureKind::*;
    vec![
        // Chapters
        HeadingRule::new(r"(?i)^chapter\s+\d+[\s:.-]*(.*)$", Chapter, 1),
        HeadingRule::new(r"^제\s*\d+\s*장[\s:.-]*(.*)$", Chapter, 1),
        // Sections
        HeadingRule::new(r"(?i)^section\s+\d+[.\d]*[\s:.-]*(.*)$", Section, 2),
        HeadingRule::new(r"^\d+\.\s+(.*)$", Section, 2),
        HeadingRule::new(r"^\d+\.\d+\s+(.*)$", Subsection, 3),
        // Markdown
        HeadingRule::new(r"^#\s+(.*)$", H1, 1),
        HeadingRule::new(r"^##\s+(.*)$", H2, 2),
        HeadingRule::new(r"^###\s+(.*)$", H3, 3),
        HeadingRule::new(r"^####\s+(.*)$", H4, 4),
        // Titles
        HeadingRule::new(r"^([A-Z][A-Z\s]{4,})$", Title, 2),
        HeadingRule::new(r"^([A-Z][a-z]+(?:\s+[A-Z][a-z]+){2,})$", Title, 2),
    ]
});

/// Scan the text line by line and report every heading found
pub fn extract_structure(text: &str) -> Vec<StructuralElement> {
    let mut elements = Vec::new();
    let mut offset = 0;

    for (line_number, raw_line) in text.split('\n').enumerate() {
        let line_start = offset;
        offset += raw_line.len() + 1;

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(element) = classify_line(line, line_number, line_start) {
            elements.push(element);
        }
    }

    elements
}

fn classify_line(line: &str, line_number: usize, char_offset: usize) -> Option<StructuralElement> {
    HEADING_RULES.iter().find_map(|rule| {
        let captures = rule.pattern.captures(line)?;
        let title = captures
            .get(1)
            .map(|m| m.as_str().trim())
            .filter(|t| !t.is_empty())
            .unwrap_or(line);

        Some(StructuralElement {
            line_number,
            char_offset,
            kind: rule.kind,
            level: rule.level,
            title: title.to_string(),
        })
    })
}
