use super::types::{ChunkMetadata, TextChunk, content_hash};
use super::{ChunkError, PARENT_MIN_CHILDREN, PARENT_PREVIEW_CHARS, PARENT_PREVIEW_CHILDREN};
use crate::tokenizer::TokenCounter;
use std::collections::HashMap;
use tracing::debug;

/// Group chunks of large sections under synthesized parent chunks.
///
/// Sections with more than `PARENT_MIN_CHILDREN` chunks get a parent placed
/// right before their first chunk; the children move to level 1. Parents are
/// numbered after the last existing `chunk_index`, in order of appearance.
pub fn build_hierarchy(
    chunks: Vec<TextChunk>,
    counter: &mut TokenCounter<'_>,
) -> Result<Vec<TextChunk>, ChunkError> {
    let sections = group_by_section(&chunks);

    let mut next_index = chunks.iter().map(|c| c.chunk_index + 1).max().unwrap_or(0);
    // Position of the first child -> (parent, child positions)
    let mut parents: HashMap<usize, (TextChunk, Vec<usize>)> = HashMap::new();

    for (title, members) in sections {
        if members.len() <= PARENT_MIN_CHILDREN {
            continue;
        }
        let children: Vec<&TextChunk> = members.iter().map(|&p| &chunks[p]).collect();
        let parent = make_parent(&title, &children, next_index, counter)?;
        debug!(section = %title, children = members.len(), "synthesized parent chunk");
        next_index += 1;
        parents.insert(members[0], (parent, members));
    }

    if parents.is_empty() {
        return Ok(chunks);
    }

    let mut parent_of: HashMap<usize, usize> = HashMap::new();
    for (parent, members) in parents.values() {
        for &pos in members {
            parent_of.insert(pos, parent.chunk_index);
        }
    }

    let mut ordered = Vec::with_capacity(chunks.len() + parents.len());
    for (pos, mut chunk) in chunks.into_iter().enumerate() {
        if let Some((parent, _)) = parents.remove(&pos) {
            ordered.push(parent);
        }
        if let Some(&parent_index) = parent_of.get(&pos) {
            chunk.chunk_level = 1;
            chunk.parent_chunk_id = Some(parent_index);
        }
        ordered.push(chunk);
    }

    Ok(ordered)
}

/// Chunk positions per section title, in order of first appearance
fn group_by_section(chunks: &[TextChunk]) -> Vec<(String, Vec<usize>)> {
    let mut sections: Vec<(String, Vec<usize>)> = Vec::new();
    let mut lookup: HashMap<&str, usize> = HashMap::new();

    for (pos, chunk) in chunks.iter().enumerate() {
        let Some(title) = chunk.section_title.as_deref() else {
            continue;
        };
        let slot = match lookup.get(title) {
            Some(&slot) => slot,
            None => {
                sections.push((title.to_string(), Vec::new()));
                lookup.insert(title, sections.len() - 1);
                sections.len() - 1
            }
        };
        sections[slot].1.push(pos);
    }

    sections
}

fn make_parent(
    title: &str,
    children: &[&TextChunk],
    chunk_index: usize,
    counter: &mut TokenCounter<'_>,
) -> Result<TextChunk, ChunkError> {
    let preview = children
        .iter()
        .take(PARENT_PREVIEW_CHILDREN)
        .map(|c| c.content.chars().take(PARENT_PREVIEW_CHARS).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");
    let content = format!("{preview}...");
    let token_count = counter.count(&content)?;

    let mut metadata = ChunkMetadata::for_content(&content);
    metadata.is_parent = true;
    metadata.child_count = Some(children.len());

    Ok(TextChunk {
        content_hash: content_hash(&content),
        content,
        chunk_index,
        token_count,
        start_char: children.iter().map(|c| c.start_char).min().unwrap_or(0),
        end_char: children.iter().map(|c| c.end_char).max().unwrap_or(0),
        start_page: children.iter().filter_map(|c| c.start_page).min(),
        end_page: children.iter().filter_map(|c| c.end_page).max(),
        section_title: Some(title.to_string()),
        chunk_level: 0,
        parent_chunk_id: None,
        metadata,
        embedding_id: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceTokenizer;

    fn chunk(index: usize, title: Option<&str>, content: &str) -> TextChunk {
        TextChunk {
            content: content.to_string(),
            chunk_index: index,
            token_count: content.split_whitespace().count(),
            start_char: index * 100,
            end_char: index * 100 + 90,
            start_page: Some(index + 1),
            end_page: Some(index + 1),
            section_title: title.map(str::to_string),
            chunk_level: 0,
            parent_chunk_id: None,
            metadata: ChunkMetadata::new(),
            content_hash: content_hash(content),
            embedding_id: None,
        }
    }

    #[test]
    fn test_small_sections_pass_through() {
        let tokenizer = WhitespaceTokenizer;
        let mut counter = TokenCounter::new(&tokenizer);
        let chunks = vec![
            chunk(0, Some("A"), "one"),
            chunk(1, Some("A"), "two"),
            chunk(2, Some("A"), "three"),
            chunk(3, None, "four"),
        ];

        let out = build_hierarchy(chunks.clone(), &mut counter).unwrap();
        assert_eq!(out, chunks);
    }

    #[test]
    fn test_large_section_gets_parent() {
        let tokenizer = WhitespaceTokenizer;
        let mut counter = TokenCounter::new(&tokenizer);
        let chunks = vec![
            chunk(0, None, "preface"),
            chunk(1, Some("Big"), "alpha"),
            chunk(2, Some("Big"), "beta"),
            chunk(3, Some("Big"), "gamma"),
            chunk(4, Some("Big"), "delta"),
            chunk(5, Some("Small"), "epsilon"),
        ];

        let out = build_hierarchy(chunks, &mut counter).unwrap();
        assert_eq!(out.len(), 7);

        let parent = &out[1];
        assert!(parent.metadata.is_parent);
        assert_eq!(parent.chunk_index, 6);
        assert_eq!(parent.content, "alpha beta gamma...");
        assert_eq!(parent.token_count, 3);
        assert_eq!(parent.metadata.child_count, Some(4));
        assert_eq!(parent.start_char, 100);
        assert_eq!(parent.end_char, 490);
        assert_eq!(parent.start_page, Some(2));
        assert_eq!(parent.end_page, Some(5));

        for child in &out[2..6] {
            assert_eq!(child.chunk_level, 1);
            assert_eq!(child.parent_chunk_id, Some(6));
        }
        assert_eq!(out[0].chunk_level, 0);
        assert_eq!(out[6].chunk_level, 0);
        assert_eq!(out[6].parent_chunk_id, None);
    }

    #[test]
    fn test_preview_truncates_children() {
        let tokenizer = WhitespaceTokenizer;
        let mut counter = TokenCounter::new(&tokenizer);
        let long = "word ".repeat(200);
        let chunks: Vec<_> = (0..4).map(|i| chunk(i, Some("Long"), &long)).collect();

        let out = build_hierarchy(chunks, &mut counter).unwrap();
        let parent = &out[0];
        assert!(parent.metadata.is_parent);
        // Three previews of 500 chars, two joining spaces, trailing marker
        assert_eq!(parent.content.chars().count(), 3 * 500 + 2 + 3);
    }

    #[test]
    fn test_split_section_keeps_order() {
        let tokenizer = WhitespaceTokenizer;
        let mut counter = TokenCounter::new(&tokenizer);
        let chunks = vec![
            chunk(0, Some("Notes"), "a"),
            chunk(1, Some("Other"), "b"),
            chunk(2, Some("Notes"), "c"),
            chunk(3, Some("Notes"), "d"),
            chunk(4, Some("Notes"), "e"),
        ];

        let out = build_hierarchy(chunks, &mut counter).unwrap();
        let order: Vec<_> = out.iter().map(|c| c.chunk_index).collect();
        assert_eq!(order, vec![5, 0, 1, 2, 3, 4]);
        assert_eq!(out[2].parent_chunk_id, None);
        assert_eq!(out[3].parent_chunk_id, Some(5));
    }
}
