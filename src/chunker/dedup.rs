use super::types::TextChunk;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Keep the first chunk for every content hash.
///
/// The seen-set lives only for this call. Children of a dropped parent are
/// re-pointed at the surviving parent with the same content; when the parent
/// duplicated a regular chunk instead, its children return to the top level.
pub fn deduplicate(chunks: Vec<TextChunk>) -> Vec<TextChunk> {
    let total = chunks.len();
    // hash -> (chunk_index, is_parent) of the first occurrence
    let mut seen: HashMap<String, (usize, bool)> = HashMap::new();
    let mut redirects: HashMap<usize, usize> = HashMap::new();
    let mut orphaned: HashSet<usize> = HashSet::new();
    let mut unique = Vec::with_capacity(total);

    for chunk in chunks {
        match seen.get(&chunk.content_hash) {
            Some(&(kept_index, kept_is_parent)) => {
                if chunk.metadata.is_parent {
                    if kept_is_parent {
                        redirects.insert(chunk.chunk_index, kept_index);
                    } else {
                        orphaned.insert(chunk.chunk_index);
                    }
                }
                debug!(hash = %chunk.content_hash, "Removed duplicate chunk");
            }
            None => {
                seen.insert(
                    chunk.content_hash.clone(),
                    (chunk.chunk_index, chunk.metadata.is_parent),
                );
                unique.push(chunk);
            }
        }
    }

    let removed = total - unique.len();
    if removed > 0 {
        info!("Removed {} duplicate chunks", removed);
        relink_children(&mut unique, &redirects, &orphaned);
    }

    unique
}

fn relink_children(
    chunks: &mut [TextChunk],
    redirects: &HashMap<usize, usize>,
    orphaned: &HashSet<usize>,
) {
    for chunk in chunks.iter_mut() {
        let Some(parent) = chunk.parent_chunk_id else {
            continue;
        };
        if let Some(&kept) = redirects.get(&parent) {
            chunk.parent_chunk_id = Some(kept);
        } else if orphaned.contains(&parent) {
            chunk.parent_chunk_id = None;
            chunk.chunk_level = 0;
        }
    }

    recount_children(chunks);
}

/// Set every parent's `child_count` from the chunks that point at it
pub(super) fn recount_children(chunks: &mut [TextChunk]) {
    let mut child_counts: HashMap<usize, usize> = HashMap::new();
    for parent in chunks.iter().filter_map(|c| c.parent_chunk_id) {
        *child_counts.entry(parent).or_default() += 1;
    }

    for chunk in chunks.iter_mut().filter(|c| c.metadata.is_parent) {
        chunk.metadata.child_count = Some(child_counts.get(&chunk.chunk_index).copied().unwrap_or(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::types::{ChunkMetadata, content_hash};

    fn chunk(index: usize, content: &str) -> TextChunk {
        TextChunk {
            content: content.to_string(),
            chunk_index: index,
            token_count: 1,
            start_char: 0,
            end_char: content.len(),
            start_page: None,
            end_page: None,
            section_title: None,
            chunk_level: 0,
            parent_chunk_id: None,
            metadata: ChunkMetadata::new(),
            content_hash: content_hash(content),
            embedding_id: None,
        }
    }

    fn parent(index: usize, content: &str, child_count: usize) -> TextChunk {
        let mut c = chunk(index, content);
        c.metadata.is_parent = true;
        c.metadata.child_count = Some(child_count);
        c
    }

    fn child(index: usize, content: &str, parent: usize) -> TextChunk {
        let mut c = chunk(index, content);
        c.chunk_level = 1;
        c.parent_chunk_id = Some(parent);
        c
    }

    #[test]
    fn test_keeps_first_occurrence() {
        let chunks = vec![chunk(0, "a"), chunk(1, "b"), chunk(2, "a"), chunk(3, "c")];
        let out = deduplicate(chunks);

        let indices: Vec<_> = out.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
    }

    #[test]
    fn test_idempotent() {
        let chunks = vec![chunk(0, "x"), chunk(1, "x"), chunk(2, "y"), chunk(3, "y")];
        let once = deduplicate(chunks);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_dropped_parent_children_are_relinked() {
        let chunks = vec![
            parent(10, "summary", 2),
            child(0, "one", 10),
            child(1, "two", 10),
            parent(11, "summary", 2),
            child(2, "three", 11),
            child(3, "one", 11),
        ];

        let out = deduplicate(chunks);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|c| matches!(c.parent_chunk_id, None | Some(10))));
        assert_eq!(out[0].metadata.child_count, Some(3));
    }

    #[test]
    fn test_parent_matching_regular_chunk_is_dropped() {
        let chunks = vec![
            chunk(0, "summary"),
            parent(10, "summary", 2),
            child(1, "one", 10),
            child(2, "two", 10),
        ];

        let out = deduplicate(chunks);
        let indices: Vec<_> = out.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(out.iter().all(|c| c.chunk_level == 0 && c.parent_chunk_id.is_none()));
        assert!(out.iter().all(|c| !c.metadata.is_parent));

        let mut hashes: Vec<_> = out.iter().map(|c| c.content_hash.as_str()).collect();
        hashes.sort();
        hashes.dedup();
        assert_eq!(hashes.len(), out.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate(Vec::new()).is_empty());
    }
}
