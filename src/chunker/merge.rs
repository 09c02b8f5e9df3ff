use super::dedup::recount_children;
use super::types::TextChunk;

/// Coalesce chunks below half of `min_tokens` into the chunks that follow.
///
/// Small chunks accumulate until a regular chunk arrives; the pending merge is
/// prepended to it while still under `min_tokens`, otherwise emitted on its
/// own. Parent chunks are never merged and flush any pending merge, and only
/// chunks under the same parent are combined; parents' `child_count` is
/// updated to match.
pub fn merge_small_chunks(chunks: Vec<TextChunk>, min_tokens: usize) -> Vec<TextChunk> {
    let is_small = |c: &TextChunk| c.token_count * 2 < min_tokens;
    let mut merged = Vec::with_capacity(chunks.len());
    let mut pending: Option<TextChunk> = None;

    for chunk in chunks {
        if chunk.metadata.is_parent {
            merged.extend(pending.take());
            merged.push(chunk);
            continue;
        }

        if pending.as_ref().is_some_and(|p| !same_group(p, &chunk)) {
            merged.extend(pending.take());
        }

        if is_small(&chunk) {
            pending = Some(match pending.take() {
                Some(p) => combine(p, chunk),
                None => chunk,
            });
            continue;
        }

        match pending.take() {
            Some(p) if p.token_count < min_tokens => merged.push(combine(p, chunk)),
            Some(p) => {
                merged.push(p);
                merged.push(chunk);
            }
            None => merged.push(chunk),
        }
    }

    merged.extend(pending);
    recount_children(&mut merged);
    merged
}

fn same_group(a: &TextChunk, b: &TextChunk) -> bool {
    a.chunk_level == b.chunk_level && a.parent_chunk_id == b.parent_chunk_id
}

/// Join two neighbouring chunks; the first one keeps its index and title
fn combine(mut first: TextChunk, second: TextChunk) -> TextChunk {
    let content = format!("{}\n\n{}", first.content, second.content);
    first.set_content(content);
    first.token_count += second.token_count;
    first.end_char = first.end_char.max(second.end_char);
    first.end_page = second.end_page.or(first.end_page);
    if first.section_title.is_none() {
        first.section_title = second.section_title;
    }
    first.metadata.has_code |= second.metadata.has_code;
    first.metadata.has_list |= second.metadata.has_list;
    first.metadata.has_table |= second.metadata.has_table;
    first.metadata.oversized |= second.metadata.oversized;
    first
}
