use std::collections::BTreeSet;

use crate::indexer::builder::{normalize_text, trigrams};
use crate::models::search::{SearchHit, SearchIndex, SearchLine};

/// Same-block context lines attached to each side of a hit.
const CONTEXT_LINES: usize = 2;

pub const DEFAULT_RESULT_LIMIT: usize = 100;

/// Runs a query against the dataset index.
///
/// Candidate selection is exact-AND over query trigrams: a query shorter
/// than 3 normalized characters, or any query trigram with no posting,
/// yields no results. Candidates are then confirmed with a case-insensitive
/// literal scan of their search lines, newest conversation first.
pub fn search(index: &SearchIndex, query: &str, limit: usize) -> Vec<SearchHit> {
    let normalized = normalize_text(query);
    if normalized.chars().count() < 3 {
        return Vec::new();
    }

    let grams = trigrams(&normalized);
    let mut postings: Vec<&BTreeSet<String>> = Vec::with_capacity(grams.len());
    for gram in &grams {
        match index.postings.get(gram) {
            Some(ids) => postings.push(ids),
            None => return Vec::new(),
        }
    }

    // Intersect smallest set first so the working set shrinks fastest.
    postings.sort_by_key(|ids| ids.len());
    let mut candidates: Vec<&String> = postings[0].iter().collect();
    for ids in &postings[1..] {
        candidates.retain(|id| ids.contains(*id));
        if candidates.is_empty() {
            return Vec::new();
        }
    }

    // Newest conversation first, id as tie-breaker, for stable output.
    candidates.sort_by(|a, b| {
        let ta = index.titles.get(*a).map(|t| t.last_message_time).unwrap_or(0);
        let tb = index.titles.get(*b).map(|t| t.last_message_time).unwrap_or(0);
        tb.cmp(&ta).then_with(|| a.cmp(b))
    });

    let mut hits = Vec::new();
    for id in candidates {
        let Some(lines) = index.lines.get(id) else { continue };
        scan_lines(index, id, lines, query, limit, &mut hits);
        if hits.len() >= limit {
            break;
        }
    }
    hits
}

fn scan_lines(
    index: &SearchIndex,
    id: &str,
    lines: &[SearchLine],
    query: &str,
    limit: usize,
    hits: &mut Vec<SearchHit>,
) {
    let (title, last_message_time) = index
        .titles
        .get(id)
        .map(|t| (t.title.clone(), t.last_message_time))
        .unwrap_or_default();

    for (i, line) in lines.iter().enumerate() {
        let Some((start, end)) = find_case_insensitive(&line.text, query) else {
            continue;
        };

        hits.push(SearchHit {
            conversation_id: id.to_string(),
            title: title.clone(),
            last_message_time,
            message_id: line.message_id.clone(),
            block_index: line.block_index,
            line_number: line.line_number,
            before: line.text[..start].to_string(),
            matched: line.text[start..end].to_string(),
            after: line.text[end..].to_string(),
            context_before: block_context(lines, line, i.saturating_sub(CONTEXT_LINES)..i),
            context_after: block_context(lines, line, i + 1..(i + 1 + CONTEXT_LINES).min(lines.len())),
        });

        if hits.len() >= limit {
            return;
        }
    }
}

/// Neighboring lines from the same message and block only; a hit at a block
/// boundary gets fewer context lines, never lines from elsewhere.
fn block_context(lines: &[SearchLine], hit: &SearchLine, range: std::ops::Range<usize>) -> Vec<String> {
    lines[range]
        .iter()
        .filter(|l| l.message_id == hit.message_id && l.block_index == hit.block_index)
        .map(|l| l.text.clone())
        .collect()
}

/// Byte range of the first case-insensitive occurrence of `needle` in
/// `haystack`, matching char by char so multi-byte lowercase expansions
/// cannot produce out-of-bounds slices.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let needle_lower: Vec<char> = needle.to_lowercase().chars().collect();
    if needle_lower.is_empty() {
        return None;
    }
    let hay: Vec<(usize, char)> = haystack.char_indices().collect();

    for start in 0..hay.len() {
        let mut ni = 0;
        let mut hi = start;
        let mut end_byte = hay[start].0;

        'outer: while ni < needle_lower.len() {
            let Some(&(byte, ch)) = hay.get(hi) else { break };
            for lc in ch.to_lowercase() {
                if ni >= needle_lower.len() || needle_lower[ni] != lc {
                    break 'outer;
                }
                ni += 1;
            }
            hi += 1;
            end_byte = byte + ch.len_utf8();
        }

        if ni == needle_lower.len() {
            return Some((hay[start].0, end_byte));
        }
    }
    None
}
