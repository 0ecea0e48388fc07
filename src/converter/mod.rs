//! Conversion of raw graph conversations into slim linear records.
//!
//! # Error Handling Strategy
//!
//! Conversion never fails a batch: a graph that cannot produce a displayable
//! conversation (no mapping, no current node, no messages left after
//! filtering) yields `None` and the caller skips it. Malformed structure
//! inside a graph (cycles, dangling parents, unknown roles) is tolerated by
//! truncating or defaulting, never by erroring, because export archives in
//! the wild contain all of it.

pub mod content;

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::conversation::{Role, SlimConversation, SlimMessage, Variant};
use crate::models::graph::{AssetDescriptor, GraphNode, RawConversationGraph};

pub use content::{ContentSegmenter, SegmentedMessage};

/// Snippets are single-line previews; anything longer is cut on a char
/// boundary.
const SNIPPET_MAX_CHARS: usize = 120;

/// Timestamps above this are already epoch milliseconds; below, epoch
/// seconds. Export versions disagree.
const MS_THRESHOLD: f64 = 1e10;

/// A converted conversation plus the by-products the ingest pipeline needs:
/// the listing snippet, the raw node count, and where each referenced asset
/// lives inside the archive.
#[derive(Debug)]
pub struct ConvertedConversation {
    pub conversation: SlimConversation,
    pub snippet: String,
    pub node_count: usize,
    /// Normalized relative path → archive entry name.
    pub assets: BTreeMap<String, String>,
}

/// Converts one raw graph into a [`SlimConversation`] by walking parent
/// links from `current_node` to the root.
///
/// Returns `None` when the graph has no mapping, no usable current node, or
/// no displayable messages after filtering.
pub fn convert_graph(
    graph: &RawConversationGraph,
    assets: &HashMap<String, AssetDescriptor>,
    entry_names: &[String],
) -> Option<ConvertedConversation> {
    let id = graph.id.as_deref()?;
    if graph.mapping.is_empty() {
        return None;
    }
    let current = graph.current_node.as_deref()?;
    if !graph.mapping.contains_key(current) {
        return None;
    }

    let path = active_path(&graph.mapping, current);
    let segmenter = ContentSegmenter::new(assets, entry_names);

    let mut messages = Vec::new();
    let mut asset_paths = BTreeMap::new();
    let mut resolved_assets = BTreeMap::new();
    let mut last_message_time = 0i64;

    for node_id in &path {
        let node = &graph.mapping[node_id.as_str()];
        let Some(raw) = &node.message else { continue };

        let segmented = segmenter.segment(raw);
        if segmented.blocks.is_empty() && segmented.details.is_none() {
            continue;
        }

        let role = Role::from_export(raw.author.role.as_deref().unwrap_or(""));
        let timestamp = normalize_timestamp(raw.create_time);
        if let Some(ts) = timestamp {
            last_message_time = last_message_time.max(ts);
        }

        let variants = if role == Role::Assistant {
            collect_variants(graph, node, node_id, &segmenter, &mut asset_paths, &mut resolved_assets)
        } else {
            Vec::new()
        };

        record_assets(&segmented, &mut asset_paths, &mut resolved_assets);
        for variant in &variants {
            if let Some(ts) = variant.timestamp {
                last_message_time = last_message_time.max(ts);
            }
        }

        messages.push(SlimMessage {
            id: raw.id.clone().unwrap_or_else(|| node_id.clone()),
            role,
            timestamp,
            recipient: raw.recipient.clone(),
            blocks: segmented.blocks,
            details: segmented.details,
            variants,
        });
    }

    if messages.is_empty() {
        return None;
    }

    for time in [graph.update_time, graph.create_time] {
        if let Some(ts) = normalize_timestamp(time) {
            last_message_time = last_message_time.max(ts);
        }
    }

    let title = graph
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Untitled conversation")
        .to_string();
    let snippet = build_snippet(&messages);

    Some(ConvertedConversation {
        conversation: SlimConversation {
            id: id.to_string(),
            title,
            create_time: normalize_timestamp(graph.create_time),
            update_time: normalize_timestamp(graph.update_time),
            last_message_time,
            messages,
            asset_paths,
        },
        snippet,
        node_count: graph.mapping.len(),
        assets: resolved_assets,
    })
}

/// Walks parent links from the leaf, guarding against cycles and dangling
/// references with a visited set; a repeat or a missing parent silently
/// truncates the path. Returned in chronological (root → leaf) order.
fn active_path(mapping: &HashMap<String, GraphNode>, current: &str) -> Vec<String> {
    let mut path = Vec::new();
    let mut visited = HashSet::new();
    let mut cursor = Some(current.to_string());

    while let Some(node_id) = cursor {
        if !visited.insert(node_id.clone()) {
            break;
        }
        let Some(node) = mapping.get(&node_id) else { break };
        path.push(node_id);
        cursor = node.parent.clone();
    }

    path.reverse();
    path
}

/// Sibling assistant regenerations: nodes under the same parent whose
/// message role is assistant and whose id differs from the active node.
/// Extracted with the same segmentation, without recursing into children.
fn collect_variants(
    graph: &RawConversationGraph,
    node: &GraphNode,
    node_id: &str,
    segmenter: &ContentSegmenter,
    asset_paths: &mut BTreeMap<String, String>,
    resolved: &mut BTreeMap<String, String>,
) -> Vec<Variant> {
    let Some(parent_id) = node.parent.as_deref() else {
        return Vec::new();
    };
    let Some(parent) = graph.mapping.get(parent_id) else {
        return Vec::new();
    };

    let mut variants = Vec::new();
    for sibling_id in &parent.children {
        if sibling_id.as_str() == node_id {
            continue;
        }
        let Some(sibling) = graph.mapping.get(sibling_id) else { continue };
        let Some(raw) = &sibling.message else { continue };
        if raw.author.role.as_deref() != Some("assistant") {
            continue;
        }

        let segmented = segmenter.segment(raw);
        if segmented.blocks.is_empty() && segmented.details.is_none() {
            continue;
        }
        record_assets(&segmented, asset_paths, resolved);
        variants.push(Variant {
            id: raw.id.clone().unwrap_or_else(|| sibling_id.clone()),
            timestamp: normalize_timestamp(raw.create_time),
            blocks: segmented.blocks,
            details: segmented.details,
        });
    }
    variants
}

fn record_assets(
    segmented: &SegmentedMessage,
    asset_paths: &mut BTreeMap<String, String>,
    resolved: &mut BTreeMap<String, String>,
) {
    for (pointer, (path, entry)) in &segmented.assets {
        asset_paths.insert(pointer.clone(), path.clone());
        resolved.insert(path.clone(), entry.clone());
    }
}

/// First markdown text of the first user message; without a user message,
/// the first message of any role. Whitespace-collapsed and bounded.
fn build_snippet(messages: &[SlimMessage]) -> String {
    let first_user = messages.iter().find(|m| m.role == Role::User);
    let source = first_user.or_else(|| messages.first());

    let Some(message) = source else { return String::new() };
    let text = message
        .blocks
        .iter()
        .find_map(|block| match block {
            crate::models::ContentBlock::Markdown { text } => Some(text.as_str()),
            _ => None,
        })
        .unwrap_or("");

    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, SNIPPET_MAX_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

/// Normalizes an export timestamp to epoch milliseconds. Values above the
/// threshold are taken as already-ms, everything else as seconds.
pub fn normalize_timestamp(value: Option<f64>) -> Option<i64> {
    let v = value?;
    if !v.is_finite() || v <= 0.0 {
        return None;
    }
    if v > MS_THRESHOLD { Some(v as i64) } else { Some((v * 1000.0) as i64) }
}
