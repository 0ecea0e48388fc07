use std::collections::{BTreeMap, HashMap};

use crate::models::graph::{AssetDescriptor, RawConversationGraph};

/// Marker introducing the embedded graph array inside the HTML sidecar.
const GRAPHS_MARKER: &str = "var jsonData =";
/// Marker introducing the embedded asset-pointer map.
const ASSETS_MARKER: &str = "var assetsJson =";

/// Graphs plus asset-pointer descriptors extracted from one archive.
#[derive(Debug, Default)]
pub struct ExportPayload {
    pub graphs: Vec<RawConversationGraph>,
    pub assets: HashMap<String, AssetDescriptor>,
}

/// Locates the conversation payload in an unpacked archive: first the
/// marker-introduced JSON literals embedded in an HTML entry, then a flat
/// `conversations.json` as fallback. Returns `None` when neither yields any
/// graphs, which the caller treats as skip-with-warning.
pub fn extract_payload(entries: &BTreeMap<String, Vec<u8>>) -> Option<ExportPayload> {
    if let Some(payload) = extract_from_html(entries) {
        if !payload.graphs.is_empty() {
            return Some(payload);
        }
    }
    extract_fallback(entries)
}

fn extract_from_html(entries: &BTreeMap<String, Vec<u8>>) -> Option<ExportPayload> {
    for (name, bytes) in entries {
        if !name.ends_with(".html") {
            continue;
        }
        let html = String::from_utf8_lossy(bytes);
        let Some(graphs_json) = extract_json_after_marker(&html, GRAPHS_MARKER) else {
            continue;
        };

        let graphs: Vec<RawConversationGraph> = match serde_json::from_str(graphs_json) {
            Ok(graphs) => graphs,
            Err(e) => {
                eprintln!("Warning: Malformed embedded graph array in {}: {}", name, e);
                continue;
            }
        };

        // The asset map is optional; older exports embed only the graphs.
        let assets = extract_json_after_marker(&html, ASSETS_MARKER)
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        return Some(ExportPayload { graphs, assets });
    }
    None
}

fn extract_fallback(entries: &BTreeMap<String, Vec<u8>>) -> Option<ExportPayload> {
    let (name, bytes) = entries
        .iter()
        .find(|(name, _)| *name == "conversations.json" || name.ends_with("/conversations.json"))?;

    match serde_json::from_slice::<Vec<RawConversationGraph>>(bytes) {
        Ok(graphs) if !graphs.is_empty() => {
            Some(ExportPayload { graphs, assets: HashMap::new() })
        }
        Ok(_) => None,
        Err(e) => {
            eprintln!("Warning: Malformed {}: {}", name, e);
            None
        }
    }
}

/// Returns the JSON literal (array or object) immediately following
/// `marker`, found by string-aware bracket-depth counting. Quoted brackets
/// and escaped quotes inside the literal do not confuse the scan.
pub fn extract_json_after_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let after = &text[text.find(marker)? + marker.len()..];
    let offset = after.find(|c: char| !c.is_whitespace())?;
    let literal = &after[offset..];

    let open = literal.chars().next()?;
    let close = match open {
        '[' => ']',
        '{' => '}',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in literal.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&literal[..i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
