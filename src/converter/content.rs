use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::models::conversation::{ContentBlock, MessageDetails};
use crate::models::graph::{AssetDescriptor, RawContent, RawMessage, RawPart, RawTaggedPart};
use crate::utils::{locate_asset_entry, sanitize_asset_path};

/// Splits raw message content into typed [`ContentBlock`]s and extracts the
/// reasoning/tool side channel. Holds the archive's asset map and entry
/// names so pointer parts can be resolved as they are encountered.
pub struct ContentSegmenter<'a> {
    assets: &'a HashMap<String, AssetDescriptor>,
    entry_names: &'a [String],
}

/// Segmentation result for one message (or variant).
#[derive(Debug, Default)]
pub struct SegmentedMessage {
    pub blocks: Vec<ContentBlock>,
    pub details: Option<MessageDetails>,
    /// Pointer → (normalized relative path, archive entry name) for every
    /// asset block emitted.
    pub assets: BTreeMap<String, (String, String)>,
}

impl<'a> ContentSegmenter<'a> {
    pub fn new(assets: &'a HashMap<String, AssetDescriptor>, entry_names: &'a [String]) -> Self {
        Self { assets, entry_names }
    }

    pub fn segment(&self, message: &RawMessage) -> SegmentedMessage {
        let mut out = SegmentedMessage::default();
        let mut details = MessageDetails::default();

        match &message.content {
            RawContent::Text { parts } | RawContent::Multimodal { parts } => {
                self.segment_parts(parts, &mut out);
            }
            RawContent::Code { language, text } => {
                if !text.trim().is_empty() {
                    out.blocks.push(ContentBlock::Code {
                        language: language.clone().unwrap_or_else(|| "text".to_string()),
                        text: text.clone(),
                    });
                }
            }
            RawContent::Thoughts { thoughts } => {
                let joined: Vec<String> = thoughts
                    .iter()
                    .filter_map(|t| {
                        let text = t.content.as_deref().or(t.summary.as_deref())?;
                        (!text.trim().is_empty()).then(|| text.to_string())
                    })
                    .collect();
                if !joined.is_empty() {
                    details.thinking = Some(joined.join("\n\n"));
                }
            }
            RawContent::Transcript { text } => {
                if !text.trim().is_empty() {
                    out.blocks.push(ContentBlock::Transcript { text: text.clone() });
                }
            }
            RawContent::Unknown(_) | RawContent::Empty => {}
        }

        extract_metadata_details(&message.metadata, &mut details);
        if !details.is_empty() {
            out.details = Some(details);
        }
        out
    }

    fn segment_parts(&self, parts: &[RawPart], out: &mut SegmentedMessage) {
        for part in parts {
            match part {
                RawPart::Text(text) => segment_text(text, &mut out.blocks),
                RawPart::Tagged(tagged) => self.segment_tagged_part(tagged, out),
                RawPart::Other(_) => {}
            }
        }
    }

    fn segment_tagged_part(&self, part: &RawTaggedPart, out: &mut SegmentedMessage) {
        match part.content_type.as_str() {
            // Nested multimodal parts flatten recursively.
            "multimodal_text" => {
                if let Some(parts) = &part.parts {
                    self.segment_parts(parts, out);
                }
            }
            "image_asset_pointer" | "audio_asset_pointer" | "video_container_asset_pointer"
            | "asset" | "file" | "image" => {
                let Some(pointer) = part.asset_pointer.as_deref() else {
                    return;
                };
                match self.resolve_asset(pointer) {
                    Some((path, entry, mime)) => {
                        out.assets.insert(pointer.to_string(), (path, entry));
                        out.blocks.push(ContentBlock::Asset { pointer: pointer.to_string(), mime });
                    }
                    // Unresolvable pointers are dropped, never emitted broken.
                    None => {
                        eprintln!("Warning: Dropping unresolvable asset pointer: {}", pointer);
                    }
                }
            }
            "audio_transcription" => {
                if let Some(text) = part.text.as_deref() {
                    if !text.trim().is_empty() {
                        out.blocks.push(ContentBlock::Transcript { text: text.to_string() });
                    }
                }
            }
            _ => {
                if let Some(text) = part.text.as_deref() {
                    segment_text(text, &mut out.blocks);
                }
            }
        }
    }

    /// Pointer → (normalized path, archive entry name, media type), or None
    /// if the descriptor is missing, the path is unsafe, or no entry holds
    /// the payload.
    fn resolve_asset(&self, pointer: &str) -> Option<(String, String, Option<String>)> {
        let descriptor = self.lookup_descriptor(pointer)?;
        let claimed = descriptor.path.as_deref()?;

        let path = match sanitize_asset_path(claimed) {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Warning: Rejecting unsafe asset path for {}: {}", pointer, e);
                return None;
            }
        };

        let entry = locate_asset_entry(&path, self.entry_names.iter().map(String::as_str))?;
        let mime = descriptor.mime.clone().or_else(|| infer_mime(&path));
        Some((path, entry, mime))
    }

    fn lookup_descriptor(&self, pointer: &str) -> Option<&AssetDescriptor> {
        if let Some(descriptor) = self.assets.get(pointer) {
            return Some(descriptor);
        }
        // Some exporter versions key the map by the bare file id rather than
        // the full scheme-prefixed pointer.
        let bare = pointer.rsplit("://").next()?;
        self.assets.get(bare)
    }
}

/// Splits a text span into markdown and fenced-code blocks. A line whose
/// trimmed form starts with ``` toggles code mode; the token after the fence
/// is the language tag, defaulting to `text`. An unterminated fence still
/// yields its code block.
pub fn segment_text(text: &str, blocks: &mut Vec<ContentBlock>) {
    let mut markdown: Vec<&str> = Vec::new();
    let mut code: Vec<&str> = Vec::new();
    let mut language: Option<String> = None;
    let mut in_code = false;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("```") {
            if in_code {
                flush_code(&mut code, language.take(), blocks);
                in_code = false;
            } else {
                flush_markdown(&mut markdown, blocks);
                let tag = rest.trim();
                language = Some(if tag.is_empty() { "text".to_string() } else { tag.to_string() });
                in_code = true;
            }
            continue;
        }
        if in_code {
            code.push(line);
        } else {
            markdown.push(line);
        }
    }

    if in_code {
        flush_code(&mut code, language.take(), blocks);
    } else {
        flush_markdown(&mut markdown, blocks);
    }
}

fn flush_markdown(lines: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>) {
    let text = lines.join("\n");
    lines.clear();
    if !text.trim().is_empty() {
        blocks.push(ContentBlock::Markdown { text });
    }
}

fn flush_code(lines: &mut Vec<&str>, language: Option<String>, blocks: &mut Vec<ContentBlock>) {
    let text = lines.join("\n");
    lines.clear();
    if !text.trim().is_empty() {
        blocks.push(ContentBlock::Code {
            language: language.unwrap_or_else(|| "text".to_string()),
            text,
        });
    }
}

/// Pulls search/tool metadata out of the free-form message metadata object.
/// Anything malformed is treated as absent.
fn extract_metadata_details(metadata: &Value, details: &mut MessageDetails) {
    if let Some(queries) = metadata.get("search_queries").and_then(Value::as_array) {
        for query in queries {
            let text = query
                .as_str()
                .map(str::to_string)
                .or_else(|| query.get("q").and_then(Value::as_str).map(str::to_string));
            if let Some(text) = text {
                if !text.is_empty() {
                    details.search_queries.push(text);
                }
            }
        }
    }

    if let Some(groups) = metadata.get("search_result_groups").and_then(Value::as_array) {
        for group in groups {
            if let Some(domain) = group.get("domain").and_then(Value::as_str) {
                if !domain.is_empty() && !details.result_domains.iter().any(|d| d == domain) {
                    details.result_domains.push(domain.to_string());
                }
            }
        }
    }

    if let Some(display) = metadata.get("tool_display_name").and_then(Value::as_str) {
        details.display = Some(display.to_string());
    } else if metadata.get("deep_research_version").is_some()
        || metadata.get("deep_research").and_then(Value::as_bool) == Some(true)
    {
        details.display = Some("Deep research".to_string());
    }
}

fn infer_mime(path: &str) -> Option<String> {
    let extension = path.rsplit('.').next()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime.to_string())
}
