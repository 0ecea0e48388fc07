use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One conversation in the raw export format: a tree of nodes with
/// parent/child links and a single active leaf (`current_node`).
///
/// Export tools disagree on field names across versions, so everything
/// except the mapping itself is optional and cleaned up during conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConversationGraph {
    #[serde(default, alias = "conversation_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub create_time: Option<f64>,
    #[serde(default)]
    pub update_time: Option<f64>,
    #[serde(default)]
    pub mapping: HashMap<String, GraphNode>,
    #[serde(default)]
    pub current_node: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub message: Option<RawMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author: RawAuthor,
    #[serde(default)]
    pub create_time: Option<f64>,
    #[serde(default)]
    pub content: RawContent,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthor {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Message content as exported: a closed tagged union keyed on
/// `content_type`, with an explicit fallback for types this tool has never
/// seen. Unrecognized or malformed content is preserved as [`RawContent::Unknown`]
/// rather than failing the whole conversation.
#[derive(Debug, Clone, Default)]
pub enum RawContent {
    Text { parts: Vec<RawPart> },
    Code { language: Option<String>, text: String },
    Multimodal { parts: Vec<RawPart> },
    Thoughts { thoughts: Vec<RawThought> },
    Transcript { text: String },
    Unknown(Value),
    #[default]
    Empty,
}

/// One element of a `parts` array: a plain text span, a tagged object
/// (asset pointer or nested multimodal content), or anything else.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPart {
    Text(String),
    Tagged(RawTaggedPart),
    Other(Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTaggedPart {
    pub content_type: String,
    #[serde(default)]
    pub asset_pointer: Option<String>,
    #[serde(default)]
    pub parts: Option<Vec<RawPart>>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawThought {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TextContent {
    #[serde(default)]
    parts: Vec<RawPart>,
}

#[derive(Debug, Clone, Deserialize)]
struct CodeContent {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ThoughtsContent {
    #[serde(default)]
    thoughts: Vec<RawThought>,
}

#[derive(Debug, Clone, Deserialize)]
struct TranscriptContent {
    #[serde(default)]
    text: String,
}

impl<'de> Deserialize<'de> for RawContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let tag = value.get("content_type").and_then(Value::as_str).unwrap_or("");

        // A parse failure inside a recognized tag means the export drifted
        // from the shape we know; keep the raw value instead of erroring.
        let parsed = match tag {
            "text" => serde_json::from_value::<TextContent>(value.clone())
                .map(|c| RawContent::Text { parts: c.parts }),
            "code" => serde_json::from_value::<CodeContent>(value.clone())
                .map(|c| RawContent::Code { language: c.language, text: c.text }),
            "multimodal_text" => serde_json::from_value::<TextContent>(value.clone())
                .map(|c| RawContent::Multimodal { parts: c.parts }),
            "thoughts" | "reasoning_recap" => {
                serde_json::from_value::<ThoughtsContent>(value.clone())
                    .map(|c| RawContent::Thoughts { thoughts: c.thoughts })
            }
            "audio_transcription" => serde_json::from_value::<TranscriptContent>(value.clone())
                .map(|c| RawContent::Transcript { text: c.text }),
            _ => return Ok(RawContent::Unknown(value)),
        };

        Ok(parsed.unwrap_or(RawContent::Unknown(value)))
    }
}

/// Descriptor for one asset pointer from the export's asset map.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetDescriptor {
    #[serde(default, alias = "file_path")]
    pub path: Option<String>,
    #[serde(default, alias = "mime_type")]
    pub mime: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_content_with_mixed_parts() {
        let json = r#"{
            "content_type": "text",
            "parts": ["hello", {"content_type": "image_asset_pointer", "asset_pointer": "file-service://file-abc"}]
        }"#;
        let content: RawContent = serde_json::from_str(json).unwrap();
        match content {
            RawContent::Text { parts } => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(&parts[0], RawPart::Text(t) if t == "hello"));
                match &parts[1] {
                    RawPart::Tagged(p) => {
                        assert_eq!(p.content_type, "image_asset_pointer");
                        assert_eq!(p.asset_pointer.as_deref(), Some("file-service://file-abc"));
                    }
                    other => panic!("expected tagged part, got {:?}", other),
                }
            }
            other => panic!("expected text content, got {:?}", other),
        }
    }

    #[test]
    fn unknown_content_type_falls_back() {
        let json = r#"{"content_type": "tether_browsing_display", "result": "x"}"#;
        let content: RawContent = serde_json::from_str(json).unwrap();
        assert!(matches!(content, RawContent::Unknown(_)));
    }

    #[test]
    fn graph_tolerates_missing_fields() {
        let json = r#"{
            "title": "Untitled",
            "mapping": {"n1": {"id": "n1", "children": []}}
        }"#;
        let graph: RawConversationGraph = serde_json::from_str(json).unwrap();
        assert!(graph.id.is_none());
        assert!(graph.current_node.is_none());
        assert_eq!(graph.mapping.len(), 1);
        assert!(graph.mapping["n1"].message.is_none());
    }

    #[test]
    fn conversation_id_alias_accepted() {
        let json = r#"{"conversation_id": "c-1", "mapping": {}}"#;
        let graph: RawConversationGraph = serde_json::from_str(json).unwrap();
        assert_eq!(graph.id.as_deref(), Some("c-1"));
    }
}
