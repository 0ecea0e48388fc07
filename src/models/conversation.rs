use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Normalized, linear form of one conversation: the active path through the
/// raw graph, root to leaf, with asset pointers resolved to relative paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlimConversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub update_time: Option<i64>,
    /// Epoch milliseconds of the newest activity observed anywhere in the
    /// graph; drives merge precedence during reconciliation.
    pub last_message_time: i64,
    pub messages: Vec<SlimMessage>,
    /// Asset pointer → sanitized relative path, for every pointer any block
    /// in this conversation references.
    #[serde(default)]
    pub asset_paths: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlimMessage {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub recipient: Option<String>,
    pub blocks: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<MessageDetails>,
    /// Alternate regenerations sharing this message's parent. Only ever set
    /// on assistant messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
}

/// Closed author-role set. Export roles outside this set map to `User`
/// during conversion so nothing is silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    pub fn from_export(role: &str) -> Self {
        match role {
            "assistant" => Role::Assistant,
            "system" => Role::System,
            "tool" => Role::Tool,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBlock {
    Markdown { text: String },
    Code { language: String, text: String },
    Asset { pointer: String, mime: Option<String> },
    Transcript { text: String },
}

/// Reasoning and tool metadata extracted out of message content. Kept off
/// the block list so rendering and search indexing never see it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_queries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl MessageDetails {
    pub fn is_empty(&self) -> bool {
        self.thinking.is_none()
            && self.search_queries.is_empty()
            && self.result_domains.is_empty()
            && self.display.is_none()
    }
}

/// A sibling assistant regeneration: same parent node, different id.
/// Carries its own blocks/details but never its own variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub blocks: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<MessageDetails>,
}
