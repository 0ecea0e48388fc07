use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

use crate::models::conversation::{ContentBlock, Role, SlimConversation, SlimMessage};
use crate::models::search::SearchLine;

/// Search data derived from one conversation: per-line records plus the
/// deduplicated trigram set.
#[derive(Debug, Default)]
pub struct IndexedConversation {
    pub lines: Vec<SearchLine>,
    pub grams: BTreeSet<String>,
}

/// Derives search lines and trigrams for one slim conversation.
///
/// Indexable messages are all user messages plus assistant messages
/// addressed to the default recipient; indexable blocks are markdown, code
/// and transcript blocks that are not structured JSON payloads. Each
/// physical line becomes one [`SearchLine`] carrying its exact location.
pub fn index_conversation(conversation: &SlimConversation) -> IndexedConversation {
    let mut indexed = IndexedConversation::default();
    let mut corpus = String::new();

    for message in &conversation.messages {
        if !message_indexable(message) {
            continue;
        }
        for (block_index, block) in message.blocks.iter().enumerate() {
            let Some(text) = indexable_text(block) else { continue };

            for (line_number, line) in text.lines().enumerate() {
                indexed.lines.push(SearchLine {
                    conversation_id: conversation.id.clone(),
                    message_id: message.id.clone(),
                    block_index,
                    line_number,
                    text: line.to_string(),
                });
            }

            corpus.push_str(text);
            corpus.push('\n');
        }
    }

    indexed.grams = trigrams(&normalize_text(&corpus));
    indexed
}

fn message_indexable(message: &SlimMessage) -> bool {
    match message.role {
        Role::User => true,
        Role::Assistant => {
            matches!(message.recipient.as_deref(), None | Some("all"))
        }
        Role::System | Role::Tool => false,
    }
}

fn indexable_text(block: &ContentBlock) -> Option<&str> {
    let text = match block {
        ContentBlock::Markdown { text } => text,
        ContentBlock::Code { text, .. } => text,
        ContentBlock::Transcript { text } => text,
        ContentBlock::Asset { .. } => return None,
    };
    if is_json_payload(text) {
        return None;
    }
    Some(text)
}

/// Tool invocations sometimes land in blocks as raw JSON objects; those are
/// machine payloads, not prose, and stay out of the index.
fn is_json_payload(text: &str) -> bool {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return false;
    }
    serde_json::from_str::<serde_json::Value>(trimmed)
        .map(|v| v.is_object())
        .unwrap_or(false)
}

/// Canonical text normalization shared by indexing and querying: NFC,
/// lowercase, whitespace runs collapsed to single spaces.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text.nfc().collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every overlapping 3-character window of the normalized text. Empty when
/// the text is shorter than 3 characters.
pub fn trigrams(normalized: &str) -> BTreeSet<String> {
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() < 3 {
        return BTreeSet::new();
    }
    chars.windows(3).map(|w| w.iter().collect()).collect()
}
