use serde::{Deserialize, Serialize};

/// Lightweight index record for one conversation. This is the unit the
/// reconciler compares; the full [`SlimConversation`](crate::models::SlimConversation)
/// record is only loaded when a conversation is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    /// First user-message text, whitespace-normalized and truncated.
    pub snippet: String,
    pub last_message_time: i64,
    #[serde(default)]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub update_time: Option<i64>,
    /// Number of nodes in the raw graph this record came from, including
    /// nodes off the active path. Tie-breaker for merge precedence.
    pub node_count: usize,
    /// Archive file name this conversation was imported from.
    #[serde(default)]
    pub source: Option<String>,
}

impl ConversationSummary {
    /// Merge precedence under `upsert`: greater `last_message_time` wins,
    /// then greater `node_count`. Equal on both means "not newer" — the
    /// caller's ingestion-order rule decides.
    pub fn is_newer_than(&self, other: &ConversationSummary) -> bool {
        if self.last_message_time != other.last_message_time {
            return self.last_message_time > other.last_message_time;
        }
        self.node_count > other.node_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(time: i64, nodes: usize) -> ConversationSummary {
        ConversationSummary {
            id: "c1".to_string(),
            title: "t".to_string(),
            snippet: String::new(),
            last_message_time: time,
            create_time: None,
            update_time: None,
            node_count: nodes,
            source: None,
        }
    }

    #[test]
    fn newer_time_wins_regardless_of_nodes() {
        assert!(summary(300, 1).is_newer_than(&summary(200, 99)));
        assert!(!summary(200, 99).is_newer_than(&summary(300, 1)));
    }

    #[test]
    fn node_count_breaks_time_ties() {
        assert!(summary(200, 7).is_newer_than(&summary(200, 5)));
        assert!(!summary(200, 5).is_newer_than(&summary(200, 7)));
    }

    #[test]
    fn fully_equal_is_not_newer() {
        assert!(!summary(200, 5).is_newer_than(&summary(200, 5)));
    }
}
