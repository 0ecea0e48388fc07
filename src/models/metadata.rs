use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Auxiliary per-archive metadata from well-known sidecar files. Every field
/// is optional; archives from older export tools carry only a subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_feedback: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopping: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_chats: Option<Value>,
}

impl AccountMetadata {
    /// Field-by-field merge: values present in `later` overwrite this one,
    /// absent fields keep whatever an earlier archive provided.
    pub fn merge_from(&mut self, later: AccountMetadata) {
        if later.user.is_some() {
            self.user = later.user;
        }
        if later.message_feedback.is_some() {
            self.message_feedback = later.message_feedback;
        }
        if later.shopping.is_some() {
            self.shopping = later.shopping;
        }
        if later.group_chats.is_some() {
            self.group_chats = later.group_chats;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.message_feedback.is_none()
            && self.shopping.is_none()
            && self.group_chats.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn later_archive_overwrites_field_by_field() {
        let mut first = AccountMetadata {
            user: Some(json!({"email": "old@example.com"})),
            message_feedback: Some(json!([{"rating": "up"}])),
            ..Default::default()
        };
        let second = AccountMetadata {
            user: Some(json!({"email": "new@example.com"})),
            shopping: Some(json!({"orders": []})),
            ..Default::default()
        };

        first.merge_from(second);

        assert_eq!(first.user, Some(json!({"email": "new@example.com"})));
        // Field absent from the later archive survives.
        assert_eq!(first.message_feedback, Some(json!([{"rating": "up"}])));
        assert_eq!(first.shopping, Some(json!({"orders": []})));
    }
}
