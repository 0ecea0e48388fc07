use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::metadata::AccountMetadata;

/// Well-known sidecar files carrying per-archive account metadata. Each is
/// optional; malformed JSON is treated as absent, never as a failure.
const SIDECAR_FILES: [(&str, SidecarField); 4] = [
    ("user.json", SidecarField::User),
    ("message_feedback.json", SidecarField::MessageFeedback),
    ("shopping.json", SidecarField::Shopping),
    ("group_chats.json", SidecarField::GroupChats),
];

#[derive(Clone, Copy)]
enum SidecarField {
    User,
    MessageFeedback,
    Shopping,
    GroupChats,
}

/// Pulls sidecar metadata out of an unpacked archive. Files may sit at the
/// archive root or under a single top-level export directory.
pub fn extract_metadata(entries: &BTreeMap<String, Vec<u8>>) -> AccountMetadata {
    let mut metadata = AccountMetadata::default();

    for (file_name, field) in SIDECAR_FILES {
        let Some((name, bytes)) = entries
            .iter()
            .find(|(name, _)| *name == file_name || name.ends_with(&format!("/{}", file_name)))
        else {
            continue;
        };

        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("Warning: Ignoring malformed sidecar {}: {}", name, e);
                continue;
            }
        };

        match field {
            SidecarField::User => metadata.user = Some(value),
            SidecarField::MessageFeedback => metadata.message_feedback = Some(value),
            SidecarField::Shopping => metadata.shopping = Some(value),
            SidecarField::GroupChats => metadata.group_chats = Some(value),
        }
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries_from(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.as_bytes().to_vec())).collect()
    }

    #[test]
    fn extracts_known_sidecars_at_root_or_nested() {
        let entries = entries_from(&[
            ("user.json", r#"{"email": "a@example.com"}"#),
            ("export-2024/message_feedback.json", r#"[{"rating": "up"}]"#),
            ("unrelated.json", r#"{"x": 1}"#),
        ]);

        let metadata = extract_metadata(&entries);
        assert_eq!(metadata.user, Some(json!({"email": "a@example.com"})));
        assert_eq!(metadata.message_feedback, Some(json!([{"rating": "up"}])));
        assert!(metadata.shopping.is_none());
        assert!(metadata.group_chats.is_none());
    }

    #[test]
    fn malformed_sidecar_is_ignored() {
        let entries = entries_from(&[("user.json", "{not json")]);
        let metadata = extract_metadata(&entries);
        assert!(metadata.is_empty());
    }
}
