use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use super::DatasetStore;
use crate::models::conversation::SlimConversation;
use crate::models::metadata::AccountMetadata;
use crate::models::search::SearchIndex;
use crate::models::summary::ConversationSummary;
use crate::utils::sanitize_asset_path;

const SUMMARIES_FILENAME: &str = "summaries.json";
const INDEX_FILENAME: &str = "search-index.json";
const CONVERSATIONS_DIR: &str = "conversations";
const ASSETS_DIR: &str = "assets";
const METADATA_DIR: &str = "metadata";

/// Directory-tree dataset store:
///
/// ```text
/// <root>/summaries.json
/// <root>/search-index.json
/// <root>/conversations/<id>.json
/// <root>/assets/<normalized relative path>
/// <root>/metadata/<name>.json      (only when present)
/// ```
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Opens (creating if needed) a dataset directory. Failure here is
    /// fatal for the whole batch: an unwritable destination is the one
    /// error this pipeline never works around.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("Cannot open output directory: {}", root.display()))?;
        Ok(Self { root: root.to_path_buf() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.root.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(value))
    }

    /// Atomic write: temp file in the same directory, then rename.
    fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let temp = self.root.join(format!("{}.tmp", name));
        let json = serde_json::to_string_pretty(value).context("Failed to serialize record")?;
        fs::write(&temp, json).with_context(|| format!("Failed to write {}", temp.display()))?;
        fs::rename(&temp, &path)
            .with_context(|| format!("Failed to rename into place: {}", path.display()))?;
        Ok(())
    }

    fn conversation_path(&self, id: &str) -> PathBuf {
        // Conversation ids are export-supplied; encode anything that could
        // act as a path separator before using one as a file name.
        let safe: String = id
            .chars()
            .map(|c| if c == '/' || c == '\\' || c == '\0' { '_' } else { c })
            .collect();
        self.root.join(CONVERSATIONS_DIR).join(format!("{}.json", safe))
    }

    fn metadata_fields(metadata: &AccountMetadata) -> [(&'static str, &Option<Value>); 4] {
        [
            ("user", &metadata.user),
            ("message_feedback", &metadata.message_feedback),
            ("shopping", &metadata.shopping),
            ("group_chats", &metadata.group_chats),
        ]
    }
}

impl DatasetStore for DirStore {
    fn load_summaries(&self) -> Result<Vec<ConversationSummary>> {
        Ok(self.read_json(SUMMARIES_FILENAME)?.unwrap_or_default())
    }

    fn load_search_index(&self) -> Result<SearchIndex> {
        Ok(self.read_json(INDEX_FILENAME)?.unwrap_or_default())
    }

    fn load_metadata(&self) -> Result<AccountMetadata> {
        Ok(AccountMetadata {
            user: self.read_json(&format!("{}/user.json", METADATA_DIR))?,
            message_feedback: self.read_json(&format!("{}/message_feedback.json", METADATA_DIR))?,
            shopping: self.read_json(&format!("{}/shopping.json", METADATA_DIR))?,
            group_chats: self.read_json(&format!("{}/group_chats.json", METADATA_DIR))?,
        })
    }

    fn load_conversation(&self, id: &str) -> Result<Option<SlimConversation>> {
        let path = self.conversation_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let conversation = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(conversation))
    }

    fn put_conversation(&mut self, conversation: &SlimConversation) -> Result<()> {
        let path = self.conversation_path(&conversation.id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json =
            serde_json::to_string(conversation).context("Failed to serialize conversation")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn delete_conversation(&mut self, id: &str) -> Result<()> {
        let path = self.conversation_path(id);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete {}", path.display()))?;
        }
        Ok(())
    }

    fn put_asset(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        // Re-validate right before touching the filesystem; the earlier
        // check at resolve time does not make this one redundant.
        let safe = sanitize_asset_path(path)?;
        let dest = self.root.join(ASSETS_DIR).join(&safe);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&dest, bytes)
            .with_context(|| format!("Failed to write asset {}", dest.display()))?;
        Ok(())
    }

    fn put_summaries(&mut self, summaries: &[ConversationSummary]) -> Result<()> {
        self.write_json(SUMMARIES_FILENAME, &summaries)
    }

    fn put_search_index(&mut self, index: &SearchIndex) -> Result<()> {
        self.write_json(INDEX_FILENAME, index)
    }

    fn put_metadata(&mut self, metadata: &AccountMetadata) -> Result<()> {
        for (name, value) in Self::metadata_fields(metadata) {
            if let Some(value) = value {
                self.write_json(&format!("{}/{}.json", METADATA_DIR, name), value)?;
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        for name in [SUMMARIES_FILENAME, INDEX_FILENAME] {
            let path = self.root.join(name);
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to delete {}", path.display()))?;
            }
        }
        for dir in [CONVERSATIONS_DIR, ASSETS_DIR, METADATA_DIR] {
            let path = self.root.join(dir);
            if path.exists() {
                fs::remove_dir_all(&path)
                    .with_context(|| format!("Failed to clear {}", path.display()))?;
            }
        }
        Ok(())
    }
}
