use std::collections::BTreeMap;

use anyhow::{Context, Result};

use super::DatasetStore;
use crate::models::conversation::SlimConversation;
use crate::models::metadata::AccountMetadata;
use crate::models::search::SearchIndex;
use crate::models::summary::ConversationSummary;
use crate::utils::sanitize_asset_path;

/// In-memory dataset store with the same logical key layout as
/// [`DirStore`](super::DirStore). Interactive hosts hand the key space to a
/// browser key/value backend; tests use it directly. Binary asset payloads
/// are owned by the store and released on every removal path, so callers
/// never hold dangling references after a clear.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, Vec<u8>>,
    assets: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asset(&self, path: &str) -> Option<&[u8]> {
        self.assets.get(path).map(Vec::as_slice)
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.records.get(key) else { return Ok(None) };
        let value = serde_json::from_slice(bytes)
            .with_context(|| format!("Failed to parse record {}", key))?;
        Ok(Some(value))
    }

    fn write_json<T: serde::Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value).context("Failed to serialize record")?;
        self.records.insert(key.to_string(), bytes);
        Ok(())
    }
}

impl DatasetStore for MemoryStore {
    fn load_summaries(&self) -> Result<Vec<ConversationSummary>> {
        Ok(self.read_json("summaries.json")?.unwrap_or_default())
    }

    fn load_search_index(&self) -> Result<SearchIndex> {
        Ok(self.read_json("search-index.json")?.unwrap_or_default())
    }

    fn load_metadata(&self) -> Result<AccountMetadata> {
        Ok(self.read_json("metadata.json")?.unwrap_or_default())
    }

    fn load_conversation(&self, id: &str) -> Result<Option<SlimConversation>> {
        self.read_json(&format!("conversations/{}", id))
    }

    fn put_conversation(&mut self, conversation: &SlimConversation) -> Result<()> {
        self.write_json(&format!("conversations/{}", conversation.id), conversation)
    }

    fn delete_conversation(&mut self, id: &str) -> Result<()> {
        self.records.remove(&format!("conversations/{}", id));
        Ok(())
    }

    fn put_asset(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        // Same policy as the directory writer, even though no filesystem is
        // involved: key-space traversal is still traversal.
        let safe = sanitize_asset_path(path)?;
        self.assets.insert(safe, bytes.to_vec());
        Ok(())
    }

    fn put_summaries(&mut self, summaries: &[ConversationSummary]) -> Result<()> {
        self.write_json("summaries.json", &summaries)
    }

    fn put_search_index(&mut self, index: &SearchIndex) -> Result<()> {
        self.write_json("search-index.json", index)
    }

    fn put_metadata(&mut self, metadata: &AccountMetadata) -> Result<()> {
        self.write_json("metadata.json", metadata)
    }

    fn clear(&mut self) -> Result<()> {
        self.records.clear();
        self.assets.clear();
        Ok(())
    }
}
