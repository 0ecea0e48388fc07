//! Persistence adapters for the imported dataset.
//!
//! One logical layout, two backends: [`DirStore`] writes a directory tree
//! (the headless batch tool's output) and [`MemoryStore`] keeps the same
//! shape as a flat key → bytes map (interactive hosts, tests). The ingest
//! and reconcile layers only ever see the [`DatasetStore`] trait, so the two
//! deployments cannot drift apart.

pub mod dir_store;
pub mod memory;

use anyhow::Result;

use crate::models::conversation::SlimConversation;
use crate::models::metadata::AccountMetadata;
use crate::models::search::SearchIndex;
use crate::models::summary::ConversationSummary;

pub use dir_store::DirStore;
pub use memory::MemoryStore;

/// Storage seam between the import core and wherever the dataset lives.
///
/// Writes are per-record; the only atomicity an implementation must provide
/// is for a single record. Callers keep conversation records and search
/// data consistent by always writing/removing them together.
pub trait DatasetStore {
    fn load_summaries(&self) -> Result<Vec<ConversationSummary>>;
    fn load_search_index(&self) -> Result<SearchIndex>;
    fn load_metadata(&self) -> Result<AccountMetadata>;
    fn load_conversation(&self, id: &str) -> Result<Option<SlimConversation>>;

    fn put_conversation(&mut self, conversation: &SlimConversation) -> Result<()>;
    fn delete_conversation(&mut self, id: &str) -> Result<()>;
    fn put_asset(&mut self, path: &str, bytes: &[u8]) -> Result<()>;
    fn put_summaries(&mut self, summaries: &[ConversationSummary]) -> Result<()>;
    fn put_search_index(&mut self, index: &SearchIndex) -> Result<()>;
    fn put_metadata(&mut self, metadata: &AccountMetadata) -> Result<()>;

    /// Remove every record: conversations, assets, index, summaries,
    /// metadata. Used by replace-mode imports.
    fn clear(&mut self) -> Result<()>;
}
