//! Trigram search index: building per-conversation search data and running
//! queries against the dataset-level index.
//!
//! Candidate selection is exact-AND over normalized trigrams; candidates
//! are confirmed with a literal case-insensitive scan of the stored lines,
//! so the index can never produce a hit the raw text does not contain.

pub mod builder;
pub mod query;

pub use builder::{IndexedConversation, index_conversation, normalize_text, trigrams};
pub use query::{DEFAULT_RESULT_LIMIT, search};
