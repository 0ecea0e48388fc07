//! chatvault - Import, index and search personal chat-export archives
//!
//! This library ingests chat-export ZIP archives, converts their raw
//! graph-shaped conversations into normalized linear records, builds a
//! trigram full-text index, and reconciles each import against a persisted
//! dataset. It supports:
//!
//! - Unpacking export archives and locating the conversation payload
//!   (embedded HTML JSON or a flat `conversations.json`)
//! - Walking possibly-malformed conversation graphs into slim records
//! - Trigram indexing and exact-AND candidate search
//! - Three import modes: `upsert`, `replace`, and `clone`
//! - Pluggable persistence: a directory tree or an in-memory key/value map
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use chatvault::ingest::{NullProgress, import_archives};
//! use chatvault::reconcile::ImportMode;
//! use chatvault::storage::DirStore;
//!
//! let mut store = DirStore::open(&PathBuf::from("/tmp/dataset"))?;
//! let archives = vec![PathBuf::from("export.zip")];
//! let outcome = import_archives(&mut store, &archives, ImportMode::Upsert, &NullProgress)?;
//! println!("Imported {} conversations", outcome.conversations_written);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod converter;
pub mod indexer;
pub mod ingest;
pub mod models;
pub mod reconcile;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use converter::convert_graph;
pub use indexer::{index_conversation, search};
pub use ingest::import_archives;
pub use models::{ConversationSummary, SearchHit, SearchIndex, SlimConversation};
pub use reconcile::ImportMode;
pub use storage::{DatasetStore, DirStore, MemoryStore};
