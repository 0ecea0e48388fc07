//! Data models for chat-export ingestion and the persisted dataset.
//!
//! This module defines the data structures used throughout the pipeline:
//!
//! - [`RawConversationGraph`] - One conversation as exported: a node tree
//! - [`SlimConversation`] - Normalized linear record used for storage/search
//! - [`SearchIndex`] / [`SearchLine`] - Trigram postings and line records
//! - [`ConversationSummary`] - Lightweight listing/merge record
//! - [`AccountMetadata`] - Optional per-archive sidecar metadata
//!
//! Export-format structs use serde with lenient custom deserialization for
//! loosely-typed fields (tagged content unions with an `Unknown` fallback),
//! since the format drifts across export-tool versions.

pub mod conversation;
pub mod graph;
pub mod metadata;
pub mod search;
pub mod summary;

pub use conversation::{ContentBlock, MessageDetails, Role, SlimConversation, SlimMessage, Variant};
pub use graph::{AssetDescriptor, GraphNode, RawConversationGraph, RawMessage, RawPart};
pub use metadata::AccountMetadata;
pub use search::{SearchHit, SearchIndex, SearchLine, TitleEntry};
pub use summary::ConversationSummary;
