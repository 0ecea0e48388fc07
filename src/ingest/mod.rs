//! Archive ingestion: unpack, convert, index, reconcile, persist.
//!
//! # Error Handling Strategy
//!
//! The batch keeps going through everything that can be skipped: unreadable
//! archives, archives without a recognizable payload, unconvertible graphs,
//! and unresolvable assets are warned about on stderr and dropped. Only a
//! failing destination store aborts the batch, and conversations already
//! persisted for earlier work are not rolled back; the returned outcome
//! reflects exactly what was written.

pub mod archive;
pub mod embedded;
pub mod metadata;
pub mod progress;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::converter::convert_graph;
use crate::indexer::index_conversation;
use crate::models::search::TitleEntry;
use crate::models::summary::ConversationSummary;
use crate::reconcile::{ImportMode, IngestedConversation, merge_batch, reconcile};
use crate::storage::DatasetStore;

pub use archive::unpack_archive;
pub use embedded::{ExportPayload, extract_payload};
pub use metadata::extract_metadata;
pub use progress::{ImportEvent, NullProgress, ProgressReporter, StderrProgress};

/// Conversion progress is reported every this many conversations.
const PROGRESS_EVERY: usize = 25;

/// Final tally of one import batch.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub conversations_written: usize,
    pub assets_written: usize,
    pub archives_processed: usize,
    pub archives_skipped: usize,
}

/// Runs one import batch: every archive in order, then one reconciliation
/// pass against the store under the selected mode.
///
/// # Errors
///
/// Returns an error only when the destination store cannot be read or
/// written. Everything else degrades to a stderr warning and a skip.
pub fn import_archives(
    store: &mut dyn DatasetStore,
    archives: &[PathBuf],
    mode: ImportMode,
    progress: &dyn ProgressReporter,
) -> Result<ImportOutcome> {
    let existing_summaries =
        store.load_summaries().context("Failed to load existing summaries")?;
    let mut index = store.load_search_index().context("Failed to load search index")?;
    let existing_metadata = store.load_metadata().context("Failed to load metadata")?;
    let mut batch_metadata = crate::models::AccountMetadata::default();

    let mut batch: Vec<IngestedConversation> = Vec::new();
    let mut staged_assets: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut outcome = ImportOutcome::default();

    for (archive_index, path) in archives.iter().enumerate() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        progress.report(&ImportEvent::ArchiveStarted {
            index: archive_index,
            total: archives.len(),
            name: name.clone(),
        });

        let entries = match unpack_archive(path) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("Warning: Skipping archive {}: {}", path.display(), e);
                outcome.archives_skipped += 1;
                continue;
            }
        };

        let Some(payload) = extract_payload(&entries) else {
            eprintln!(
                "Warning: Skipping archive {}: no embedded graphs and no conversations.json",
                path.display()
            );
            outcome.archives_skipped += 1;
            continue;
        };

        let entry_names: Vec<String> = entries.keys().cloned().collect();
        let total = payload.graphs.len();
        let mut converted_count = 0;
        let mut archive_assets = 0;

        for graph in &payload.graphs {
            let Some(converted) = convert_graph(graph, &payload.assets, &entry_names) else {
                continue;
            };

            for (asset_path, entry_name) in &converted.assets {
                let Some(bytes) = entries.get(entry_name) else { continue };
                if !staged_assets.contains_key(asset_path) {
                    staged_assets.insert(asset_path.clone(), bytes.clone());
                    archive_assets += 1;
                    progress.report(&ImportEvent::AssetCollected { path: asset_path.clone() });
                }
            }

            let indexed = index_conversation(&converted.conversation);
            let summary = ConversationSummary {
                id: converted.conversation.id.clone(),
                title: converted.conversation.title.clone(),
                snippet: converted.snippet.clone(),
                last_message_time: converted.conversation.last_message_time,
                create_time: converted.conversation.create_time,
                update_time: converted.conversation.update_time,
                node_count: converted.node_count,
                source: Some(name.clone()),
            };

            batch.push(IngestedConversation {
                conversation: converted.conversation,
                summary,
                lines: indexed.lines,
                grams: indexed.grams,
            });

            converted_count += 1;
            if converted_count % PROGRESS_EVERY == 0 {
                progress.report(&ImportEvent::ConversationsConverted {
                    name: name.clone(),
                    done: converted_count,
                    total,
                });
            }
        }

        batch_metadata.merge_from(extract_metadata(&entries));
        outcome.archives_processed += 1;
        progress.report(&ImportEvent::ArchiveCompleted {
            name,
            conversations: converted_count,
            assets: archive_assets,
        });
    }

    let write_set = reconcile(&existing_summaries, merge_batch(batch), mode);

    // A replace-mode import forgets persisted metadata along with the rest
    // of the dataset; otherwise later archives layer over what was stored.
    let (mut summaries, metadata) = if write_set.clear_first {
        store.clear().context("Failed to clear destination dataset")?;
        index = Default::default();
        (Vec::new(), batch_metadata)
    } else {
        let mut metadata = existing_metadata;
        metadata.merge_from(batch_metadata);
        (existing_summaries, metadata)
    };

    for ingested in write_set.writes {
        store
            .put_conversation(&ingested.conversation)
            .with_context(|| format!("Failed to write conversation {}", ingested.conversation.id))?;
        index.insert_conversation(
            &ingested.conversation.id,
            ingested.lines,
            ingested.grams,
            TitleEntry {
                title: ingested.conversation.title.clone(),
                last_message_time: ingested.conversation.last_message_time,
            },
        );
        upsert_summary(&mut summaries, ingested.summary);
        outcome.conversations_written += 1;
    }

    for (path, bytes) in &staged_assets {
        store
            .put_asset(path, bytes)
            .with_context(|| format!("Failed to write asset {}", path))?;
        outcome.assets_written += 1;
    }

    // Newest first, matching the listing order hosts display.
    summaries.sort_by(|a, b| {
        b.last_message_time.cmp(&a.last_message_time).then_with(|| a.id.cmp(&b.id))
    });
    store.put_summaries(&summaries).context("Failed to write summaries")?;
    store.put_search_index(&index).context("Failed to write search index")?;
    if !metadata.is_empty() {
        store.put_metadata(&metadata).context("Failed to write metadata")?;
    }

    Ok(outcome)
}

fn upsert_summary(summaries: &mut Vec<ConversationSummary>, summary: ConversationSummary) {
    match summaries.iter_mut().find(|s| s.id == summary.id) {
        Some(slot) => *slot = summary,
        None => summaries.push(summary),
    }
}
