/// Import-mode behavior across repeated imports of the same archives
mod common;

use chatvault::ingest::{NullProgress, import_archives};
use chatvault::reconcile::ImportMode;
use chatvault::storage::{DatasetStore, MemoryStore};
use common::{ExportArchiveBuilder, GraphBuilder, ten_conversation_archive};
use regex::Regex;

#[test]
fn upsert_is_idempotent_across_reimports() {
    let (_dir, archive) = ten_conversation_archive();
    let mut store = MemoryStore::new();

    import_archives(&mut store, &[archive.clone()], ImportMode::Upsert, &NullProgress).unwrap();
    let first = store.load_summaries().unwrap();

    import_archives(&mut store, &[archive], ImportMode::Upsert, &NullProgress).unwrap();
    let second = store.load_summaries().unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 10, "re-importing identical data must not grow the dataset");
    let mut ids: Vec<&str> = second.iter().map(|s| s.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[test]
fn upsert_keeps_newer_existing_record() {
    let (_d1, newer) = ExportArchiveBuilder::new()
        .with_graph(
            GraphBuilder::new("c1")
                .title("Newer")
                .create_time(1_800_000_000.0)
                .user_text("newer content")
                .build(),
        )
        .build();
    let (_d2, older) = ExportArchiveBuilder::new()
        .with_graph(
            GraphBuilder::new("c1")
                .title("Older")
                .create_time(1_600_000_000.0)
                .user_text("older content")
                .build(),
        )
        .build();

    let mut store = MemoryStore::new();
    import_archives(&mut store, &[newer], ImportMode::Upsert, &NullProgress).unwrap();
    import_archives(&mut store, &[older], ImportMode::Upsert, &NullProgress).unwrap();

    let summaries = store.load_summaries().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].title, "Newer");
}

#[test]
fn multi_archive_batch_merges_shared_ids_before_reconciling() {
    let (_d1, older) = ExportArchiveBuilder::new()
        .with_graph(
            GraphBuilder::new("c1")
                .title("Older")
                .create_time(1_600_000_000.0)
                .user_text("older content")
                .build(),
        )
        .build();
    let (_d2, newer) = ExportArchiveBuilder::new()
        .with_graph(
            GraphBuilder::new("c1")
                .title("Newer")
                .create_time(1_800_000_000.0)
                .user_text("newer content")
                .build(),
        )
        .build();

    // Newer archive first: batch order must not matter.
    let mut store = MemoryStore::new();
    let outcome =
        import_archives(&mut store, &[newer, older], ImportMode::Upsert, &NullProgress).unwrap();

    assert_eq!(outcome.conversations_written, 1);
    let summaries = store.load_summaries().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].title, "Newer");
}

#[test]
fn replace_wipes_previous_dataset() {
    let (_d1, first) = ten_conversation_archive();
    let (_d2, second) = ExportArchiveBuilder::new()
        .with_graph(GraphBuilder::new("only-one").user_text("replacement data").build())
        .build();

    let mut store = MemoryStore::new();
    import_archives(&mut store, &[first], ImportMode::Upsert, &NullProgress).unwrap();
    assert_eq!(store.load_summaries().unwrap().len(), 10);
    assert_eq!(store.asset_count(), 1);

    import_archives(&mut store, &[second], ImportMode::Replace, &NullProgress).unwrap();

    let summaries = store.load_summaries().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, "only-one");
    // Old conversation records and assets are gone.
    assert!(store.load_conversation("conv-00").unwrap().is_none());
    assert_eq!(store.asset_count(), 0);
    let index = store.load_search_index().unwrap();
    assert_eq!(index.lines.len(), 1);
}

#[test]
fn replace_import_of_fixture_yields_exact_counts() {
    let (_dir, archive) = ten_conversation_archive();
    let mut store = MemoryStore::new();

    let outcome =
        import_archives(&mut store, &[archive], ImportMode::Replace, &NullProgress).unwrap();

    assert_eq!(store.load_summaries().unwrap().len(), 10);
    assert!(outcome.assets_written > 0);
}

#[test]
fn clone_reimport_doubles_with_unique_v_suffixes() {
    let (_dir, archive) = ten_conversation_archive();
    let mut store = MemoryStore::new();

    import_archives(&mut store, &[archive.clone()], ImportMode::Clone, &NullProgress).unwrap();
    import_archives(&mut store, &[archive], ImportMode::Clone, &NullProgress).unwrap();

    let summaries = store.load_summaries().unwrap();
    assert_eq!(summaries.len(), 20);

    let suffix = Regex::new(r"^conv-\d{2}_v(\d+)$").unwrap();
    let cloned: Vec<&str> =
        summaries.iter().map(|s| s.id.as_str()).filter(|id| suffix.is_match(id)).collect();
    assert_eq!(cloned.len(), 10);
    assert!(cloned.iter().any(|id| id.ends_with("_v2")));

    let mut ids: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20, "clone must never overwrite an existing id");

    // Search lines were rewritten to the assigned ids.
    let index = store.load_search_index().unwrap();
    for id in cloned {
        let lines = index.lines.get(id).expect("cloned conversation is indexed");
        assert!(lines.iter().all(|l| l.conversation_id == id));
        assert!(store.load_conversation(id).unwrap().is_some());
    }
}

#[test]
fn clone_never_touches_existing_records() {
    let (_d1, original) = ExportArchiveBuilder::new()
        .with_graph(
            GraphBuilder::new("c1").title("Original").user_text("original body").build(),
        )
        .build();
    let (_d2, imposter) = ExportArchiveBuilder::new()
        .with_graph(
            GraphBuilder::new("c1")
                .title("Imposter")
                .create_time(1_900_000_000.0)
                .user_text("newer but must not overwrite")
                .build(),
        )
        .build();

    let mut store = MemoryStore::new();
    import_archives(&mut store, &[original], ImportMode::Upsert, &NullProgress).unwrap();
    import_archives(&mut store, &[imposter], ImportMode::Clone, &NullProgress).unwrap();

    let kept = store.load_conversation("c1").unwrap().unwrap();
    assert_eq!(kept.title, "Original");
    let clone = store.load_conversation("c1_v2").unwrap().unwrap();
    assert_eq!(clone.title, "Imposter");
}
