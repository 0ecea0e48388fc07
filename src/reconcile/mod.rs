//! Dataset reconciliation: merging a freshly ingested batch into the
//! persisted dataset under one of three deterministic import modes.
//!
//! All three modes operate on summaries as the comparison key and produce a
//! [`WriteSet`] the caller applies to the store; nothing here touches disk.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use anyhow::bail;
use regex::Regex;

use crate::models::conversation::SlimConversation;
use crate::models::search::SearchLine;
use crate::models::summary::ConversationSummary;

/// How incoming conversations are merged against the persisted dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Newer-wins per id; unseen ids are added.
    Upsert,
    /// Wipe the dataset, then write everything.
    Replace,
    /// Never overwrite; id collisions get a `_v<n>` suffix.
    Clone,
}

impl FromStr for ImportMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upsert" => Ok(ImportMode::Upsert),
            "replace" => Ok(ImportMode::Replace),
            "clone" => Ok(ImportMode::Clone),
            other => bail!("Invalid import mode '{}' (expected upsert, replace or clone)", other),
        }
    }
}

/// One fully converted and indexed conversation, ready to persist. The
/// conversation, its lines and its grams travel together so the store never
/// sees one without the others.
#[derive(Debug)]
pub struct IngestedConversation {
    pub conversation: SlimConversation,
    pub summary: ConversationSummary,
    pub lines: Vec<SearchLine>,
    pub grams: BTreeSet<String>,
}

impl IngestedConversation {
    /// Rewrites every id-bearing location to `new_id`. Used by clone mode.
    fn reassign_id(&mut self, new_id: &str) {
        self.conversation.id = new_id.to_string();
        self.summary.id = new_id.to_string();
        for line in &mut self.lines {
            line.conversation_id = new_id.to_string();
        }
    }
}

/// The reconciler's output: what to write and what the write replaces.
#[derive(Debug, Default)]
pub struct WriteSet {
    /// Clear the entire dataset before applying writes (replace mode).
    pub clear_first: bool,
    pub writes: Vec<IngestedConversation>,
}

/// Collapses conversations sharing an id across archives of one batch, so a
/// multi-archive import behaves as one coherent unit. Later archives win
/// ties under the same comparator reconciliation uses.
pub fn merge_batch(batch: Vec<IngestedConversation>) -> Vec<IngestedConversation> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, IngestedConversation> = HashMap::new();

    for incoming in batch {
        let id = incoming.summary.id.clone();
        let replace = match by_id.get(&id) {
            Some(kept) => !kept.summary.is_newer_than(&incoming.summary),
            None => {
                order.push(id.clone());
                true
            }
        };
        if replace {
            by_id.insert(id, incoming);
        }
    }

    order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
}

/// Applies the selected mode to a merged batch against the persisted
/// snapshot's summaries, producing the final write-set.
pub fn reconcile(
    existing: &[ConversationSummary],
    batch: Vec<IngestedConversation>,
    mode: ImportMode,
) -> WriteSet {
    match mode {
        ImportMode::Replace => WriteSet { clear_first: true, writes: batch },
        ImportMode::Upsert => reconcile_upsert(existing, batch),
        ImportMode::Clone => reconcile_clone(existing, batch),
    }
}

fn reconcile_upsert(existing: &[ConversationSummary], batch: Vec<IngestedConversation>) -> WriteSet {
    let by_id: HashMap<&str, &ConversationSummary> =
        existing.iter().map(|s| (s.id.as_str(), s)).collect();

    let writes = batch
        .into_iter()
        .filter(|incoming| match by_id.get(incoming.summary.id.as_str()) {
            // The incoming import is the later ingestion, so it wins exact
            // ties; only a strictly newer persisted record blocks it.
            Some(current) => !current.is_newer_than(&incoming.summary),
            None => true,
        })
        .collect();

    WriteSet { clear_first: false, writes }
}

fn reconcile_clone(existing: &[ConversationSummary], batch: Vec<IngestedConversation>) -> WriteSet {
    let mut counters = SuffixCounters::seeded_from(existing.iter().map(|s| s.id.as_str()));
    let mut taken: BTreeSet<String> = existing.iter().map(|s| s.id.clone()).collect();

    let mut writes = Vec::new();
    for mut incoming in batch {
        let id = incoming.summary.id.clone();
        if taken.contains(&id) {
            let new_id = counters.next_id(&id);
            incoming.reassign_id(&new_id);
            taken.insert(new_id);
        } else {
            counters.observe(&id);
            taken.insert(id);
        }
        writes.push(incoming);
    }

    WriteSet { clear_first: false, writes }
}

/// Per-base monotonic counters for clone-suffix assignment.
///
/// The base of `abc_v3` is `abc`; an id with no `_v<digits>` suffix is its
/// own base. An original id that legitimately ends in `_v<digits>` is
/// indistinguishable from a clone and is counted against its base; the
/// counter still guarantees unique assignments.
struct SuffixCounters {
    pattern: Regex,
    highest: HashMap<String, u32>,
}

impl SuffixCounters {
    fn seeded_from<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counters = SuffixCounters {
            pattern: Regex::new(r"^(.*)_v(\d+)$").expect("suffix pattern is valid"),
            highest: HashMap::new(),
        };
        for id in ids {
            counters.observe(id);
        }
        counters
    }

    fn split<'a>(&self, id: &'a str) -> (&'a str, u32) {
        match self.pattern.captures(id) {
            Some(caps) => {
                let base = caps.get(1).map(|m| m.as_str()).unwrap_or(id);
                let n = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(1);
                (base, n)
            }
            // The unsuffixed original counts as generation 1, so the first
            // clone becomes `_v2`.
            None => (id, 1),
        }
    }

    fn observe(&mut self, id: &str) {
        let (base, n) = self.split(id);
        let entry = self.highest.entry(base.to_string()).or_insert(0);
        *entry = (*entry).max(n);
    }

    fn next_id(&mut self, id: &str) -> String {
        let (base, _) = self.split(id);
        let entry = self.highest.entry(base.to_string()).or_insert(1);
        *entry += 1;
        format!("{}_v{}", base, entry)
    }
}
