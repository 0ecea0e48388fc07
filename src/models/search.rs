use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One physical line of indexable text, tagged with its exact location so a
/// hit can be scrolled to without re-parsing the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLine {
    pub conversation_id: String,
    pub message_id: String,
    pub block_index: usize,
    pub line_number: usize,
    pub text: String,
}

/// Title and recency for one conversation, kept alongside the index so
/// search results can be rendered without loading full records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleEntry {
    pub title: String,
    pub last_message_time: i64,
}

/// Dataset-level search index: trigram postings plus per-conversation lines.
/// Persisted as one record; entries for a conversation are inserted and
/// removed together with the conversation itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchIndex {
    /// Normalized 3-char gram → sorted set of conversation ids containing it.
    pub postings: BTreeMap<String, BTreeSet<String>>,
    pub lines: BTreeMap<String, Vec<SearchLine>>,
    pub titles: BTreeMap<String, TitleEntry>,
}

impl SearchIndex {
    /// Insert one conversation's search data, replacing anything already
    /// present under the same id.
    pub fn insert_conversation(
        &mut self,
        id: &str,
        lines: Vec<SearchLine>,
        grams: BTreeSet<String>,
        title: TitleEntry,
    ) {
        self.remove_conversation(id);
        for gram in grams {
            self.postings.entry(gram).or_default().insert(id.to_string());
        }
        self.lines.insert(id.to_string(), lines);
        self.titles.insert(id.to_string(), title);
    }

    /// Remove every trace of a conversation: lines, title, and postings.
    pub fn remove_conversation(&mut self, id: &str) {
        self.lines.remove(id);
        self.titles.remove(id);
        self.postings.retain(|_, ids| {
            ids.remove(id);
            !ids.is_empty()
        });
    }
}

/// One search match, with the line split around the matched substring and a
/// little same-block context on either side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub conversation_id: String,
    pub title: String,
    pub last_message_time: i64,
    pub message_id: String,
    pub block_index: usize,
    pub line_number: usize,
    pub before: String,
    pub matched: String,
    pub after: String,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(conv: &str, text: &str) -> SearchLine {
        SearchLine {
            conversation_id: conv.to_string(),
            message_id: "m1".to_string(),
            block_index: 0,
            line_number: 0,
            text: text.to_string(),
        }
    }

    #[test]
    fn remove_conversation_clears_postings() {
        let mut index = SearchIndex::default();
        let grams: BTreeSet<String> = ["abc", "bcd"].iter().map(|s| s.to_string()).collect();
        index.insert_conversation(
            "c1",
            vec![line("c1", "abcd")],
            grams.clone(),
            TitleEntry { title: "t".into(), last_message_time: 1 },
        );
        index.insert_conversation(
            "c2",
            vec![line("c2", "abc")],
            [String::from("abc")].into_iter().collect(),
            TitleEntry { title: "t2".into(), last_message_time: 2 },
        );

        index.remove_conversation("c1");

        assert!(!index.lines.contains_key("c1"));
        assert!(!index.titles.contains_key("c1"));
        // "bcd" was only in c1 and must vanish entirely; "abc" keeps c2.
        assert!(!index.postings.contains_key("bcd"));
        assert_eq!(index.postings["abc"].len(), 1);
        assert!(index.postings["abc"].contains("c2"));
    }

    #[test]
    fn insert_replaces_existing_entries() {
        let mut index = SearchIndex::default();
        index.insert_conversation(
            "c1",
            vec![line("c1", "old")],
            [String::from("old")].into_iter().collect(),
            TitleEntry { title: "old".into(), last_message_time: 1 },
        );
        index.insert_conversation(
            "c1",
            vec![line("c1", "new")],
            [String::from("new")].into_iter().collect(),
            TitleEntry { title: "new".into(), last_message_time: 2 },
        );

        assert_eq!(index.lines["c1"].len(), 1);
        assert_eq!(index.lines["c1"][0].text, "new");
        assert!(!index.postings.contains_key("old"));
        assert_eq!(index.titles["c1"].title, "new");
    }
}
