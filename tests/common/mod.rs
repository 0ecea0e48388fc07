//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Builder for fixture export archives (ZIP files in the export format).
pub struct ExportArchiveBuilder {
    graphs: Vec<Value>,
    asset_map: serde_json::Map<String, Value>,
    extra_entries: Vec<(String, Vec<u8>)>,
    embed_in_html: bool,
}

impl ExportArchiveBuilder {
    pub fn new() -> Self {
        Self {
            graphs: Vec::new(),
            asset_map: serde_json::Map::new(),
            extra_entries: Vec::new(),
            embed_in_html: true,
        }
    }

    /// Use the flat `conversations.json` layout instead of the embedded
    /// HTML payload.
    pub fn flat_json(mut self) -> Self {
        self.embed_in_html = false;
        self
    }

    pub fn with_graph(mut self, graph: Value) -> Self {
        self.graphs.push(graph);
        self
    }

    pub fn with_asset(mut self, pointer: &str, path: &str, mime: &str, bytes: &[u8]) -> Self {
        self.asset_map
            .insert(pointer.to_string(), json!({"path": path, "mime": mime}));
        self.extra_entries.push((path.to_string(), bytes.to_vec()));
        self
    }

    /// Register a descriptor without providing the payload entry.
    pub fn with_asset_descriptor(mut self, pointer: &str, path: &str) -> Self {
        self.asset_map.insert(pointer.to_string(), json!({"path": path}));
        self
    }

    pub fn with_entry(mut self, name: &str, bytes: &[u8]) -> Self {
        self.extra_entries.push((name.to_string(), bytes.to_vec()));
        self
    }

    pub fn with_sidecar(mut self, name: &str, value: Value) -> Self {
        self.extra_entries.push((name.to_string(), value.to_string().into_bytes()));
        self
    }

    pub fn write_to(self, path: &Path) {
        let file = std::fs::File::create(path).expect("Failed to create archive file");
        let mut writer = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        if self.embed_in_html {
            let html = format!(
                "<html><script>var jsonData = {}; var assetsJson = {};</script></html>",
                Value::Array(self.graphs.clone()),
                Value::Object(self.asset_map.clone()),
            );
            writer.start_file("chat.html", options).unwrap();
            writer.write_all(html.as_bytes()).unwrap();
        } else {
            writer.start_file("conversations.json", options).unwrap();
            writer
                .write_all(Value::Array(self.graphs.clone()).to_string().as_bytes())
                .unwrap();
        }

        for (name, bytes) in &self.extra_entries {
            writer.start_file(name.as_str(), options).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
    }

    /// Write the archive into a fresh temp dir and return (dir, path).
    pub fn build(self) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("export.zip");
        self.write_to(&path);
        (dir, path)
    }
}

impl Default for ExportArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a linear graph conversation: alternating nodes chained root to
/// leaf, `current_node` at the leaf.
pub struct GraphBuilder {
    id: String,
    title: String,
    create_time: f64,
    messages: Vec<Value>,
}

impl GraphBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: format!("Conversation {}", id),
            create_time: 1_700_000_000.0,
            messages: Vec::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn create_time(mut self, seconds: f64) -> Self {
        self.create_time = seconds;
        self
    }

    pub fn user_text(self, text: &str) -> Self {
        self.message("user", text)
    }

    pub fn assistant_text(self, text: &str) -> Self {
        self.message("assistant", text)
    }

    pub fn message(mut self, role: &str, text: &str) -> Self {
        let n = self.messages.len();
        let time = self.create_time + n as f64;
        self.messages.push(json!({
            "id": format!("{}-m{}", self.id, n),
            "author": {"role": role},
            "create_time": time,
            "content": {"content_type": "text", "parts": [text]}
        }));
        self
    }

    /// Message whose content carries an asset pointer part.
    pub fn user_asset(mut self, pointer: &str, caption: &str) -> Self {
        let n = self.messages.len();
        let time = self.create_time + n as f64;
        self.messages.push(json!({
            "id": format!("{}-m{}", self.id, n),
            "author": {"role": "user"},
            "create_time": time,
            "content": {"content_type": "multimodal_text", "parts": [
                {"content_type": "image_asset_pointer", "asset_pointer": pointer},
                caption
            ]}
        }));
        self
    }

    pub fn build(self) -> Value {
        let mut mapping = serde_json::Map::new();
        let count = self.messages.len();
        for (i, message) in self.messages.into_iter().enumerate() {
            let node_id = format!("{}-n{}", self.id, i);
            let parent = (i > 0).then(|| format!("{}-n{}", self.id, i - 1));
            let children: Vec<String> =
                (i + 1 < count).then(|| vec![format!("{}-n{}", self.id, i + 1)]).unwrap_or_default();
            mapping.insert(
                node_id.clone(),
                json!({
                    "id": node_id,
                    "parent": parent,
                    "children": children,
                    "message": message
                }),
            );
        }

        json!({
            "id": self.id,
            "title": self.title,
            "create_time": self.create_time,
            "update_time": self.create_time + count as f64,
            "current_node": format!("{}-n{}", self.id, count.saturating_sub(1)),
            "mapping": mapping
        })
    }
}

/// A ten-conversation fixture archive with one asset, written to a temp dir.
pub fn ten_conversation_archive() -> (TempDir, PathBuf) {
    let mut builder = ExportArchiveBuilder::new().with_asset(
        "file-service://file-fixture",
        "assets/fixture.png",
        "image/png",
        b"\x89PNG-fixture",
    );
    for i in 0..10 {
        let mut graph = GraphBuilder::new(&format!("conv-{:02}", i))
            .create_time(1_700_000_000.0 + (i * 100) as f64)
            .user_text(&format!("question number {}", i))
            .assistant_text(&format!("answer number {}", i));
        if i == 0 {
            graph = graph.user_asset("file-service://file-fixture", "see attachment");
        }
        builder = builder.with_graph(graph.build());
    }
    builder.build()
}
