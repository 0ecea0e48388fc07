use std::io::Write;

/// A single progress event from an import run. Advisory only: reporters may
/// drop events, and nothing in the pipeline waits on them.
#[derive(Debug, Clone)]
pub enum ImportEvent {
    ArchiveStarted { index: usize, total: usize, name: String },
    ConversationsConverted { name: String, done: usize, total: usize },
    AssetCollected { path: String },
    ArchiveCompleted { name: String, conversations: usize, assets: usize },
}

/// Receives import progress. Implementations write to stderr so stdout
/// stays parseable for scripts; interactive hosts can forward events to a
/// UI instead.
pub trait ProgressReporter {
    fn report(&self, event: &ImportEvent);
}

/// Human-readable progress on stderr.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: &ImportEvent) {
        let line = match event {
            ImportEvent::ArchiveStarted { index, total, name } => {
                format!("[{}/{}] importing {}\n", index + 1, total, name)
            }
            ImportEvent::ConversationsConverted { name, done, total } => {
                format!("  {}: {} / {} conversations\n", name, done, total)
            }
            ImportEvent::AssetCollected { path } => format!("  asset {}\n", path),
            ImportEvent::ArchiveCompleted { name, conversations, assets } => {
                format!("  {} done: {} conversations, {} assets\n", name, conversations, assets)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }
}

/// Discards all events.
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn report(&self, _event: &ImportEvent) {}
}
