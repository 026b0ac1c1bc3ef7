//! Append-only record of who said what.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};

use crate::error::Result;
use crate::types::Message;

/// Receives every message as it enters the conversation.
///
/// Recording is best effort and must never stop a run.
pub trait TranscriptSink: Send + Sync {
    fn record(&self, speaker: &str, message: &Message);
}

/// One transcript line: `[CODE] ` when the content has a fence, then
/// `SPEAKER: content`.
pub fn format_entry(speaker: &str, message: &Message) -> String {
    let marker = if message.has_fence() { "[CODE] " } else { "" };
    format!("{marker}{}: {}\n", speaker.to_uppercase(), message.content)
}

/// Appends entries to a log file.
#[derive(Debug)]
pub struct FileTranscript {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileTranscript {
    /// Open `path` for appending, creating it and its parent directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranscriptSink for FileTranscript {
    fn record(&self, speaker: &str, message: &Message) {
        let entry = format_entry(speaker, message);
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = file.write_all(entry.as_bytes()) {
            warn!(path = %self.path.display(), error = %e, "failed to write transcript");
        }
    }
}

/// Emits every entry as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTranscript;

impl TranscriptSink for TracingTranscript {
    fn record(&self, speaker: &str, message: &Message) {
        info!(
            target: "pairloop::transcript",
            speaker,
            role = %message.role,
            "{}",
            message.content
        );
    }
}
