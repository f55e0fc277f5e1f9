//! JSONL transcript of a run.
//!
//! One line per [`ConversationEvent`]: the payload's fields with `type` and
//! `timestamp` (RFC 3339, millisecond precision) added at the top level.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use shellpilot_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// File name for a transcript started at `started`.
pub fn conversation_file_name(started: DateTime<Utc>) -> String {
    format!("conversation-{}.jsonl", started.format("%Y%m%dT%H%M%S%.3fZ"))
}

/// Turn an event into the object written on its line.
fn to_record(event: ConversationEvent) -> Value {
    let mut map = match event.payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    map.insert("type".to_string(), Value::from(event.event_type));
    map.insert(
        "timestamp".to_string(),
        Value::from(event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Value::Object(map)
}

/// Buffered JSONL writer behind a mutex; every record is flushed as it is
/// written, and again on drop.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Create (truncate) the log file at `path`, making parent directories.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// A fresh `conversation-<timestamp>.jsonl` in `dir`. Failures are
    /// logged and yield `None` so the caller can fall back to no logging.
    pub fn in_dir(dir: impl AsRef<Path>) -> Option<Self> {
        let path = dir.as_ref().join(conversation_file_name(Utc::now()));
        match Self::create(&path) {
            Ok(logger) => {
                info!("Conversation log: {}", path.display());
                Some(logger)
            }
            Err(e) => {
                warn!(
                    "Could not create conversation log {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let Ok(line) = serde_json::to_string(&to_record(event)) else {
            return;
        };
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Conversation log write failed: {}", e);
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        let writer = self.writer.get_mut().unwrap_or_else(|e| e.into_inner());
        let _ = writer.flush();
    }
}
