//! JSONL turn audit writer.
//!
//! One JSON object per completed turn, appended with a buffered writer.
//! Audit failures are logged and swallowed, never surfaced to the turn.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use tutormesh_application::{TurnAuditLogger, TurnRecord};

/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on every record and
/// on `Drop`.
pub struct JsonlTurnAudit {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlTurnAudit {
    /// Create a new audit log at the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!("Could not create audit directory {}: {}", parent.display(), e);
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create audit file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TurnAuditLogger for JsonlTurnAudit {
    fn record(&self, record: &TurnRecord) {
        let Ok(line) = serde_json::to_string(record) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Flush so every acknowledged turn is on disk.
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlTurnAudit {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Read;
    use tutormesh_domain::InteractionMode;

    fn record(mode: InteractionMode, agents: &[&str]) -> TurnRecord {
        TurnRecord {
            timestamp: Utc::now(),
            user_id: "u1".to_string(),
            session_id: "sess-u1".to_string(),
            mode,
            agent_ids: agents.iter().map(|a| a.to_string()).collect(),
            latency_ms: 42,
            route: None,
            collaborative: None,
        }
    }

    #[test]
    fn test_writes_one_json_line_per_turn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turns.jsonl");
        let audit = JsonlTurnAudit::new(&path).unwrap();

        audit.record(&record(InteractionMode::Manual, &["math-tutor"]));
        audit.record(&record(InteractionMode::Router, &["science-tutor"]));
        drop(audit);

        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        let lines: Vec<&str> = content.trim().lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["mode"], "manual");
        assert_eq!(first["agent_ids"][0], "math-tutor");
        // Optional fields are omitted, not null.
        assert!(first.get("route").is_none());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["mode"], "router");
    }

    #[test]
    fn test_unwritable_path_yields_none() {
        let result = JsonlTurnAudit::new("/proc/nonexistent/turns.jsonl");
        let _ = result;
    }
}
