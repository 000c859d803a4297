//! Append-only chat log — one line per inbound event.

use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

/// Line-oriented message log: `[ISO-8601 timestamp] sender: text`.
///
/// Failures are logged and swallowed; the chat flow never blocks on the
/// log file.
pub struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one inbound event.
    pub fn append(&self, sender: &str, text: &str) {
        if let Err(e) = self.try_append(sender, text) {
            warn!("chat log write failed: {e}");
        }
    }

    fn try_append(&self, sender: &str, text: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "[{}] {sender}: {text}",
            Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_writes_one_line_per_event() {
        let dir = std::env::temp_dir().join("__lapak_test_chatlog__");
        let _ = std::fs::remove_dir_all(&dir);
        let log = ChatLog::new(dir.join("logs.txt"));

        log.append("628123", "TOP UP");
        log.append("628456", "halo");

        let content = std::fs::read_to_string(dir.join("logs.txt")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("628123: TOP UP"));
        assert!(lines[1].ends_with("628456: halo"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_append_survives_missing_file() {
        let dir = std::env::temp_dir().join("__lapak_test_chatlog_missing__");
        let _ = std::fs::remove_dir_all(&dir);
        let log = ChatLog::new(dir.join("nested").join("logs.txt"));

        // Must not panic; creates parents on demand.
        log.append("628123", "hello");
        assert!(dir.join("nested").join("logs.txt").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
