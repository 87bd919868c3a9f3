//! Durable conversation log.
//!
//! The whole log is a pretty-printed JSON array, rewritten on every append.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use super::MemoryResult;

/// One exchange between the user and the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub user_message: String,
    pub agent_response: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

impl ConversationRecord {
    pub fn new(
        user_message: impl Into<String>,
        agent_response: impl Into<String>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            user_message: user_message.into(),
            agent_response: agent_response.into(),
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// Accept RFC 3339 timestamps as well as offset-less ISO-8601 ones, which are
/// read as local time.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(serde::de::Error::custom)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| serde::de::Error::custom(format!("nonexistent local time: {raw}")))
}

/// Chronological, append-only list of records mirrored to a JSON file.
#[derive(Debug)]
pub struct ConversationLog {
    path: Option<PathBuf>,
    records: Vec<ConversationRecord>,
}

impl ConversationLog {
    /// Load the log at `path`.
    ///
    /// A missing file starts an empty log. So does an unreadable one, with a
    /// warning; it is overwritten on the next append.
    pub fn open(path: &Path) -> Self {
        let records = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Vec<ConversationRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(
                        target: "memory",
                        "ignoring unparseable conversation log {}: {e}",
                        path.display()
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    target: "memory",
                    "cannot read conversation log {}: {e}",
                    path.display()
                );
                Vec::new()
            }
        };

        tracing::debug!(
            target: "memory",
            "loaded {} conversation record(s) from {}",
            records.len(),
            path.display()
        );

        Self {
            path: Some(path.to_path_buf()),
            records,
        }
    }

    /// A log that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Vec::new(),
        }
    }

    /// Append a record and rewrite the file.
    ///
    /// The record stays in memory even if the write fails.
    pub fn append(&mut self, record: ConversationRecord) -> MemoryResult<()> {
        self.records.push(record);
        self.persist()
    }

    pub fn records(&self) -> &[ConversationRecord] {
        &self.records
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self) -> MemoryResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let log = ConversationLog::open(&dir.path().join("conversations.json"));
        assert!(log.records().is_empty());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conversations.json");
        std::fs::write(&path, "{ not json").unwrap();

        let log = ConversationLog::open(&path);
        assert!(log.records().is_empty());
    }

    #[test]
    fn test_append_rewrites_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state/conversations.json");

        let mut log = ConversationLog::open(&path);
        log.append(ConversationRecord::new("hi", "hello", None))
            .unwrap();
        log.append(ConversationRecord::new(
            "what is EduTrack?",
            "An educational platform.",
            Some(serde_json::json!({"user_id": "u1"})),
        ))
        .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["user_message"], "hi");
        assert!(array[0]["metadata"].is_null());
        assert_eq!(array[1]["metadata"]["user_id"], "u1");
        // Pretty-printed
        assert!(raw.contains("\n  {"));

        let reopened = ConversationLog::open(&path);
        assert_eq!(reopened.records(), log.records());
    }

    #[test]
    fn test_reads_offsetless_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conversations.json");
        std::fs::write(
            &path,
            r#"[{"user_message": "a", "agent_response": "b",
                 "timestamp": "2024-05-01T10:15:30.123456", "metadata": null}]"#,
        )
        .unwrap();

        let log = ConversationLog::open(&path);
        assert_eq!(log.records().len(), 1);
        assert_eq!(log.records()[0].agent_response, "b");
    }
}
