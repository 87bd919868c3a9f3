//! Conversation memory.
//!
//! Long-term memory is the persisted [`ConversationLog`]; short-term memory is
//! the bounded [`WorkingMemory`]. Every recorded exchange feeds both.

pub mod log;
pub mod working;

pub use log::{ConversationLog, ConversationRecord};
pub use working::{WorkingMemory, WorkingMemoryItem};

use std::path::Path;
use thiserror::Error;

/// Errors from memory persistence.
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;

const USER_IMPORTANCE: f32 = 1.0;
const AGENT_IMPORTANCE: f32 = 0.9;
const CONTEXT_HISTORY: usize = 3;

/// Conversation log plus working memory.
#[derive(Debug)]
pub struct ConversationMemory {
    log: ConversationLog,
    working: WorkingMemory,
}

impl ConversationMemory {
    /// Open the log at `path` with a working memory of `capacity` items.
    pub fn open(path: &Path, capacity: usize) -> Self {
        Self {
            log: ConversationLog::open(path),
            working: WorkingMemory::new(capacity),
        }
    }

    /// Memory that is never persisted.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            log: ConversationLog::in_memory(),
            working: WorkingMemory::new(capacity),
        }
    }

    /// Record one exchange.
    ///
    /// The working memory is updated even when persisting the log fails; the
    /// error is still returned so the caller can log it.
    pub fn record(
        &mut self,
        user_message: &str,
        agent_response: &str,
        metadata: Option<serde_json::Value>,
    ) -> MemoryResult<()> {
        let persisted = self.log.append(ConversationRecord::new(
            user_message,
            agent_response,
            metadata,
        ));

        self.working
            .insert(format!("User: {user_message}"), USER_IMPORTANCE);
        self.working
            .insert(format!("Agent: {agent_response}"), AGENT_IMPORTANCE);

        persisted
    }

    /// Keyword search over past exchanges.
    ///
    /// The score of a record is how many whitespace-separated query terms
    /// occur (case-insensitively, as substrings) in its user message and
    /// response. Records scoring zero are dropped; the rest are returned best
    /// first, oldest first among equals.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&ConversationRecord> {
        let query = query.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();

        let mut scored: Vec<(usize, &ConversationRecord)> = self
            .log
            .records()
            .iter()
            .filter_map(|record| {
                let text = format!("{} {}", record.user_message, record.agent_response)
                    .to_lowercase();
                let score = terms.iter().filter(|term| text.contains(**term)).count();
                (score > 0).then_some((score, record))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, record)| record)
            .collect()
    }

    /// The last `count` records, oldest first.
    pub fn recent(&self, count: usize) -> &[ConversationRecord] {
        let records = self.log.records();
        &records[records.len().saturating_sub(count)..]
    }

    /// Text block summarising working memory and recent history.
    pub fn render_context(&self) -> String {
        let working = self
            .working
            .items()
            .iter()
            .map(|item| format!("- {}", item.content))
            .collect::<Vec<_>>()
            .join("\n");

        let history = self
            .recent(CONTEXT_HISTORY)
            .iter()
            .map(|r| format!("User: {}\nAgent: {}", r.user_message, r.agent_response))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "### Current Context (Working Memory):\n{working}\n\n### Recent Conversation History:\n{history}"
        )
    }

    pub fn working(&self) -> &WorkingMemory {
        &self.working
    }

    pub fn records(&self) -> &[ConversationRecord] {
        self.log.records()
    }
}
