//! System prompt composition.
//!
//! The instructions template carries a `####MESSAGE####` placeholder for the
//! refusal sentence; retrieved context follows in a `####CONTEXT####` block.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::messages::CANNOT_PROCESS;

pub const MESSAGE_PLACEHOLDER: &str = "####MESSAGE####";
pub const CONTEXT_DELIMITER: &str = "####CONTEXT####";
pub const MEMORY_DELIMITER: &str = "####MEMORY####";

const BUNDLED_INSTRUCTIONS: &str = include_str!("../prompts/instructions.md");

/// Errors from loading the instructions template.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Instructions file not found at: {}", .path.display())]
    InstructionsNotFound { path: PathBuf },

    #[error("Failed to read instructions from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for prompt operations.
pub type PromptResult<T> = Result<T, PromptError>;

/// Where the instructions template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionsSource {
    /// Template compiled into the binary.
    Bundled,
    /// Template read from disk on every compose.
    File(PathBuf),
}

/// Builds the system prompt sent with each query.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    source: InstructionsSource,
}

impl PromptComposer {
    pub fn new(source: InstructionsSource) -> Self {
        Self { source }
    }

    pub fn bundled() -> Self {
        Self::new(InstructionsSource::Bundled)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(InstructionsSource::File(path.into()))
    }

    /// Bundled template unless an override path is configured.
    pub fn from_settings(instructions_path: Option<&Path>) -> Self {
        match instructions_path {
            Some(path) => Self::from_file(path),
            None => Self::bundled(),
        }
    }

    /// The trimmed instructions template.
    pub fn instructions(&self) -> PromptResult<String> {
        match &self.source {
            InstructionsSource::Bundled => Ok(BUNDLED_INSTRUCTIONS.trim().to_string()),
            InstructionsSource::File(path) => match std::fs::read_to_string(path) {
                Ok(raw) => Ok(raw.trim().to_string()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(PromptError::InstructionsNotFound { path: path.clone() })
                }
                Err(source) => Err(PromptError::Io {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }

    /// Compose the system prompt.
    ///
    /// An empty `context` still produces the (empty) delimited block. `memory`
    /// is appended in its own block when present and non-empty.
    pub fn compose(&self, context: &str, memory: Option<&str>) -> PromptResult<String> {
        let mut prompt = self
            .instructions()?
            .replace(MESSAGE_PLACEHOLDER, CANNOT_PROCESS);

        if context.is_empty() {
            prompt.push_str(&format!("\n\n{CONTEXT_DELIMITER}\n\n{CONTEXT_DELIMITER}"));
        } else {
            prompt.push_str(&format!(
                "\n\n{CONTEXT_DELIMITER}\n\n{context}\n\n{CONTEXT_DELIMITER}"
            ));
        }

        if let Some(memory) = memory.filter(|m| !m.is_empty()) {
            prompt.push_str(&format!(
                "\n\n{MEMORY_DELIMITER}\n\n{memory}\n\n{MEMORY_DELIMITER}"
            ));
        }

        Ok(prompt)
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::bundled()
    }
}
