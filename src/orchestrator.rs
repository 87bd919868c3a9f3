//! Single-pass query handling.
//!
//! Validate → guard → (mask | retrieve) → prompt → remote model → memory.
//! Every path ends in a user-facing string and a conversation record.

use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::guard::{Guard, PiiGuard};
use crate::ingest::{IngestStats, Ingestor};
use crate::llm::{ChatModel, GeminiClient, GeminiConfig};
use crate::memory::ConversationMemory;
use crate::messages::{GUARD_PII, INVALID_INPUT, PROBLEM_OCCURRED};
use crate::prompt::PromptComposer;
use crate::retrieve::{ContextRetriever, Retriever};
use crate::vector::open_store;
use crate::{debug_event, log_event};

/// Recorded in place of the user's text when it could not be masked.
const REDACTED_INPUT: &str = "<REDACTED>";

/// One user query.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub user_input: String,
    pub user_id: Option<String>,
}

impl ChatRequest {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Why a query did not produce a model answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Blank input.
    InvalidInput,
    /// A corpus or instructions file is missing; carries the text shown.
    NotFound(String),
    /// Anything else.
    Generic,
}

/// Result of one pass through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The model's answer.
    Proceed(String),
    /// Personal data found; carries the masked input.
    Blocked(String),
    Failed(FailureKind),
}

impl Outcome {
    /// The string returned to the user.
    pub fn reply(&self) -> &str {
        match self {
            Outcome::Proceed(answer) => answer,
            Outcome::Blocked(_) => GUARD_PII,
            Outcome::Failed(FailureKind::InvalidInput) => INVALID_INPUT,
            Outcome::Failed(FailureKind::NotFound(message)) => message,
            Outcome::Failed(FailureKind::Generic) => PROBLEM_OCCURRED,
        }
    }

    fn from_error(error: &Error) -> Self {
        if error.is_not_found() {
            Outcome::Failed(FailureKind::NotFound(error.to_string()))
        } else {
            Outcome::Failed(FailureKind::Generic)
        }
    }
}

/// Behaviour switches.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Corpus ingested by [`Orchestrator::ingest_corpus`].
    pub corpus_path: PathBuf,
    /// Send masked input to the model instead of refusing.
    pub forward_masked: bool,
    /// Append rendered memory context to the system prompt.
    pub inject_memory: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("docs"),
            forward_masked: false,
            inject_memory: false,
        }
    }
}

/// Owns every service a query touches.
pub struct Orchestrator {
    guard: Box<dyn Guard>,
    retriever: Box<dyn ContextRetriever>,
    model: Box<dyn ChatModel>,
    memory: ConversationMemory,
    prompts: PromptComposer,
    options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(
        guard: Box<dyn Guard>,
        retriever: Box<dyn ContextRetriever>,
        model: Box<dyn ChatModel>,
        memory: ConversationMemory,
        prompts: PromptComposer,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            guard,
            retriever,
            model,
            memory,
            prompts,
            options,
        }
    }

    /// Wire up the production services from settings.
    ///
    /// Pdfium and the API key are only needed once a PDF is read or the model
    /// is called, so blank and sensitive queries are answered without them.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate().map_err(Error::Config)?;

        let guard = PiiGuard::new(settings.guard.entities.as_slice())?;
        let store = open_store(settings, true)?;
        let ingestor = Ingestor::from_settings(settings)?;
        let retriever = Retriever::new(store, ingestor, settings.store.top_k);
        let model = GeminiClient::new(GeminiConfig::from_settings(&settings.llm));
        let memory = ConversationMemory::open(
            &settings.resolve(&settings.memory.path),
            settings.memory.capacity,
        );
        let instructions = settings
            .llm
            .instructions_path
            .as_ref()
            .map(|path| settings.resolve(path));

        Ok(Self::new(
            Box::new(guard),
            Box::new(retriever),
            Box::new(model),
            memory,
            PromptComposer::from_settings(instructions.as_deref()),
            OrchestratorOptions {
                corpus_path: settings.resolve(&settings.corpus.path),
                forward_masked: settings.guard.forward_masked,
                inject_memory: settings.memory.inject_context,
            },
        ))
    }

    /// Answer one query. Always returns a string.
    pub async fn respond(&mut self, request: &ChatRequest) -> String {
        let (recorded_input, outcome) = self.process(&request.user_input).await;
        let reply = outcome.reply().to_string();

        let metadata = request
            .user_id
            .as_ref()
            .map(|user_id| serde_json::json!({ "user_id": user_id }));
        if let Err(e) = self.memory.record(&recorded_input, &reply, metadata) {
            tracing::error!(target: "orchestrator", "failed to persist conversation: {e}");
        }

        reply
    }

    /// Run the pipeline and return the text to record as the user message
    /// alongside the outcome.
    pub async fn process(&mut self, input: &str) -> (String, Outcome) {
        if input.trim().is_empty() {
            log_event!("orchestrator", "invalid input");
            return (input.to_string(), Outcome::Failed(FailureKind::InvalidInput));
        }

        if self.guard.detect(input) {
            return match self.guard.mask(input) {
                Ok(masked) => self.process_masked(masked).await,
                Err(e) => (REDACTED_INPUT.to_string(), self.fail(e.into())),
            };
        }

        let outcome = match self.retrieve_and_answer(input).await {
            Ok(answer) => Outcome::Proceed(answer),
            Err(e) => self.fail(e),
        };
        (input.to_string(), outcome)
    }

    /// Retrieval is skipped for sensitive input; only masked text goes on.
    async fn process_masked(&self, masked: String) -> (String, Outcome) {
        if !self.options.forward_masked {
            log_event!("orchestrator", "blocked", "personal data in input");
            return (masked.clone(), Outcome::Blocked(masked));
        }

        debug_event!("orchestrator", "forwarding masked input");
        let outcome = match self.answer(&masked, "").await {
            Ok(answer) => Outcome::Proceed(answer),
            Err(e) => self.fail(e),
        };
        (masked, outcome)
    }

    async fn retrieve_and_answer(&mut self, input: &str) -> Result<String> {
        let context = self.retriever.retrieve(input)?;
        debug_event!("orchestrator", "context", "{} chars", context.len());
        self.answer(input, &context).await
    }

    async fn answer(&self, user_turn: &str, context: &str) -> Result<String> {
        let memory = self
            .options
            .inject_memory
            .then(|| self.memory.render_context());
        let system_prompt = self.prompts.compose(context, memory.as_deref())?;

        let answer = self.model.complete(&system_prompt, user_turn).await?;
        log_event!("orchestrator", "answered", "via {}", self.model.name());
        Ok(answer)
    }

    fn fail(&self, error: Error) -> Outcome {
        let outcome = Outcome::from_error(&error);
        match &outcome {
            Outcome::Failed(FailureKind::NotFound(_)) => {
                tracing::warn!(target: "orchestrator", "{error}");
            }
            _ => tracing::error!(target: "orchestrator", "query failed: {error}"),
        }
        outcome
    }

    /// Reset the collection and ingest the configured corpus.
    pub fn ingest_corpus(&mut self) -> Result<IngestStats> {
        let path = self.options.corpus_path.clone();
        self.retriever.rebuild(&path)
    }

    /// Ingest at the start of a session.
    ///
    /// A missing corpus is recorded in the conversation log with the
    /// not-found sentence before the error is returned.
    pub fn start_session(&mut self) -> Result<IngestStats> {
        let result = self.ingest_corpus();
        if let Err(e) = &result
            && e.is_not_found()
        {
            tracing::warn!(target: "orchestrator", "session ingest: {e}");
            let metadata = serde_json::json!({ "event": "ingest" });
            if let Err(e) = self.memory.record("", &e.to_string(), Some(metadata)) {
                tracing::error!(target: "orchestrator", "failed to persist conversation: {e}");
            }
        }
        result
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_replies() {
        assert_eq!(Outcome::Proceed("hi".into()).reply(), "hi");
        assert_eq!(Outcome::Blocked("<EMAIL_ADDRESS>".into()).reply(), GUARD_PII);
        assert_eq!(
            Outcome::Failed(FailureKind::InvalidInput).reply(),
            INVALID_INPUT
        );
        assert_eq!(
            Outcome::Failed(FailureKind::NotFound("missing".into())).reply(),
            "missing"
        );
        assert_eq!(Outcome::Failed(FailureKind::Generic).reply(), PROBLEM_OCCURRED);
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new("What is EduTrack?").with_user("abc");
        assert_eq!(request.user_id.as_deref(), Some("abc"));
    }
}
