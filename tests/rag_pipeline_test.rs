//! End-to-end retrieval over a small FAQ corpus with the offline embedder.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use secondbrain::documents::{ChunkingConfig, DocumentReader, DocumentResult, TextExtractor};
use secondbrain::ingest::NoProgress;
use secondbrain::llm::{ChatModel, LlmResult};
use secondbrain::messages::CANNOT_PROCESS;
use secondbrain::prompt::{CONTEXT_DELIMITER, PromptComposer};
use secondbrain::vector::{HashingGenerator, VectorStore, VectorStoreError};
use secondbrain::{
    ChatRequest, ContextRetriever, ConversationMemory, Ingestor, Orchestrator,
    OrchestratorOptions, PiiGuard, Retriever,
};
use tempfile::TempDir;

const FAQ: &str = "EduTrack Frequently Asked Questions

Q1: What is EduTrack used for?
A1: EduTrack helps educational institutions follow student engagement and course progress in one place.

Q2: How do teachers create a course?
A2: Teachers open the Courses tab, press New Course, and fill in the title and the weekly schedule.

Q3: Can students see their grades?
A3: Students see grades on their dashboard as soon as a teacher publishes an assessment.

Q4: How is attendance recorded?
A4: Attendance is taken from the class roster. Late arrivals can be marked with a single click.

Q5: Does the platform export reports?
A5: School staff can export term reports as spreadsheets from the Reports page.

Q6: How are parents kept informed?
A6: Parents receive a weekly summary with attendance, grades and upcoming deadlines.

Q7: Is there a mobile app?
A7: A mobile app mirrors the dashboard, including notifications about new assignments.

Q8: Can assignments be submitted late?
A8: Teachers choose a late window per assignment. Submissions after the window are flagged.

Q9: How do students join a course?
A9: Students enter the join code shared by their teacher on the Courses tab.

Q10: Where is data stored?
A10: Course data is kept in the school's own region and backed up every night.

Q11: Can a course have several teachers?
A11: Yes. Co-teachers share the gradebook and can each publish assessments.

Q12: How do I reset my password?
A12: Choose Forgot Password on the sign-in page and follow the link sent to you.
";

/// Reads `.pdf` fixtures as plain text.
struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_pages(&self, path: &Path) -> DocumentResult<Vec<String>> {
        Ok(vec![fs::read_to_string(path)?])
    }
}

/// Answers with the context lines that mention a query word, as a grounded
/// model would, and declines otherwise.
struct ExtractiveModel;

impl ExtractiveModel {
    fn context(system_prompt: &str) -> &str {
        system_prompt
            .rsplit(CONTEXT_DELIMITER)
            .nth(1)
            .unwrap_or_default()
            .trim()
    }

    fn terms(query: &str) -> Vec<String> {
        query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() >= 4)
            .map(str::to_lowercase)
            .collect()
    }
}

#[async_trait]
impl ChatModel for ExtractiveModel {
    async fn complete(&self, system_prompt: &str, user_turn: &str) -> LlmResult<String> {
        let terms = Self::terms(user_turn);
        let lines: Vec<&str> = Self::context(system_prompt)
            .lines()
            .filter(|line| {
                let line = line.to_lowercase();
                terms.iter().any(|term| line.contains(term.as_str()))
            })
            .collect();

        if lines.is_empty() {
            Ok(CANNOT_PROCESS.to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }

    fn name(&self) -> &str {
        "extractive"
    }
}

fn corpus() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("edutrack_faq.pdf"), FAQ).unwrap();
    fs::write(dir.path().join("notes.txt"), "not part of the corpus").unwrap();
    dir
}

fn ingestor() -> Ingestor {
    Ingestor::new(
        DocumentReader::new(Box::new(PlainTextExtractor)),
        ChunkingConfig::default(),
    )
    .unwrap()
}

fn retriever() -> Retriever {
    Retriever::new(
        VectorStore::in_memory("knowledge-docs", Box::new(HashingGenerator::new(384))),
        ingestor(),
        3,
    )
}

#[test]
fn test_ingested_chunk_is_retrievable_verbatim() {
    let dir = corpus();
    let mut retriever = retriever();

    let stats = retriever.rebuild(dir.path()).unwrap();
    assert_eq!(stats.documents, 1);
    assert!(stats.chunks > 1);
    assert_eq!(retriever.store().count(), stats.chunks);

    let all = retriever.hits("EduTrack", stats.chunks).unwrap();
    assert_eq!(all.len(), stats.chunks);

    for chunk in &all {
        let top = retriever.hits(&chunk.text, 3).unwrap();
        assert!(
            top.iter().any(|hit| hit.text == chunk.text),
            "chunk {} missing from its own top 3",
            chunk.id
        );
    }
}

#[test]
fn test_context_is_at_most_three_chunks() {
    let dir = corpus();
    let mut retriever = retriever();
    retriever.rebuild(dir.path()).unwrap();

    let hits = retriever.hits("How is attendance recorded?", 3).unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

    let context = retriever.retrieve("How is attendance recorded?").unwrap();
    let expected: String = hits.into_iter().map(|hit| hit.text).collect();
    assert_eq!(context, expected);
}

#[test]
fn test_reset_empties_context() {
    let dir = corpus();
    let mut retriever = retriever();
    retriever.rebuild(dir.path()).unwrap();

    retriever.store_mut().reset().unwrap();

    assert_eq!(retriever.store().count(), 0);
    assert_eq!(retriever.retrieve("What is EduTrack?").unwrap(), "");
}

#[test]
fn test_rebuild_replaces_previous_corpus() {
    let dir = corpus();
    let mut retriever = retriever();
    let first = retriever.rebuild(dir.path()).unwrap();
    let second = retriever.rebuild(dir.path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(retriever.store().count(), second.chunks);
}

#[test]
fn test_missing_corpus_is_not_found() {
    let dir = TempDir::new().unwrap();
    let mut retriever = retriever();

    let err = retriever.rebuild(&dir.path().join("docs")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_persisted_collection_reopens() {
    let corpus = corpus();
    let data = TempDir::new().unwrap();

    let mut store = VectorStore::open(
        data.path(),
        "knowledge-docs",
        Box::new(HashingGenerator::new(384)),
    )
    .unwrap();
    let stats = ingestor()
        .reingest(&mut store, corpus.path(), &NoProgress)
        .unwrap();
    drop(store);

    let reopened = VectorStore::open(
        data.path(),
        "knowledge-docs",
        Box::new(HashingGenerator::new(384)),
    )
    .unwrap();
    assert_eq!(reopened.count(), stats.chunks);

    let mismatch = VectorStore::open(
        data.path(),
        "knowledge-docs",
        Box::new(HashingGenerator::new(128)),
    );
    assert!(matches!(
        mismatch,
        Err(VectorStoreError::ModelMismatch { .. })
    ));
}

#[tokio::test]
async fn test_edutrack_questions_end_to_end() {
    let dir = corpus();
    let data = TempDir::new().unwrap();
    let log_path = data.path().join("conversations.json");

    let mut orchestrator = Orchestrator::new(
        Box::new(PiiGuard::with_defaults().unwrap()),
        Box::new(retriever()),
        Box::new(ExtractiveModel),
        ConversationMemory::open(&log_path, 10),
        PromptComposer::bundled(),
        OrchestratorOptions {
            corpus_path: dir.path().to_path_buf(),
            ..Default::default()
        },
    );
    orchestrator.ingest_corpus().unwrap();

    let answer = orchestrator
        .respond(&ChatRequest::new("What is EduTrack used for?").with_user("abc"))
        .await;
    assert!(answer.to_lowercase().contains("educational"), "{answer}");

    let unrelated = orchestrator
        .respond(&ChatRequest::new("Who is the prime minister of India?").with_user("abc"))
        .await;
    assert_eq!(unrelated, CANNOT_PROCESS);

    let reopened = ConversationMemory::open(&log_path, 10);
    let records = reopened.recent(2);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].user_message, "What is EduTrack used for?");
    assert_eq!(records[0].agent_response, answer);
    assert_eq!(records[1].agent_response, CANNOT_PROCESS);
    assert!(
        records
            .iter()
            .all(|r| r.metadata.as_ref().unwrap()["user_id"] == "abc")
    );
}
