//! Ask and Chat commands.

use std::io::Write;

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Settings;
use crate::orchestrator::{ChatRequest, Orchestrator};

fn request(query: String, user: Option<&str>) -> ChatRequest {
    let request = ChatRequest::new(query);
    match user {
        Some(id) => request.with_user(id),
        None => request,
    }
}

/// Ingest the corpus, reporting rather than failing.
fn ingest_for_session(orchestrator: &mut Orchestrator) {
    match orchestrator.start_session() {
        Ok(stats) => eprintln!(
            "{} {} document(s), {} chunk(s)",
            style("Ingested").green(),
            stats.documents,
            stats.chunks
        ),
        Err(e) if e.is_not_found() => eprintln!("{} {e}", style("Warning:").yellow()),
        Err(e) => eprintln!("{} ingestion failed: {e}", style("Warning:").yellow()),
    }
}

/// Run ask command - answer one question.
pub async fn run_ask(
    config: &Settings,
    query: String,
    user: Option<String>,
    ingest: bool,
) -> Result<()> {
    let mut orchestrator = Orchestrator::from_settings(config)?;
    if ingest {
        ingest_for_session(&mut orchestrator);
    }

    let reply = orchestrator
        .respond(&request(query, user.as_deref()))
        .await;
    println!("{reply}");
    Ok(())
}

/// Run chat command - ingest, then answer lines from stdin until EOF or `exit`.
pub async fn run_chat(config: &Settings, user: Option<String>) -> Result<()> {
    let mut orchestrator = Orchestrator::from_settings(config)?;
    ingest_for_session(&mut orchestrator);

    eprintln!("Ask about the corpus. Type 'exit' or press Ctrl-D to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", style(">").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if line.trim() == "exit" {
            break;
        }

        let reply = orchestrator.respond(&request(line, user.as_deref())).await;
        println!("{reply}\n");
    }
    Ok(())
}
