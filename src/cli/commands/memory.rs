//! Memory inspection commands.

use anyhow::Result;
use console::style;

use crate::cli::MemoryAction;
use crate::config::Settings;
use crate::memory::{ConversationMemory, ConversationRecord};

fn print_record(record: &ConversationRecord) {
    println!(
        "{} {}",
        style(record.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
        record
            .metadata
            .as_ref()
            .and_then(|m| m.get("user_id"))
            .and_then(|id| id.as_str())
            .map(|id| format!("[{id}]"))
            .unwrap_or_default()
    );
    println!("  User:  {}", record.user_message);
    println!("  Agent: {}\n", record.agent_response);
}

/// Run memory command.
pub fn run(action: MemoryAction, config: &Settings) -> Result<()> {
    let memory = ConversationMemory::open(
        &config.resolve(&config.memory.path),
        config.memory.capacity,
    );

    match action {
        MemoryAction::Recent { n } => {
            let records = memory.recent(n);
            if records.is_empty() {
                eprintln!("No conversations recorded.");
            }
            records.iter().for_each(print_record);
        }
        MemoryAction::Search { query, limit } => {
            let records = memory.search(&query, limit);
            if records.is_empty() {
                eprintln!("No matching conversations.");
            }
            records.into_iter().for_each(print_record);
        }
        MemoryAction::Context => {
            println!("{}", memory.render_context());
        }
    }
    Ok(())
}
