//! Search command.

use anyhow::Result;
use console::style;

use crate::config::Settings;
use crate::vector::open_store;

/// Run search command - show the chunks nearest to `query`.
pub fn run(config: &Settings, query: &str, k: usize, json: bool) -> Result<()> {
    let store = open_store(config, false)?;
    let hits = store.query(query, k)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        eprintln!("No results found. Run 'secondbrain ingest' first.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let source = hit
            .metadata
            .source_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| hit.metadata.source_doc.clone());
        println!(
            "\n{}. {} {} (similarity: {:.3})",
            i + 1,
            style(hit.id).cyan(),
            source,
            hit.similarity()
        );
        println!("   {}", hit.text.replace('\n', " "));
    }
    Ok(())
}
