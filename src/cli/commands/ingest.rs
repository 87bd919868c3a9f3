//! Ingest command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::ingest::{IngestProgress, IngestStats, Ingestor, NoProgress};
use crate::vector::open_store;

/// Progress bar over documents.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message("reading documents");
        Self { bar }
    }

    fn finish(&self, stats: &IngestStats) {
        self.bar.finish_with_message(format!(
            "{} document(s), {} chunk(s)",
            stats.documents, stats.chunks
        ));
    }
}

impl IngestProgress for BarProgress {
    fn started(&self, documents: usize) {
        self.bar.set_length(documents as u64);
        self.bar.set_position(0);
        if let Ok(bar_style) =
            ProgressStyle::with_template("{spinner} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
        {
            self.bar.set_style(bar_style.progress_chars("=> "));
        }
    }

    fn document_done(&self, path: &Path, chunks: usize) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(format!("{name} ({chunks} chunks)"));
        self.bar.inc(1);
    }
}

/// Run ingest command - reset the collection and ingest `path`.
pub fn run(config: &Settings, path: Option<PathBuf>, show_progress: bool) -> Result<()> {
    let corpus = config.resolve(path.as_deref().unwrap_or(&config.corpus.path));

    let mut store = open_store(config, show_progress)?;
    let ingestor = Ingestor::from_settings(config)?;

    let stats = if show_progress {
        let progress = BarProgress::new();
        let result = ingestor.reingest(&mut store, &corpus, &progress);
        match &result {
            Ok(stats) => progress.finish(stats),
            Err(_) => progress.bar.abandon(),
        }
        result?
    } else {
        ingestor.reingest(&mut store, &corpus, &NoProgress)?
    };

    println!(
        "{} {} document(s) into '{}' ({} chunks)",
        style("Ingested").green().bold(),
        stats.documents,
        store.name(),
        stats.chunks
    );
    Ok(())
}
