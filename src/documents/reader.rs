//! PDF discovery and text extraction.
//!
//! A path is either a single `.pdf` file or a directory searched recursively
//! for `*.pdf`. Extraction sits behind [`TextExtractor`] so the reader does not
//! care whether pages come from Pdfium or from a test double.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

use super::types::Document;
use crate::messages::FILE_NOT_FOUND;

/// Errors from reading source documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("{}", FILE_NOT_FOUND)]
    CorpusNotFound { path: PathBuf },

    #[error("Invalid corpus path pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to bind Pdfium library: {0}")]
    PdfBinding(String),

    #[error("Failed to extract text from {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Source of per-page text for a file.
pub trait TextExtractor: Send + Sync {
    /// Extract the text of every page, in page order.
    fn extract_pages(&self, path: &Path) -> DocumentResult<Vec<String>>;
}

/// Pdfium-backed text extraction.
///
/// The library is bound on first extraction, so an extractor can be built
/// where libpdfium is absent as long as nothing is ingested.
pub struct PdfiumExtractor {
    library_dir: Option<String>,
    pdfium: OnceLock<Pdfium>,
}

impl PdfiumExtractor {
    /// Extractor that binds lazily, preferring `library_dir` when given.
    pub fn new(library_dir: Option<&str>) -> Self {
        Self {
            library_dir: library_dir.map(str::to_string),
            pdfium: OnceLock::new(),
        }
    }

    /// Extractor bound up front.
    pub fn bind(library_dir: Option<&str>) -> DocumentResult<Self> {
        let extractor = Self::new(library_dir);
        extractor.pdfium()?;
        Ok(extractor)
    }

    fn pdfium(&self) -> DocumentResult<&Pdfium> {
        if let Some(pdfium) = self.pdfium.get() {
            return Ok(pdfium);
        }

        let bindings = match self.library_dir.as_deref() {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                    .or_else(|_| Pdfium::bind_to_system_library())
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| DocumentError::PdfBinding(e.to_string()))?;

        tracing::debug!(target: "documents", "pdfium bound");
        Ok(self.pdfium.get_or_init(|| Pdfium::new(bindings)))
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract_pages(&self, path: &Path) -> DocumentResult<Vec<String>> {
        let extraction_error = |reason: String| DocumentError::Extraction {
            path: path.to_path_buf(),
            reason,
        };

        let document = self
            .pdfium()?
            .load_pdf_from_file(path, None)
            .map_err(|e| extraction_error(e.to_string()))?;

        let mut pages = Vec::new();
        for page in document.pages().iter() {
            let text = page.text().map_err(|e| extraction_error(e.to_string()))?;
            pages.push(text.all());
        }
        Ok(pages)
    }
}

/// Reads every PDF under a path into [`Document`]s.
pub struct DocumentReader {
    extractor: Box<dyn TextExtractor>,
}

impl DocumentReader {
    pub fn new(extractor: Box<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    /// Read all PDFs at `path`.
    ///
    /// Page texts are joined with a trailing newline each and the result is
    /// trimmed. Files with no text are skipped. Fails with
    /// [`DocumentError::CorpusNotFound`] when no file matches.
    pub fn read(&self, path: &Path) -> DocumentResult<Vec<Document>> {
        let files = discover_pdfs(path)?;
        if files.is_empty() {
            return Err(DocumentError::CorpusNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let pages = self.extractor.extract_pages(&file)?;
            let text: String = pages.iter().map(|page| format!("{page}\n")).collect();
            let content = text.trim();

            if content.is_empty() {
                tracing::debug!(target: "documents", "skipping {}: no extractable text", file.display());
                continue;
            }

            documents.push(Document::new(file, content.to_string()));
        }

        tracing::info!(
            target: "documents",
            "read {} document(s) from {}",
            documents.len(),
            path.display()
        );
        Ok(documents)
    }
}

/// List PDF files at `path`, sorted.
///
/// A path with a `.pdf` extension is matched as-is; anything else is treated
/// as a directory and searched with `**/*.pdf`.
pub fn discover_pdfs(path: &Path) -> DocumentResult<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&path.to_string_lossy());
    let pattern = if is_pdf(path) {
        escaped
    } else {
        format!("{}/**/*.pdf", escaped.trim_end_matches('/'))
    };

    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(file) if file.is_file() => Some(file),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(target: "documents", "skipping unreadable entry: {e}");
                None
            }
        })
        .collect();
    files.sort();
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "pdf")
}
