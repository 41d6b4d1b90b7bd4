//! Document text extraction.

use std::any::Any;
use std::fs;
use std::path::Path;
use storyloom_core::{AppError, AppResult};

/// Document kinds the default extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Markdown,
    PlainText,
}

impl DocumentKind {
    /// Detect document kind from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::PlainText => "text",
        }
    }
}

/// Turns a document on disk into raw text.
///
/// Extraction is blocking; ingestion runs it on the blocking thread pool.
pub trait DocumentExtractor: Send + Sync {
    /// Whether this extractor handles the file at all. Unsupported files are
    /// ignored silently rather than reported as failures.
    fn supports(&self, path: &Path) -> bool;

    /// Extract the document's text. Fails with `AppError::Extraction`.
    fn extract(&self, path: &Path) -> AppResult<String>;
}

/// Extractor for PDF, Markdown and plain-text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl DocumentExtractor for FileExtractor {
    fn supports(&self, path: &Path) -> bool {
        DocumentKind::from_path(path).is_some()
    }

    fn extract(&self, path: &Path) -> AppResult<String> {
        match DocumentKind::from_path(path) {
            Some(DocumentKind::Pdf) => extract_pdf(path),
            Some(DocumentKind::Markdown) => read_text(path).map(|raw| clean_markdown(&raw)),
            Some(DocumentKind::PlainText) => read_text(path),
            None => Err(AppError::Extraction(format!(
                "Unsupported document type: {:?}",
                path
            ))),
        }
    }
}

/// Extract the text of every page, concatenated.
///
/// The PDF parser can panic on malformed input; that is contained here so a
/// single bad file never takes down the corpus build. The process panic hook
/// still runs, so the parser's panic line appears on stderr ahead of the
/// ingest warning; the payload is carried in the returned error.
fn extract_pdf(path: &Path) -> AppResult<String> {
    let owned = path.to_path_buf();
    match std::panic::catch_unwind(move || pdf_extract::extract_text(&owned)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(AppError::Extraction(format!(
            "Failed to extract {:?}: {}",
            path, e
        ))),
        Err(payload) => Err(AppError::Extraction(format!(
            "PDF parser aborted on {:?}: {}",
            path,
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn read_text(path: &Path) -> AppResult<String> {
    fs::read_to_string(path)
        .map_err(|e| AppError::Extraction(format!("Failed to read {:?}: {}", path, e)))
}

/// Clean markdown by dropping heading markers, rules and code fences.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}
