use crate::error::{Result, SummarizerError};
use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Documents with fewer trimmed characters than this are rejected before any
/// AI call is made.
pub const MIN_TEXT_CHARS: usize = 50;

/// Extracts the text of every page in page order.
///
/// Never fails: unreadable, encrypted or image-only files produce an empty
/// string, which [`ensure_sufficient_text`] then rejects.
pub fn load_document_text(path: &Path) -> String {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            return String::new();
        }
    };

    // pdf-extract panics on some malformed inputs.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    }));

    match pages {
        Ok(Ok(pages)) => {
            debug!(
                "Extracted {} pages of text from {}",
                pages.len(),
                path.display()
            );
            pages.concat()
        }
        Ok(Err(e)) => {
            warn!("Text extraction failed for {}: {}", path.display(), e);
            String::new()
        }
        Err(_) => {
            warn!("Text extraction aborted for {}", path.display());
            String::new()
        }
    }
}

pub fn ensure_sufficient_text(text: &str) -> Result<&str> {
    let chars = text.trim().chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(SummarizerError::InsufficientText { chars });
    }
    Ok(text)
}

/// Mirrors the `*.pdf` filter of a file picker.
pub fn ensure_pdf_path(path: &Path) -> Result<()> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        Ok(())
    } else {
        Err(SummarizerError::UnsupportedFile(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_empty_text() {
        let text = load_document_text(Path::new("/definitely/not/here.pdf"));
        assert!(text.is_empty());
    }

    #[test]
    fn test_non_pdf_bytes_yield_empty_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is plainly not a portable document").unwrap();
        assert!(load_document_text(file.path()).is_empty());
    }

    #[test]
    fn test_insufficient_text_threshold() {
        let short = format!("   {}   ", "x".repeat(MIN_TEXT_CHARS - 1));
        match ensure_sufficient_text(&short) {
            Err(SummarizerError::InsufficientText { chars }) => assert_eq!(chars, 49),
            other => panic!("expected InsufficientText, got {:?}", other),
        }

        let enough = "x".repeat(MIN_TEXT_CHARS);
        assert!(ensure_sufficient_text(&enough).is_ok());
    }

    #[test]
    fn test_pdf_extension_filter() {
        assert!(ensure_pdf_path(Path::new("filings/aapl-10k.PDF")).is_ok());
        assert!(ensure_pdf_path(Path::new("filings/aapl-10k.pdf")).is_ok());
        assert!(matches!(
            ensure_pdf_path(Path::new("filings/aapl-10k.htm")),
            Err(SummarizerError::UnsupportedFile(_))
        ));
        assert!(ensure_pdf_path(Path::new("no_extension")).is_err());
    }
}
