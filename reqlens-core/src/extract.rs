//! Text extraction from uploaded documents
//!
//! Supports PDF (via `pdf-extract`) and UTF-8 plain text.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while pulling text out of a document
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(PathBuf),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Kinds of documents the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Infer the document kind from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

/// Extract the full text of a stored PDF or TXT file
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }

    match DocumentKind::from_path(path) {
        Some(DocumentKind::Pdf) => extract_pdf(path),
        Some(DocumentKind::Text) => fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => Err(ExtractError::UnsupportedType(path.to_path_buf())),
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed documents instead of returning an error
    let result = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path)));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf(format!(
            "extractor panicked while reading {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_document_kind_from_path() {
        assert_eq!(DocumentKind::from_path(Path::new("a.pdf")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(Path::new("a.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(Path::new("notes.txt")), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_path(Path::new("notes.docx")), None);
        assert_eq!(DocumentKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_extract_text_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reqs.txt");
        fs::write(&path, "The system shall export reports.").unwrap();

        let text = extract_text(&path).unwrap();
        assert_eq!(text, "The system shall export reports.");
    }

    #[test]
    fn test_extract_missing_file() {
        let dir = tempdir().unwrap();
        let result = extract_text(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(ExtractError::NotFound(_))));
    }

    #[test]
    fn test_extract_unsupported_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reqs.md");
        fs::write(&path, "# Requirements").unwrap();

        let result = extract_text(&path);
        assert!(matches!(result, Err(ExtractError::UnsupportedType(_))));
    }

    #[test]
    fn test_extract_invalid_utf8_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binary.txt");
        fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();

        let result = extract_text(&path);
        assert!(matches!(result, Err(ExtractError::Io { .. })));
    }

    /// Build a one-page PDF showing `line` in Helvetica, with a correct xref table
    fn single_page_pdf(line: &str) -> Vec<u8> {
        let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", line);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, object) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, object).as_bytes());
        }

        let xref_start = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_start
            )
            .as_bytes(),
        );
        pdf
    }

    #[test]
    fn test_extract_valid_pdf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Requirements.PDF");
        fs::write(&path, single_page_pdf("Users can export reports")).unwrap();

        let text = extract_text(&path).unwrap();
        let words: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(words.join(" "), "Users can export reports");
    }

    #[test]
    fn test_extract_corrupt_pdf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"this is not a pdf").unwrap();

        let result = extract_text(&path);
        assert!(matches!(result, Err(ExtractError::Pdf(_))));
    }
}
