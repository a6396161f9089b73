//! PDF text extraction

use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::error::{Error, Result};

/// Replace glyphs that PDF fonts commonly emit with plain ASCII so the
/// chunker and the separator lists see the text the way it reads
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\u{2010}', "-")
        .replace('\u{2011}', "-")
        .replace('\u{2013}', "-")
        .replace('\u{2014}', "--")
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
}

/// Extracted PDF content
#[derive(Debug, Clone)]
pub struct ParsedPdf {
    /// Extracted text
    pub text: String,
    /// Content hash for deduplication
    pub content_hash: String,
    /// Total pages
    pub total_pages: Option<u32>,
}

/// PDF parser with a hang guard around extraction
pub struct PdfParser {
    timeout: Duration,
}

impl PdfParser {
    /// Create a parser with the given extraction timeout
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Parse a PDF file into text
    pub fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedPdf> {
        let text = self.extract_with_timeout(filename, data)?;

        let text = cleanup_pdf_text(&text);
        let text = text
            .replace('\0', "")
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "No text content could be extracted from PDF",
            ));
        }

        let total_pages = match lopdf::Document::load_mem(data) {
            Ok(doc) => Some(doc.get_pages().len() as u32),
            Err(_) => Some(1),
        };

        Ok(ParsedPdf {
            content_hash: hash_content(&text),
            text,
            total_pages,
        })
    }

    /// Extract PDF text with a sync timeout to prevent hangs on problematic fonts
    fn extract_with_timeout(&self, filename: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                Ok(text)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed for {}: {}, trying fallback", filename, e);
                Self::extract_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread may still be running; we cannot kill it
                tracing::error!(
                    "PDF extraction timeout after {}s for {}",
                    self.timeout.as_secs(),
                    filename
                );
                Self::extract_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed for {}", filename);
                Self::extract_fallback(filename, data)
            }
        }
    }

    /// Fallback extraction reading content streams with lopdf directly
    fn extract_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut all_text = String::new();

        for (page_num, page_id) in doc.get_pages() {
            match doc.get_page_content(page_id) {
                Ok(content) => {
                    let text = Self::extract_text_from_content(&content);
                    if !text.is_empty() {
                        all_text.push_str(&text);
                        all_text.push('\n');
                    }
                }
                Err(e) => {
                    tracing::debug!("Could not get content for page {}: {}", page_num, e);
                }
            }
        }

        if all_text.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "PDF appears to be image-based or has no extractable text",
            ));
        }

        Ok(all_text)
    }

    /// Extract text between BT/ET operators in a content stream
    fn extract_text_from_content(content: &[u8]) -> String {
        let content_str = String::from_utf8_lossy(content);
        let mut text = String::new();
        let mut in_text_block = false;
        let mut current_text = String::new();

        for line in content_str.lines() {
            let line = line.trim();

            if line == "BT" {
                in_text_block = true;
                continue;
            }

            if line == "ET" {
                in_text_block = false;
                if !current_text.is_empty() {
                    text.push_str(&current_text);
                    text.push(' ');
                    current_text.clear();
                }
                continue;
            }

            if in_text_block && (line.ends_with("Tj") || line.ends_with("TJ")) {
                if let Some(start) = line.find('(') {
                    if let Some(end) = line.rfind(')') {
                        let extracted = &line[start + 1..end];
                        let decoded = extracted
                            .replace("\\n", "\n")
                            .replace("\\r", "\r")
                            .replace("\\t", "\t")
                            .replace("\\(", "(")
                            .replace("\\)", ")")
                            .replace("\\\\", "\\");
                        current_text.push_str(&decoded);
                    }
                }
            }
        }

        text
    }
}

/// Hash content for deduplication
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_normalizes_common_glyphs() {
        let cleaned = cleanup_pdf_text("Calculus\u{2019}s \u{201C}grade\u{201D} \u{2013} A");
        assert_eq!(cleaned, "Calculus's \"grade\" - A");
    }

    #[test]
    fn content_hash_is_stable() {
        assert_eq!(hash_content("abc"), hash_content("abc"));
        assert_ne!(hash_content("abc"), hash_content("abd"));
    }

    #[test]
    fn content_stream_text_is_extracted() {
        let stream = b"BT\n/F1 12 Tf\n(Spring 2021: Calculus I) Tj\nET\n";
        let text = PdfParser::extract_text_from_content(stream);
        assert!(text.contains("Spring 2021: Calculus I"));
    }

    #[test]
    fn empty_pdf_data_is_a_parse_error() {
        let parser = PdfParser::new(5);
        assert!(parser.parse("empty.pdf", b"").is_err());
    }
}
