// Document Text Extraction
// PDF, DOCX and plain-text uploads to a single normalized string

use docx_rs::{DocumentChild, ParagraphChild, Run, RunChild};
use regex::Regex;
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::services::text_processor::normalize_punctuation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Docx,
    Txt,
}

impl FileFormat {
    /// Detect the format from the file extension, case-insensitively.
    pub fn detect(file_name: &str) -> Result<Self, UnsupportedFormat> {
        let lower = file_name.trim().to_lowercase();
        if lower.ends_with(".pdf") {
            Ok(Self::Pdf)
        } else if lower.ends_with(".docx") {
            Ok(Self::Docx)
        } else if lower.ends_with(".txt") {
            Ok(Self::Txt)
        } else if lower.ends_with(".doc") {
            Err(UnsupportedFormat::LegacyDoc)
        } else {
            Err(UnsupportedFormat::Unknown(file_name.trim().to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum UnsupportedFormat {
    #[error("Legacy .doc files are not supported. Please save as .docx.")]
    LegacyDoc,
    #[error("Unsupported file: {0}. Please use PDF, DOCX, or TXT.")]
    Unknown(String),
}

#[derive(Debug, Error)]
#[error("Error parsing {format} file: {message}")]
pub struct ExtractionError {
    pub format: FileFormat,
    pub message: String,
}

impl ExtractionError {
    fn new(format: FileFormat, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
        }
    }
}

fn wt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").expect("w:t regex"))
}

/// Extract and normalize text. Parsers run on the blocking pool; a parser
/// panic surfaces as an `ExtractionError`.
pub async fn extract(format: FileFormat, bytes: Vec<u8>) -> Result<String, ExtractionError> {
    let raw = match format {
        FileFormat::Txt => decode_text(&bytes),
        FileFormat::Pdf => run_blocking(format, move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await?,
        FileFormat::Docx => run_blocking(format, move || docx_text(&bytes)).await?,
    };

    let text = normalize_punctuation(&raw);
    debug!("[EXTRACT] {} -> {} chars", format, text.chars().count());
    Ok(text)
}

async fn run_blocking<F>(format: FileFormat, job: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, String> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(message)) => Err(ExtractionError::new(format, message)),
        Err(e) => Err(ExtractionError::new(format, format!("parser crashed: {}", e))),
    }
}

/// Permissive UTF-8: invalid sequences are dropped.
fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != '\u{FFFD}' && c != '\u{FEFF}')
        .collect()
}

fn docx_text(bytes: &[u8]) -> Result<String, String> {
    match docx_rs::read_docx(bytes) {
        Ok(docx) => {
            let paragraphs: Vec<String> = docx
                .document
                .children
                .iter()
                .filter_map(|child| match child {
                    DocumentChild::Paragraph(p) => {
                        let mut text = String::new();
                        collect_paragraph_text(&p.children, &mut text);
                        Some(text)
                    }
                    _ => None,
                })
                .collect();
            Ok(paragraphs.join("\n"))
        }
        Err(e) => {
            warn!("[EXTRACT] docx reader failed ({}), falling back to raw XML", e);
            docx_text_from_xml(bytes).map_err(|fallback| format!("{} ({})", e, fallback))
        }
    }
}

fn collect_paragraph_text(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => collect_run_text(run, out),
            ParagraphChild::Hyperlink(link) => collect_paragraph_text(&link.children, out),
            _ => {}
        }
    }
}

fn collect_run_text(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

/// Read `word/document.xml` straight from the zip package.
fn docx_text_from_xml(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let paragraphs: Vec<String> = xml
        .split("</w:p>")
        .map(|para| {
            wt_re()
                .captures_iter(para)
                .filter_map(|c| c.get(1))
                .map(|m| unescape_xml(m.as_str()))
                .collect::<String>()
        })
        .collect();

    // The tail after the last </w:p> is never a paragraph.
    let count = paragraphs.len().saturating_sub(1);
    Ok(paragraphs[..count].join("\n"))
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
