use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::Config;
use crate::mime::{self, DetectedMime};
use crate::ocr;
use crate::pdf;

/// Extracted text for a document, plus the detected type that picked the
/// extraction strategy.
#[derive(Debug)]
pub struct Extraction {
    pub text: String,
    pub mime: DetectedMime,
}

/// Detects the document type from content and runs the matching strategy:
/// plain text is read verbatim, PDFs are rasterized page by page and OCRed,
/// images go straight to OCR. Unsupported types yield an empty artifact so
/// the document is still archived and deduplicated, it just contributes no
/// search lines.
pub fn extract_text(config: &Config, document: &Path) -> Result<Extraction> {
    let mime = mime::sniff_file(document)?;
    debug!(document = %document.display(), mime = %mime.label(), "detected document type");
    let text = match &mime {
        DetectedMime::PlainText => read_plain_text(document)?,
        DetectedMime::Pdf => pdf::extract_pdf_text(config, document)?,
        DetectedMime::Png | DetectedMime::Jpeg => ocr::recognize(config, document)?,
        DetectedMime::Other(label) => {
            warn!(
                document = %document.display(),
                mime = %label,
                "unsupported document type, archiving without text"
            );
            String::new()
        }
    };
    Ok(Extraction { text, mime })
}

fn read_plain_text(document: &Path) -> Result<String> {
    std::fs::read_to_string(document)
        .with_context(|| format!("failed to read document as UTF-8 text: {}", document.display()))
}
