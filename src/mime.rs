use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Leading bytes inspected for type detection. Large enough that the UTF-8
/// heuristic sees a representative sample of text files.
const SNIFF_WINDOW: usize = 8192;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Content-detected type of a file. The variants carry the full dispatch
/// table for extraction; `Other` keeps a label for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedMime {
    PlainText,
    Pdf,
    Png,
    Jpeg,
    Other(String),
}

impl DetectedMime {
    pub fn label(&self) -> &str {
        match self {
            Self::PlainText => "text/plain",
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Other(label) => label,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Detects the mime type from file content, never from the extension.
pub fn sniff_file(path: &Path) -> Result<DetectedMime> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for type detection: {}", path.display()))?;

    let mut window = [0_u8; SNIFF_WINDOW];
    let mut filled = 0_usize;
    while filled < window.len() {
        let count = file
            .read(&mut window[filled..])
            .with_context(|| format!("failed to read file for type detection: {}", path.display()))?;
        if count == 0 {
            break;
        }
        filled += count;
    }

    Ok(sniff_bytes(&window[..filled]))
}

pub fn sniff_bytes(window: &[u8]) -> DetectedMime {
    if window.is_empty() {
        return DetectedMime::Other("application/x-empty".to_string());
    }
    if window.starts_with(b"%PDF-") {
        return DetectedMime::Pdf;
    }
    if window.starts_with(&PNG_SIGNATURE) {
        return DetectedMime::Png;
    }
    if window.starts_with(&JPEG_SIGNATURE) {
        return DetectedMime::Jpeg;
    }
    if window.starts_with(b"PK\x03\x04") {
        return DetectedMime::Other("application/zip".to_string());
    }
    if window.starts_with(&[0x1F, 0x8B]) {
        return DetectedMime::Other("application/gzip".to_string());
    }
    if looks_like_text(window) {
        return DetectedMime::PlainText;
    }
    DetectedMime::Other("application/octet-stream".to_string())
}

/// Text means no NUL bytes and valid UTF-8, which is also what the plain
/// extraction strategy requires when it reads the whole file. A multibyte
/// sequence cut off by the sniff window still counts as text.
fn looks_like_text(window: &[u8]) -> bool {
    let body = window.strip_prefix(&UTF8_BOM).unwrap_or(window);
    if body.contains(&0) {
        return false;
    }

    match std::str::from_utf8(body) {
        Ok(_) => true,
        Err(error) => error.error_len().is_none(),
    }
}
