use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::{Cli, OcrEngine};
use crate::util::ensure_directory;

pub const TEXT_DIR_NAME: &str = "_text";
pub const TEXT_SUFFIX: &str = ".txt";
pub const LEDGER_FILE_NAME: &str = ".md5sums.txt";
pub const RUN_MANIFEST_FILE_NAME: &str = ".last_run.json";

const OCR_DPI: u32 = 600;
const RASTER_DPI: u32 = 200;

/// Resolved settings for one process run, built once in `main` and passed
/// by reference into every component.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub text_dir: PathBuf,
    pub text_suffix: String,
    pub ledger_path: PathBuf,
    pub run_manifest_path: PathBuf,
    pub ocr_languages: Vec<String>,
    pub ocr_engine: OcrEngine,
    pub ocr_dpi: u32,
    pub raster_dpi: u32,
}

impl Config {
    pub fn new(data_dir: PathBuf, ocr_languages: Vec<String>, ocr_engine: OcrEngine) -> Self {
        let text_dir = data_dir.join(TEXT_DIR_NAME);
        let ledger_path = text_dir.join(LEDGER_FILE_NAME);
        let run_manifest_path = text_dir.join(RUN_MANIFEST_FILE_NAME);

        Self {
            data_dir,
            text_dir,
            text_suffix: TEXT_SUFFIX.to_string(),
            ledger_path,
            run_manifest_path,
            ocr_languages,
            ocr_engine,
            ocr_dpi: OCR_DPI,
            raster_dpi: RASTER_DPI,
        }
    }

    pub fn resolve(cli: &Cli) -> Self {
        let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
        Self::new(data_dir, cli.ocr_languages.clone(), cli.ocr_engine)
    }

    /// Creates the archive layout: the root, the text-cache tree and an
    /// empty ledger. Idempotent; runs before every command.
    pub fn setup(&self) -> Result<()> {
        ensure_directory(&self.data_dir)?;
        ensure_directory(&self.text_dir)?;

        if !self.ledger_path.exists() {
            File::create(&self.ledger_path)
                .with_context(|| format!("failed to create ledger: {}", self.ledger_path.display()))?;
        }

        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docspace")
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
