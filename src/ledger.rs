use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Append-only index of content fingerprints, one lowercase hex digest per
/// line. A digest listed here means the matching document was fully archived
/// and indexed, so appending is the final step of every import.
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn contains(&self, digest: &str) -> Result<bool> {
        let file = File::open(&self.path).with_context(|| {
            format!("failed to open fingerprint ledger: {}", self.path.display())
        })?;
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| {
                format!("failed to read fingerprint ledger: {}", self.path.display())
            })?;
            if line.trim() == digest {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The layout setup creates the ledger file, so a missing file here is a
    /// broken data directory and surfaces as an error.
    pub fn append(&self, digest: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| {
                format!(
                    "failed to open fingerprint ledger for append: {}",
                    self.path.display()
                )
            })?;
        writeln!(file, "{digest}").with_context(|| {
            format!(
                "failed to append to fingerprint ledger: {}",
                self.path.display()
            )
        })?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let file = File::open(&self.path).with_context(|| {
            format!("failed to open fingerprint ledger: {}", self.path.display())
        })?;
        let mut total = 0_usize;
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| {
                format!("failed to read fingerprint ledger: {}", self.path.display())
            })?;
            if !line.trim().is_empty() {
                total += 1;
            }
        }
        Ok(total)
    }
}
