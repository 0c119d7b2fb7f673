use serde::{Deserialize, Serialize};

/// Outcome tallies for one import or rescan run. `imported` counts newly
/// archived documents, `unsupported` the subset archived with an empty text
/// artifact because no extraction strategy matched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunCounts {
    pub imported: usize,
    pub already_imported: usize,
    pub unsupported: usize,
    pub failed: usize,
    pub artifacts_written: usize,
}

/// Record of the most recent import or rescan run, written next to the
/// fingerprint ledger and read back by `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_kind: String,
    pub started_at: String,
    pub finished_at: String,
    pub data_dir: String,
    pub ocr_languages: Vec<String>,
    pub ocr_engine: String,
    pub counts: RunCounts,
    pub failures: Vec<String>,
}
