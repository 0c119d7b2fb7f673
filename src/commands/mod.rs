use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::model::{RunCounts, RunManifest};
use crate::util::{now_utc_string, write_json_pretty};

pub mod docker;
pub mod import;
pub mod preview;
pub mod rescan;
pub mod search;
pub mod status;

/// Records the outcome of an import or rescan run next to the ledger, where
/// `status` picks it up.
pub(crate) fn write_run_manifest(
    config: &Config,
    run_kind: &str,
    started_at: String,
    counts: RunCounts,
    failures: Vec<String>,
) -> Result<()> {
    let manifest = RunManifest {
        manifest_version: 1,
        run_kind: run_kind.to_string(),
        started_at,
        finished_at: now_utc_string(),
        data_dir: config.data_dir.display().to_string(),
        ocr_languages: config.ocr_languages.clone(),
        ocr_engine: config.ocr_engine.as_str().to_string(),
        counts,
        failures,
    };
    write_json_pretty(&config.run_manifest_path, &manifest)?;
    info!(path = %config.run_manifest_path.display(), "wrote run manifest");
    Ok(())
}
