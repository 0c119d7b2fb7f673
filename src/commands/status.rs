use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::archive;
use crate::config::Config;
use crate::ledger::Ledger;
use crate::model::RunManifest;

pub fn run(config: &Config) -> Result<()> {
    info!(data_dir = %config.data_dir.display(), "status requested");

    let documents = archive::collect_documents(config)?;
    let artifacts = archive::collect_text_artifacts(config)?;
    let ledger_entries = Ledger::new(&config.ledger_path).count()?;

    info!(
        documents = documents.len(),
        text_artifacts = artifacts.len(),
        ledger_entries,
        "archive status"
    );

    let mut missing_artifacts = 0_usize;
    for document in &documents {
        let artifact = archive::text_path_for(config, document)?;
        if !artifact.exists() {
            missing_artifacts += 1;
            warn!(document = %document.display(), "document has no text artifact");
        }
    }
    if missing_artifacts > 0 {
        warn!(
            missing_artifacts,
            "text cache is incomplete, run rescan-all to rebuild it"
        );
    }

    if config.run_manifest_path.exists() {
        let raw = fs::read(&config.run_manifest_path)
            .with_context(|| format!("failed to read {}", config.run_manifest_path.display()))?;
        let manifest: RunManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", config.run_manifest_path.display()))?;

        info!(
            run_kind = %manifest.run_kind,
            started_at = %manifest.started_at,
            finished_at = %manifest.finished_at,
            ocr_engine = %manifest.ocr_engine,
            imported = manifest.counts.imported,
            already_imported = manifest.counts.already_imported,
            unsupported = manifest.counts.unsupported,
            failed = manifest.counts.failed,
            artifacts_written = manifest.counts.artifacts_written,
            "last run"
        );
        for failure in &manifest.failures {
            warn!(failure = %failure, "last run reported a failure");
        }
    } else {
        warn!(path = %config.run_manifest_path.display(), "no run manifest recorded yet");
    }

    Ok(())
}
