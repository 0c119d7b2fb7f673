use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::archive;
use crate::cli::RescanArgs;
use crate::config::Config;
use crate::extract;
use crate::ledger::Ledger;
use crate::model::RunCounts;
use crate::util::{self, now_utc_string};

pub fn run(config: &Config, args: RescanArgs) -> Result<()> {
    if !args.yes && !util::confirm("this will delete your text cache - continue?")? {
        info!("rescan cancelled, nothing changed");
        return Ok(());
    }
    rebuild(config)
}

/// Drops the whole text tree and rebuilds it from the archived documents.
/// The ledger is derived state and gets repopulated along the way, so a
/// rescan never turns archived documents back into "not imported".
fn rebuild(config: &Config) -> Result<()> {
    let started_at = now_utc_string();

    if config.text_dir.exists() {
        fs::remove_dir_all(&config.text_dir).with_context(|| {
            format!("failed to delete text tree: {}", config.text_dir.display())
        })?;
    }
    config.setup()?;

    let documents = archive::collect_documents(config)?;
    info!(documents = documents.len(), "rebuilding text cache");

    let ledger = Ledger::new(&config.ledger_path);
    let mut counts = RunCounts::default();
    let mut failures = Vec::new();

    for document in &documents {
        match rebuild_one(config, &ledger, document) {
            Ok(unsupported) => {
                counts.artifacts_written += 1;
                if unsupported {
                    counts.unsupported += 1;
                }
            }
            Err(error) => {
                counts.failed += 1;
                error!(document = %document.display(), error = %error, "rescan failed for document");
                failures.push(format!("{}: {error:#}", document.display()));
            }
        }
    }

    super::write_run_manifest(config, "rescan-all", started_at, counts.clone(), failures)?;
    info!(
        artifacts = counts.artifacts_written,
        unsupported = counts.unsupported,
        failed = counts.failed,
        "rescan completed"
    );
    Ok(())
}

fn rebuild_one(config: &Config, ledger: &Ledger, document: &Path) -> Result<bool> {
    info!(document = %document.display(), "processing");
    let extraction = extract::extract_text(config, document)?;
    archive::write_text_artifact(config, document, &extraction.text)?;

    let digest = util::digest_file(document)?;
    if !ledger.contains(&digest)? {
        ledger.append(&digest)?;
    }

    Ok(!extraction.mime.is_supported())
}
