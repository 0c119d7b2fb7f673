use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::warn;

use crate::archive;
use crate::cli::PreviewArgs;
use crate::config::Config;

/// Renders the fzf preview pane for one candidate line: a colored `rg`
/// excerpt of the matching artifact, or the raw artifact when `rg` is not
/// installed. Output goes straight to stdout where fzf captures it.
pub fn run(config: &Config, args: PreviewArgs) -> Result<()> {
    let artifact = match artifact_for_candidate(config, &args.line) {
        Some(artifact) => artifact,
        None => {
            warn!(line = %args.line, "malformed preview line");
            return Ok(());
        }
    };

    let status = Command::new("rg")
        .arg("--ignore-case")
        .arg("--pretty")
        .arg("--context")
        .arg("10")
        .arg(&args.query)
        .arg(&artifact)
        .status();

    match status {
        // rg exits 1 when nothing matches; an empty pane is the right
        // preview for that.
        Ok(_) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => dump_artifact(&artifact),
        Err(error) => Err(anyhow::Error::new(error).context("failed to launch rg")),
    }
}

fn artifact_for_candidate(config: &Config, line: &str) -> Option<PathBuf> {
    let (doc_relative, _) = line.split_once(':')?;
    Some(archive::text_path_for_relative(config, doc_relative))
}

fn dump_artifact(artifact: &Path) -> Result<()> {
    let content = std::fs::read_to_string(artifact)
        .with_context(|| format!("failed to read text artifact: {}", artifact.display()))?;
    print!("{content}");
    Ok(())
}
