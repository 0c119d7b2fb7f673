use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::archive;
use crate::config::Config;

/// Interactive fuzzy search over every line of the text cache. Selected
/// matches are printed as archive document paths, one per line.
pub fn run(config: &Config) -> Result<()> {
    let candidates = collect_candidates(config)?;
    if candidates.is_empty() {
        info!("text cache is empty, nothing to search");
        return Ok(());
    }

    let selections = run_fzf(config, &candidates)?;

    let mut seen = HashSet::new();
    for selection in &selections {
        match document_for_candidate(config, selection) {
            Some(document) => {
                if seen.insert(document.clone()) {
                    println!("{}", document.display());
                }
            }
            None => warn!(candidate = %selection, "malformed selection line"),
        }
    }
    Ok(())
}

/// One candidate per non-blank artifact line, `<doc-relative-path>:<line>`,
/// so a match leads straight back to its document.
fn collect_candidates(config: &Config) -> Result<Vec<String>> {
    let mut candidates = Vec::new();
    for artifact in archive::collect_text_artifacts(config)? {
        let label = document_label_for(config, &artifact)?;
        let content = std::fs::read_to_string(&artifact)
            .with_context(|| format!("failed to read text artifact: {}", artifact.display()))?;
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            candidates.push(format!("{label}:{line}"));
        }
    }
    Ok(candidates)
}

fn document_label_for(config: &Config, artifact: &Path) -> Result<String> {
    let relative = artifact.strip_prefix(&config.text_dir).with_context(|| {
        format!(
            "text artifact {} is outside the text tree {}",
            artifact.display(),
            config.text_dir.display()
        )
    })?;
    let relative = relative
        .to_str()
        .with_context(|| format!("artifact path is not valid UTF-8: {}", artifact.display()))?;
    let label = relative
        .strip_suffix(config.text_suffix.as_str())
        .unwrap_or(relative);
    Ok(label.to_string())
}

fn document_for_candidate(config: &Config, candidate: &str) -> Option<PathBuf> {
    let (doc_relative, _) = candidate.split_once(':')?;
    Some(config.data_dir.join(doc_relative))
}

/// The preview pane re-invokes this binary in hidden preview mode; fzf
/// substitutes `{}` with the highlighted line and `{q}` with the query.
/// fzf hands this template to a shell, so the embedded paths are quoted.
fn preview_command(config: &Config) -> Result<String> {
    let current_exe =
        std::env::current_exe().context("failed to resolve the current executable")?;
    Ok(format!(
        "{} --data-dir {} _parse_preview {{}} {{q}}",
        shell_quote(&current_exe.display().to_string()),
        shell_quote(&config.data_dir.display().to_string())
    ))
}

/// Single-quotes a path for the preview shell. An embedded quote closes the
/// string, emits an escaped quote and reopens, so `it's` becomes `'it'\''s'`.
fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "'\\''"))
}

fn run_fzf(config: &Config, candidates: &[String]) -> Result<Vec<String>> {
    let preview = preview_command(config)?;

    let mut command = Command::new("fzf");
    command
        .arg("--multi")
        .arg("--ansi")
        .arg("--preview")
        .arg(&preview)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            bail!("fzf not found on PATH; install fzf to use search")
        }
        Err(error) => {
            return Err(anyhow::Error::new(error).context("failed to launch fzf"));
        }
    };

    {
        let mut stdin = child
            .stdin
            .take()
            .context("failed to open stdin of fzf")?;
        for candidate in candidates {
            if let Err(error) = writeln!(stdin, "{candidate}") {
                // fzf exits as soon as the user confirms or cancels; a broken
                // pipe mid-stream is part of normal operation.
                if error.kind() == std::io::ErrorKind::BrokenPipe {
                    break;
                }
                return Err(
                    anyhow::Error::new(error).context("failed to stream candidates to fzf")
                );
            }
        }
    }

    let output = child.wait_with_output().context("failed to wait for fzf")?;
    match output.status.code() {
        // 1 is "no match", 130 is "interrupted"; both mean no selection.
        Some(0) => {}
        Some(1) | Some(130) => return Ok(Vec::new()),
        _ => bail!("fzf exited with status {}", output.status),
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().map(|line| line.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OcrEngine;

    fn test_config(root: &Path) -> Config {
        let config = Config::new(
            root.join("docspace"),
            vec!["deu".to_string()],
            OcrEngine::Local,
        );
        config.setup().expect("setup");
        config
    }

    #[test]
    fn candidates_carry_document_labels_and_skip_blank_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        std::fs::write(
            config.text_dir.join("notes.txt.txt"),
            "first line\n\n  \nsecond line\n",
        )
        .expect("write");
        std::fs::create_dir_all(config.text_dir.join("letters")).expect("mkdir");
        std::fs::write(
            config.text_dir.join("letters").join("scan.pdf.txt"),
            "dear sir\n",
        )
        .expect("write");

        let candidates = collect_candidates(&config).expect("collect");

        assert_eq!(
            candidates,
            vec![
                "letters/scan.pdf:dear sir".to_string(),
                "notes.txt:first line".to_string(),
                "notes.txt:second line".to_string(),
            ]
        );
    }

    #[test]
    fn ledger_lines_never_become_candidates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        std::fs::write(&config.ledger_path, "aa11\nbb22\n").expect("write ledger");
        std::fs::write(config.text_dir.join("notes.txt.txt"), "hello\n").expect("write");

        let candidates = collect_candidates(&config).expect("collect");
        assert_eq!(candidates, vec!["notes.txt:hello".to_string()]);
    }

    #[test]
    fn selections_map_back_to_archive_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());

        assert_eq!(
            document_for_candidate(&config, "letters/scan.pdf:dear sir"),
            Some(config.data_dir.join("letters").join("scan.pdf"))
        );
        assert_eq!(
            document_for_candidate(&config, "notes.txt:a line: with a colon"),
            Some(config.data_dir.join("notes.txt"))
        );
        assert_eq!(document_for_candidate(&config, "no separator here"), None);
    }

    #[test]
    fn preview_command_reinvokes_the_binary_in_preview_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());

        let preview = preview_command(&config).expect("preview command");
        assert!(preview.ends_with("_parse_preview {} {q}"));
        assert!(preview.contains("--data-dir"));
        assert!(preview.contains(&config.data_dir.display().to_string()));
    }

    #[test]
    fn shell_quote_escapes_embedded_quotes() {
        assert_eq!(shell_quote("/plain/path"), "'/plain/path'");
        assert_eq!(shell_quote("/it's here"), "'/it'\\''s here'");
    }

    #[test]
    fn preview_command_survives_quotes_in_the_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(&dir.path().join("it's here"));

        let preview = preview_command(&config).expect("preview command");
        assert!(preview.contains("it'\\''s here"));
        assert!(preview.ends_with("_parse_preview {} {q}"));
    }
}
