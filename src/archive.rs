use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::config::Config;
use crate::util;

/// Copies a document into the archive under its own file name, mangling the
/// name when a different file already occupies it. Returns the archived path.
pub fn copy_in(config: &Config, source: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("document name is not valid UTF-8: {}", source.display()))?;

    let mut candidate_name = file_name.to_string();
    let mut attempt = 0_u32;
    loop {
        let candidate = config.data_dir.join(&candidate_name);
        if !candidate.exists() {
            std::fs::copy(source, &candidate).with_context(|| {
                format!(
                    "failed to copy {} into archive at {}",
                    source.display(),
                    candidate.display()
                )
            })?;
            return Ok(candidate);
        }
        if is_same_file(source, &candidate)? {
            // Importing a file that already sits inside the archive; copying
            // onto itself would truncate it.
            return Ok(candidate);
        }
        attempt += 1;
        candidate_name = collision_name(file_name, attempt);
    }
}

/// Inserts `_<attempt>` before the first extension dot. A leading dot is part
/// of the stem, not an extension separator.
fn collision_name(file_name: &str, attempt: u32) -> String {
    match file_name
        .char_indices()
        .skip(1)
        .find(|(_, character)| *character == '.')
    {
        Some((index, _)) => format!(
            "{}_{attempt}{}",
            &file_name[..index],
            &file_name[index..]
        ),
        None => format!("{file_name}_{attempt}"),
    }
}

/// Inode identity, so a hard link to the source with the destination name
/// counts as the same file.
fn is_same_file(left: &Path, right: &Path) -> Result<bool> {
    let left = std::fs::metadata(left)
        .with_context(|| format!("failed to stat {}", left.display()))?;
    let right = std::fs::metadata(right)
        .with_context(|| format!("failed to stat {}", right.display()))?;
    Ok(left.dev() == right.dev() && left.ino() == right.ino())
}

/// Archive-relative path of a document, as a string so the text-artifact
/// mapping can append a suffix to it.
pub fn doc_relative_for(config: &Config, document: &Path) -> Result<String> {
    let relative = document.strip_prefix(&config.data_dir).with_context(|| {
        format!(
            "document {} is outside the archive {}",
            document.display(),
            config.data_dir.display()
        )
    })?;
    let relative = relative
        .to_str()
        .with_context(|| format!("document path is not valid UTF-8: {}", document.display()))?;
    Ok(relative.to_string())
}

/// Text artifact path for an archived document: the document's relative path
/// replayed under the text tree with the suffix appended to the full name, so
/// `scan.pdf` maps to `scan.pdf.txt` and the mapping stays invertible.
pub fn text_path_for(config: &Config, document: &Path) -> Result<PathBuf> {
    let relative = doc_relative_for(config, document)?;
    Ok(text_path_for_relative(config, &relative))
}

pub fn text_path_for_relative(config: &Config, relative: &str) -> PathBuf {
    config
        .text_dir
        .join(format!("{relative}{}", config.text_suffix))
}

/// Writes extracted text for a document, creating intermediate directories so
/// nested archive paths mirror into the text tree. Returns the artifact path.
pub fn write_text_artifact(config: &Config, document: &Path, text: &str) -> Result<PathBuf> {
    let artifact = text_path_for(config, document)?;
    if let Some(parent) = artifact.parent() {
        util::ensure_directory(parent)?;
    }
    std::fs::write(&artifact, text)
        .with_context(|| format!("failed to write text artifact: {}", artifact.display()))?;
    Ok(artifact)
}

/// Every archived document, in lexicographic path order. The text tree is not
/// part of the archive and is skipped wholesale.
pub fn collect_documents(config: &Config) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    let walker = WalkDir::new(&config.data_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.path() != config.text_dir);
    for entry in walker {
        let entry = entry.with_context(|| {
            format!("failed to walk archive: {}", config.data_dir.display())
        })?;
        if entry.file_type().is_file() {
            documents.push(entry.into_path());
        }
    }
    documents.sort();
    Ok(documents)
}

/// Every text artifact, in lexicographic path order. Bookkeeping files in the
/// text tree (the fingerprint ledger also carries the text suffix) are not
/// artifacts and never surface as search candidates.
pub fn collect_text_artifacts(config: &Config) -> Result<Vec<PathBuf>> {
    let mut artifacts = Vec::new();
    for entry in WalkDir::new(&config.text_dir).sort_by_file_name() {
        let entry = entry.with_context(|| {
            format!("failed to walk text tree: {}", config.text_dir.display())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if path == config.ledger_path || path == config.run_manifest_path {
            continue;
        }
        let is_artifact = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&config.text_suffix));
        if is_artifact {
            artifacts.push(path);
        }
    }
    artifacts.sort();
    Ok(artifacts)
}
