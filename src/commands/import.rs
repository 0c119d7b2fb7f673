use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{error, info};

use crate::archive;
use crate::cli::ImportArgs;
use crate::config::Config;
use crate::extract;
use crate::ledger::Ledger;
use crate::model::RunCounts;
use crate::util::{self, now_utc_string};

#[derive(Debug)]
enum ImportOutcome {
    Imported {
        document: PathBuf,
        unsupported: bool,
    },
    AlreadyImported,
}

pub fn run(config: &Config, args: ImportArgs) -> Result<()> {
    let started_at = now_utc_string();
    let ledger = Ledger::new(&config.ledger_path);

    info!(
        data_dir = %config.data_dir.display(),
        files = args.file_paths.len(),
        "starting import"
    );

    let mut counts = RunCounts::default();
    let mut failures = Vec::new();

    for file_path in &args.file_paths {
        match import_one(config, &ledger, file_path) {
            Ok(ImportOutcome::Imported {
                document,
                unsupported,
            }) => {
                counts.imported += 1;
                counts.artifacts_written += 1;
                if unsupported {
                    counts.unsupported += 1;
                }
                info!(
                    source = %file_path.display(),
                    archived = %document.display(),
                    "imported"
                );
            }
            Ok(ImportOutcome::AlreadyImported) => {
                counts.already_imported += 1;
                info!(source = %file_path.display(), "already imported, skipping");
            }
            Err(error) => {
                counts.failed += 1;
                error!(source = %file_path.display(), error = %error, "import failed");
                failures.push(format!("{}: {error:#}", file_path.display()));
            }
        }
    }

    super::write_run_manifest(config, "import", started_at, counts.clone(), failures)?;
    info!(
        imported = counts.imported,
        already_imported = counts.already_imported,
        unsupported = counts.unsupported,
        failed = counts.failed,
        "import completed"
    );
    Ok(())
}

/// Imports a single document. Extraction runs before anything is written so
/// an OCR failure leaves no copy, no artifact and no ledger entry; the ledger
/// append comes last and marks the import as complete.
fn import_one(config: &Config, ledger: &Ledger, file_path: &Path) -> Result<ImportOutcome> {
    if !file_path.is_file() {
        bail!("not a regular file: {}", file_path.display());
    }

    let digest = util::digest_file(file_path)?;
    if ledger.contains(&digest)? {
        return Ok(ImportOutcome::AlreadyImported);
    }

    let extraction = extract::extract_text(config, file_path)?;
    let document = archive::copy_in(config, file_path)?;
    archive::write_text_artifact(config, &document, &extraction.text)?;
    ledger.append(&digest)?;

    Ok(ImportOutcome::Imported {
        document,
        unsupported: !extraction.mime.is_supported(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OcrEngine;
    use crate::model::RunManifest;

    fn test_config(root: &Path) -> Config {
        let config = Config::new(
            root.join("docspace"),
            vec!["deu".to_string()],
            OcrEngine::Local,
        );
        config.setup().expect("setup");
        config
    }

    fn read_manifest(config: &Config) -> RunManifest {
        let raw = std::fs::read(&config.run_manifest_path).expect("read manifest");
        serde_json::from_slice(&raw).expect("parse manifest")
    }

    #[test]
    fn import_archives_indexes_and_ledgers_a_text_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "rent contract\n").expect("write source");

        run(
            &config,
            ImportArgs {
                file_paths: vec![source.clone()],
            },
        )
        .expect("import");

        let archived = config.data_dir.join("notes.txt");
        assert_eq!(
            std::fs::read_to_string(&archived).expect("read archived"),
            "rent contract\n"
        );
        assert_eq!(
            std::fs::read_to_string(config.text_dir.join("notes.txt.txt"))
                .expect("read artifact"),
            "rent contract\n"
        );

        let ledger = Ledger::new(&config.ledger_path);
        assert_eq!(ledger.count().expect("count"), 1);
        let digest = util::digest_file(&archived).expect("digest");
        assert!(ledger.contains(&digest).expect("contains"));

        let manifest = read_manifest(&config);
        assert_eq!(manifest.run_kind, "import");
        assert_eq!(manifest.counts.imported, 1);
        assert_eq!(manifest.counts.artifacts_written, 1);
        assert_eq!(manifest.counts.failed, 0);
    }

    #[test]
    fn reimporting_identical_content_under_a_new_name_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let first = dir.path().join("notes.txt");
        let second = dir.path().join("copy-of-notes.txt");
        std::fs::write(&first, "same content\n").expect("write");
        std::fs::write(&second, "same content\n").expect("write");

        run(
            &config,
            ImportArgs {
                file_paths: vec![first, second],
            },
        )
        .expect("import");

        assert!(config.data_dir.join("notes.txt").exists());
        assert!(!config.data_dir.join("copy-of-notes.txt").exists());
        assert_eq!(
            Ledger::new(&config.ledger_path).count().expect("count"),
            1
        );

        let manifest = read_manifest(&config);
        assert_eq!(manifest.counts.imported, 1);
        assert_eq!(manifest.counts.already_imported, 1);
    }

    #[test]
    fn name_collisions_with_different_content_get_mangled_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let first_dir = dir.path().join("a");
        let second_dir = dir.path().join("b");
        std::fs::create_dir_all(&first_dir).expect("mkdir");
        std::fs::create_dir_all(&second_dir).expect("mkdir");
        let first = first_dir.join("notes.txt");
        let second = second_dir.join("notes.txt");
        std::fs::write(&first, "first version\n").expect("write");
        std::fs::write(&second, "second version\n").expect("write");

        run(
            &config,
            ImportArgs {
                file_paths: vec![first, second],
            },
        )
        .expect("import");

        assert_eq!(
            std::fs::read_to_string(config.data_dir.join("notes.txt")).expect("read"),
            "first version\n"
        );
        assert_eq!(
            std::fs::read_to_string(config.data_dir.join("notes_1.txt")).expect("read"),
            "second version\n"
        );
        assert!(config.text_dir.join("notes.txt.txt").exists());
        assert!(config.text_dir.join("notes_1.txt.txt").exists());
        assert_eq!(
            Ledger::new(&config.ledger_path).count().expect("count"),
            2
        );
    }

    #[test]
    fn multibyte_names_collide_into_clean_mangled_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let first_dir = dir.path().join("a");
        let second_dir = dir.path().join("b");
        std::fs::create_dir_all(&first_dir).expect("mkdir");
        std::fs::create_dir_all(&second_dir).expect("mkdir");
        let first = first_dir.join("übersicht.txt");
        let second = second_dir.join("übersicht.txt");
        std::fs::write(&first, "erste fassung\n").expect("write");
        std::fs::write(&second, "zweite fassung\n").expect("write");

        run(
            &config,
            ImportArgs {
                file_paths: vec![first, second],
            },
        )
        .expect("import");

        assert!(config.data_dir.join("übersicht.txt").exists());
        assert_eq!(
            std::fs::read_to_string(config.data_dir.join("übersicht_1.txt")).expect("read"),
            "zweite fassung\n"
        );
        assert!(config.text_dir.join("übersicht.txt.txt").exists());
        assert!(config.text_dir.join("übersicht_1.txt.txt").exists());
    }

    #[test]
    fn unsupported_documents_are_archived_with_an_empty_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let source = dir.path().join("bundle.zip");
        std::fs::write(&source, b"PK\x03\x04zipzipzip").expect("write");

        run(
            &config,
            ImportArgs {
                file_paths: vec![source],
            },
        )
        .expect("import");

        assert!(config.data_dir.join("bundle.zip").exists());
        assert_eq!(
            std::fs::read_to_string(config.text_dir.join("bundle.zip.txt"))
                .expect("read artifact"),
            ""
        );
        assert_eq!(
            Ledger::new(&config.ledger_path).count().expect("count"),
            1
        );

        let manifest = read_manifest(&config);
        assert_eq!(manifest.counts.imported, 1);
        assert_eq!(manifest.counts.unsupported, 1);
    }

    #[test]
    fn empty_documents_are_archived_and_ledgered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let source = dir.path().join("empty.txt");
        std::fs::write(&source, "").expect("write");

        run(
            &config,
            ImportArgs {
                file_paths: vec![source],
            },
        )
        .expect("import");

        assert!(config.data_dir.join("empty.txt").exists());
        assert_eq!(
            std::fs::read_to_string(config.text_dir.join("empty.txt.txt"))
                .expect("read artifact"),
            ""
        );
        assert_eq!(
            Ledger::new(&config.ledger_path).count().expect("count"),
            1
        );

        let manifest = read_manifest(&config);
        assert_eq!(manifest.counts.imported, 1);
        assert_eq!(manifest.counts.unsupported, 1);
    }

    #[test]
    fn failed_extraction_leaves_no_partial_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        // Sniffs as text (binary byte sits past the window) but cannot be
        // read as UTF-8, so extraction fails after the dedup check.
        let source = dir.path().join("trap.txt");
        let mut content = vec![b'a'; 9000];
        content.push(0xFF);
        std::fs::write(&source, &content).expect("write");

        let ledger = Ledger::new(&config.ledger_path);
        let error = import_one(&config, &ledger, &source).expect_err("should fail");
        assert!(error.to_string().contains("UTF-8"));

        assert!(!config.data_dir.join("trap.txt").exists());
        assert!(!config.text_dir.join("trap.txt.txt").exists());
        assert_eq!(ledger.count().expect("count"), 0);
    }

    #[test]
    fn batch_continues_past_per_file_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "fine\n").expect("write");
        let missing = dir.path().join("no-such-file.txt");

        run(
            &config,
            ImportArgs {
                file_paths: vec![missing.clone(), good],
            },
        )
        .expect("import");

        assert!(config.data_dir.join("good.txt").exists());

        let manifest = read_manifest(&config);
        assert_eq!(manifest.counts.imported, 1);
        assert_eq!(manifest.counts.failed, 1);
        assert_eq!(manifest.failures.len(), 1);
        assert!(manifest.failures[0].contains("no-such-file.txt"));
    }
}
