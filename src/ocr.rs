use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::cli::OcrEngine;
use crate::config::Config;
use crate::util;

const DOCKER_BASE_IMAGE: &str = "jitesoft/tesseract-ocr";
const CONTAINER_INPUT_DIR: &str = "/tmp/input";

/// Runs tesseract over a single image file and returns the recognized text.
///
/// The docker engine mounts the image into a throwaway container with the
/// configured language models trained in; the local engine calls a
/// host-installed tesseract directly.
pub fn recognize(config: &Config, input: &Path) -> Result<String> {
    let input = input
        .canonicalize()
        .with_context(|| format!("failed to resolve ocr input: {}", input.display()))?;

    let mut command = match config.ocr_engine {
        OcrEngine::Docker => {
            ensure_image(config)?;
            docker_run_command(config, &input)?
        }
        OcrEngine::Local => local_run_command(config, &input),
    };
    debug!(command = %util::render_command(&command), "running tesseract");

    let output = command
        .output()
        .with_context(|| format!("failed to execute tesseract for {}", input.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "tesseract returned non-zero exit status for {} ({}): {}",
            input.display(),
            util::render_command(&command),
            stderr.trim()
        );
    }

    let text = String::from_utf8(output.stdout).with_context(|| {
        format!(
            "tesseract produced undecodable output for {} ({})",
            input.display(),
            util::render_command(&command)
        )
    })?;
    Ok(text.replace('\u{0000}', ""))
}

/// `docker run --rm -v <input>:/tmp/input/<name> <tag> --dpi N -l <langs>
/// /tmp/input/<name> stdout`. The input must already be an absolute path or
/// the bind mount silently creates an empty directory instead.
fn docker_run_command(config: &Config, input: &Path) -> Result<Command> {
    let input_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("ocr input name is not valid UTF-8: {}", input.display()))?;
    let mount_target = format!("{CONTAINER_INPUT_DIR}/{input_name}");

    let mut command = Command::new("docker");
    command
        .arg("run")
        .arg("--rm")
        .arg("-v")
        .arg(format!("{}:{}", input.display(), mount_target))
        .arg(image_tag(&config.ocr_languages))
        .arg("--dpi")
        .arg(config.ocr_dpi.to_string())
        .arg("-l")
        .arg(language_spec(&config.ocr_languages))
        .arg(&mount_target)
        .arg("stdout");
    Ok(command)
}

fn local_run_command(config: &Config, input: &Path) -> Command {
    let mut command = Command::new("tesseract");
    command
        .arg(input)
        .arg("stdout")
        .arg("--dpi")
        .arg(config.ocr_dpi.to_string())
        .arg("-l")
        .arg(language_spec(&config.ocr_languages));
    command
}

/// Builds the tesseract image unless one with the right tag already exists.
fn ensure_image(config: &Config) -> Result<()> {
    let tag = image_tag(&config.ocr_languages);
    if image_exists(&tag)? {
        return Ok(());
    }
    info!(%tag, "tesseract image not found, building it");
    build_image(config)
}

/// Builds the language-trained tesseract image, streaming the dockerfile over
/// stdin so nothing touches disk.
pub fn build_image(config: &Config) -> Result<()> {
    let tag = image_tag(&config.ocr_languages);
    let dockerfile = render_dockerfile(&config.ocr_languages);
    info!(%tag, languages = %config.ocr_languages.join(", "), "building tesseract image");

    let mut child = Command::new("docker")
        .arg("build")
        .arg("-t")
        .arg(&tag)
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to execute docker build; is docker installed?")?;

    let mut stdin = child
        .stdin
        .take()
        .context("failed to open stdin of docker build")?;
    stdin
        .write_all(dockerfile.as_bytes())
        .context("failed to stream dockerfile to docker build")?;
    drop(stdin);

    let output = child
        .wait_with_output()
        .context("failed to wait for docker build")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "docker build returned non-zero exit status for {tag}: {}",
            stderr.trim()
        );
    }
    info!(%tag, "tesseract image built");
    Ok(())
}

fn image_exists(tag: &str) -> Result<bool> {
    let output = Command::new("docker")
        .arg("images")
        .arg("-q")
        .arg(tag)
        .output()
        .context("failed to execute docker images; is docker installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "docker images returned non-zero exit status for {tag}: {}",
            stderr.trim()
        );
    }
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// One image per language set, so switching languages builds a sibling image
/// instead of clobbering the previous one.
fn image_tag(languages: &[String]) -> String {
    format!("docspace_tesseract_{}", languages.join("_"))
}

fn language_spec(languages: &[String]) -> String {
    languages.join("+")
}

fn render_dockerfile(languages: &[String]) -> String {
    let mut dockerfile = format!("FROM {DOCKER_BASE_IMAGE}\n");
    for language in languages {
        dockerfile.push_str(&format!("RUN train-lang {language} --fast\n"));
    }
    dockerfile
}
