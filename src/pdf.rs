use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::config::Config;
use crate::ocr;

/// Extracts text from a scanned PDF by rasterizing every page into a scratch
/// directory and running OCR over the page images in order. The scratch
/// directory lives only for the duration of the call.
pub fn extract_pdf_text(config: &Config, pdf: &Path) -> Result<String> {
    let pages = page_count(pdf)?;
    debug!(pdf = %pdf.display(), pages, "rasterizing pdf for ocr");

    let workspace =
        tempfile::tempdir().context("failed to create scratch directory for pdf pages")?;
    let mut images = Vec::with_capacity(pages);
    for page_number in 1..=pages {
        images.push(rasterize_page(config, pdf, workspace.path(), page_number)?);
    }

    let mut text = String::new();
    for image in &images {
        text.push_str(&ocr::recognize(config, image)?);
    }
    Ok(text)
}

/// Renders one page with `pdftoppm -singlefile -jpeg`. Output roots count
/// from zero, so page 1 becomes `output_0.jpg`.
fn rasterize_page(
    config: &Config,
    pdf: &Path,
    workspace: &Path,
    page_number: usize,
) -> Result<PathBuf> {
    let output_root = workspace.join(format!("output_{}", page_number - 1));
    let image_path = PathBuf::from(format!("{}.jpg", output_root.display()));

    let output = Command::new("pdftoppm")
        .arg("-f")
        .arg(page_number.to_string())
        .arg("-l")
        .arg(page_number.to_string())
        .arg("-singlefile")
        .arg("-jpeg")
        .arg("-r")
        .arg(config.raster_dpi.to_string())
        .arg(pdf)
        .arg(&output_root)
        .output()
        .with_context(|| format!("failed to execute pdftoppm for {}", pdf.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftoppm returned non-zero exit status for {} page {}: {}",
            pdf.display(),
            page_number,
            stderr.trim()
        );
    }

    if !image_path.exists() {
        bail!(
            "pdftoppm did not produce expected image for {} page {}",
            pdf.display(),
            page_number
        );
    }

    Ok(image_path)
}

fn page_count(pdf: &Path) -> Result<usize> {
    let output = Command::new("pdfinfo")
        .arg(pdf)
        .output()
        .with_context(|| format!("failed to execute pdfinfo for {}", pdf.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdfinfo returned non-zero exit status for {}: {}",
            pdf.display(),
            stderr.trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_page_count(&stdout)
        .with_context(|| format!("pdfinfo reported no page count for {}", pdf.display()))
}

fn parse_page_count(pdfinfo_output: &str) -> Option<usize> {
    pdfinfo_output
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}
