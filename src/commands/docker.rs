use anyhow::Result;

use crate::config::Config;
use crate::ocr;

/// Force-rebuilds the tesseract image for the configured languages, picking
/// up upstream base-image and language-model updates.
pub fn run(config: &Config) -> Result<()> {
    ocr::build_image(config)
}
