use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "docspace",
    version,
    about = "Personal document archive with OCR text extraction and fuzzy full-text search"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long = "ocr-lang", global = true, default_values_t = [String::from("deu")])]
    pub ocr_languages: Vec<String>,

    #[arg(long, value_enum, global = true, default_value_t = OcrEngine::Docker)]
    pub ocr_engine: OcrEngine,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Import(ImportArgs),
    #[command(aliases = ["rescan_all", "reimport-all", "reimport_all"])]
    RescanAll(RescanArgs),
    Search,
    #[command(alias = "docker_rebuild")]
    DockerRebuild,
    Status,
    #[command(name = "_parse_preview", hide = true)]
    ParsePreview(PreviewArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(required = true)]
    pub file_paths: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RescanArgs {
    #[arg(long, default_value_t = false)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    pub line: String,

    #[arg(default_value = "")]
    pub query: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OcrEngine {
    Docker,
    Local,
}

impl OcrEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Local => "local",
        }
    }
}
