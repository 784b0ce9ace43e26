use std::path::PathBuf;

use anyhow::Context;
use barzooka::{Barzooka, ScreenerConfig};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli
{
    /// JSON configuration file; command line options take precedence
    #[arg(long, env = "BARZOOKA_CONFIG")]
    config: Option<PathBuf>,

    /// ONNX model file
    #[arg(long, env = "BARZOOKA_MODEL")]
    model: Option<PathBuf>,

    /// Folder that page images are extracted into while a PDF is screened
    #[arg(long, env = "BARZOOKA_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command
{
    /// Screen every PDF in a folder and write one CSV row per paper
    Corpus
    {
        pdf_folder: PathBuf,
        output_csv: PathBuf,
    },
    /// Screen a single PDF
    Pdf
    {
        pdf: PathBuf,
        /// Report labels per page instead of counts per graph type
        #[arg(long)]
        pagewise: bool,
    },
    /// Screen image files; folders are searched recursively
    Images
    {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()>
{
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()>
{
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .parse_default_env()
        .init();

    let mut config = match &cli.config
    {
        Some(path) => ScreenerConfig::from_file(path)?,
        None => ScreenerConfig::default(),
    };
    if let Some(model) = cli.model {
        config.model.path = model;
    }
    if let Some(scratch_dir) = cli.scratch_dir {
        config.scratch_dir = scratch_dir;
    }

    let screener = Barzooka::from_config(&config)
        .with_context(|| format!("Failed to set up screening with model {:?}", config.model.path))?;

    match cli.command
    {
        Command::Corpus { pdf_folder, output_csv } => {
            let report = screener.screen_corpus(&pdf_folder, &output_csv)?;
            info!("{} screened, {} skipped", report.screened, report.skipped.len());
            if !report.skipped.is_empty() {
                print_json(&report.skipped)?;
            }
        },
        Command::Pdf { pdf, pagewise } => {
            if pagewise {
                print_json(&screener.screen_pdf_pages(&pdf)?)?;
            } else {
                print_json(&screener.screen_pdf(&pdf)?)?;
            }
        },
        Command::Images { paths } => {
            let mut files = Vec::new();
            for path in paths
            {
                if path.is_dir() {
                    files.extend(barzooka::document::list_images(&path)?);
                } else {
                    files.push(path);
                }
            }
            let labels = screener.screen_images(&files)?;
            let results: Vec<_> = files.iter().zip(labels.iter()).collect();
            print_json(&results)?;
        },
    }

    Ok(())
}
