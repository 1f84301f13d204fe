mod agents;
mod config;
mod convertapi;
mod llamaparse;
mod openai;
mod pdf;
mod pipelines;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use std::path::PathBuf;

/// Split PDFs, count words, and let LLM agents investigate documents.
#[derive(Parser, Debug)]
#[command(name = "pdf-sleuth", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, global = true, default_value = "config.toml", help = "Path to the config file")]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a PDF with ConvertAPI and store the top 5 words of every page
    WordCount {
        #[arg(long, default_value = "Safari.pdf")]
        pdf: PathBuf,
        #[arg(long, help = "Run the tools in a fixed order instead of through an agent")]
        direct: bool,
    },
    /// Split a PDF locally and extract every page to markdown
    Extract {
        #[arg(long, default_value = "case.pdf")]
        pdf: PathBuf,
        #[arg(long, help = "Run the tools in a fixed order instead of through an agent")]
        direct: bool,
    },
    /// Run the detective group chat over the extracted pages
    Investigate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filter)
        .init();
    log::info!("Configuration loaded from {}", cli.config.display());

    match cli.command {
        Command::WordCount { pdf, direct } => pipelines::word_count::run(&config, &pdf, direct).await,
        Command::Extract { pdf, direct } => pipelines::detective::run_extract(&config, &pdf, direct).await,
        Command::Investigate => pipelines::detective::run_investigation(&config).await,
    }
}
