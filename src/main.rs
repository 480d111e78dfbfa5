use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    chapterbook::logging::init(chapterbook::logging::DEFAULT_DIRECTIVE).context("init logging")?;

    let cli = chapterbook::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        chapterbook::cli::Command::Scrape(args) => {
            chapterbook::crawl::run(args).await.context("scrape")?;
        }
        chapterbook::cli::Command::Links(args) => {
            chapterbook::crawl::links(args).await.context("links")?;
        }
        chapterbook::cli::Command::Export(args) => {
            chapterbook::export::run(args).context("export")?;
        }
    }

    Ok(())
}
