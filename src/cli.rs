use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape a book's landing page and every chapter it links to.
    Scrape(ScrapeArgs),
    /// List the chapter links found on a landing page without fetching them.
    Links(LinksArgs),
    /// Re-render a saved JSON book.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// Book landing page URL (`https://` is assumed when no scheme is given).
    #[arg(long)]
    pub url: String,

    /// Write the structured export (JSON) to this path.
    #[arg(long)]
    pub json: Option<String>,

    /// Write the narrative export (Markdown) to this path.
    #[arg(long)]
    pub md: Option<String>,

    /// Pause between chapter requests (politeness).
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,

    /// Per-request timeout.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Minimum characters for a chapter to be kept.
    #[arg(long, default_value_t = 100)]
    pub min_chars: usize,

    /// Overwrite existing output files.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct LinksArgs {
    /// Book landing page URL.
    #[arg(long)]
    pub url: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Md,
    Json,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// JSON book written by `scrape --json`.
    #[arg(long)]
    pub input: String,

    #[arg(long, value_enum)]
    pub format: ExportFormat,

    #[arg(long)]
    pub out: String,

    /// Overwrite an existing output file.
    #[arg(long)]
    pub force: bool,
}
