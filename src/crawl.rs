use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::cli::{LinksArgs, ScrapeArgs};
use crate::fetch::HttpFetcher;
use crate::scrape::{BookScraper, ScrapeOptions, ScrapeReport};

/// Parses a user-supplied landing URL, assuming `https://` when no scheme is given.
pub fn parse_landing_url(input: &str) -> anyhow::Result<Url> {
    let input = input.trim();
    if input.is_empty() {
        anyhow::bail!("--url must not be empty");
    }
    let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_owned()
    } else {
        format!("https://{input}")
    };

    let url = Url::parse(&with_scheme).with_context(|| format!("parse --url: {input}"))?;
    if url.host_str().is_none() {
        anyhow::bail!("--url must have host: {url}");
    }
    Ok(url)
}

pub async fn run(args: ScrapeArgs) -> anyhow::Result<()> {
    let landing_url = parse_landing_url(&args.url)?;
    for out in [&args.json, &args.md].into_iter().flatten() {
        if Path::new(out).exists() && !args.force {
            anyhow::bail!("export output already exists: {out}");
        }
    }

    let fetcher =
        HttpFetcher::new(Duration::from_secs(args.timeout_secs)).context("build http fetcher")?;
    let options = ScrapeOptions {
        min_chapter_chars: args.min_chars,
        pacing_delay: Duration::from_millis(args.delay_ms),
        ..ScrapeOptions::default()
    };
    let scraper = BookScraper::new(fetcher, options);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; finishing with chapters scraped so far");
            interrupt.cancel();
        }
    });

    let report = match scraper.run_with_cancel(&landing_url, &cancel).await {
        Ok(report) => report,
        Err(failure) => {
            let json = serde_json::to_string(&failure).context("serialize scrape failure")?;
            eprintln!("{json}");
            return Err(failure).context("scrape landing page");
        }
    };

    print_summary(&report).context("print summary")?;

    if let Some(out) = &args.json {
        let json = crate::export::render_json(&report.book)?;
        crate::export::write_output(Path::new(out), &json, args.force)?;
        tracing::info!(out = %out, "wrote json export");
    }
    if let Some(out) = &args.md {
        let md = crate::export::render_markdown(&report.book);
        crate::export::write_output(Path::new(out), &md, args.force)?;
        tracing::info!(out = %out, "wrote markdown export");
    }

    Ok(())
}

pub async fn links(args: LinksArgs) -> anyhow::Result<()> {
    let landing_url = parse_landing_url(&args.url)?;
    let fetcher =
        HttpFetcher::new(Duration::from_secs(args.timeout_secs)).context("build http fetcher")?;
    let scraper = BookScraper::new(fetcher, ScrapeOptions::default());

    let (details, links) = scraper
        .discover(&landing_url)
        .await
        .context("discover chapter links")?;
    tracing::info!(title = %details.title, links = links.len(), "discovered chapter links");

    let mut stdout = std::io::stdout().lock();
    for link in &links {
        serde_json::to_writer(&mut stdout, link).context("write link json")?;
        stdout.write_all(b"\n").context("write link newline")?;
    }
    stdout.flush().context("flush stdout")?;
    Ok(())
}

fn print_summary(report: &ScrapeReport) -> anyhow::Result<()> {
    let book = &report.book;
    let mut out = std::io::stdout().lock();

    let title = match book.book_details.title.as_str() {
        "" => "N/A",
        title => title,
    };
    writeln!(out, "Book: {title}")?;
    if let Some(author) = &book.book_details.author {
        writeln!(out, "Author: {author}")?;
    }
    writeln!(out, "Chapters: {}", book.total_chapters)?;
    writeln!(out, "Failed: {}", report.failed)?;
    writeln!(out, "Skipped (too short): {}", report.skipped)?;
    if report.cancelled {
        writeln!(out, "Interrupted: partial result")?;
    }

    for chapter in &book.chapters {
        match chapter.error() {
            None => writeln!(
                out,
                "  {}. {} ({} chars)",
                chapter.chapter_number,
                chapter.title().unwrap_or_default(),
                chapter.content_length()
            )?,
            Some(error) => writeln!(out, "  {}. Error: {error}", chapter.chapter_number)?,
        }
    }

    let elapsed = report.finished_at - report.started_at;
    tracing::info!(elapsed_ms = elapsed.num_milliseconds(), "scrape finished");
    Ok(())
}
