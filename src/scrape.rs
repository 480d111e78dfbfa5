//! Sequential chapter orchestration: discover once, then fetch and extract
//! one chapter at a time with a fixed pause between attempts.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dom_query::Document;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::book;
use crate::discover::LinkDiscoverer;
use crate::fetch::{FetchOptions, FetchedPage, PageFetcher};
use crate::formats::{BookDetails, BookRecord, ChapterLink, ChapterRecord};
use crate::locate::ContentLocator;
use crate::noise::{NoiseFilter, NoiseProfile};
use crate::text::TextExtractor;

const CHAPTER_FETCH_FAILED: &str = "Failed to scrape chapter";
const LANDING_FETCH_FAILED: &str = "Failed to scrape main page";
const PROGRESS_EVERY: usize = 5;

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Chapters shorter than this many characters are dropped.
    pub min_chapter_chars: usize,
    /// Threshold for the landing page scraped as its own chapter when it has no links.
    pub min_fallback_chars: usize,
    pub pacing_delay: Duration,
    pub landing_fetch: FetchOptions,
    pub chapter_fetch: FetchOptions,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            min_chapter_chars: 100,
            min_fallback_chars: 50,
            pacing_delay: Duration::from_secs(1),
            landing_fetch: FetchOptions::landing(),
            chapter_fetch: FetchOptions::chapter(),
        }
    }
}

/// The landing page could not be retrieved; nothing was scraped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{error} ({url})")]
pub struct ScrapeFailure {
    pub error: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub book: BookRecord,
    /// Chapters extracted but under the length threshold.
    pub skipped: usize,
    /// Chapters whose fetch failed; these are also present in `book.chapters`.
    pub failed: usize,
    /// The run stopped early; `book` holds what was accepted until then.
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// State owned by a single run.
#[derive(Debug, Default)]
struct RunContext {
    seen_urls: HashSet<String>,
    chapters: Vec<ChapterRecord>,
    skipped: usize,
    failed: usize,
    cancelled: bool,
}

enum Attempt {
    Extracted(ChapterRecord),
    Failed(ChapterRecord),
    Cancelled,
}

pub struct BookScraper<F> {
    fetcher: F,
    options: ScrapeOptions,
    noise: NoiseFilter,
    locator: ContentLocator,
    extractor: TextExtractor,
    discoverer: LinkDiscoverer,
}

impl<F: PageFetcher> BookScraper<F> {
    pub fn new(fetcher: F, options: ScrapeOptions) -> Self {
        Self {
            fetcher,
            options,
            noise: NoiseFilter::default(),
            locator: ContentLocator::default(),
            extractor: TextExtractor::default(),
            discoverer: LinkDiscoverer::default(),
        }
    }

    pub fn with_noise_filter(mut self, noise: NoiseFilter) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_text_extractor(mut self, extractor: TextExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub async fn run(&self, landing_url: &Url) -> Result<ScrapeReport, ScrapeFailure> {
        self.run_with_cancel(landing_url, &CancellationToken::new())
            .await
    }

    /// Cancelling `cancel` stops the run at the next fetch or pause and
    /// keeps every chapter accepted so far.
    pub async fn run_with_cancel(
        &self,
        landing_url: &Url,
        cancel: &CancellationToken,
    ) -> Result<ScrapeReport, ScrapeFailure> {
        let started_at = Utc::now();
        let mut ctx = RunContext::default();

        tracing::info!(url = %landing_url, "scraping landing page");
        let (details, links) = self.read_landing(landing_url, &mut ctx, cancel).await?;
        tracing::info!(title = %details.title, links = links.len(), "landing page read");

        if links.is_empty() {
            tracing::info!("no chapter links found; scraping landing page as a chapter");
            self.scrape_landing_as_chapter(landing_url, &mut ctx, cancel)
                .await;
        } else {
            self.scrape_chapters(&links, &mut ctx, cancel).await;
        }

        if ctx.skipped > 0 {
            tracing::info!(
                skipped = ctx.skipped,
                min_chars = self.options.min_chapter_chars,
                "skipped short chapters"
            );
        }

        Ok(ScrapeReport {
            book: BookRecord::new(landing_url.as_str(), details, ctx.chapters),
            skipped: ctx.skipped,
            failed: ctx.failed,
            cancelled: ctx.cancelled,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Landing-page half of a run: book details plus the ordered chapter links.
    pub async fn discover(
        &self,
        landing_url: &Url,
    ) -> Result<(BookDetails, Vec<ChapterLink>), ScrapeFailure> {
        let mut ctx = RunContext::default();
        self.read_landing(landing_url, &mut ctx, &CancellationToken::new())
            .await
    }

    async fn read_landing(
        &self,
        landing_url: &Url,
        ctx: &mut RunContext,
        cancel: &CancellationToken,
    ) -> Result<(BookDetails, Vec<ChapterLink>), ScrapeFailure> {
        let failure = |error: String| ScrapeFailure {
            error,
            url: landing_url.to_string(),
        };

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(failure("scrape cancelled".to_owned())),
            fetched = self.fetcher.fetch(landing_url, &self.options.landing_fetch) => fetched,
        };
        let page = match fetched {
            Ok(page) if page.success => page,
            Ok(_) => return Err(failure(LANDING_FETCH_FAILED.to_owned())),
            Err(err) => return Err(failure(err.to_string())),
        };

        let document = Document::from(page.html.as_str());
        self.noise.strip_structure(&document);
        let author = book::author(&document);
        self.noise.filter(&document, NoiseProfile::Landing);
        let details = BookDetails {
            title: book::title(&document),
            author,
        };
        let links = self
            .discoverer
            .discover(&document, landing_url, &mut ctx.seen_urls);
        Ok((details, links))
    }

    async fn scrape_chapters(
        &self,
        links: &[ChapterLink],
        ctx: &mut RunContext,
        cancel: &CancellationToken,
    ) {
        tracing::info!(chapters = links.len(), "scraping chapters");
        for (idx, link) in links.iter().enumerate() {
            let chapter_number = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            match self.attempt(&link.url, chapter_number, cancel).await {
                Attempt::Cancelled => {
                    ctx.cancelled = true;
                    break;
                }
                Attempt::Extracted(record)
                    if record.content_length() < self.options.min_chapter_chars =>
                {
                    tracing::info!(
                        chapter = chapter_number,
                        chars = record.content_length(),
                        "skipping chapter (too short)"
                    );
                    ctx.skipped += 1;
                }
                Attempt::Extracted(record) => ctx.chapters.push(record),
                Attempt::Failed(record) => {
                    tracing::warn!(
                        chapter = chapter_number,
                        url = %link.url,
                        error = record.error().unwrap_or_default(),
                        "chapter failed"
                    );
                    ctx.failed += 1;
                    ctx.chapters.push(record);
                }
            }

            if (idx + 1) % PROGRESS_EVERY == 0 {
                tracing::info!(
                    accepted = ctx.chapters.len(),
                    total = links.len(),
                    "scrape progress"
                );
            }

            let has_next = idx + 1 < links.len();
            if has_next && !self.pace(cancel).await {
                ctx.cancelled = true;
                break;
            }
        }
    }

    async fn scrape_landing_as_chapter(
        &self,
        landing_url: &Url,
        ctx: &mut RunContext,
        cancel: &CancellationToken,
    ) {
        match self.attempt(landing_url, 1, cancel).await {
            Attempt::Cancelled => ctx.cancelled = true,
            Attempt::Extracted(record)
                if record.content_length() >= self.options.min_fallback_chars =>
            {
                ctx.chapters.push(record);
            }
            Attempt::Extracted(record) => {
                tracing::info!(
                    chars = record.content_length(),
                    "landing page content too short"
                );
                ctx.skipped += 1;
            }
            Attempt::Failed(record) => {
                tracing::warn!(
                    error = record.error().unwrap_or_default(),
                    "landing page chapter failed"
                );
                ctx.failed += 1;
            }
        }
    }

    async fn attempt(&self, url: &Url, chapter_number: u32, cancel: &CancellationToken) -> Attempt {
        tracing::debug!(chapter = chapter_number, %url, "fetching chapter");
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Attempt::Cancelled,
            fetched = self.fetcher.fetch(url, &self.options.chapter_fetch) => fetched,
        };

        match fetched {
            Ok(page) if page.success => {
                let record = self.read_chapter(url, chapter_number, &page);
                tracing::debug!(
                    chapter = chapter_number,
                    chars = record.content_length(),
                    "chapter extracted"
                );
                Attempt::Extracted(record)
            }
            Ok(_) => Attempt::Failed(ChapterRecord::failed(
                chapter_number,
                url.as_str(),
                CHAPTER_FETCH_FAILED,
            )),
            Err(err) => Attempt::Failed(ChapterRecord::failed(
                chapter_number,
                url.as_str(),
                err.to_string(),
            )),
        }
    }

    /// The title is read before noise filtering, since heading banners are
    /// among the elements the filter removes.
    fn read_chapter(&self, url: &Url, chapter_number: u32, page: &FetchedPage) -> ChapterRecord {
        let document = Document::from(page.html.as_str());
        let title = book::heading_title(&document).unwrap_or_default();

        self.noise.filter(&document, NoiseProfile::Chapter);
        let content = self.locator.locate(&document);
        let text = self
            .extractor
            .extract_page(content.as_ref(), page.markdown.as_deref());

        ChapterRecord::extracted(chapter_number, url.as_str(), title, text)
    }

    /// Returns `false` when cancelled during the pause.
    async fn pace(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        if self.options.pacing_delay.is_zero() {
            return true;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.options.pacing_delay) => true,
        }
    }
}
