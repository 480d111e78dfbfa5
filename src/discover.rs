use std::collections::HashSet;

use dom_query::{Document, Selection};
use url::Url;

use crate::formats::ChapterLink;
use crate::locate::ContentLocator;
use crate::text::visible_text;

pub const DEFAULT_SKIP_KEYWORDS: &[&str] = &[
    "login",
    "signup",
    "register",
    "category",
    "tag",
    "author",
    "search",
    "cart",
    "checkout",
    "#",
    "javascript",
];

/// Turns a noise-filtered landing page into an ordered, de-duplicated link list.
#[derive(Debug, Clone)]
pub struct LinkDiscoverer {
    locator: ContentLocator,
    skip_keywords: Vec<String>,
}

impl Default for LinkDiscoverer {
    fn default() -> Self {
        Self::new(ContentLocator::default(), DEFAULT_SKIP_KEYWORDS.iter().copied())
    }
}

impl LinkDiscoverer {
    pub fn new<S: Into<String>>(
        locator: ContentLocator,
        skip_keywords: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            locator,
            skip_keywords: skip_keywords
                .into_iter()
                .map(|keyword| keyword.into().to_lowercase())
                .collect(),
        }
    }

    /// `seen` holds resolved URLs already handed out; only first sightings
    /// are returned and recorded.
    pub fn discover(
        &self,
        document: &Document,
        landing_url: &Url,
        seen: &mut HashSet<String>,
    ) -> Vec<ChapterLink> {
        let Some(region) = self.locator.locate_or_body(document) else {
            return Vec::new();
        };

        let mut links = Vec::new();
        for node in region.select("a[href]").nodes() {
            let anchor = Selection::from(*node);
            let Some(link) = self.candidate(&anchor, landing_url) else {
                continue;
            };
            if seen.insert(link.url.to_string()) {
                links.push(link);
            }
        }

        tracing::debug!(landing = %landing_url, found = links.len(), "chapter links discovered");
        links
    }

    fn candidate(&self, anchor: &Selection, landing_url: &Url) -> Option<ChapterLink> {
        let href = anchor.attr("href")?;
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let anchor_text = visible_text(anchor);
        if anchor_text.is_empty() {
            return None;
        }

        let url = landing_url.join(href).ok()?;
        if !is_same_host(&url, landing_url) || url.as_str() == landing_url.as_str() {
            return None;
        }
        if self.is_skipped(&url) {
            return None;
        }

        Some(ChapterLink { url, anchor_text })
    }

    fn is_skipped(&self, url: &Url) -> bool {
        let lower = url.as_str().to_lowercase();
        self.skip_keywords
            .iter()
            .any(|keyword| lower.contains(keyword.as_str()))
    }
}

fn is_same_host(url: &Url, landing_url: &Url) -> bool {
    url.host_str().is_some()
        && url.host_str() == landing_url.host_str()
        && url.port() == landing_url.port()
}
