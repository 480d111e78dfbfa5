use dom_query::{Document, Selection};

pub const DEFAULT_CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".entry-content",
    ".post-content",
    ".book-content",
    "main",
    "#content",
];

/// Finds the primary content region with an ordered selector list.
///
/// The first selector that matches anything wins and its first match in
/// document order is returned. Later selectors are never consulted, even if
/// they would match a larger region.
#[derive(Debug, Clone)]
pub struct ContentLocator {
    selectors: Vec<String>,
}

impl Default for ContentLocator {
    fn default() -> Self {
        Self::new(DEFAULT_CONTENT_SELECTORS.iter().copied())
    }
}

impl ContentLocator {
    pub fn new<S: Into<String>>(selectors: impl IntoIterator<Item = S>) -> Self {
        Self {
            selectors: selectors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn locate<'a>(&self, document: &'a Document) -> Option<Selection<'a>> {
        self.selectors.iter().find_map(|selector| {
            let found = document.select(selector).first();
            if found.exists() {
                tracing::trace!(selector = %selector, "content region located");
                Some(found)
            } else {
                None
            }
        })
    }

    /// Same as [`Self::locate`], falling back to `<body>`.
    pub fn locate_or_body<'a>(&self, document: &'a Document) -> Option<Selection<'a>> {
        self.locate(document).or_else(|| {
            let body = document.select("body").first();
            body.exists().then_some(body)
        })
    }
}
