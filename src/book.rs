use dom_query::{Document, Selection};

use crate::text::visible_text;

const AUTHOR_MARKER_BN: &str = "লেখক";
const AUTHOR_MARKER_EN: &str = "author";
const AUTHOR_CANDIDATES: &str = "p, div, span";

/// Text of the first `h1`, else of the first `h2.entry-title`.
pub fn heading_title(document: &Document) -> Option<String> {
    ["h1", "h2.entry-title"].iter().find_map(|selector| {
        let el = document.select(selector).first();
        el.exists().then(|| visible_text(&el))
    })
}

/// Book title from a noise-filtered landing page, falling back to `<title>`.
pub fn title(document: &Document) -> String {
    heading_title(document)
        .filter(|title| !title.is_empty())
        .or_else(|| {
            let el = document.select("title").first();
            el.exists().then(|| visible_text(&el))
        })
        .unwrap_or_default()
}

fn mentions_author(text: &str) -> bool {
    text.contains(AUTHOR_MARKER_BN) || text.to_lowercase().contains(AUTHOR_MARKER_EN)
}

/// Byline of a landing page: the first innermost `p`/`div`/`span` that
/// mentions an author marker, so a wrapper holding the whole page is not
/// mistaken for it. Run this before keyword noise removal, which deletes
/// `.author` style elements.
pub fn author(document: &Document) -> Option<String> {
    let page_text = visible_text(&document.select("html"));
    if !mentions_author(&page_text) {
        return None;
    }

    for node in document.select(AUTHOR_CANDIDATES).nodes() {
        let el = Selection::from(*node);
        let text = visible_text(&el);
        if !mentions_author(&text) {
            continue;
        }
        let has_inner_candidate = el
            .select(AUTHOR_CANDIDATES)
            .nodes()
            .iter()
            .any(|inner| mentions_author(&visible_text(&Selection::from(*inner))));
        if !has_inner_candidate {
            return Some(text);
        }
    }
    None
}
