use dom_query::Selection;

const BLOCK_SELECTOR: &str = "p, div, h2, h3, h4";
const INVISIBLE_PARENTS: &[&str] = &["script", "style", "noscript", "template"];

const CONTENT_END_TERMS: &[&str] = &[
    "পরবর্তী অধ্যায়",
    "next chapter",
    "আরও পড়ুন",
    "read more",
    "লগইন",
    "login",
    "সাইন আপ",
    "sign up",
    "register",
    "রেজিস্টার",
];

const MARKDOWN_AUTH_TERMS: &[&str] = &["login", "sign up", "register", "লগইন", "সাইন আপ"];

/// Case-insensitive substring lexicon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLexicon {
    terms: Vec<String>,
}

impl Default for BoundaryLexicon {
    fn default() -> Self {
        Self::new(CONTENT_END_TERMS.iter().copied())
    }
}

impl BoundaryLexicon {
    pub fn new<S: Into<String>>(terms: impl IntoIterator<Item = S>) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|term| term.into().to_lowercase())
                .collect(),
        }
    }

    /// Terms used to drop login/signup lines from a markdown rendition.
    pub fn markdown_auth() -> Self {
        Self::new(MARKDOWN_AUTH_TERMS.iter().copied())
    }

    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.terms.iter().any(|term| lower.contains(term.as_str()))
    }
}

/// Walks block-level descendants and stops at the first content-ended marker.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    boundary: BoundaryLexicon,
    markdown_auth: BoundaryLexicon,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(BoundaryLexicon::default(), BoundaryLexicon::markdown_auth())
    }
}

impl TextExtractor {
    pub fn new(boundary: BoundaryLexicon, markdown_auth: BoundaryLexicon) -> Self {
        Self {
            boundary,
            markdown_auth,
        }
    }

    /// Nested blocks are visited individually, so a `div` wrapping two
    /// paragraphs contributes its own text and then each paragraph's again.
    pub fn extract(&self, content: &Selection) -> String {
        let mut parts: Vec<String> = Vec::new();
        for node in content.select(BLOCK_SELECTOR).nodes() {
            let text = visible_text(&Selection::from(*node));
            if text.is_empty() {
                continue;
            }
            if self.boundary.matches(&text) {
                tracing::trace!(boundary = %text, accepted = parts.len(), "content boundary reached");
                break;
            }
            parts.push(text);
        }
        parts.join("\n\n")
    }

    pub fn filter_markdown(&self, markdown: &str) -> String {
        markdown
            .split('\n')
            .filter(|line| !self.markdown_auth.matches(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Block extraction on the located region, falling back to the
    /// filtered markdown rendition when that yields nothing.
    pub fn extract_page(&self, content: Option<&Selection>, markdown: Option<&str>) -> String {
        let text = content.map(|el| self.extract(el)).unwrap_or_default();
        if !text.is_empty() {
            return text;
        }
        match markdown {
            Some(markdown) => self.filter_markdown(markdown),
            None => text,
        }
    }
}

/// Text of `el` outside script-like elements, whitespace collapsed and trimmed.
pub fn visible_text(el: &Selection) -> String {
    let mut raw = String::new();
    for root in el.nodes() {
        for node in root.descendants() {
            if !node.is_text() {
                continue;
            }
            let hidden = node
                .parent()
                .and_then(|parent| parent.node_name())
                .is_some_and(|name| {
                    INVISIBLE_PARENTS
                        .iter()
                        .any(|tag| name.eq_ignore_ascii_case(tag))
                });
            if hidden {
                continue;
            }
            raw.push_str(&node.text());
        }
    }
    collapse_whitespace(&raw)
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use dom_query::Document;

    use super::*;

    fn article(doc: &Document) -> Selection<'_> {
        doc.select("article").first()
    }

    #[test]
    fn stops_at_boundary_and_excludes_everything_after() {
        let doc = Document::from(
            r#"<html><body><article>
<p>Para A</p><p>Para B</p><p>Next Chapter →</p><p>Para C</p>
</article></body></html>"#,
        );
        let text = TextExtractor::default().extract(&article(&doc));
        assert_eq!(text, "Para A\n\nPara B");
    }

    #[test]
    fn boundary_matching_is_case_insensitive_and_multilingual() {
        let lexicon = BoundaryLexicon::default();
        assert!(lexicon.matches("READ MORE stories"));
        assert!(lexicon.matches("পরবর্তী অধ্যায় →"));
        assert!(lexicon.matches("Please Register to continue"));
        assert!(!lexicon.matches("The chapter ends here."));
    }

    #[test]
    fn headings_are_included_and_empty_blocks_skipped() {
        let doc = Document::from(
            r#"<html><body><article>
<h2>Chapter One</h2><p>   </p><h5>tiny</h5><p>It  was
 a dark night.</p>
</article></body></html>"#,
        );
        let text = TextExtractor::default().extract(&article(&doc));
        assert_eq!(text, "Chapter One\n\nIt was a dark night.");
    }

    #[test]
    fn script_text_is_not_visible() {
        let doc = Document::from(
            r#"<html><body><article><p>Shown<script>var hidden = 1;</script></p></article></body></html>"#,
        );
        let text = TextExtractor::default().extract(&article(&doc));
        assert_eq!(text, "Shown");
    }

    #[test]
    fn nested_blocks_repeat_their_text() {
        let doc = Document::from(
            r#"<html><body><article><div><p>Inner</p></div></article></body></html>"#,
        );
        let text = TextExtractor::default().extract(&article(&doc));
        assert_eq!(text, "Inner\n\nInner");
    }

    #[test]
    fn markdown_fallback_drops_auth_lines() {
        let extractor = TextExtractor::default();
        let markdown = "# Title\nStory line\n[Login](/login)\nসাইন আপ করুন\nMore story";
        let text = extractor.extract_page(None, Some(markdown));
        assert_eq!(text, "# Title\nStory line\nMore story");
    }

    #[test]
    fn markdown_fallback_used_only_when_blocks_are_empty() {
        let doc = Document::from(
            r#"<html><body><article><p>Login to read</p><p>Hidden</p></article></body></html>"#,
        );
        let extractor = TextExtractor::default();
        let content = article(&doc);
        assert_eq!(
            extractor.extract_page(Some(&content), Some("Rendered text")),
            "Rendered text"
        );
        assert_eq!(extractor.extract_page(Some(&content), None), "");
    }
}
