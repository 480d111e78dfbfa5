//! Removal of site furniture before any text is read.
//!
//! The class/id rule is plain substring matching on the lowercased
//! attribute value, so `author-box` is removed by the `auth` keyword just
//! like `auth-modal`. Callers that need different behavior supply their own
//! [`NoiseLexicon`].

use dom_query::{Document, Selection};

const STRUCTURAL_SELECTOR: &str = "nav, footer, aside, header";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalCategory {
    Auth,
    Share,
    Social,
    Comment,
}

/// Which page a document came from; selects the keyword categories that apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseProfile {
    Landing,
    Chapter,
}

impl NoiseProfile {
    pub fn categories(self) -> &'static [RemovalCategory] {
        match self {
            Self::Landing => &[
                RemovalCategory::Auth,
                RemovalCategory::Share,
                RemovalCategory::Comment,
            ],
            Self::Chapter => &[
                RemovalCategory::Auth,
                RemovalCategory::Share,
                RemovalCategory::Social,
                RemovalCategory::Comment,
            ],
        }
    }
}

/// Keyword → category table for the class/id rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseLexicon {
    entries: Vec<(String, RemovalCategory)>,
}

impl Default for NoiseLexicon {
    fn default() -> Self {
        Self::new([
            ("login", RemovalCategory::Auth),
            ("signup", RemovalCategory::Auth),
            ("sign-up", RemovalCategory::Auth),
            ("register", RemovalCategory::Auth),
            ("auth", RemovalCategory::Auth),
            ("share", RemovalCategory::Share),
            ("social", RemovalCategory::Social),
            ("comment", RemovalCategory::Comment),
        ])
    }
}

impl NoiseLexicon {
    pub fn new<K: Into<String>>(entries: impl IntoIterator<Item = (K, RemovalCategory)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(keyword, category)| (keyword.into().to_lowercase(), category))
                .collect(),
        }
    }

    pub fn keywords_for(&self, profile: NoiseProfile) -> Vec<&str> {
        let categories = profile.categories();
        self.entries
            .iter()
            .filter(|(_, category)| categories.contains(category))
            .map(|(keyword, _)| keyword.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoiseFilter {
    lexicon: NoiseLexicon,
}

impl NoiseFilter {
    pub fn new(lexicon: NoiseLexicon) -> Self {
        Self { lexicon }
    }

    /// Images and structural chrome only; keyword matches are left in place.
    pub fn strip_structure(&self, document: &Document) {
        document.select("img").remove();
        document.select(STRUCTURAL_SELECTOR).remove();
    }

    /// Strips images, structural chrome and keyword-matched elements in place.
    pub fn filter(&self, document: &Document, profile: NoiseProfile) {
        self.strip_structure(document);

        let keywords = self.lexicon.keywords_for(profile);
        if keywords.is_empty() {
            return;
        }
        let matched: Vec<Selection> = document
            .select("[class], [id]")
            .nodes()
            .iter()
            .map(|node| Selection::from(*node))
            .filter(|el| attributes_match(el, &keywords))
            .collect();
        tracing::trace!(?profile, removed = matched.len(), "noise keyword matches");
        for el in matched {
            el.remove();
        }
    }
}

fn attributes_match(el: &Selection, keywords: &[&str]) -> bool {
    ["class", "id"].iter().any(|name| {
        el.attr(name).is_some_and(|value| {
            let value = value.to_lowercase();
            keywords.iter().any(|keyword| value.contains(keyword))
        })
    })
}
