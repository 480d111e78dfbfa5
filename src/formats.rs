use serde::{Deserialize, Serialize};
use url::Url;

/// A candidate chapter found on the landing page, prior to fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterLink {
    pub url: Url,
    pub anchor_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub chapter_number: u32,
    pub url: String,
    #[serde(flatten)]
    pub outcome: ChapterOutcome,
}

/// Either the extracted text of a chapter or the reason it could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChapterOutcome {
    Extracted {
        title: String,
        content: String,
        content_length: usize,
    },
    Failed {
        error: String,
    },
}

impl ChapterRecord {
    /// `content_length` counts Unicode scalar values, not bytes.
    pub fn extracted(
        chapter_number: u32,
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let content_length = content.chars().count();
        Self {
            chapter_number,
            url: url.into(),
            outcome: ChapterOutcome::Extracted {
                title: title.into(),
                content,
                content_length,
            },
        }
    }

    pub fn failed(chapter_number: u32, url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            chapter_number,
            url: url.into(),
            outcome: ChapterOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn title(&self) -> Option<&str> {
        match &self.outcome {
            ChapterOutcome::Extracted { title, .. } => Some(title),
            ChapterOutcome::Failed { .. } => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match &self.outcome {
            ChapterOutcome::Extracted { content, .. } => Some(content),
            ChapterOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ChapterOutcome::Extracted { .. } => None,
            ChapterOutcome::Failed { error } => Some(error),
        }
    }

    /// Failed records have no content and report zero.
    pub fn content_length(&self) -> usize {
        match &self.outcome {
            ChapterOutcome::Extracted { content_length, .. } => *content_length,
            ChapterOutcome::Failed { .. } => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ChapterOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub url: String,
    pub book_details: BookDetails,
    pub total_chapters: usize,
    pub chapters: Vec<ChapterRecord>,
}

impl BookRecord {
    pub fn new(url: impl Into<String>, book_details: BookDetails, chapters: Vec<ChapterRecord>) -> Self {
        Self {
            url: url.into(),
            book_details,
            total_chapters: chapters.len(),
            chapters,
        }
    }

    /// Rebuilds a record read from disk so `total_chapters` and every
    /// `content_length` agree with the chapters actually present.
    pub fn recounted(self) -> Self {
        let chapters = self
            .chapters
            .into_iter()
            .map(|chapter| {
                let ChapterRecord {
                    chapter_number,
                    url,
                    outcome,
                } = chapter;
                match outcome {
                    ChapterOutcome::Extracted { title, content, .. } => {
                        ChapterRecord::extracted(chapter_number, url, title, content)
                    }
                    outcome @ ChapterOutcome::Failed { .. } => ChapterRecord {
                        chapter_number,
                        url,
                        outcome,
                    },
                }
            })
            .collect();
        Self::new(self.url, self.book_details, chapters)
    }
}
