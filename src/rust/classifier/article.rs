use serde::{Deserialize, Serialize};

/// Default number of description characters kept in a preview.
pub const DEFAULT_PREVIEW_CHARS: usize = 300;

/// A submitted news article. Only the description is classified; the title
/// is kept for the preview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl Article {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: description.into(),
        }
    }

    /// Sets the title. Blank titles are treated as absent.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title = if title.trim().is_empty() { None } else { Some(title) };
        self
    }

    /// Whitespace-only descriptions count as empty, so they are rejected
    /// before the pipeline is loaded rather than classified as noise.
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.description.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.description.split_whitespace().count()
    }

    /// Builds the preview shown under a result, truncating the description
    /// to `max_chars` characters.
    pub fn preview(&self, max_chars: usize) -> ArticlePreview {
        let truncated = self.char_count() > max_chars;
        let mut description: String = self.description.chars().take(max_chars).collect();
        if truncated {
            description.push_str("...");
        }
        ArticlePreview {
            title: self.title.clone(),
            description,
            truncated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticlePreview {
    pub title: Option<String>,
    pub description: String,
    pub truncated: bool,
}
