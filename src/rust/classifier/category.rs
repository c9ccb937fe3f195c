use std::fmt;

use serde::Serialize;

/// News categories the pipeline predicts, keyed by the integer label it emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    World,
    Sports,
    Business,
    SciTech,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::World,
        Category::Sports,
        Category::Business,
        Category::SciTech,
    ];

    /// Maps a model label to a category. Labels outside 1..=4 are unclassified.
    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            1 => Some(Self::World),
            2 => Some(Self::Sports),
            3 => Some(Self::Business),
            4 => Some(Self::SciTech),
            _ => None,
        }
    }

    pub fn label(self) -> i64 {
        match self {
            Self::World => 1,
            Self::Sports => 2,
            Self::Business => 3,
            Self::SciTech => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::World => "World",
            Self::Sports => "Sports",
            Self::Business => "Business",
            Self::SciTech => "Science & Technology",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::World => "🌍",
            Self::Sports => "🏏",
            Self::Business => "📈",
            Self::SciTech => "🤖",
        }
    }

    /// Card heading, e.g. "🌍 World News".
    pub fn headline(self) -> String {
        match self {
            Self::World => format!("{} World News", self.emoji()),
            _ => format!("{} {}", self.emoji(), self.name()),
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Self::World => {
                "This article is related to international events, global politics, or world affairs."
            }
            Self::Sports => "This article is related to sports, athletics, games, or competitions.",
            Self::Business => {
                "This article is related to business, finance, markets, or economy."
            }
            Self::SciTech => {
                "This article is related to science, technology, innovation, or research."
            }
        }
    }

    /// Short guide text shown next to the form.
    pub fn examples(self) -> &'static str {
        match self {
            Self::World => "International events, politics, diplomacy",
            Self::Sports => "Games, tournaments, athletes",
            Self::Business => "Markets, companies, economy",
            Self::SciTech => "Innovation, research, gadgets",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::World => "world-card",
            Self::Sports => "sports-card",
            Self::Business => "business-card",
            Self::SciTech => "tech-card",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
