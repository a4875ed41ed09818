use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    #[default]
    Poesia,
    Extras,
    Teatro,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Poesia, Category::Extras, Category::Teatro];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Poesia => "POESIA",
            Category::Extras => "EXTRAS",
            Category::Teatro => "TEATRO",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poem {
    /// Zero on insert means a fresh id is assigned.
    pub id: i64,
    pub category: Category,
    pub title: String,
    pub teaser: String,
    pub body: String,
    pub closing: String,
    pub created_at: DateTime<Utc>,
    pub favorited_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub audio: Option<String>,
    pub video: Option<String>,
    pub extra: Option<String>,
    pub url1: Option<String>,
    pub url2: Option<String>,
    pub image: String,
}

impl Poem {
    pub fn is_favorite(&self) -> bool {
        self.favorited_at.is_some()
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// Which slice of the library a list screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PoemFilter {
    #[default]
    All,
    Category(Category),
    Favorites,
    Read,
    Search(String),
}
