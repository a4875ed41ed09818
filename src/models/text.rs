use serde::{Deserialize, Serialize};

/// Static informational page (privacy policy, about, ...) looked up by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(default)]
    pub id: i64,
    pub key: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
}

/// Keyed text stored twice: HTML for display and a plain body for speech.
/// The two bodies are authored separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainText {
    #[serde(default)]
    pub id: i64,
    pub key: String,
    pub html: String,
    pub speech: String,
}
