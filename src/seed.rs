use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::{NoticeRepository, PoemRepository, TextRepository};
use crate::error::Result;
use crate::models::{Category, Notice, PlainText, Poem};

/// Content bundle used to populate a fresh database.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub poems: Vec<PoemSeed>,
    #[serde(default)]
    pub notices: Vec<Notice>,
    #[serde(default)]
    pub texts: Vec<PlainText>,
}

#[derive(Debug, Deserialize)]
pub struct PoemSeed {
    #[serde(default)]
    pub category: Category,
    pub title: String,
    #[serde(default)]
    pub teaser: String,
    pub body: String,
    #[serde(default)]
    pub closing: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image: String,
    pub audio: Option<String>,
    pub video: Option<String>,
    pub extra: Option<String>,
    pub url1: Option<String>,
    pub url2: Option<String>,
}

impl PoemSeed {
    fn into_poem(self, now: DateTime<Utc>) -> Poem {
        Poem {
            id: 0,
            category: self.category,
            title: self.title,
            teaser: self.teaser,
            body: self.body,
            closing: self.closing,
            created_at: self.created_at.unwrap_or(now),
            favorited_at: None,
            read_at: None,
            audio: self.audio,
            video: self.video,
            extra: self.extra,
            url1: self.url1,
            url2: self.url2,
            image: self.image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub poems: usize,
    pub notices: usize,
    pub texts: usize,
}

pub fn read_seed_file(path: &Path) -> Result<SeedFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub async fn import_seed(
    seed: SeedFile,
    poems: &PoemRepository,
    notices: &NoticeRepository,
    texts: &TextRepository,
) -> Result<SeedReport> {
    let now = Utc::now();
    let report = SeedReport {
        poems: seed.poems.len(),
        notices: seed.notices.len(),
        texts: seed.texts.len(),
    };

    let new_poems = seed.poems.into_iter().map(|p| p.into_poem(now)).collect();
    poems.insert_all(new_poems).await?;

    for notice in seed.notices {
        notices.upsert_notice(notice).await?;
    }

    for text in seed.texts {
        texts.upsert_text(text).await?;
    }

    tracing::info!(
        "Imported {} poems, {} notices, {} texts",
        report.poems,
        report.notices,
        report.texts
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    const SEED: &str = r##"{
        "poems": [
            {"category": "TEATRO", "title": "Ato I", "body": "Cena ::i:um::", "created_at": "2024-05-01T10:00:00Z"},
            {"title": "Alvorada", "body": "Luz", "image": "alvorada.webp"}
        ],
        "notices": [
            {"key": "sobre", "title": "Sobre", "content": "# Catfeina"}
        ],
        "texts": [
            {"key": "privacidade", "html": "<p>Dados</p>", "speech": "Dados"}
        ]
    }"##;

    #[tokio::test]
    async fn imports_every_section() {
        let db = Database::open_in_memory().await.unwrap();
        let poems = PoemRepository::new(db.clone());
        let notices = NoticeRepository::new(db.clone());
        let texts = TextRepository::new(db);

        let seed: SeedFile = serde_json::from_str(SEED).unwrap();
        let report = import_seed(seed, &poems, &notices, &texts).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                poems: 2,
                notices: 1,
                texts: 1
            }
        );

        let all = poems.all_poems().await.unwrap();
        assert_eq!(all[0].title, "Alvorada");
        assert_eq!(all[0].category, Category::Poesia);
        assert_eq!(all[1].category, Category::Teatro);
        assert!(all.iter().all(|p| !p.is_favorite() && !p.is_read()));

        assert!(notices.notice_by_key("sobre").await.unwrap().is_some());
        assert_eq!(
            texts.text_by_key("privacidade").await.unwrap().unwrap().speech,
            "Dados"
        );
    }
}
