use rusqlite::{params, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{Notice, PlainText};

use super::database::{Database, Table};
use super::live::LiveStream;

/// Informational pages keyed by `chave`.
#[derive(Clone)]
pub struct NoticeRepository {
    db: Database,
}

impl NoticeRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn notice_by_key(&self, key: &str) -> Result<Option<Notice>> {
        let key = key.to_string();
        let notice = self
            .db
            .conn()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, chave, imagem, titulo, conteudo FROM informativos WHERE chave = ?1 LIMIT 1",
                )?;
                let notice = stmt.query_row(params![key], notice_from_row).optional()?;
                Ok(notice)
            })
            .await?;
        Ok(notice)
    }

    pub fn watch_notice(&self, key: impl Into<String>) -> LiveStream<Option<Notice>> {
        let repo = self.clone();
        let key = key.into();
        self.db.observe(Table::Notices, move || {
            let repo = repo.clone();
            let key = key.clone();
            async move { repo.notice_by_key(&key).await }
        })
    }

    /// Insert, or update the row that already owns `notice.key`.
    pub async fn upsert_notice(&self, notice: Notice) -> Result<()> {
        self.db
            .conn()
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO informativos (chave, imagem, titulo, conteudo)
                       VALUES (?1, ?2, ?3, ?4)
                       ON CONFLICT(chave) DO UPDATE SET
                           imagem = excluded.imagem,
                           titulo = excluded.titulo,
                           conteudo = excluded.conteudo"#,
                    params![notice.key, notice.image, notice.title, notice.content],
                )?;
                Ok(())
            })
            .await?;
        self.db.notify(Table::Notices);
        Ok(())
    }
}

/// HTML/speech text pairs keyed by `chave`.
#[derive(Clone)]
pub struct TextRepository {
    db: Database,
}

impl TextRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn text_by_key(&self, key: &str) -> Result<Option<PlainText>> {
        let key = key.to_string();
        let text = self
            .db
            .conn()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, chave, conteudo_html, conteudo_tts FROM textos WHERE chave = ?1 LIMIT 1",
                )?;
                let text = stmt.query_row(params![key], text_from_row).optional()?;
                Ok(text)
            })
            .await?;
        Ok(text)
    }

    pub fn watch_text(&self, key: impl Into<String>) -> LiveStream<Option<PlainText>> {
        let repo = self.clone();
        let key = key.into();
        self.db.observe(Table::Texts, move || {
            let repo = repo.clone();
            let key = key.clone();
            async move { repo.text_by_key(&key).await }
        })
    }

    pub async fn upsert_text(&self, text: PlainText) -> Result<()> {
        self.db
            .conn()
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO textos (chave, conteudo_html, conteudo_tts)
                       VALUES (?1, ?2, ?3)
                       ON CONFLICT(chave) DO UPDATE SET
                           conteudo_html = excluded.conteudo_html,
                           conteudo_tts = excluded.conteudo_tts"#,
                    params![text.key, text.html, text.speech],
                )?;
                Ok(())
            })
            .await?;
        self.db.notify(Table::Texts);
        Ok(())
    }
}

fn notice_from_row(row: &Row) -> rusqlite::Result<Notice> {
    Ok(Notice {
        id: row.get(0)?,
        key: row.get(1)?,
        image: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
    })
}

fn text_from_row(row: &Row) -> rusqlite::Result<PlainText> {
    Ok(PlainText {
        id: row.get(0)?,
        key: row.get(1)?,
        html: row.get(2)?,
        speech: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_test::assert_ok;

    fn privacy(content: &str) -> Notice {
        Notice {
            id: 0,
            key: "privacidade".into(),
            image: Some("informativos/privacidade.webp".into()),
            title: Some("Privacidade".into()),
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn unknown_key_is_none_for_one_shot_and_stream() {
        let db = Database::open_in_memory().await.unwrap();
        let notices = NoticeRepository::new(db.clone());
        let texts = TextRepository::new(db);

        assert!(assert_ok!(notices.notice_by_key("nada").await).is_none());
        assert!(assert_ok!(texts.text_by_key("nada").await).is_none());

        let mut stream = notices.watch_notice("nada");
        assert!(stream.next().await.unwrap().unwrap().is_none());
        let mut stream = texts.watch_text("nada");
        assert!(stream.next().await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_keeps_key_unique() {
        let db = Database::open_in_memory().await.unwrap();
        let notices = NoticeRepository::new(db);

        notices.upsert_notice(privacy("v1")).await.unwrap();
        let first = notices.notice_by_key("privacidade").await.unwrap().unwrap();

        notices.upsert_notice(privacy("v2")).await.unwrap();
        let second = notices.notice_by_key("privacidade").await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.content, "v2");
    }

    #[tokio::test]
    async fn stream_sees_later_insert() {
        let db = Database::open_in_memory().await.unwrap();
        let texts = TextRepository::new(db);
        let mut stream = texts.watch_text("termos");
        assert!(stream.next().await.unwrap().unwrap().is_none());

        texts
            .upsert_text(PlainText {
                id: 0,
                key: "termos".into(),
                html: "<p>Termos</p>".into(),
                speech: "Termos".into(),
            })
            .await
            .unwrap();

        let text = stream.next().await.unwrap().unwrap().unwrap();
        assert_eq!(text.html, "<p>Termos</p>");
        assert_eq!(text.speech, "Termos");
    }
}
