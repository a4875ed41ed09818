use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{decode_or_default, Category, Poem};

use super::database::{Database, Table};
use super::live::LiveStream;

const POEM_COLUMNS: &str = "id, categoria, titulo, texto_base, conteudo, texto_final, data_criacao, \
     data_favoritado, data_leitura, campo_audio, campo_video, campo_extra, campo_url1, campo_url2, imagem";

/// Poems and their favorite/read marks.
#[derive(Clone)]
pub struct PoemRepository {
    db: Database,
}

impl PoemRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // Queries

    pub async fn all_poems(&self) -> Result<Vec<Poem>> {
        self.query_poems(
            format!("SELECT {POEM_COLUMNS} FROM poesias ORDER BY data_criacao DESC, id DESC"),
            Vec::new(),
        )
        .await
    }

    pub async fn poem_by_id(&self, id: i64) -> Result<Option<Poem>> {
        let poem = self
            .db
            .conn()
            .call(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {POEM_COLUMNS} FROM poesias WHERE id = ?1"))?;
                let poem = stmt.query_row(params![id], poem_from_row).optional()?;
                Ok(poem)
            })
            .await?;
        Ok(poem)
    }

    pub async fn poems_by_category(&self, category: Category) -> Result<Vec<Poem>> {
        self.query_poems(
            format!(
                "SELECT {POEM_COLUMNS} FROM poesias WHERE categoria = ?1 \
                 ORDER BY data_criacao DESC, id DESC"
            ),
            vec![category.as_str().to_string()],
        )
        .await
    }

    pub async fn favorite_poems(&self) -> Result<Vec<Poem>> {
        self.query_poems(
            format!(
                "SELECT {POEM_COLUMNS} FROM poesias WHERE data_favoritado IS NOT NULL \
                 ORDER BY data_favoritado DESC, id DESC"
            ),
            Vec::new(),
        )
        .await
    }

    pub async fn read_poems(&self) -> Result<Vec<Poem>> {
        self.query_poems(
            format!(
                "SELECT {POEM_COLUMNS} FROM poesias WHERE data_leitura IS NOT NULL \
                 ORDER BY data_leitura DESC, id DESC"
            ),
            Vec::new(),
        )
        .await
    }

    /// Case-insensitive substring match on title or body. An empty term
    /// matches every poem.
    pub async fn search_poems(&self, term: &str) -> Result<Vec<Poem>> {
        self.query_poems(
            format!(
                r"SELECT {POEM_COLUMNS} FROM poesias
                  WHERE titulo LIKE '%' || ?1 || '%' ESCAPE '\'
                     OR conteudo LIKE '%' || ?1 || '%' ESCAPE '\'
                  ORDER BY data_criacao DESC, id DESC"
            ),
            vec![escape_like(term)],
        )
        .await
    }

    async fn query_poems(&self, sql: String, args: Vec<String>) -> Result<Vec<Poem>> {
        let poems = self
            .db
            .conn()
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let poems = stmt
                    .query_map(rusqlite::params_from_iter(args.iter()), poem_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(poems)
            })
            .await?;
        Ok(poems)
    }

    // Live queries

    pub fn watch_all(&self) -> LiveStream<Vec<Poem>> {
        let repo = self.clone();
        self.db.observe(Table::Poems, move || {
            let repo = repo.clone();
            async move { repo.all_poems().await }
        })
    }

    pub fn watch_poem(&self, id: i64) -> LiveStream<Option<Poem>> {
        let repo = self.clone();
        self.db.observe(Table::Poems, move || {
            let repo = repo.clone();
            async move { repo.poem_by_id(id).await }
        })
    }

    pub fn watch_category(&self, category: Category) -> LiveStream<Vec<Poem>> {
        let repo = self.clone();
        self.db.observe(Table::Poems, move || {
            let repo = repo.clone();
            async move { repo.poems_by_category(category).await }
        })
    }

    pub fn watch_favorites(&self) -> LiveStream<Vec<Poem>> {
        let repo = self.clone();
        self.db.observe(Table::Poems, move || {
            let repo = repo.clone();
            async move { repo.favorite_poems().await }
        })
    }

    pub fn watch_read(&self) -> LiveStream<Vec<Poem>> {
        let repo = self.clone();
        self.db.observe(Table::Poems, move || {
            let repo = repo.clone();
            async move { repo.read_poems().await }
        })
    }

    pub fn watch_search(&self, term: impl Into<String>) -> LiveStream<Vec<Poem>> {
        let repo = self.clone();
        let term = term.into();
        self.db.observe(Table::Poems, move || {
            let repo = repo.clone();
            let term = term.clone();
            async move { repo.search_poems(&term).await }
        })
    }

    // Status marks

    pub async fn mark_favorite(&self, id: i64) -> Result<bool> {
        self.set_timestamp("data_favoritado", id, Some(Utc::now())).await
    }

    pub async fn unmark_favorite(&self, id: i64) -> Result<bool> {
        self.set_timestamp("data_favoritado", id, None).await
    }

    pub async fn mark_read(&self, id: i64) -> Result<bool> {
        self.set_timestamp("data_leitura", id, Some(Utc::now())).await
    }

    pub async fn unmark_read(&self, id: i64) -> Result<bool> {
        self.set_timestamp("data_leitura", id, None).await
    }

    pub async fn set_favorite(&self, id: i64, favorite: bool) -> Result<bool> {
        if favorite {
            self.mark_favorite(id).await
        } else {
            self.unmark_favorite(id).await
        }
    }

    pub async fn set_read(&self, id: i64, read: bool) -> Result<bool> {
        if read {
            self.mark_read(id).await
        } else {
            self.unmark_read(id).await
        }
    }

    /// Returns whether a poem with `id` existed.
    async fn set_timestamp(
        &self,
        column: &'static str,
        id: i64,
        at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let millis = at.map(|dt| dt.timestamp_millis());
        let updated = self
            .db
            .conn()
            .call(move |conn| {
                let updated = conn.execute(
                    &format!("UPDATE poesias SET {column} = ?1 WHERE id = ?2"),
                    params![millis, id],
                )?;
                Ok(updated)
            })
            .await?;

        if updated == 0 {
            tracing::debug!("No poem with id {} to update {}", id, column);
            return Ok(false);
        }
        self.db.notify(Table::Poems);
        Ok(true)
    }

    // Writes

    /// Insert or replace by id. An id of zero inserts a new row.
    pub async fn upsert(&self, poem: Poem) -> Result<i64> {
        let id = self
            .db
            .conn()
            .call(move |conn| {
                insert_or_replace(conn, &poem)?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        self.db.notify(Table::Poems);
        Ok(id)
    }

    pub async fn insert_all(&self, poems: Vec<Poem>) -> Result<()> {
        if poems.is_empty() {
            return Ok(());
        }
        let count = poems.len();
        self.db
            .conn()
            .call(move |conn| {
                let tx = conn.transaction()?;
                for poem in &poems {
                    insert_or_replace(&tx, poem)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        tracing::debug!("Inserted {} poems", count);
        self.db.notify(Table::Poems);
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self
            .db
            .conn()
            .call(move |conn| Ok(conn.execute("DELETE FROM poesias WHERE id = ?1", params![id])?))
            .await?;
        if deleted > 0 {
            self.db.notify(Table::Poems);
        }
        Ok(deleted > 0)
    }

    pub async fn delete_all(&self) -> Result<()> {
        self.db
            .conn()
            .call(|conn| {
                conn.execute("DELETE FROM poesias", [])?;
                Ok(())
            })
            .await?;
        self.db.notify(Table::Poems);
        Ok(())
    }
}

fn insert_or_replace(conn: &rusqlite::Connection, poem: &Poem) -> rusqlite::Result<usize> {
    conn.execute(
        r#"INSERT OR REPLACE INTO poesias (id, categoria, titulo, texto_base, conteudo, texto_final,
               data_criacao, data_favoritado, data_leitura, campo_audio, campo_video, campo_extra,
               campo_url1, campo_url2, imagem)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"#,
        params![
            (poem.id > 0).then_some(poem.id),
            poem.category.as_str(),
            poem.title,
            poem.teaser,
            poem.body,
            poem.closing,
            poem.created_at.timestamp_millis(),
            poem.favorited_at.map(|dt| dt.timestamp_millis()),
            poem.read_at.map(|dt| dt.timestamp_millis()),
            poem.audio,
            poem.video,
            poem.extra,
            poem.url1,
            poem.url2,
            poem.image,
        ],
    )
}

/// Escape LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn poem_from_row(row: &Row) -> rusqlite::Result<Poem> {
    let category: String = row.get(1)?;
    Ok(Poem {
        id: row.get(0)?,
        category: decode_or_default("categoria", Some(category.as_str()), Category::Poesia).into_inner(),
        title: row.get(2)?,
        teaser: row.get(3)?,
        body: row.get(4)?,
        closing: row.get(5)?,
        created_at: from_millis(row.get(6)?),
        favorited_at: row.get::<_, Option<i64>>(7)?.map(from_millis),
        read_at: row.get::<_, Option<i64>>(8)?.map(from_millis),
        audio: row.get(9)?,
        video: row.get(10)?,
        extra: row.get(11)?,
        url1: row.get(12)?,
        url2: row.get(13)?,
        image: row.get(14)?,
    })
}
