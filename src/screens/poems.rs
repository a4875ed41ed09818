use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;

use crate::db::{LiveStream, PoemRepository};
use crate::error::Result;
use crate::markup::{self, ContentElement};
use crate::models::{Poem, PoemFilter, FONT_SCALE_DEFAULT};
use crate::prefs::PreferencesRepository;

use super::{publish, state_channel, Feedback, Messages, Scope, ScreenState, StateSender, UserMessage};

#[derive(Debug, Clone, Copy)]
enum Mark {
    Favorite,
    Read,
}

impl Mark {
    fn feedback(self, value: bool) -> Feedback {
        match (self, value) {
            (Mark::Favorite, true) => Feedback::Favorited,
            (Mark::Favorite, false) => Feedback::Unfavorited,
            (Mark::Read, true) => Feedback::MarkedRead,
            (Mark::Read, false) => Feedback::UnmarkedRead,
        }
    }

    fn failure(self) -> Feedback {
        match self {
            Mark::Favorite => Feedback::FavoriteFailed,
            Mark::Read => Feedback::ReadFailed,
        }
    }
}

/// Set a mark and report the outcome on `messages`. Returns whether the
/// poem existed.
async fn apply_mark(
    repo: &PoemRepository,
    messages: &Messages,
    confirm: fn(Feedback) -> UserMessage,
    id: i64,
    mark: Mark,
    value: bool,
) -> Result<bool> {
    let result = match mark {
        Mark::Favorite => repo.set_favorite(id, value).await,
        Mark::Read => repo.set_read(id, value).await,
    };
    match result {
        Ok(true) => {
            messages.send(confirm(mark.feedback(value)));
            Ok(true)
        }
        Ok(false) => {
            tracing::warn!("Poem {} disappeared before {:?} could change", id, mark);
            messages.send(UserMessage::Snackbar(mark.failure()));
            Ok(false)
        }
        Err(e) => {
            tracing::error!("Failed to update {:?} for poem {}: {}", mark, id, e);
            messages.send(UserMessage::Snackbar(mark.failure()));
            Err(e)
        }
    }
}

/// List of poems for one filter, kept current while the screen is open.
pub struct PoemListScreen {
    repo: PoemRepository,
    filter: PoemFilter,
    state: StateSender<Vec<Poem>>,
    pending_delete: watch::Sender<Option<Poem>>,
    messages: Messages,
    scope: Scope,
}

impl PoemListScreen {
    pub fn open(repo: &PoemRepository, filter: PoemFilter) -> Self {
        let mut screen = Self {
            repo: repo.clone(),
            filter,
            state: state_channel(),
            pending_delete: watch::Sender::new(None),
            messages: Messages::default(),
            scope: Scope::default(),
        };
        screen.subscribe();
        screen
    }

    fn subscribe(&mut self) {
        let stream: LiveStream<Vec<Poem>> = match &self.filter {
            PoemFilter::All => self.repo.watch_all(),
            PoemFilter::Category(category) => self.repo.watch_category(*category),
            PoemFilter::Favorites => self.repo.watch_favorites(),
            PoemFilter::Read => self.repo.watch_read(),
            PoemFilter::Search(term) => self.repo.watch_search(term.clone()),
        };
        self.scope
            .spawn(publish(stream, Arc::clone(&self.state), ScreenState::Ready));
    }

    /// Drop the current subscription and load again from scratch.
    pub fn reload(&mut self) {
        self.scope.cancel();
        self.state.send_replace(ScreenState::Loading);
        self.subscribe();
    }

    pub fn filter(&self) -> &PoemFilter {
        &self.filter
    }

    pub fn state(&self) -> watch::Receiver<ScreenState<Vec<Poem>>> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ScreenState<Vec<Poem>> {
        self.state.borrow().clone()
    }

    pub fn messages(&mut self) -> &mut Messages {
        &mut self.messages
    }

    /// Flip the favorite mark of `poem` as the list last showed it.
    pub async fn toggle_favorite(&self, poem: &Poem) -> Result<bool> {
        let value = !poem.is_favorite();
        apply_mark(&self.repo, &self.messages, UserMessage::Toast, poem.id, Mark::Favorite, value).await
    }

    pub async fn toggle_read(&self, poem: &Poem) -> Result<bool> {
        let value = !poem.is_read();
        apply_mark(&self.repo, &self.messages, UserMessage::Toast, poem.id, Mark::Read, value).await
    }

    /// Hold `poem` until the user confirms or cancels its deletion.
    pub fn request_delete(&self, poem: Poem) {
        self.pending_delete.send_replace(Some(poem));
    }

    pub fn pending_delete(&self) -> watch::Receiver<Option<Poem>> {
        self.pending_delete.subscribe()
    }

    pub fn cancel_delete(&self) {
        self.pending_delete.send_replace(None);
    }

    /// Delete the poem held by [`Self::request_delete`]. Returns `false`
    /// when nothing was pending or the poem was already gone.
    pub async fn confirm_delete(&self) -> Result<bool> {
        let Some(poem) = self.pending_delete.send_replace(None) else {
            return Ok(false);
        };
        match self.repo.delete(poem.id).await {
            Ok(true) => {
                self.messages.send(UserMessage::Toast(Feedback::Deleted));
                Ok(true)
            }
            Ok(false) => {
                tracing::warn!("Poem {} was already gone", poem.id);
                self.messages.send(UserMessage::Snackbar(Feedback::DeleteFailed));
                Ok(false)
            }
            Err(e) => {
                tracing::error!("Failed to delete poem {}: {}", poem.id, e);
                self.messages.send(UserMessage::Snackbar(Feedback::DeleteFailed));
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoemDetail {
    pub poem: Poem,
    pub elements: Vec<ContentElement>,
}

impl PoemDetail {
    fn new(poem: Poem) -> Self {
        let elements = markup::parse(&poem.body);
        Self { poem, elements }
    }
}

/// A single poem with its body parsed for display, plus the reader's font
/// multiplier.
pub struct PoemDetailScreen {
    id: i64,
    repo: PoemRepository,
    state: StateSender<PoemDetail>,
    font_scale: watch::Receiver<f32>,
    messages: Messages,
    _scope: Scope,
}

impl PoemDetailScreen {
    pub fn open(repo: &PoemRepository, prefs: &PreferencesRepository, id: i64) -> Self {
        let state = state_channel();
        let mut scope = Scope::default();
        scope.spawn(publish(repo.watch_poem(id), Arc::clone(&state), |poem| match poem {
            Some(poem) => ScreenState::Ready(PoemDetail::new(poem)),
            None => {
                tracing::warn!("Poem not found");
                ScreenState::NotFound
            }
        }));

        let (scale_tx, font_scale) = watch::channel(FONT_SCALE_DEFAULT);
        let mut scales = prefs.font_scale();
        scope.spawn(async move {
            while let Some(scale) = scales.next().await {
                scale_tx.send_replace(scale);
            }
        });

        Self {
            id,
            repo: repo.clone(),
            state,
            font_scale,
            messages: Messages::default(),
            _scope: scope,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn state(&self) -> watch::Receiver<ScreenState<PoemDetail>> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ScreenState<PoemDetail> {
        self.state.borrow().clone()
    }

    pub fn font_scale(&self) -> watch::Receiver<f32> {
        self.font_scale.clone()
    }

    pub fn messages(&mut self) -> &mut Messages {
        &mut self.messages
    }

    /// Flip the favorite mark of the loaded poem. Returns the new value, or
    /// `None` when no poem is loaded.
    pub async fn toggle_favorite(&self) -> Result<Option<bool>> {
        self.toggle(Mark::Favorite, Poem::is_favorite).await
    }

    /// Flip the read mark of the loaded poem, as [`Self::toggle_favorite`].
    pub async fn toggle_read(&self) -> Result<Option<bool>> {
        self.toggle(Mark::Read, Poem::is_read).await
    }

    async fn toggle(&self, mark: Mark, flag: fn(&Poem) -> bool) -> Result<Option<bool>> {
        let Some(current) = self.loaded(flag) else {
            tracing::warn!("No poem loaded to toggle {:?}", mark);
            return Ok(None);
        };
        let updated = apply_mark(
            &self.repo,
            &self.messages,
            UserMessage::Snackbar,
            self.id,
            mark,
            !current,
        )
        .await?;
        Ok(updated.then_some(!current))
    }

    fn loaded(&self, flag: fn(&Poem) -> bool) -> Option<bool> {
        self.state.borrow().ready().map(|detail| flag(&detail.poem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Category;
    use crate::prefs::PreferenceStore;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn poem(title: &str, category: Category, body: &str) -> Poem {
        Poem {
            id: 0,
            category,
            title: title.to_string(),
            teaser: String::new(),
            body: body.to_string(),
            closing: String::new(),
            created_at: Utc::now(),
            favorited_at: None,
            read_at: None,
            audio: None,
            video: None,
            extra: None,
            url1: None,
            url2: None,
            image: String::new(),
        }
    }

    async fn repo() -> PoemRepository {
        PoemRepository::new(Database::open_in_memory().await.unwrap())
    }

    fn prefs(dir: &tempfile::TempDir) -> PreferencesRepository {
        PreferencesRepository::new(PreferenceStore::new(dir.path().join("catfeina_settings.toml")))
    }

    async fn wait<T: Clone>(
        rx: &mut watch::Receiver<ScreenState<T>>,
        pred: impl FnMut(&ScreenState<T>) -> bool,
    ) -> ScreenState<T> {
        timeout(Duration::from_secs(2), rx.wait_for(pred))
            .await
            .expect("screen state did not settle")
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn list_follows_filter_and_updates() {
        let repo = repo().await;
        let id = repo.upsert(poem("Alvorada", Category::Poesia, "Luz")).await.unwrap();
        repo.upsert(poem("Ato I", Category::Teatro, "Cena")).await.unwrap();

        let screen = PoemListScreen::open(&repo, PoemFilter::Favorites);
        let mut rx = screen.state();
        let state = wait(&mut rx, |s| !s.is_loading()).await;
        assert_eq!(state, ScreenState::Ready(vec![]));

        repo.mark_favorite(id).await.unwrap();
        let state = wait(&mut rx, |s| s.ready().is_some_and(|p| !p.is_empty())).await;
        let poems = state.ready().unwrap();
        assert_eq!(poems.len(), 1);
        assert_eq!(poems[0].title, "Alvorada");
    }

    #[tokio::test]
    async fn list_by_category() {
        let repo = repo().await;
        repo.upsert(poem("Alvorada", Category::Poesia, "Luz")).await.unwrap();
        repo.upsert(poem("Ato I", Category::Teatro, "Cena")).await.unwrap();

        let screen = PoemListScreen::open(&repo, PoemFilter::Category(Category::Teatro));
        let mut rx = screen.state();
        let state = wait(&mut rx, |s| !s.is_loading()).await;
        let titles: Vec<_> = state.ready().unwrap().iter().map(|p| p.title.clone()).collect();
        assert_eq!(titles, vec!["Ato I"]);
    }

    #[tokio::test]
    async fn reload_recovers_from_a_failed_load() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PoemRepository::new(db.clone());
        repo.upsert(poem("Alvorada", Category::Poesia, "Luz")).await.unwrap();
        db.conn()
            .call(|conn| {
                conn.execute_batch("ALTER TABLE poesias RENAME TO poesias_fora")?;
                Ok(())
            })
            .await
            .unwrap();

        let mut screen = PoemListScreen::open(&repo, PoemFilter::All);
        let mut rx = screen.state();
        let state = wait(&mut rx, |s| !s.is_loading()).await;
        assert!(matches!(state, ScreenState::Failed(_)));

        db.conn()
            .call(|conn| {
                conn.execute_batch("ALTER TABLE poesias_fora RENAME TO poesias")?;
                Ok(())
            })
            .await
            .unwrap();
        screen.reload();
        assert!(screen.current().is_loading());

        let mut rx = screen.state();
        let state = wait(&mut rx, |s| !s.is_loading()).await;
        assert_eq!(state.ready().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn list_toggles_report_once() {
        let repo = repo().await;
        let id = repo.upsert(poem("Alvorada", Category::Poesia, "Luz")).await.unwrap();

        let mut screen = PoemListScreen::open(&repo, PoemFilter::All);
        let mut rx = screen.state();
        let state = wait(&mut rx, |s| s.ready().is_some()).await;
        let shown = state.ready().unwrap()[0].clone();

        assert!(screen.toggle_favorite(&shown).await.unwrap());
        assert_eq!(screen.messages().poll(), Some(UserMessage::Toast(Feedback::Favorited)));
        assert_eq!(screen.messages().poll(), None);
        let state = wait(&mut rx, |s| s.ready().is_some_and(|p| p[0].is_favorite())).await;

        let shown = state.ready().unwrap()[0].clone();
        screen.toggle_read(&shown).await.unwrap();
        assert_eq!(screen.messages().poll(), Some(UserMessage::Toast(Feedback::MarkedRead)));

        // A poem that no longer exists cannot be marked.
        repo.delete(id).await.unwrap();
        assert!(!screen.toggle_favorite(&shown).await.unwrap());
        assert_eq!(
            screen.messages().poll(),
            Some(UserMessage::Snackbar(Feedback::FavoriteFailed))
        );
    }

    #[tokio::test]
    async fn delete_waits_for_confirmation() {
        let repo = repo().await;
        repo.upsert(poem("Alvorada", Category::Poesia, "Luz")).await.unwrap();

        let mut screen = PoemListScreen::open(&repo, PoemFilter::All);
        let mut rx = screen.state();
        let state = wait(&mut rx, |s| s.ready().is_some()).await;
        let shown = state.ready().unwrap()[0].clone();

        screen.request_delete(shown.clone());
        assert_eq!(screen.pending_delete().borrow().as_ref().map(|p| p.id), Some(shown.id));
        screen.cancel_delete();
        assert!(screen.pending_delete().borrow().is_none());
        assert!(!screen.confirm_delete().await.unwrap());
        assert_eq!(screen.messages().poll(), None);

        screen.request_delete(shown);
        assert!(screen.confirm_delete().await.unwrap());
        assert!(screen.pending_delete().borrow().is_none());
        assert_eq!(screen.messages().poll(), Some(UserMessage::Toast(Feedback::Deleted)));
        wait(&mut rx, |s| s.ready().is_some_and(|p| p.is_empty())).await;
    }

    #[tokio::test]
    async fn detail_parses_body() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo().await;
        let id = repo
            .upsert(poem("Alvorada", Category::Poesia, "# Alvorada\n\nLuz ::b:forte::"))
            .await
            .unwrap();

        let screen = PoemDetailScreen::open(&repo, &prefs(&dir), id);
        let mut rx = screen.state();
        let state = wait(&mut rx, |s| !s.is_loading()).await;
        let detail = state.ready().unwrap();
        assert_eq!(detail.poem.id, id);
        assert_eq!(detail.elements.len(), 2);
        assert_eq!(detail.elements[1].block().unwrap().text(), "Luz forte");
    }

    #[tokio::test]
    async fn missing_poem_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo().await;
        let mut screen = PoemDetailScreen::open(&repo, &prefs(&dir), 404);
        let mut rx = screen.state();
        assert_eq!(wait(&mut rx, |s| !s.is_loading()).await, ScreenState::NotFound);

        // Nothing loaded, so toggling does nothing.
        assert_eq!(screen.toggle_favorite().await.unwrap(), None);
        assert_eq!(screen.messages().poll(), None);
    }

    #[tokio::test]
    async fn toggles_flip_status() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo().await;
        let id = repo.upsert(poem("Alvorada", Category::Poesia, "Luz")).await.unwrap();

        let mut screen = PoemDetailScreen::open(&repo, &prefs(&dir), id);
        let mut rx = screen.state();
        wait(&mut rx, |s| s.ready().is_some()).await;

        assert_eq!(screen.toggle_favorite().await.unwrap(), Some(true));
        assert_eq!(screen.messages().poll(), Some(UserMessage::Snackbar(Feedback::Favorited)));
        wait(&mut rx, |s| s.ready().is_some_and(|d| d.poem.is_favorite())).await;

        assert_eq!(screen.toggle_favorite().await.unwrap(), Some(false));
        assert_eq!(screen.messages().poll(), Some(UserMessage::Snackbar(Feedback::Unfavorited)));
        wait(&mut rx, |s| s.ready().is_some_and(|d| !d.poem.is_favorite())).await;

        assert_eq!(screen.toggle_read().await.unwrap(), Some(true));
        let state = wait(&mut rx, |s| s.ready().is_some_and(|d| d.poem.is_read())).await;
        assert!(state.ready().unwrap().poem.read_at.unwrap() <= Utc::now());
    }

    #[tokio::test]
    async fn detail_follows_font_scale() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = prefs(&dir);
        let repo = repo().await;
        let screen = PoemDetailScreen::open(&repo, &prefs, 1);
        assert_eq!(*screen.font_scale().borrow(), FONT_SCALE_DEFAULT);

        prefs.set_font_scale(1.5).await.unwrap();
        let mut scale = screen.font_scale();
        let seen = *timeout(Duration::from_secs(2), scale.wait_for(|s| *s == 1.5))
            .await
            .expect("font scale did not update")
            .unwrap();
        assert_eq!(seen, 1.5);
    }
}
