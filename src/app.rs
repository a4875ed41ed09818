use std::path::{Path, PathBuf};

use url::Url;

use crate::assets;
use crate::config::Config;
use crate::db::{Database, NoticeRepository, PoemRepository, TextRepository};
use crate::error::Result;
use crate::models::PoemFilter;
use crate::prefs::{PreferenceStore, PreferencesRepository};
use crate::screens::{NoticeScreen, PoemDetailScreen, PoemListScreen, SettingsScreen};
use crate::seed::{self, SeedReport};

/// Process-wide services. Every screen borrows its repositories from here.
pub struct App {
    pub poems: PoemRepository,
    pub notices: NoticeRepository,
    pub texts: TextRepository,
    pub preferences: PreferencesRepository,
    image_dir: PathBuf,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let db = match &config.asset_db_path {
            Some(asset) => Database::create_from_asset(asset, &config.db_path).await?,
            None => Database::open(&config.db_path).await?,
        };
        tracing::info!("Content database ready at {}", config.db_path);

        let store = PreferenceStore::new(&config.preferences_path);

        Ok(Self {
            poems: PoemRepository::new(db.clone()),
            notices: NoticeRepository::new(db.clone()),
            texts: TextRepository::new(db),
            preferences: PreferencesRepository::new(store),
            image_dir: PathBuf::from(&config.image_dir),
        })
    }

    pub fn poem_list(&self, filter: PoemFilter) -> PoemListScreen {
        PoemListScreen::open(&self.poems, filter)
    }

    pub fn poem_detail(&self, id: i64) -> PoemDetailScreen {
        PoemDetailScreen::open(&self.poems, &self.preferences, id)
    }

    pub fn notice(&self, key: Option<String>) -> NoticeScreen {
        NoticeScreen::open(&self.notices, key)
    }

    pub fn settings(&self) -> SettingsScreen {
        SettingsScreen::open(self.preferences.clone())
    }

    pub fn image_uri(&self, relative: &str) -> Result<Url> {
        assets::image_uri(&self.image_dir, relative)
    }

    pub async fn import_seed(&self, path: &Path) -> Result<SeedReport> {
        let seed = seed::read_seed_file(path)?;
        seed::import_seed(seed, &self.poems, &self.notices, &self.texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::ScreenState;
    use std::time::Duration;
    use tokio::time::timeout;

    fn config_in(dir: &tempfile::TempDir) -> Config {
        Config {
            db_path: dir.path().join("catfeina.db").to_string_lossy().to_string(),
            asset_db_path: None,
            preferences_path: dir
                .path()
                .join("catfeina_settings.toml")
                .to_string_lossy()
                .to_string(),
            image_dir: dir.path().join("images").to_string_lossy().to_string(),
        }
    }

    #[tokio::test]
    async fn wires_screens_to_one_database() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(&config_in(&dir)).await.unwrap();

        let seed = dir.path().join("seed.json");
        std::fs::write(
            &seed,
            r#"{"poems": [{"title": "Alvorada", "body": "Luz"}], "notices": [{"key": "sobre", "content": "Oi"}]}"#,
        )
        .unwrap();
        let report = app.import_seed(&seed).await.unwrap();
        assert_eq!(report.poems, 1);

        let list = app.poem_list(PoemFilter::All);
        let mut rx = list.state();
        let state = timeout(Duration::from_secs(2), rx.wait_for(|s| !s.is_loading()))
            .await
            .unwrap()
            .unwrap()
            .clone();
        assert_eq!(state.ready().map(Vec::len), Some(1));

        let notice = app.notice(Some("sobre".into()));
        let mut rx = notice.state();
        let state = timeout(Duration::from_secs(2), rx.wait_for(|s| !s.is_loading()))
            .await
            .unwrap()
            .unwrap()
            .clone();
        assert!(matches!(state, ScreenState::Ready(_)));
    }

    #[tokio::test]
    async fn images_resolve_under_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(&config_in(&dir)).await.unwrap();
        let uri = app.image_uri("gato.webp").unwrap();
        assert_eq!(uri.to_file_path().unwrap(), dir.path().join("images").join("gato.webp"));
    }
}
