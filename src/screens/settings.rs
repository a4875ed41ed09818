use futures::StreamExt;
use tokio::sync::watch;

use crate::error::Result;
use crate::models::{BaseTheme, DisplaySettings, ThemeMode};
use crate::prefs::PreferencesRepository;

use super::Scope;

/// Theme and font controls. Preference reads never fail, so the state is
/// the settings themselves rather than a [`super::ScreenState`].
pub struct SettingsScreen {
    prefs: PreferencesRepository,
    settings: watch::Receiver<DisplaySettings>,
    _scope: Scope,
}

impl SettingsScreen {
    pub fn open(prefs: PreferencesRepository) -> Self {
        let (tx, rx) = watch::channel(DisplaySettings::default());
        let mut stream = prefs.display_settings();
        let mut scope = Scope::default();
        scope.spawn(async move {
            while let Some(settings) = stream.next().await {
                if tx.send(settings).is_err() {
                    break;
                }
            }
        });

        Self {
            prefs,
            settings: rx,
            _scope: scope,
        }
    }

    pub fn settings(&self) -> watch::Receiver<DisplaySettings> {
        self.settings.clone()
    }

    pub fn current(&self) -> DisplaySettings {
        *self.settings.borrow()
    }

    pub async fn set_theme_mode(&self, mode: ThemeMode) -> Result<()> {
        self.prefs.set_theme_mode(mode).await
    }

    pub async fn set_base_theme(&self, theme: BaseTheme) -> Result<()> {
        self.prefs.set_base_theme(theme).await
    }

    pub async fn toggle_dark_mode(&self) -> Result<bool> {
        self.prefs.toggle_dark_mode().await
    }

    pub async fn increase_font(&self) -> Result<f32> {
        self.prefs.step_font_scale(1).await
    }

    pub async fn decrease_font(&self) -> Result<f32> {
        self.prefs.step_font_scale(-1).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FONT_SCALE_MAX, FONT_SCALE_MIN};
    use crate::prefs::PreferenceStore;
    use std::time::Duration;
    use tokio::time::timeout;

    fn screen(dir: &tempfile::TempDir) -> SettingsScreen {
        let store = PreferenceStore::new(dir.path().join("catfeina_settings.toml"));
        SettingsScreen::open(PreferencesRepository::new(store))
    }

    async fn wait(screen: &SettingsScreen, pred: impl FnMut(&DisplaySettings) -> bool) -> DisplaySettings {
        let mut rx = screen.settings();
        let settings = *timeout(Duration::from_secs(2), rx.wait_for(pred))
            .await
            .expect("settings did not update")
            .unwrap();
        settings
    }

    #[tokio::test]
    async fn theme_changes_are_published() {
        let dir = tempfile::tempdir().unwrap();
        let screen = screen(&dir);
        assert_eq!(screen.current(), DisplaySettings::default());

        screen.set_theme_mode(ThemeMode::Light).await.unwrap();
        screen.set_base_theme(BaseTheme::Verao).await.unwrap();
        let settings = wait(&screen, |s| s.base_theme == BaseTheme::Verao).await;
        assert_eq!(settings.theme_mode, ThemeMode::Light);
    }

    #[tokio::test]
    async fn dark_mode_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let screen = screen(&dir);

        assert!(screen.toggle_dark_mode().await.unwrap());
        wait(&screen, |s| s.dark_mode).await;
        assert!(!screen.toggle_dark_mode().await.unwrap());
        wait(&screen, |s| !s.dark_mode).await;
    }

    #[tokio::test]
    async fn simultaneous_toggles_both_apply() {
        let dir = tempfile::tempdir().unwrap();
        let screen = screen(&dir);

        let (a, b) = tokio::join!(screen.toggle_dark_mode(), screen.toggle_dark_mode());
        assert_ne!(a.unwrap(), b.unwrap());
        assert!(!screen.prefs.current().await.dark_mode);
    }

    #[tokio::test]
    async fn font_steps_stay_in_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let screen = screen(&dir);

        assert_eq!(screen.increase_font().await.unwrap(), 1.1);
        for _ in 0..20 {
            screen.increase_font().await.unwrap();
        }
        assert_eq!(screen.increase_font().await.unwrap(), FONT_SCALE_MAX);
        wait(&screen, |s| s.font_scale == FONT_SCALE_MAX).await;

        for _ in 0..30 {
            screen.decrease_font().await.unwrap();
        }
        assert_eq!(screen.decrease_font().await.unwrap(), FONT_SCALE_MIN);
    }
}
