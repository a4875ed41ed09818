use futures::stream::{BoxStream, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{
    clamp_font_scale, decode_or_default, step_font_scale, BaseTheme, DisplaySettings, ThemeMode,
    FONT_SCALE_DEFAULT,
};

use super::store::{PreferenceStore, PreferenceValue, Preferences};

pub const THEME_MODE: &str = "theme_mode";
pub const BASE_THEME: &str = "base_theme";
pub const DARK_MODE: &str = "dark_mode";
pub const FONT_SIZE_MULTIPLIER: &str = "font_size_multiplier";

/// Theme and font preferences. Reads never fail: a store that cannot be read
/// behaves like an empty one and every value takes its default.
#[derive(Clone)]
pub struct PreferencesRepository {
    store: PreferenceStore,
}

impl PreferencesRepository {
    pub fn new(store: PreferenceStore) -> Self {
        Self { store }
    }

    fn resilient(&self) -> BoxStream<'static, Preferences> {
        self.store
            .data()
            .map(|result| result.unwrap_or_else(fallback))
            .boxed()
    }

    pub fn theme_mode(&self) -> BoxStream<'static, ThemeMode> {
        self.resilient().map(|p| theme_mode_of(&p)).boxed()
    }

    pub fn base_theme(&self) -> BoxStream<'static, BaseTheme> {
        self.resilient().map(|p| base_theme_of(&p)).boxed()
    }

    pub fn dark_mode(&self) -> BoxStream<'static, bool> {
        self.resilient().map(|p| dark_mode_of(&p)).boxed()
    }

    pub fn font_scale(&self) -> BoxStream<'static, f32> {
        self.resilient().map(|p| font_scale_of(&p)).boxed()
    }

    pub fn display_settings(&self) -> BoxStream<'static, DisplaySettings> {
        self.resilient().map(|p| settings_of(&p)).boxed()
    }

    pub async fn current(&self) -> DisplaySettings {
        let prefs = self.store.load().await.unwrap_or_else(fallback);
        settings_of(&prefs)
    }

    pub async fn set_theme_mode(&self, mode: ThemeMode) -> Result<()> {
        self.write(THEME_MODE, PreferenceValue::Text(mode.as_str().to_string()))
            .await
    }

    pub async fn set_base_theme(&self, theme: BaseTheme) -> Result<()> {
        self.write(BASE_THEME, PreferenceValue::Text(theme.as_str().to_string()))
            .await
    }

    pub async fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.write(DARK_MODE, PreferenceValue::Bool(enabled)).await
    }

    /// Stores the multiplier clamped into the supported range.
    pub async fn set_font_scale(&self, scale: f32) -> Result<()> {
        let scale = clamp_font_scale(scale)
            .ok_or_else(|| AppError::Invalid(format!("font scale {scale}")))?;
        self.write(FONT_SIZE_MULTIPLIER, PreferenceValue::Float(scale as f64))
            .await
    }

    /// Flip dark mode inside one locked edit. Returns the new value.
    pub async fn toggle_dark_mode(&self) -> Result<bool> {
        let prefs = self
            .store
            .edit(|prefs| {
                let enabled = !dark_mode_of(prefs);
                prefs.set(DARK_MODE, PreferenceValue::Bool(enabled));
            })
            .await?;
        Ok(dark_mode_of(&prefs))
    }

    /// Move the font multiplier by `steps` slider positions inside one
    /// locked edit. Returns the stored value.
    pub async fn step_font_scale(&self, steps: i32) -> Result<f32> {
        let prefs = self
            .store
            .edit(move |prefs| {
                let scale = step_font_scale(font_scale_of(prefs), steps);
                prefs.set(FONT_SIZE_MULTIPLIER, PreferenceValue::Float(scale as f64));
            })
            .await?;
        Ok(font_scale_of(&prefs))
    }

    async fn write(&self, key: &'static str, value: PreferenceValue) -> Result<()> {
        tracing::debug!(key, ?value, "Updating preference");
        self.store.edit(move |prefs| prefs.set(key, value)).await?;
        Ok(())
    }
}

fn fallback(error: AppError) -> Preferences {
    tracing::warn!("Could not read preferences, using defaults: {}", error);
    Preferences::default()
}

fn theme_mode_of(prefs: &Preferences) -> ThemeMode {
    decode_or_default(THEME_MODE, prefs.get_str(THEME_MODE), ThemeMode::default()).into_inner()
}

fn base_theme_of(prefs: &Preferences) -> BaseTheme {
    decode_or_default(BASE_THEME, prefs.get_str(BASE_THEME), BaseTheme::default()).into_inner()
}

fn dark_mode_of(prefs: &Preferences) -> bool {
    prefs.get_bool(DARK_MODE).unwrap_or(false)
}

fn font_scale_of(prefs: &Preferences) -> f32 {
    prefs
        .get_float(FONT_SIZE_MULTIPLIER)
        .and_then(|v| clamp_font_scale(v as f32))
        .unwrap_or(FONT_SCALE_DEFAULT)
}

fn settings_of(prefs: &Preferences) -> DisplaySettings {
    DisplaySettings {
        theme_mode: theme_mode_of(prefs),
        base_theme: base_theme_of(prefs),
        dark_mode: dark_mode_of(prefs),
        font_scale: font_scale_of(prefs),
    }
}
