use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const FONT_SCALE_MIN: f32 = 0.4;
pub const FONT_SCALE_MAX: f32 = 2.0;
pub const FONT_SCALE_STEP: f32 = 0.1;
pub const FONT_SCALE_DEFAULT: f32 = 1.0;

/// Light/dark behaviour selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::System => "SYSTEM",
            ThemeMode::Light => "LIGHT",
            ThemeMode::Dark => "DARK",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SYSTEM" => Ok(ThemeMode::System),
            "LIGHT" => Ok(ThemeMode::Light),
            "DARK" => Ok(ThemeMode::Dark),
            _ => Err(()),
        }
    }
}

/// Colour palette the app is painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BaseTheme {
    #[default]
    Primavera,
    Verao,
}

impl BaseTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseTheme::Primavera => "PRIMAVERA",
            BaseTheme::Verao => "VERAO",
        }
    }
}

impl fmt::Display for BaseTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseTheme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIMAVERA" => Ok(BaseTheme::Primavera),
            "VERAO" => Ok(BaseTheme::Verao),
            _ => Err(()),
        }
    }
}

/// Everything the renderer needs to know about the user's display choices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub theme_mode: ThemeMode,
    pub base_theme: BaseTheme,
    pub dark_mode: bool,
    pub font_scale: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            theme_mode: ThemeMode::default(),
            base_theme: BaseTheme::default(),
            dark_mode: false,
            font_scale: FONT_SCALE_DEFAULT,
        }
    }
}

/// Clamp a font multiplier into the supported range. NaN has no meaningful
/// position in the range and yields `None`.
pub fn clamp_font_scale(scale: f32) -> Option<f32> {
    if scale.is_nan() {
        return None;
    }
    Some(scale.clamp(FONT_SCALE_MIN, FONT_SCALE_MAX))
}

/// Move one slider step up or down, snapped to the nearest tenth.
pub fn step_font_scale(current: f32, steps: i32) -> f32 {
    let next = current + FONT_SCALE_STEP * steps as f32;
    let snapped = (next * 10.0).round() / 10.0;
    snapped.clamp(FONT_SCALE_MIN, FONT_SCALE_MAX)
}
