mod repository;
mod store;

pub use repository::{PreferencesRepository, BASE_THEME, DARK_MODE, FONT_SIZE_MULTIPLIER, THEME_MODE};
pub use store::{PreferenceStore, PreferenceValue, Preferences};
