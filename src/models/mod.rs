mod decode;
mod poem;
mod text;
mod theme;

pub use decode::{decode_or_default, Decoded};
pub use poem::{Category, Poem, PoemFilter};
pub use text::{Notice, PlainText};
pub use theme::{
    clamp_font_scale, step_font_scale, BaseTheme, DisplaySettings, ThemeMode, FONT_SCALE_DEFAULT,
    FONT_SCALE_MAX, FONT_SCALE_MIN, FONT_SCALE_STEP,
};
