use std::path::{Component, Path};

use url::Url;

use crate::error::{AppError, Result};

/// Resolve an image reference stored in the database (for example
/// `informativos/capa.webp`) to a `file://` URI under `image_dir`.
pub fn image_uri(image_dir: impl AsRef<Path>, relative: &str) -> Result<Url> {
    let relative = Path::new(relative.trim());
    if relative.as_os_str().is_empty() {
        return Err(AppError::Invalid("empty image path".into()));
    }
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(AppError::Invalid(format!(
            "image path {:?} must stay inside the image directory",
            relative
        )));
    }

    let base = image_dir.as_ref();
    let base = if base.is_absolute() {
        base.to_path_buf()
    } else {
        std::env::current_dir()?.join(base)
    };

    Url::from_file_path(base.join(relative))
        .map_err(|_| AppError::Invalid(format!("cannot build a file URI for {:?}", relative)))
}
