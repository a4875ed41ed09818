use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid value: {0}")]
    Invalid(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn timed_out() -> Result<()> {
        Err(anyhow::anyhow!("Timed out waiting for the content database").into())
    }

    #[test]
    fn adhoc_errors_keep_their_message() {
        let err = timed_out().unwrap_err();
        assert!(matches!(err, AppError::Other(_)));
        assert_eq!(err.to_string(), "Timed out waiting for the content database");
    }
}
