use std::str::FromStr;

/// Outcome of decoding a persisted value that has a documented default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<T> {
    Stored(T),
    Default(T),
}

impl<T> Decoded<T> {
    pub fn into_inner(self) -> T {
        match self {
            Decoded::Stored(value) | Decoded::Default(value) => value,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Decoded::Default(_))
    }
}

/// Decode `raw` or fall back to `default`. A present but unparseable value is
/// logged; a missing one is not.
pub fn decode_or_default<T: FromStr>(key: &str, raw: Option<&str>, default: T) -> Decoded<T> {
    let Some(raw) = raw else {
        return Decoded::Default(default);
    };

    match raw.parse::<T>() {
        Ok(value) => Decoded::Stored(value),
        Err(_) => {
            tracing::warn!(key, value = raw, "Unrecognised stored value, using default");
            Decoded::Default(default)
        }
    }
}
