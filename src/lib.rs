pub mod app;
pub mod assets;
pub mod config;
pub mod db;
pub mod error;
pub mod markup;
pub mod models;
pub mod prefs;
pub mod screens;
pub mod seed;

pub use app::App;
pub use config::Config;
pub use error::{AppError, Result};
