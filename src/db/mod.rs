mod database;
mod live;
mod repository;
mod schema;
mod texts;

pub use database::{Database, Table};
pub use live::{live_query, LiveStream};
pub use repository::PoemRepository;
pub use texts::{NoticeRepository, TextRepository};
