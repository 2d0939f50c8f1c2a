mod repository;

pub use self::repository::{PostRepository, SqlitePostRepository};
