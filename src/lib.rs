// Library exports for postwriter
// Transport layers decode requests into `db::models` types and call the
// repositories in `posts` and `uploads`.

pub mod config;
pub mod db;
pub mod error;
pub mod posts;
pub mod sql;
pub mod uploads;
