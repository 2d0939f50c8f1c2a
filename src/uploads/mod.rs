mod blob;
pub mod naming;
mod repository;

pub use self::blob::{BlobStore, FsBlobStore};
pub use self::repository::{SqliteUploadRepository, UploadRepository};
