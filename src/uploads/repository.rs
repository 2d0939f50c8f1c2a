// Repository pattern - upload bytes go to the blob store, metadata to SQLite
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use std::path::{Path, PathBuf};

use super::blob::{BlobStore, FsBlobStore};
use super::naming;
use crate::config::Config;
use crate::db::models::{Asset, AssetKind, SavedAsset, WriteAsset};
use crate::db::DbPool;
use crate::error::StoreResult;
use crate::sql::{MembershipCount, ParamStyle, Statement, SQLITE_MAX_PARAMS};

/// Upload operations. Writing bytes and recording metadata are separate
/// calls; the caller records metadata only after a successful save.
pub trait UploadRepository: Send + Sync {
    /// Write the upload's bytes and return where they went.
    fn save(&self, kind: AssetKind, asset: &WriteAsset) -> StoreResult<SavedAsset>;

    /// Record metadata for saved bytes, returning the stored asset.
    fn insert(&self, kind: AssetKind, user_id: i64, saved: &SavedAsset) -> StoreResult<Asset>;

    /// How many of `ids` belong to `user_id`.
    fn count_owned(&self, kind: AssetKind, ids: &[i64], user_id: i64) -> StoreResult<u64>;
}

/// SQLite implementation
pub struct SqliteUploadRepository<B = FsBlobStore> {
    pool: DbPool,
    photo_root: PathBuf,
    file_root: PathBuf,
    blobs: B,
}

impl SqliteUploadRepository<FsBlobStore> {
    pub fn new(pool: DbPool, photo_root: impl Into<PathBuf>, file_root: impl Into<PathBuf>) -> Self {
        Self::with_blob_store(pool, photo_root, file_root, FsBlobStore)
    }

    pub fn from_config(pool: DbPool, config: &Config) -> Self {
        Self::new(pool, config.photos_path(), config.files_path())
    }
}

impl<B: BlobStore> SqliteUploadRepository<B> {
    pub fn with_blob_store(
        pool: DbPool,
        photo_root: impl Into<PathBuf>,
        file_root: impl Into<PathBuf>,
        blobs: B,
    ) -> Self {
        Self {
            pool,
            photo_root: photo_root.into(),
            file_root: file_root.into(),
            blobs,
        }
    }

    fn root(&self, kind: AssetKind) -> &Path {
        match kind {
            AssetKind::Photo => &self.photo_root,
            AssetKind::File => &self.file_root,
        }
    }

    /// [`UploadRepository::save`] with an explicit clock reading.
    pub fn save_at(
        &self,
        kind: AssetKind,
        asset: &WriteAsset,
        at: DateTime<Utc>,
    ) -> StoreResult<SavedAsset> {
        let location = naming::locate(self.root(kind), &asset.name, at)?;

        self.blobs.write(&location.path, &asset.body)?;
        tracing::debug!(
            "Saved {} '{}' for user {} as {}",
            kind,
            asset.name,
            asset.user_id,
            location.path.display()
        );

        Ok(SavedAsset {
            name: location.file_name,
            url: location.path.to_string_lossy().into_owned(),
        })
    }
}

impl<B: BlobStore> UploadRepository for SqliteUploadRepository<B> {
    fn save(&self, kind: AssetKind, asset: &WriteAsset) -> StoreResult<SavedAsset> {
        self.save_at(kind, asset, Utc::now())
    }

    fn insert(&self, kind: AssetKind, user_id: i64, saved: &SavedAsset) -> StoreResult<Asset> {
        let conn = self.pool.get()?;

        let template = format!(
            "INSERT INTO {} (user_id, title, url) VALUES (?, ?, ?) RETURNING id",
            kind.table()
        );
        let id: i64 = Statement::from_template(
            &template,
            ParamStyle::Sqlite,
            vec![
                Value::from(user_id),
                Value::from(saved.name.clone()),
                Value::from(saved.url.clone()),
            ],
        )
        .query_one(&conn)?;

        Ok(saved.clone().with_id(id))
    }

    fn count_owned(&self, kind: AssetKind, ids: &[i64], user_id: i64) -> StoreResult<u64> {
        // An empty IN list can't match anything
        if ids.is_empty() {
            return Ok(0);
        }

        // Chunk counts are summed, so an id may appear in one chunk only
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let query = MembershipCount {
            table: kind.table(),
            owner_column: "user_id",
            id_column: "id",
        };
        let conn = self.pool.get()?;
        let mut total: u64 = 0;
        for stmt in query.build_chunks(ParamStyle::Sqlite, user_id, &unique, SQLITE_MAX_PARAMS) {
            let count: i64 = stmt.query_one(&conn)?;
            total += count as u64;
        }

        Ok(total)
    }
}
