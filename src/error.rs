/// Why a declared asset name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AssetNameError {
    #[error("name must be at least two characters")]
    TooShort,

    #[error("name must contain exactly one extension separator")]
    Extension,

    #[error("name must not contain path separators")]
    PathSeparator,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid asset name: {0}")]
    InvalidAssetName(#[from] AssetNameError),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Blob store error: {0}")]
    Blob(#[from] std::io::Error),
}

impl StoreError {
    /// True for input problems detected before any side effect.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::InvalidAssetName(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
