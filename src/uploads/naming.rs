//! Storage naming for uploads.
//!
//! An upload declared as `holiday.png` lands at
//! `<root>/ho/<md5(timestamp ++ name)>.png`: the first two characters of the
//! declared name pick a shard directory and the fingerprint keeps uploads
//! with the same declared name apart.

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};

use crate::error::AssetNameError;

const SHARD_LEN: usize = 2;

/// Final on-disk location of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file_name: String,
    pub path: PathBuf,
}

/// First two characters of the declared name.
pub fn shard_dir(name: &str) -> Result<String, AssetNameError> {
    let shard: String = name.chars().take(SHARD_LEN).collect();
    if shard.chars().count() < SHARD_LEN {
        return Err(AssetNameError::TooShort);
    }
    Ok(shard)
}

/// The part after the single `.` in the declared name.
pub fn extension(name: &str) -> Result<&str, AssetNameError> {
    let mut parts = name.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(ext), None) => Ok(ext),
        _ => Err(AssetNameError::Extension),
    }
}

/// `<hex md5 of timestamp ++ name>.<ext>`.
pub fn fingerprint_name(name: &str, at: DateTime<Utc>) -> Result<String, AssetNameError> {
    let ext = extension(name)?;
    let seed = format!("{}{}", at.to_rfc3339_opts(SecondsFormat::Nanos, true), name);
    let digest = md5::compute(seed.as_bytes());
    Ok(format!("{:x}.{}", digest, ext))
}

/// Validate `name` and work out where its bytes go under `root`.
pub fn locate(root: &Path, name: &str, at: DateTime<Utc>) -> Result<Location, AssetNameError> {
    if name.contains(|c: char| c == '/' || c == '\\') {
        return Err(AssetNameError::PathSeparator);
    }

    let shard = shard_dir(name)?;
    let file_name = fingerprint_name(name, at)?;
    let path = root.join(shard).join(&file_name);

    Ok(Location { file_name, path })
}
