use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Destination for upload bytes.
pub trait BlobStore: Send + Sync {
    /// Create `path` and write `data` to it. The handle is released before
    /// returning, whether or not the write succeeded.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

/// Writes blobs as plain files, creating shard directories on demand.
///
/// Files are opened with `create_new`; an existing file at the target path
/// is reported as `AlreadyExists` instead of being overwritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBlobStore;

impl BlobStore for FsBlobStore {
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let written = file.write_all(data).and_then(|()| file.sync_all());
        drop(file);

        if let Err(e) = written {
            tracing::warn!("Blob write to {} failed: {}", path.display(), e);
            // Don't leave a truncated blob behind
            let _ = fs::remove_file(path);
            return Err(e);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_shard_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ho").join("abc.png");

        FsBlobStore.write(&path, b"bytes").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"bytes");
    }

    #[test]
    fn write_refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ab").join("abc.txt");

        FsBlobStore.write(&path, b"first").unwrap();
        let err = FsBlobStore.write(&path, b"second").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&path).unwrap(), b"first");
    }

    #[test]
    fn write_accepts_empty_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("em").join("empty.txt");

        FsBlobStore.write(&path, b"").unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }
}
