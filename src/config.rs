use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub uploads: UploadsConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub pool_size: u32,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UploadsConfig {
    pub photo_path: Option<PathBuf>,
    pub file_path: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: 8,
        }
    }
}

impl Config {
    /// Read `config_path` (or `<data_dir>/config.toml`) when it exists and
    /// resolve unset paths under `data_dir`.
    pub fn load(config_path: Option<&Path>, data_dir: &Path) -> anyhow::Result<Self> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        if config.database.pool_size == 0 {
            anyhow::bail!("database.pool_size must be at least 1");
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("postwriter.db"));
        }
        if config.uploads.photo_path.is_none() {
            config.uploads.photo_path = Some(data_dir.join("photos"));
        }
        if config.uploads.file_path.is_none() {
            config.uploads.file_path = Some(data_dir.join("files"));
        }

        Ok(config)
    }

    /// `~/.postwriter`, when a home directory can be determined.
    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".postwriter"))
    }

    pub fn db_path(&self) -> &Path {
        self.database
            .path
            .as_deref()
            .unwrap_or(Path::new("postwriter.db"))
    }

    pub fn photos_path(&self) -> &Path {
        self.uploads
            .photo_path
            .as_deref()
            .unwrap_or(Path::new("photos"))
    }

    pub fn files_path(&self) -> &Path {
        self.uploads
            .file_path
            .as_deref()
            .unwrap_or(Path::new("files"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.database.pool_size, 8);
        assert!(config.database.path.is_none());
        assert!(config.uploads.photo_path.is_none());
        assert!(config.uploads.file_path.is_none());
    }

    #[test]
    fn default_data_dir_is_dot_postwriter() {
        if let Some(dir) = Config::default_data_dir() {
            assert!(dir.ends_with(".postwriter"));
        }
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(None, tmp.path()).unwrap();
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.db_path(), tmp.path().join("postwriter.db"));
        assert_eq!(config.photos_path(), tmp.path().join("photos"));
        assert_eq!(config.files_path(), tmp.path().join("files"));
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[database]
path = "/srv/postwriter/main.db"
pool_size = 4

[uploads]
photo_path = "/srv/media/photos"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&config_path), tmp.path()).unwrap();
        assert_eq!(config.db_path(), Path::new("/srv/postwriter/main.db"));
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.photos_path(), Path::new("/srv/media/photos"));
        // Unset values still resolve under the data dir
        assert_eq!(config.files_path(), tmp.path().join("files"));
    }

    #[test]
    fn load_finds_config_in_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "[database]\npool_size = 2\n").unwrap();

        let config = Config::load(None, tmp.path()).unwrap();
        assert_eq!(config.database.pool_size, 2);
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "[database]\npool_size = 0\n").unwrap();

        assert!(Config::load(None, tmp.path()).is_err());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "[database\n").unwrap();

        assert!(Config::load(None, tmp.path()).is_err());
    }
}
