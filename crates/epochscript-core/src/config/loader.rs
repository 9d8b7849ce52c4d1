//! Configuration file discovery and loading

use std::path::{Path, PathBuf};

use super::ParserConfig;
use crate::error::EpochError;
use crate::result::Result;

/// File names searched for, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".epochscriptrc.toml",
    "epochscript.toml",
    "epochscript.yaml",
    "epochscript.yml",
    "epochscript.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from start_path
    ///
    /// Tries each of [`CONFIG_FILE_NAMES`] in every directory from
    /// `start_path` up to the filesystem root.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| EpochError::io_error(start_path, e))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load config from an explicit path, or discover one from `start_dir`
    ///
    /// Falls back to [`ParserConfig::default`] when discovery finds nothing.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<ParserConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(EpochError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return ParserConfig::load(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => ParserConfig::load(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(ParserConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_auto_discover_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("strategies/momentum");
        fs::create_dir_all(&nested).unwrap();
        create_temp_config(temp_dir.path(), "epochscript.toml", "incremental = false\n");

        let found = ConfigLoader::auto_discover(&nested).unwrap().unwrap();
        assert!(found.ends_with("epochscript.toml"));

        let config = ConfigLoader::load(None, Some(&nested)).unwrap();
        assert!(!config.incremental);
    }

    #[test]
    fn test_dotfile_has_priority() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "epochscript.json", r#"{"maxIncrementalSize": 1}"#);
        create_temp_config(temp_dir.path(), ".epochscriptrc.toml", "maxIncrementalSize = 2\n");

        let config = ConfigLoader::load(None, Some(temp_dir.path())).unwrap();
        assert_eq!(config.max_incremental_size, 2);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Some(Path::new("nonexistent.toml")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(temp_dir.path(), "epochscript.ini", "incremental=false");
        let err = ConfigLoader::load(Some(&path), None).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }
}
