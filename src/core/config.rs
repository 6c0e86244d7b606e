//! Config file loading.

use crate::constants;
use crate::models::config::ExportConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `<config_dir>/pass-export/config.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join(constants::APP_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME)
    })
}

pub fn load(path: &Path) -> Result<ExportConfig> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ExportConfig =
        toml::from_str(&content).with_context(|| format!("parse config {}", path.display()))?;
    Ok(config)
}

/// Load the config the user asked for, or the default one if present.
///
/// An explicitly named file must load. Problems with the default file are
/// returned as a warning alongside the built-in defaults.
pub fn resolve(explicit: Option<&Path>) -> Result<(ExportConfig, Option<String>)> {
    if let Some(path) = explicit {
        return Ok((load(path)?, None));
    }
    match default_path() {
        Some(path) if path.exists() => match load(&path) {
            Ok(config) => Ok((config, None)),
            Err(e) => Ok((
                ExportConfig::default(),
                Some(format!("ignoring config: {:#}", e)),
            )),
        },
        _ => Ok((ExportConfig::default(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "store_dir = \"/srv/pass\"\ngpg_program = \"gpg2\"\nunlock = false\njobs = 4\n",
        )
        .unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.store_dir, Some(PathBuf::from("/srv/pass")));
        assert_eq!(config.gpg_program.as_deref(), Some("gpg2"));
        assert_eq!(config.unlock, Some(false));
        assert_eq!(config.jobs, Some(4));
    }

    #[test]
    fn test_load_empty_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();
        let config = load(&path).unwrap();
        assert!(config.store_dir.is_none());
        assert!(config.jobs.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "threads = 2\n").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn test_explicit_missing_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(resolve(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
