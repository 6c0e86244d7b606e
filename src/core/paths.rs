//! Password store path resolution.

use crate::constants;
use anyhow::{bail, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
    pub gpg_id: PathBuf,
}

impl StorePaths {
    /// Resolve the store root from the CLI/env value, then the config file,
    /// then `~/.password-store`.
    pub fn resolve(root_arg: Option<PathBuf>, config_root: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = root_arg.or(config_root) {
            return Ok(Self::from_root(root));
        }
        match dirs::home_dir() {
            Some(home) => Ok(Self::from_root(home.join(constants::DEFAULT_STORE_DIR_NAME))),
            None => bail!(
                "cannot determine home directory; pass --password-store or set {}",
                constants::STORE_DIR_ENV
            ),
        }
    }

    pub fn from_root(root: PathBuf) -> Self {
        let gpg_id = root.join(constants::GPG_ID_FILE);
        Self { root, gpg_id }
    }
}

impl std::fmt::Display for StorePaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store@{}", self.root.display())
    }
}
