//! Config file model.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Store root (defaults to `~/.password-store`).
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Decryption program (defaults to `gpg`).
    #[serde(default)]
    pub gpg_program: Option<String>,

    /// Unlock the key once before decrypting (defaults to true).
    #[serde(default)]
    pub unlock: Option<bool>,

    /// Number of decryption workers (defaults to 1).
    #[serde(default)]
    pub jobs: Option<usize>,
}
