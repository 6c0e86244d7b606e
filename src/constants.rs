//! Centralized constants for store layout, external programs, and output.

/// Store directory name under the user's home when nothing else is configured.
pub const DEFAULT_STORE_DIR_NAME: &str = ".password-store";

/// Environment variable `pass` itself uses for the store location.
pub const STORE_DIR_ENV: &str = "PASSWORD_STORE_DIR";

/// Suffix of an encrypted entry file.
pub const SECRET_EXTENSION: &str = ".gpg";

/// File in the store root listing the recipient key ids.
pub const GPG_ID_FILE: &str = ".gpg-id";

/// Default decryption program.
pub const DEFAULT_GPG_PROGRAM: &str = "gpg";

/// Payload signed once to make the agent prompt for the passphrase.
pub const UNLOCK_PAYLOAD: &[u8] = b"1234";

/// Folder value for entries living directly in the store root.
pub const ROOT_FOLDER: &str = "/";

/// Metadata separator lines accepted right after the password line.
pub const METADATA_SEPARATORS: &[&str] = &["--", "---"];

/// Permission mode for the exported CSV file.
pub const EXPORT_FILE_MODE: u32 = 0o600;

/// Config file name under the per-user config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name under the per-user config directory.
pub const APP_DIR_NAME: &str = "pass-export";
