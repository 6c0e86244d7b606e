//! Export a `pass` password store to CSV.
//!
//! Walks the store, decrypts every `.gpg` entry through `gpg`, parses the
//! password line plus YAML-ish metadata into a credential record, and
//! streams the records into a Bitwarden-importable CSV.
//!
//! ## Modules
//! - `cli` — Command-line handlers
//! - `core` — Export pipeline (walker, entry parsing, orchestration, writer)
//! - `models` — Data structures
//! - `util` — System utilities (gpg, fs, logging)

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod util;
