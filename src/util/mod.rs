//! Utility modules for gpg, filesystem, and logging.

pub mod fs;
pub mod gpg;
pub mod logging;
