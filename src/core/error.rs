//! Fatal errors of an export run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Walking the store failed (permission denied, broken entry, ...).
    #[error("walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The run was cancelled before it finished.
    #[error("export cancelled")]
    Cancelled,

    /// The key could not be unlocked before the run.
    #[error("unlock decryption key: {0}")]
    Unlock(String),

    /// Serializing a record or writing to the sink failed.
    #[error("write record: {0}")]
    Write(#[from] csv::Error),

    #[error("pipeline worker panicked")]
    WorkerPanicked,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
