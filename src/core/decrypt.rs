//! Decryption seam between the pipeline and the external program.

use crate::constants;
use crate::core::error::PipelineError;
use crate::util::gpg;
use std::path::Path;
use zeroize::Zeroizing;

/// Plaintext of one entry, plus the reason if decryption did not succeed.
///
/// A failed decryption still carries whatever the program printed so the
/// entry is exported degraded instead of dropped.
pub struct Decrypted {
    pub plaintext: Zeroizing<Vec<u8>>,
    pub failure: Option<String>,
}

impl Decrypted {
    pub fn ok(plaintext: Vec<u8>) -> Self {
        Self {
            plaintext: Zeroizing::new(plaintext),
            failure: None,
        }
    }

    pub fn failed(partial: Vec<u8>, reason: impl Into<String>) -> Self {
        Self {
            plaintext: Zeroizing::new(partial),
            failure: Some(reason.into()),
        }
    }
}

pub trait Decryptor: Send + Sync {
    /// Called once before any entry is decrypted. Failure aborts the run.
    fn unlock(&self) -> Result<(), PipelineError>;

    /// Decrypt a single entry. Never fails the run.
    fn decrypt(&self, path: &Path) -> Decrypted;
}

/// Decrypts through the `gpg` binary.
#[derive(Debug, Clone)]
pub struct GpgDecryptor {
    program: String,
    unlock: bool,
}

impl GpgDecryptor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            unlock: true,
        }
    }

    /// Skip the up-front unlock (agent already primed, or no passphrase).
    pub fn with_unlock(mut self, unlock: bool) -> Self {
        self.unlock = unlock;
        self
    }
}

impl Decryptor for GpgDecryptor {
    fn unlock(&self) -> Result<(), PipelineError> {
        if !self.unlock {
            return Ok(());
        }
        gpg::unlock(&self.program, constants::UNLOCK_PAYLOAD)
            .map_err(|e| PipelineError::Unlock(format!("{:#}", e)))
    }

    fn decrypt(&self, path: &Path) -> Decrypted {
        match gpg::decrypt_to_stdout(&self.program, path) {
            Ok(out) if out.success => Decrypted {
                plaintext: out.stdout,
                failure: None,
            },
            Ok(out) => Decrypted {
                plaintext: out.stdout,
                failure: Some(out.detail),
            },
            Err(e) => Decrypted::failed(Vec::new(), format!("{:#}", e)),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_gpg_decryptor_missing_program_degrades() {
        let dec = GpgDecryptor::new("pass-export-no-such-gpg");
        let out = dec.decrypt(Path::new("/tmp/a.gpg"));
        assert!(out.plaintext.is_empty());
        assert!(out.failure.is_some());
    }

    #[test]
    fn test_gpg_decryptor_unlock_failure() {
        let dec = GpgDecryptor::new("false");
        let err = dec.unlock().unwrap_err();
        assert!(matches!(err, PipelineError::Unlock(_)));
    }

    #[test]
    fn test_gpg_decryptor_unlock_skipped() {
        let dec = GpgDecryptor::new("false").with_unlock(false);
        assert!(dec.unlock().is_ok());
    }
}
