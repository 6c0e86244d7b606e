//! Per-entry problems that degrade a record without stopping the export.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The decryption program failed; the record carries whatever it printed.
    DecryptFailed,
    /// The metadata block did not parse; the record has no extra fields.
    MetadataInvalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDiagnostic {
    /// Entry path relative to the store root.
    pub path: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::DecryptFailed => write!(f, "decrypt failed"),
            DiagnosticKind::MetadataInvalid => write!(f, "invalid metadata"),
        }
    }
}

impl fmt::Display for EntryDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.path, self.kind, self.message)
    }
}
