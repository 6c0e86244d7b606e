//! CSV serialization of the record stream.

use crate::core::error::PipelineError;
use crate::models::record::CredentialRecord;
use crossbeam_channel::Receiver;
use std::io::Write;

/// Header row, in `CredentialRecord` field order.
pub const COLUMNS: &[&str] = &[
    "folder",
    "favorite",
    "type",
    "name",
    "notes",
    "fields",
    "login_uri",
    "login_username",
    "login_password",
    "login_totp",
];

/// Write the header and then one row per record until the stream closes.
/// Returns the number of rows written.
pub fn write_records<W: Write>(
    out: W,
    records: &Receiver<CredentialRecord>,
) -> Result<usize, PipelineError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(COLUMNS)?;

    let mut written = 0usize;
    for record in records.iter() {
        writer.serialize(&record)?;
        written += 1;
    }
    // Rows sit in the csv buffer, so most sink failures surface here.
    writer
        .flush()
        .map_err(|e| PipelineError::Write(e.into()))?;
    Ok(written)
}
