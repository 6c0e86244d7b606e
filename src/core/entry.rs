//! Turns one decrypted entry into a credential record.
//!
//! Entry layout follows the `pass` convention: the first line is the
//! password, an optional `--`/`---` separator may follow, and the rest is a
//! flat `key: value` YAML document.

use crate::constants;
use crate::models::record::{CredentialRecord, EntryKind, Fields};
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;
use std::path::{Component, Path};

/// A built record and, if the metadata block was unusable, why.
#[derive(Debug, Clone)]
pub struct BuiltEntry {
    pub record: CredentialRecord,
    pub metadata_error: Option<String>,
}

/// Build the record for the entry at `relative` (path below the store root,
/// including the `.gpg` suffix) from its decrypted content.
///
/// Never fails: unparsable metadata yields a record without extra fields.
pub fn build_record(relative: &Path, plaintext: &[u8]) -> BuiltEntry {
    let (folder, name) = split_entry_path(relative);

    let text = String::from_utf8_lossy(plaintext);
    let mut lines = text.split('\n');
    let password = lines
        .next()
        .unwrap_or_default()
        .trim_end_matches('\r')
        .to_string();
    let rest: Vec<&str> = lines.collect();
    let body = match rest.first() {
        Some(first) if constants::METADATA_SEPARATORS.contains(&first.trim_end_matches('\r')) => {
            &rest[1..]
        }
        _ => &rest[..],
    };

    let (mut fields, metadata_error) = match parse_metadata(&body.join("\n")) {
        Ok(fields) => (fields, None),
        Err(e) => (Fields::new(), Some(e)),
    };

    let username = match fields.take("login") {
        Some(login) => {
            fields.take("username");
            login
        }
        None => fields.take("username").unwrap_or_default(),
    };

    // An empty `url` counts as missing.
    let url = fields.take("url").unwrap_or_default();
    let http = fields.take("http");
    let login_uri = if url.is_empty() {
        http.unwrap_or_default()
    } else {
        url
    };

    let login_totp = fields.take("totp").unwrap_or_default();
    let kind = if login_totp.is_empty() {
        EntryKind::Login
    } else {
        EntryKind::Totp
    };

    BuiltEntry {
        record: CredentialRecord {
            folder,
            favorite: 0,
            kind,
            name,
            notes: String::new(),
            fields,
            login_uri,
            login_username: username,
            login_password: password,
            login_totp,
        },
        metadata_error,
    }
}

/// Folder and display name of an entry path relative to the store root.
pub fn split_entry_path(relative: &Path) -> (String, String) {
    let file_name = relative
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = file_name
        .strip_suffix(constants::SECRET_EXTENSION)
        .map(str::to_string)
        .unwrap_or(file_name);

    let parts: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let folder = if parts.is_empty() {
        constants::ROOT_FOLDER.to_string()
    } else {
        parts.join("/")
    };
    (folder, name)
}

fn parse_metadata(doc: &str) -> Result<Fields, String> {
    if doc.trim().is_empty() {
        return Ok(Fields::new());
    }
    let parsed: MetadataDoc = serde_yaml::from_str(doc).map_err(|e| e.to_string())?;
    Ok(parsed.0)
}

/// Flat `key: value` document decoded straight into strings, so scalars
/// keep the text the user wrote (`+49...`, `0x1F`, `1.50`). Null values
/// become empty strings and a repeated key keeps its last value.
struct MetadataDoc(Fields);

impl<'de> Deserialize<'de> for MetadataDoc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MetadataVisitor)
    }
}

struct MetadataVisitor;

impl<'de> Visitor<'de> for MetadataVisitor {
    type Value = MetadataDoc;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a flat key-value mapping")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(MetadataDoc(Fields::new()))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut fields = Fields::new();
        while let Some((key, value)) = map.next_entry::<String, Option<String>>()? {
            fields.insert(key, value.unwrap_or_default());
        }
        Ok(MetadataDoc(fields))
    }
}
