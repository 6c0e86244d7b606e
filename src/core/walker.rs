//! Store traversal: streams the path of every encrypted entry.

use crate::constants;
use crate::core::cancel::CancelToken;
use crate::core::error::PipelineError;
use crossbeam_channel::{select, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::thread;
use walkdir::{DirEntry, WalkDir};

/// Single-value slot holding the walk's terminal outcome.
pub type ErrorSlot = Receiver<Result<(), PipelineError>>;

/// Start walking `root` on a background thread.
///
/// Paths are handed over one at a time through a rendezvous channel, so the
/// walk never runs ahead of its consumer. The channel closes when the walk
/// ends; the outcome (walk failure, cancellation, or success) is then
/// available on the returned slot.
pub fn walk_secret_files(
    root: &Path,
    cancel: &CancelToken,
) -> Result<(Receiver<PathBuf>, ErrorSlot), PipelineError> {
    let (paths_tx, paths_rx) = crossbeam_channel::bounded(0);
    let (result_tx, result_rx) = crossbeam_channel::bounded(1);
    let root = root.to_path_buf();
    let cancel = cancel.clone();

    thread::Builder::new()
        .name("pass-export-walk".to_string())
        .spawn(move || {
            let result = walk(&root, &paths_tx, &cancel);
            drop(paths_tx);
            if let Err(e) = &result {
                tracing::debug!(error = %e, "walk stopped");
            }
            let _ = result_tx.send(result);
        })?;

    Ok((paths_rx, result_rx))
}

fn walk(root: &Path, paths: &Sender<PathBuf>, cancel: &CancelToken) -> Result<(), PipelineError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry.map_err(|source| PipelineError::Walk {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source,
        })?;
        if entry.file_type().is_dir() || !is_secret_file(entry.path()) {
            continue;
        }
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        select! {
            send(paths, entry.into_path()) -> sent => {
                // Consumer hung up without cancelling; nothing left to feed.
                if sent.is_err() {
                    return Err(PipelineError::Cancelled);
                }
            }
            recv(cancel.receiver()) -> _ => return Err(PipelineError::Cancelled),
        }
    }
    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Whether `path` names an encrypted store entry.
pub fn is_secret_file(path: &Path) -> bool {
    match path.file_name().and_then(|s| s.to_str()) {
        Some(name) => {
            !name.starts_with('.')
                && name.len() > constants::SECRET_EXTENSION.len()
                && name.ends_with(constants::SECRET_EXTENSION)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Email")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join("Email/gmail.gpg"), b"x").unwrap();
        fs::write(root.join("banking.gpg"), b"x").unwrap();
        fs::write(root.join(".gpg-id"), b"ABCDEF").unwrap();
        fs::write(root.join(".git/objects/stale.gpg"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();
        dir
    }

    #[test]
    fn test_is_secret_file() {
        assert!(is_secret_file(Path::new("/s/a.gpg")));
        assert!(!is_secret_file(Path::new("/s/.gpg-id")));
        assert!(!is_secret_file(Path::new("/s/.hidden.gpg")));
        assert!(!is_secret_file(Path::new("/s/a.txt")));
        assert!(!is_secret_file(Path::new("/s/.gpg")));
    }

    #[test]
    fn test_walk_yields_only_secret_files() {
        let dir = store();
        let cancel = CancelToken::new();
        let (paths, slot) = walk_secret_files(dir.path(), &cancel).unwrap();
        let mut found: Vec<PathBuf> = paths
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        found.sort();
        assert_eq!(
            found,
            vec![PathBuf::from("Email/gmail.gpg"), PathBuf::from("banking.gpg")]
        );
        assert!(slot.recv().unwrap().is_ok());
    }

    #[test]
    fn test_walk_missing_root_is_walk_error() {
        let dir = TempDir::new().unwrap();
        let cancel = CancelToken::new();
        let (paths, slot) = walk_secret_files(&dir.path().join("nope"), &cancel).unwrap();
        assert_eq!(paths.iter().count(), 0);
        let err = slot.recv().unwrap().unwrap_err();
        assert!(matches!(err, PipelineError::Walk { .. }));
    }

    #[test]
    fn test_walk_cancelled_while_blocked() {
        let dir = store();
        let cancel = CancelToken::new();
        let (paths, slot) = walk_secret_files(dir.path(), &cancel).unwrap();
        cancel.cancel();
        let err = slot.recv().unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(paths.iter().count(), 0);
    }
}
