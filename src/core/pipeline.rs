//! Export orchestration: walk -> decrypt -> build -> forward.
//!
//! ```text
//!  walk thread ──paths (rendezvous)──▶ decrypt workers ──records (rendezvous)──▶ writer
//!        │                                   │
//!        └── terminal slot                   └── diagnostics (unbounded)
//! ```
//!
//! Every hand-off also waits on the shared [`CancelToken`], so a cancelled
//! run unwinds at the next channel operation. A decryption subprocess that
//! is already running is not killed; cancellation waits for it to return.

use crate::core::cancel::CancelToken;
use crate::core::decrypt::Decryptor;
use crate::core::entry;
use crate::core::error::PipelineError;
use crate::core::walker::{self, ErrorSlot};
use crate::core::writer;
use crate::models::diagnostic::{DiagnosticKind, EntryDiagnostic};
use crate::models::record::CredentialRecord;
use crossbeam_channel::{select, Receiver, Sender};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Outcome of a finished run.
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Records handed to the output stream.
    pub records: usize,
    /// Problems not already read from [`Export::diagnostics`].
    pub diagnostics: Vec<EntryDiagnostic>,
}

impl ExportSummary {
    /// Number of distinct entries with at least one diagnostic.
    pub fn degraded_entries(&self) -> usize {
        let mut paths: Vec<&str> = self.diagnostics.iter().map(|d| d.path.as_str()).collect();
        paths.sort_unstable();
        paths.dedup();
        paths.len()
    }
}

/// A running export. Drain [`Export::records`], then call [`Export::finish`].
pub struct Export {
    records: Receiver<CredentialRecord>,
    diagnostics: Receiver<EntryDiagnostic>,
    walk_result: ErrorSlot,
    workers: Vec<JoinHandle<Result<usize, PipelineError>>>,
    cancel: CancelToken,
}

impl Export {
    /// Unlock the key, then start the walk and `jobs` decryption workers.
    ///
    /// Records arrive in no particular order once more than one worker runs.
    pub fn start(
        root: &Path,
        decryptor: Arc<dyn Decryptor>,
        jobs: usize,
        cancel: &CancelToken,
    ) -> Result<Self, PipelineError> {
        decryptor.unlock()?;
        info!(root = %root.display(), "key unlocked, starting export");

        let (paths, walk_result) = walker::walk_secret_files(root, cancel)?;
        let (records_tx, records_rx) = crossbeam_channel::bounded(0);
        let (diag_tx, diag_rx) = crossbeam_channel::unbounded();

        let jobs = jobs.max(1);
        let mut workers = Vec::with_capacity(jobs);
        for idx in 0..jobs {
            let worker = Worker {
                root: root.to_path_buf(),
                decryptor: Arc::clone(&decryptor),
                paths: paths.clone(),
                records: records_tx.clone(),
                diagnostics: diag_tx.clone(),
                cancel: cancel.clone(),
            };
            let handle = thread::Builder::new()
                .name(format!("pass-export-decrypt-{}", idx))
                .spawn(move || worker.run());
            match handle {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    cancel.cancel();
                    return Err(e.into());
                }
            }
        }

        Ok(Self {
            records: records_rx,
            diagnostics: diag_rx,
            walk_result,
            workers,
            cancel: cancel.clone(),
        })
    }

    /// Stream of built records; closes once every path was processed.
    pub fn records(&self) -> &Receiver<CredentialRecord> {
        &self.records
    }

    /// Per-entry problems as they happen. Whatever is left unread when
    /// the run ends is returned by [`Export::finish`].
    pub fn diagnostics(&self) -> &Receiver<EntryDiagnostic> {
        &self.diagnostics
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for every stage and report the run's terminal error, if any.
    ///
    /// A walk failure wins over cancellation. Blocks until the workers exit,
    /// so call it after the record stream is drained or after cancelling.
    pub fn finish(self) -> Result<ExportSummary, PipelineError> {
        let mut records = 0usize;
        let mut worker_err: Option<PipelineError> = None;
        for handle in self.workers {
            match handle.join() {
                Ok(Ok(n)) => records += n,
                Ok(Err(e)) => {
                    worker_err.get_or_insert(e);
                }
                Err(_) => {
                    worker_err.get_or_insert(PipelineError::WorkerPanicked);
                }
            }
        }

        // The slot only disconnects empty if the walk thread died.
        match self.walk_result.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(PipelineError::WorkerPanicked),
        }
        if let Some(e) = worker_err {
            return Err(e);
        }

        let diagnostics: Vec<EntryDiagnostic> = self.diagnostics.try_iter().collect();
        Ok(ExportSummary {
            records,
            diagnostics,
        })
    }
}

/// Run a whole export into `out`.
///
/// A writer failure cancels the pipeline and is returned as the run's error.
pub fn run<W: Write>(
    root: &Path,
    decryptor: Arc<dyn Decryptor>,
    jobs: usize,
    cancel: &CancelToken,
    out: W,
) -> Result<ExportSummary, PipelineError> {
    let export = Export::start(root, decryptor, jobs, cancel)?;
    let written = match writer::write_records(out, export.records()) {
        Ok(n) => n,
        Err(e) => {
            export.cancel();
            if let Err(stage_err) = export.finish() {
                debug!(error = %stage_err, "pipeline stopped after write failure");
            }
            return Err(e);
        }
    };
    let summary = export.finish()?;
    debug!(written, forwarded = summary.records, "export finished");
    Ok(summary)
}

struct Worker {
    root: PathBuf,
    decryptor: Arc<dyn Decryptor>,
    paths: Receiver<PathBuf>,
    records: Sender<CredentialRecord>,
    diagnostics: Sender<EntryDiagnostic>,
    cancel: CancelToken,
}

impl Worker {
    fn run(self) -> Result<usize, PipelineError> {
        let mut forwarded = 0usize;
        loop {
            let path = select! {
                recv(self.paths) -> msg => match msg {
                    Ok(path) => path,
                    Err(_) => return Ok(forwarded),
                },
                recv(self.cancel.receiver()) -> _ => return Err(PipelineError::Cancelled),
            };

            let record = self.process(&path);

            if self.cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            select! {
                send(self.records, record) -> sent => {
                    if sent.is_err() {
                        return Err(PipelineError::Cancelled);
                    }
                }
                recv(self.cancel.receiver()) -> _ => return Err(PipelineError::Cancelled),
            }
            forwarded += 1;
        }
    }

    fn process(&self, path: &Path) -> CredentialRecord {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let label = relative.display().to_string();

        let decrypted = self.decryptor.decrypt(path);
        if let Some(reason) = decrypted.failure.as_deref() {
            self.report(&label, DiagnosticKind::DecryptFailed, reason);
        }

        let built = entry::build_record(relative, &decrypted.plaintext);
        if let Some(reason) = built.metadata_error.as_deref() {
            self.report(&label, DiagnosticKind::MetadataInvalid, reason);
        }
        built.record
    }

    fn report(&self, path: &str, kind: DiagnosticKind, message: &str) {
        warn!(entry = %path, %kind, "{}", message);
        let _ = self.diagnostics.send(EntryDiagnostic {
            path: path.to_string(),
            kind,
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decrypt::Decrypted;
    use std::fs;
    use tempfile::TempDir;

    /// Treats the "encrypted" file content as plaintext.
    struct PlainDecryptor;

    impl Decryptor for PlainDecryptor {
        fn unlock(&self) -> Result<(), PipelineError> {
            Ok(())
        }

        fn decrypt(&self, path: &Path) -> Decrypted {
            match fs::read(path) {
                Ok(bytes) => Decrypted::ok(bytes),
                Err(e) => Decrypted::failed(Vec::new(), e.to_string()),
            }
        }
    }

    struct LockedDecryptor;

    impl Decryptor for LockedDecryptor {
        fn unlock(&self) -> Result<(), PipelineError> {
            Err(PipelineError::Unlock("no pinentry".to_string()))
        }

        fn decrypt(&self, _: &Path) -> Decrypted {
            unreachable!("decrypt after failed unlock")
        }
    }

    #[test]
    fn test_start_fails_when_unlock_fails() {
        let dir = TempDir::new().unwrap();
        let cancel = CancelToken::new();
        let res = Export::start(dir.path(), Arc::new(LockedDecryptor), 1, &cancel);
        assert!(matches!(res, Err(PipelineError::Unlock(_))));
    }

    #[test]
    fn test_run_counts_records_and_diagnostics() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Web")).unwrap();
        fs::write(dir.path().join("Web/site.gpg"), "pw\nlogin: a\n").unwrap();
        fs::write(dir.path().join("note.gpg"), "pw\nfree text\n").unwrap();

        let cancel = CancelToken::new();
        let mut out = Vec::new();
        let summary = run(dir.path(), Arc::new(PlainDecryptor), 1, &cancel, &mut out).unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.diagnostics.len(), 1);
        assert_eq!(summary.diagnostics[0].path, "note.gpg");
        assert_eq!(summary.diagnostics[0].kind, DiagnosticKind::MetadataInvalid);
        assert_eq!(summary.degraded_entries(), 1);
    }

    #[test]
    fn test_diagnostics_stream_while_running() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.gpg"), "pw\nlogin: a\n").unwrap();
        fs::write(dir.path().join("bad.gpg"), "pw\nfree text\n").unwrap();

        let cancel = CancelToken::new();
        let export = Export::start(dir.path(), Arc::new(PlainDecryptor), 1, &cancel).unwrap();
        let records = export.records().iter().count();
        let streamed: Vec<EntryDiagnostic> = export.diagnostics().try_iter().collect();
        let summary = export.finish().unwrap();

        assert_eq!(records, 2);
        assert_eq!(streamed.len(), 1);
        assert_eq!(streamed[0].path, "bad.gpg");
        assert!(summary.diagnostics.is_empty());
    }

    #[test]
    fn test_writer_failure_cancels_run() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("device full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let dir = TempDir::new().unwrap();
        // Large enough to overflow the csv buffer mid-run.
        let password = "x".repeat(512);
        for i in 0..50 {
            fs::write(dir.path().join(format!("e{:02}.gpg", i)), format!("{}\n", password)).unwrap();
        }

        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let root = dir.path().to_path_buf();
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            let res = run(&root, Arc::new(PlainDecryptor), 3, &worker_cancel, Full);
            let _ = done_tx.send(res);
        });

        let res = done_rx
            .recv_timeout(std::time::Duration::from_secs(10))
            .expect("run did not return after writer failure");
        let err = res.unwrap_err();
        assert!(matches!(err, PipelineError::Write(_)), "{:?}", err);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_cancel_before_draining() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("e{}.gpg", i)), "pw\n").unwrap();
        }
        let cancel = CancelToken::new();
        let export = Export::start(dir.path(), Arc::new(PlainDecryptor), 2, &cancel).unwrap();
        cancel.cancel();
        let err = export.finish().unwrap_err();
        assert!(err.is_cancelled());
    }
}
