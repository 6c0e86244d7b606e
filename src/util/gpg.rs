//! Wrappers around the `gpg` command line.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use zeroize::Zeroizing;

/// Captured result of one decryption call.
pub struct DecryptOutput {
    pub stdout: Zeroizing<Vec<u8>>,
    pub success: bool,
    /// Exit status plus stderr, for diagnostics. Empty on success.
    pub detail: String,
}

/// Decrypt `input` to stdout. Only a failure to start the program is an
/// `Err`; a non-zero exit still returns whatever was printed.
pub fn decrypt_to_stdout(program: &str, input: &Path) -> Result<DecryptOutput> {
    let output = Command::new(program)
        .arg("--quiet")
        .arg("--decrypt")
        .arg(input)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("run {} --decrypt", program))?;

    let stdout = Zeroizing::new(output.stdout);
    if output.status.success() {
        return Ok(DecryptOutput {
            stdout,
            success: true,
            detail: String::new(),
        });
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Ok(DecryptOutput {
        stdout,
        success: false,
        detail: format!("{}: {}", output.status, stderr.trim()),
    })
}

/// Sign a dummy payload so the agent asks for the passphrase once and
/// caches it for the decryptions that follow.
pub fn unlock(program: &str, payload: &[u8]) -> Result<()> {
    let mut child = Command::new(program)
        .arg("--armor")
        .arg("--sign")
        .arg("--output")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("run {} --sign", program))?;

    if let Some(mut stdin) = child.stdin.take() {
        // The program may exit before reading; its status decides.
        let _ = stdin.write_all(payload);
    }

    let output = child.wait_with_output().context("wait for unlock")?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!("command failed: {}: {}", output.status, stderr.trim());
}

/// First line of `<program> --version`.
pub fn version(program: &str) -> Result<String> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("run {} --version", program))?;
    if !output.status.success() {
        bail!("{} --version exited with {}", program, output.status);
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_decrypt_missing_program_is_err() {
        let res = decrypt_to_stdout("pass-export-no-such-gpg", Path::new("/tmp/x.gpg"));
        assert!(res.is_err());
    }

    #[test]
    fn test_decrypt_failure_keeps_going() {
        let out = decrypt_to_stdout("false", Path::new("/tmp/x.gpg")).unwrap();
        assert!(!out.success);
        assert!(out.stdout.is_empty());
        assert!(!out.detail.is_empty());
    }

    #[test]
    fn test_unlock_status_decides() {
        assert!(unlock("true", b"1234").is_ok());
        assert!(unlock("false", b"1234").is_err());
        assert!(unlock("pass-export-no-such-gpg", b"1234").is_err());
    }
}
