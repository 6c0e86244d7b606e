use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(mode);
        fs::set_permissions(path, perm)
            .with_context(|| format!("set permissions {:o} on {}", mode, path.display()))?;
    }
    Ok(())
}

/// Output file that only appears at its destination once complete.
///
/// Content goes to a private temp file next to the target; `persist`
/// renames it into place. Dropping without persisting removes it.
pub struct PrivateOutput {
    tmp: NamedTempFile,
    target: PathBuf,
}

impl PrivateOutput {
    pub fn create(target: &Path, mode: u32) -> Result<Self> {
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = tempfile::Builder::new()
            .prefix(".pass-export-")
            .tempfile_in(parent)
            .with_context(|| format!("create temp file in {}", parent.display()))?;
        set_permissions(tmp.path(), mode)?;
        Ok(Self {
            tmp,
            target: target.to_path_buf(),
        })
    }

    pub fn file(&mut self) -> &mut File {
        self.tmp.as_file_mut()
    }

    pub fn persist(self) -> Result<()> {
        self.tmp
            .as_file()
            .sync_all()
            .with_context(|| format!("sync {}", self.tmp.path().display()))?;
        self.tmp
            .persist(&self.target)
            .map_err(|err| anyhow::anyhow!("persist {}: {}", self.target.display(), err))?;
        Ok(())
    }
}
