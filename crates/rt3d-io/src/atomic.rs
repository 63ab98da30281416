//! All-or-nothing file output.
//!
//! Writers render into a temporary file next to the destination and rename
//! it over the target only after everything was written, so a failed export
//! never leaves a truncated file or clobbers a previous good one.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{IoError, Result};

/// Output file that only appears at its destination on [`commit`](Self::commit)
#[derive(Debug)]
pub struct AtomicFile {
    target: PathBuf,
    temp: NamedTempFile,
}

impl AtomicFile {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let target = path.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|source| IoError::Write {
            path: target.clone(),
            source,
        })?;

        let temp = tempfile::Builder::new()
            .prefix(".rt3d-")
            .suffix(".part")
            .tempfile_in(&dir)
            .map_err(|source| IoError::Write {
                path: target.clone(),
                source,
            })?;
        Ok(Self { target, temp })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Render the file contents through a buffered writer
    pub fn write_with<F>(&mut self, render: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
    {
        let mut writer = BufWriter::new(self.temp.as_file_mut());
        render(&mut writer)
            .and_then(|()| writer.flush())
            .map_err(|source| IoError::Write {
                path: self.target.clone(),
                source,
            })
    }

    /// Move the finished file into place
    pub fn commit(self) -> Result<PathBuf> {
        let target = self.target;
        let file: File = self.temp.persist(&target).map_err(|err| IoError::Write {
            path: target.clone(),
            source: err.error,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o644))?;
        }
        #[cfg(not(unix))]
        drop(file);

        Ok(target)
    }
}

/// Write `path` in one shot through [`AtomicFile`]
pub fn write_atomic<F>(path: impl AsRef<Path>, render: F) -> Result<PathBuf>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let mut file = AtomicFile::create(path)?;
    file.write_with(render)?;
    file.commit()
}
