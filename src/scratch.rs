//! The scratch area containers are extracted into.
//!
//! One directory is reused for every book and removed after each one, so detection never
//! sees files of a previous book. Removal refuses to run when the directory holds the
//! running program, which only happens when the scratch path is misconfigured.

use std::fs::File;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::task::spawn_blocking;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::path_utils::get_file_name_lossy;

/// Handle on the shared extraction directory.
#[derive(Debug, Clone)]
pub struct ScratchArea {
    path: PathBuf,
}

impl ScratchArea {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extracts a zip container into the scratch directory, clearing leftovers first.
    pub async fn extract(&self, container: &Path) -> Result<()> {
        if fs::metadata(&self.path).await.is_ok() {
            log::warn!("Scratch area {:?} was not empty, cleaning it first", self.path);
            self.clean().await?;
        }
        fs::create_dir_all(&self.path).await?;

        log::debug!("Extracting {:?} into {:?}", container, self.path);
        let container = container.to_path_buf();
        let target = self.path.clone();
        spawn_blocking(move || -> Result<()> {
            let mut archive = ZipArchive::new(File::open(&container)?)?;
            archive.extract(&target)?;
            Ok(())
        })
        .await??;
        Ok(())
    }

    /// Removes the scratch directory and everything in it.
    ///
    /// # Errors
    ///
    /// * [`Error::SelfProtectionTripped`] - the directory holds the running program or an
    ///   entry with its file name
    pub async fn clean(&self) -> Result<()> {
        log::debug!("Cleaning up {:?}", self.path);
        if self.contains_running_program().await? {
            log::error!("Directory to clean up includes the running program: {:?}", self.path);
            return Err(Error::SelfProtectionTripped(self.path.clone()));
        }
        match fs::remove_dir_all(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn contains_running_program(&self) -> Result<bool> {
        let program = std::env::current_exe()?;
        let program_name = get_file_name_lossy(&program);

        if let (Ok(scratch), Ok(program)) = (
            fs::canonicalize(&self.path).await,
            fs::canonicalize(&program).await,
        ) {
            if program.starts_with(&scratch) {
                return Ok(true);
            }
        }

        let mut entries = match fs::read_dir(&self.path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy() == program_name {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
