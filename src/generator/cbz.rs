use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::path_utils::{get_file_name_lossy, path_to_string_lossy};
use async_trait::async_trait;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::spawn_blocking;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A generator for creating CBZ (Comic Book ZIP) files.
///
/// Pages keep their file names, so the order readers see is the order the cover
/// normalizer established. The manifest sits next to them at the top level.
pub struct Cbz {
    zip: Option<ZipWriter<File>>,
    options: SimpleFileOptions,
    has_manifest: bool,
}

impl Cbz {
    /// Maps a file read-only so its bytes can be copied into the archive.
    async fn map_file(path: &Path) -> Result<Mmap> {
        let file = fs::File::open(path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open file '{}': {}", path_to_string_lossy(path), e),
            ))
        })?;
        let file_std = file.into_std().await;

        spawn_blocking(move || unsafe { MmapOptions::new().map(&file_std) })
            .await
            .map_err(|e| Error::Other(format!("Failed to map file: {}", e)))?
            .map_err(Error::Io)
    }

    fn write_entry(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let options = self.options;
        let zip = match self.zip.as_mut() {
            Some(z) => z,
            None => {
                return Err(Error::Other("Zip writer not available".to_string()));
            }
        };
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
        Ok(())
    }

    fn entry_name(path: &Path) -> Result<String> {
        match path.file_name() {
            Some(_) => Ok(get_file_name_lossy(path)),
            None => Err(Error::InvalidPath(
                PathBuf::from(path),
                "Path has no file name".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Generator for Cbz {
    fn new(output_file: &Path) -> Result<Self> {
        let options: SimpleFileOptions = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let file = File::create(output_file)?;

        Ok(Cbz {
            zip: Some(ZipWriter::new(file)),
            options,
            has_manifest: false,
        })
    }

    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self> {
        let name = Self::entry_name(image_path)?;
        let mmap = Self::map_file(image_path).await?;
        self.write_entry(&name, &mmap[..])?;
        Ok(self)
    }

    async fn add_manifest(&mut self, manifest_path: &Path) -> Result<&mut Self> {
        if self.has_manifest {
            return Err(Error::Other("Manifest already added".to_string()));
        }
        let name = Self::entry_name(manifest_path)?;
        let bytes = fs::read(manifest_path).await?;
        self.write_entry(&name, &bytes)?;
        self.has_manifest = true;
        Ok(self)
    }

    async fn save(mut self) -> Result<()> {
        // Take ownership of the zip writer
        let zip = match self.zip.take() {
            Some(z) => z,
            None => {
                return Err(Error::Other("Zip writer not available".to_string()));
            }
        };

        // Finish writing the zip file in a blocking task
        spawn_blocking(move || match zip.finish() {
            Ok(_) => Ok(()),
            Err(e) => Err(Error::Zip(e)),
        })
        .await??;

        Ok(())
    }
}
