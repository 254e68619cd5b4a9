//! Generator module provides the archive builder interface and its implementations.
//!
//! This module contains the common interface for output archive generators and the
//! CBZ implementation used by the pipeline, plus [`build_archive`], which packages a
//! resolved image folder and its manifest.

use crate::error::{Error, Result};
use crate::path_utils::{extension_of, sorted_file_names};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

pub mod cbz;

/// Common interface for all archive generators.
///
/// The `Generator` trait defines a consistent API for generators that package
/// page images and a metadata manifest into a single output file.
#[async_trait]
pub trait Generator {
    /// Creates a new generator writing to `output_file`.
    ///
    /// # Parameters
    /// * `output_file` - Full path of the archive to create; its directory must exist
    ///
    /// # Returns
    /// * `Result<Self>` - A new generator instance or an error if creation fails
    fn new(output_file: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Adds a page, stored under its bare file name.
    ///
    /// # Parameters
    /// * `image_path` - Path to the image file to add as a page
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if failed
    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self>
    where
        Self: Sized;

    /// Adds the manifest file as a top-level entry named after the file.
    async fn add_manifest(&mut self, manifest_path: &Path) -> Result<&mut Self>
    where
        Self: Sized;

    /// Finalizes the document and writes it to the output location.
    async fn save(self) -> Result<()>;
}

/// Packages every `extension` file of `image_folder`, plus the manifest, into `output_file`.
///
/// Files with another extension are skipped. Entries are added in name order.
///
/// # Arguments
///
/// * `image_folder` - The resolved image folder
/// * `extension` - The resolved image extension, without the leading dot
/// * `manifest_path` - The written manifest file
/// * `output_file` - Archive to create
/// * `create_output_directory` - Whether a missing output directory may be created
///
/// # Returns
///
/// * `Ok(usize)` - Number of pages written
/// * `Err(Error::NotFound)` - The output directory is missing and may not be created
pub async fn build_archive<G: Generator + Send>(
    image_folder: &Path,
    extension: &str,
    manifest_path: &Path,
    output_file: &Path,
    create_output_directory: bool,
) -> Result<usize> {
    if let Some(parent) = output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        if fs::metadata(parent).await.is_err() {
            if !create_output_directory {
                return Err(Error::NotFound(format!(
                    "Output directory does not exist: {:?}",
                    parent
                )));
            }
            fs::create_dir_all(parent).await?;
        }
    }

    let mut generator = G::new(output_file)?;
    let mut pages = 0;
    for name in sorted_file_names(image_folder).await? {
        let path = image_folder.join(&name);
        if extension_of(&path).as_deref() != Some(extension) {
            continue;
        }
        generator.add_page(&path).await?;
        pages += 1;
    }
    generator.add_manifest(manifest_path).await?;
    generator.save().await?;

    log::debug!("Wrote {} pages to {:?}", pages, output_file);
    Ok(pages)
}
