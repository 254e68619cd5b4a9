//! Resolution of the single image extension used by an image folder.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{Error, Result};
use crate::path_utils::{extension_of, sorted_file_names};

/// Suffixes that never denote page images (stylesheets, navigation, markup).
pub const NON_IMAGE_EXTENSIONS: &[&str] = &["css", "ncx", "html", "opf", "xhtml"];

/// The raster format kept when the canonical format is forced.
pub const CANONICAL_EXTENSION: &str = "png";

/// Raster formats dropped when the canonical format is forced.
pub const NON_CANONICAL_EXTENSIONS: &[&str] = &["jpeg", "gif"];

/// Determines the one image extension present in `folder`.
///
/// Extensionless files and [`NON_IMAGE_EXTENSIONS`] are ignored. With
/// `force_canonical`, the [`NON_CANONICAL_EXTENSIONS`] are ignored as well, so a folder
/// mixing `png` pages with a stray `gif` still resolves to `png`.
///
/// # Arguments
///
/// * `folder` - The detected image folder
/// * `force_canonical` - Whether to drop non-canonical raster formats first
///
/// # Returns
///
/// * `Ok(String)` - The extension, without the leading dot
/// * `Err(Error::MixedOrMissingFormat)` - Zero or several extensions remain
pub async fn resolve_extension(folder: &Path, force_canonical: bool) -> Result<String> {
    let mut extensions: BTreeSet<String> = sorted_file_names(folder)
        .await?
        .iter()
        .filter_map(|name| extension_of(Path::new(name)))
        .collect();

    extensions.retain(|ext| !NON_IMAGE_EXTENSIONS.contains(&ext.as_str()));
    if force_canonical {
        extensions.retain(|ext| !NON_CANONICAL_EXTENSIONS.contains(&ext.as_str()));
    }
    log::debug!("Extensions in {:?}: {:?}", folder, extensions);

    if extensions.len() == 1 {
        if let Some(extension) = extensions.pop_first() {
            return Ok(extension);
        }
    }
    Err(Error::MixedOrMissingFormat {
        folder: folder.to_path_buf(),
        found: extensions.into_iter().collect(),
    })
}
