//! Cover normalization.
//!
//! Comic readers take the lexically first file of an archive as its cover. This module
//! makes sure a `cover.<ext>` file exists and sorts first, renaming the pages when it
//! would not, and drops the cover again when it is byte-identical to the first page.

use std::path::Path;

use sha2::{Digest, Sha512};
use tokio::fs;

use crate::error::{Error, Result};
use crate::path_utils::sorted_file_names;
use crate::types::CoverOutcome;

/// Base name of the canonical cover file.
pub const COVER_STEM: &str = "cover";
/// Base name of the alternative cover some producers ship inside the image folder.
pub const PAGE_COVER_STEM: &str = "page_cover";
/// Prefixes tried, in order, when pages must be renamed to sort after the cover.
pub const RENAME_PREFIXES: &[&str] = &["page", "image", "img"];

/// Normalizes the cover of an image folder.
///
/// Cover resolution order: `cover.<ext>` in the folder, `cover.<ext>` copied from the
/// backup folder (usually the parent), `page_cover.<ext>` renamed to `cover.<ext>`, and
/// finally the first page itself. Pages are then renamed if the cover does not sort before them, and
/// the cover is deleted when its content equals the first page.
///
/// # Arguments
///
/// * `folder` - The detected image folder
/// * `extension` - The resolved image extension, without the leading dot
/// * `backup_folder` - Folder searched for a cover when `folder` has none
///
/// # Returns
///
/// * `Ok(CoverOutcome)` - What happened to the cover; [`CoverOutcome::Unresolved`] when the
///   folder holds no page at all
/// * `Err(Error::RenameExhausted)` - The pages could not be renamed behind the cover
pub async fn normalize_cover(
    folder: &Path,
    extension: &str,
    backup_folder: Option<&Path>,
) -> Result<CoverOutcome> {
    let cover = match resolve_cover(folder, extension, backup_folder).await? {
        Some(cover) => cover,
        None => {
            log::warn!("Unable to verify cover in {:?}, proceeding without one", folder);
            return Ok(CoverOutcome::Unresolved);
        }
    };
    log::debug!("Cover: {:?}", folder.join(&cover));

    let Some(mut first_page) = first_page(folder, extension, &cover).await? else {
        log::debug!("Cover is the only image");
        return Ok(CoverOutcome::Kept { cover });
    };
    log::debug!("First non-cover file: {}", first_page);

    let mut renamed_with = None;
    if cover > first_page {
        log::debug!("File names are non-ordered for cover, reorder needed");
        let prefix = reorder(folder, &cover).await?;
        first_page = format!("{}{}", prefix, first_page);
        renamed_with = Some(prefix);
    }

    let cover_hash = hash_file(&folder.join(&cover)).await?;
    let first_hash = hash_file(&folder.join(&first_page)).await?;
    if cover_hash == first_hash {
        log::debug!("Cover matches first page {}, removing cover", first_page);
        fs::remove_file(folder.join(&cover)).await?;
        return Ok(CoverOutcome::Deduplicated {
            removed: cover,
            renamed_with,
        });
    }

    Ok(CoverOutcome::Kept { cover })
}

/// Finds or creates the cover file, returning its name.
async fn resolve_cover(
    folder: &Path,
    extension: &str,
    backup_folder: Option<&Path>,
) -> Result<Option<String>> {
    let cover = format!("{}.{}", COVER_STEM, extension);
    let target = folder.join(&cover);
    if is_file(&target).await {
        log::debug!("Named cover found");
        return Ok(Some(cover));
    }

    if let Some(backup_folder) = backup_folder {
        let backup = backup_folder.join(&cover);
        if is_file(&backup).await {
            log::debug!("Found backup cover in {:?}, copying into place", backup_folder);
            fs::copy(&backup, &target).await?;
            return Ok(Some(cover));
        }
    }

    let page_cover = folder.join(format!("{}.{}", PAGE_COVER_STEM, extension));
    if is_file(&page_cover).await {
        log::debug!("Found {}, moving into place", PAGE_COVER_STEM);
        fs::rename(&page_cover, &target).await?;
        return Ok(Some(cover));
    }

    log::debug!("Unable to find cover, using first image as cover");
    Ok(image_files(folder, extension).await?.into_iter().next())
}

/// First image file in sorted order that is not the cover.
async fn first_page(folder: &Path, extension: &str, cover: &str) -> Result<Option<String>> {
    Ok(image_files(folder, extension)
        .await?
        .into_iter()
        .find(|name| name != cover))
}

/// Renames every non-cover file with the first prefix no page already starts with.
///
/// A prefix nobody starts with cannot collide with an existing name, and every prefix
/// sorts after the canonical cover name.
async fn reorder(folder: &Path, cover: &str) -> Result<&'static str> {
    let pages: Vec<String> = sorted_file_names(folder)
        .await?
        .into_iter()
        .filter(|name| name != cover)
        .collect();

    let prefix = RENAME_PREFIXES
        .iter()
        .copied()
        .find(|prefix| {
            !pages.iter().any(|name| name.starts_with(prefix))
                && format!("{}{}", prefix, pages.first().map_or("", String::as_str)).as_str()
                    > cover
        })
        .ok_or_else(|| Error::RenameExhausted(folder.to_path_buf()))?;
    log::debug!("Renaming {} files with prefix '{}'", pages.len(), prefix);

    for name in &pages {
        fs::rename(folder.join(name), folder.join(format!("{}{}", prefix, name))).await?;
    }
    Ok(prefix)
}

/// Image files of `folder` with the given extension, sorted.
async fn image_files(folder: &Path, extension: &str) -> Result<Vec<String>> {
    let suffix = format!(".{}", extension);
    Ok(sorted_file_names(folder)
        .await?
        .into_iter()
        .filter(|name| name.ends_with(&suffix))
        .collect())
}

/// SHA-512 of a file's content, hex encoded.
pub async fn hash_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).await?;
    let digest = hex::encode(Sha512::digest(&bytes));
    log::debug!("Hash of {:?}: {}", path, digest);
    Ok(digest)
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}
