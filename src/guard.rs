//! Duplicate avoidance against the remote catalog and the local output tree.
//!
//! Both checks run before a container is touched. The remote check resolves the series
//! (override table first, catalog search otherwise) and looks for the target number in
//! the declared numbers of every volume; the local check looks for the archive the
//! conversion would write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::catalog::{Catalog, SeriesCandidate};
use crate::error::Result;
use crate::path_utils::series_path_component;
use crate::volume::VolumeNumber;

/// File extension of output archives.
pub const ARCHIVE_EXTENSION: &str = "cbz";

/// Picks the catalog series matching `target` among search candidates.
///
/// A lone candidate is accepted as is; among several, only an exact name match counts.
pub fn select_series<'a>(candidates: &'a [SeriesCandidate], target: &str) -> Option<&'a SeriesCandidate> {
    match candidates {
        [] => None,
        [only] => Some(only),
        many => {
            log::debug!("Found {} matches, looking for '{}'", many.len(), target);
            many.iter().find(|candidate| candidate.name == target)
        }
    }
}

/// Resolves a series name to its catalog id.
pub async fn resolve_series_id<C: Catalog + ?Sized>(
    catalog: &C,
    overrides: &HashMap<String, String>,
    series: &str,
) -> Result<Option<String>> {
    if let Some(id) = overrides.get(series) {
        log::debug!("Using series override for '{}': {}", series, id);
        return Ok(Some(id.clone()));
    }
    let candidates = catalog.search_series(series).await?;
    Ok(select_series(&candidates, series).map(|candidate| candidate.id.clone()))
}

/// Whether the catalog already holds volume `target` of `series`.
///
/// # Errors
///
/// Catalog errors propagate; so does a volume entry whose declared number is a
/// malformed range.
pub async fn exists_in_catalog<C: Catalog + ?Sized>(
    catalog: &C,
    overrides: &HashMap<String, String>,
    series: &str,
    target: i64,
    page_size: usize,
) -> Result<bool> {
    let Some(series_id) = resolve_series_id(catalog, overrides, series).await? else {
        log::debug!("Found no matches, '{}' is not in the catalog", series);
        return Ok(false);
    };
    log::debug!("Series ID: {}", series_id);

    for entry in catalog.series_volumes(&series_id, page_size).await? {
        if entry.number.trim().is_empty() {
            log::debug!("Skipping unnumbered volume '{}'", entry.title);
            continue;
        }
        let declared = VolumeNumber::parse(&entry.number)?;
        log::debug!("Checking '{}' ({:?}) against {}", entry.title, declared, target);
        if declared.contains(target) {
            log::debug!("Found a match: {}", entry.title);
            return Ok(true);
        }
    }
    log::debug!("Looped all volumes and didn't find volume {}", target);
    Ok(false)
}

/// Where the archive of a volume is written: `root/publisher/series/Volume {index}.cbz`.
pub fn output_path(root: &Path, publisher: &str, series: &str, index: &str) -> PathBuf {
    root.join(publisher)
        .join(series_path_component(series))
        .join(format!("Volume {}.{}", index, ARCHIVE_EXTENSION))
}

/// Whether the archive at `path` already exists.
///
/// With `create_missing_directory`, a missing parent directory is created on the way;
/// the decision itself never depends on that flag.
pub async fn exists_locally(path: &Path, create_missing_directory: bool) -> Result<bool> {
    log::debug!("Checking for file/path: {:?}", path);
    if fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false) {
        return Ok(true);
    }
    if let Some(parent) = path.parent() {
        if create_missing_directory && !parent.as_os_str().is_empty() && !parent.exists() {
            log::debug!("Folder not found, creating {:?}", parent);
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(false)
}
