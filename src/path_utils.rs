//! Path utilities shared by the detection and packaging stages.
//!
//! Everything that turns record values into path components, or directory listings
//! into sorted file names, lives here so the stages agree on the same rules.

use std::path::{Path, PathBuf};

use tokio::fs::read_dir;

use crate::error::Result;

/// Replaces path separators in a series name so it stays a single path component.
///
/// # Arguments
///
/// * `name` - The series name as found in the record
///
/// # Returns
///
/// * `String` - The name with every `/` replaced by `_`
pub fn series_path_component(name: &str) -> String {
    name.replace('/', "_")
}

/// Gets the file name from a path with fallback to lossy conversion.
pub fn get_file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Checks if a filename starts with a dot (hidden file).
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Returns the extension of `path` without the leading dot, as written on disk.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_string())
}

/// Extracts the record id from a library container path.
///
/// Library folders are named `"<Title> (<id>)"` and hold the container file, so the id
/// is the text inside the last parenthesis of the parent folder name.
///
/// # Arguments
///
/// * `container` - Path to the container file (e.g. `Lib/Author/Title (42)/Title.epub`)
///
/// # Returns
///
/// * `Option<String>` - The id, or `None` when the parent folder does not follow the convention
pub fn book_id_from_container(container: &Path) -> Option<String> {
    let folder = container.parent()?.file_name()?.to_string_lossy().to_string();
    let (_, tail) = folder.rsplit_once(" (")?;
    let id = tail.strip_suffix(')')?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(id.to_string())
}

/// Lists the non-hidden regular files of `directory`, sorted by name.
///
/// Names compare byte-wise, which is the lexical order the cover and page rules rely on.
pub async fn sorted_file_names(directory: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = read_dir(directory).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_hidden_file(&path) || !entry.file_type().await?.is_file() {
            continue;
        }
        names.push(get_file_name_lossy(&path));
    }
    names.sort();
    Ok(names)
}

/// Recursively collects every `.epub` container under `root`, sorted by path.
pub async fn collect_containers(root: &Path) -> Result<Vec<PathBuf>> {
    let mut containers = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(directory) = pending.pop() {
        let mut entries = read_dir(&directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_hidden_file(&path) {
                continue;
            }
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if extension_of(&path).as_deref() == Some("epub") {
                containers.push(path);
            }
        }
    }

    containers.sort();
    Ok(containers)
}
