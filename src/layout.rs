//! Container layout detection.
//!
//! Extracted e-book containers put their page images in a handful of places depending on
//! the tool that produced them. Detection walks two prioritized matcher lists, one for
//! the root folder and one for the image folder inside it, and stops at the first hit.
//! The order is significant: several producers create more than one of these folders.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{Error, Result};
use crate::path_utils::sorted_file_names;
use crate::types::Layout;

/// Number of same-format images a container must hold at its top level to be treated
/// as a bare image dump.
pub const BARE_IMAGE_THRESHOLD: usize = 30;

/// Matchers for the root folder, in priority order.
#[derive(Debug, Clone, Copy)]
enum RootMatcher {
    /// A directory with this exact name.
    Folder(&'static str),
    /// The container itself, when it directly holds one of these image folders.
    SelfWithImageFolder(&'static [&'static str]),
    /// The container itself is the image folder, when it directly holds more than
    /// [`BARE_IMAGE_THRESHOLD`] files of this extension.
    BareImages(&'static str),
}

const ROOT_MATCHERS: &[RootMatcher] = &[
    RootMatcher::Folder("OEBPS"),
    RootMatcher::Folder("OPS"),
    RootMatcher::Folder("item"),
    RootMatcher::Folder("EPUB"),
    RootMatcher::SelfWithImageFolder(&["images", "image"]),
    RootMatcher::BareImages("jpg"),
    RootMatcher::BareImages("png"),
];

/// Image folder names inside the root, in priority order.
const IMAGE_FOLDERS: &[&str] = &["images", "Images", "image", "Image"];

/// Marker used for "the folder itself".
const CURRENT_FOLDER: &str = ".";

/// Finds the root and image folders of an extracted container.
///
/// # Arguments
///
/// * `container` - The directory the container was extracted into
///
/// # Returns
///
/// * `Ok(Layout)` - Folder names relative to `container` (`"."` for the container itself)
/// * `Err(Error::LayoutUnknown)` - Neither matcher list produced a hit
pub async fn detect_layout(container: &Path) -> Result<Layout> {
    let mut root = None;
    for matcher in ROOT_MATCHERS {
        match matcher {
            RootMatcher::Folder(name) => {
                if is_dir(&container.join(name)).await {
                    root = Some(name.to_string());
                }
            }
            RootMatcher::SelfWithImageFolder(names) => {
                for name in names.iter() {
                    if is_dir(&container.join(name)).await {
                        root = Some(CURRENT_FOLDER.to_string());
                        break;
                    }
                }
            }
            RootMatcher::BareImages(extension) => {
                if count_with_extension(container, extension).await? > BARE_IMAGE_THRESHOLD {
                    log::debug!("Container holds bare '{}' images", extension);
                    return Ok(Layout {
                        root: CURRENT_FOLDER.to_string(),
                        images: CURRENT_FOLDER.to_string(),
                    });
                }
            }
        }
        if root.is_some() {
            break;
        }
    }

    let Some(root) = root else {
        log::debug!("Unable to determine main-folder layout");
        return Err(Error::LayoutUnknown(container.to_path_buf()));
    };
    log::debug!("Root folder: {}", root);

    let root_path = container.join(&root);
    for name in IMAGE_FOLDERS {
        if is_dir(&root_path.join(name)).await {
            log::debug!("Image folder: {}", name);
            return Ok(Layout {
                root,
                images: name.to_string(),
            });
        }
    }

    log::debug!("Unable to determine sub-folder layout");
    Err(Error::LayoutUnknown(container.to_path_buf()))
}

impl Layout {
    /// The image folder of this layout under `container`.
    pub fn image_folder(&self, container: &Path) -> PathBuf {
        let mut path = container.to_path_buf();
        for part in [&self.root, &self.images] {
            if part != CURRENT_FOLDER {
                path.push(part);
            }
        }
        path
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn count_with_extension(folder: &Path, extension: &str) -> Result<usize> {
    let suffix = format!(".{}", extension);
    Ok(sorted_file_names(folder)
        .await?
        .iter()
        .filter(|name| name.ends_with(&suffix))
        .count())
}
