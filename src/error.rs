//! Custom error types and result handling for Shuuroku operations.
//!
//! All operations return a [`Result<T>`] which is a type alias for `std::result::Result<T, Error>`.
//! Errors carry a scope: most of them abort only the book being converted, while a few
//! (see [`Error::is_fatal`]) abort the whole run.
//!
use std::path::PathBuf;

/// Type alias for Results with Shuuroku errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all Shuuroku operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Regular expression parsing errors
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Record snapshot or catalog payload decoding errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Transport-level catalog errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// Async task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    ShuurokuBuilder(#[from] crate::shuuroku::ShuurokuConfigBuilderError),

    /// None of the known container layouts matched.
    #[error("Unable to determine the folder layout of '{0:?}'")]
    LayoutUnknown(PathBuf),
    /// The image folder holds zero or several candidate image extensions.
    #[error("Image folder '{folder:?}' does not hold a single image format (found {found:?})")]
    MixedOrMissingFormat { folder: PathBuf, found: Vec<String> },
    /// Every neutral rename prefix is already taken by a page file.
    #[error("Unable to fix image naming in '{0:?}': all rename prefixes are in use")]
    RenameExhausted(PathBuf),
    /// The catalog answered with a non-success status.
    #[error("Catalog request to '{url}' failed with status {status}")]
    RemoteUnavailable { url: String, status: u16 },
    #[error("Unable to build ComicInfo.xml: {0}")]
    ManifestBuildFailure(String),
    /// The scratch area contains the running program.
    #[error("Refusing to clean '{0:?}': it contains the running program")]
    SelfProtectionTripped(PathBuf),
    /// A declared volume number could not be expanded.
    #[error("Malformed volume number '{0}'")]
    MalformedVolumeRange(String),
    #[error("No book record with id '{0}'")]
    RecordNotFound(String),
    #[error("Book record '{id}' has no {field}")]
    IncompleteRecord { id: String, field: &'static str },
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// Error for resources that couldn't be found (e.g., scratch directory, output directory)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Whether this error ends the whole run rather than just the current book.
    ///
    /// Catalog failures, store lookups and the scratch self-protection check are
    /// run-scoped; detection, synthesis and archive errors only skip the book.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::RemoteUnavailable { .. }
                | Error::Http(_)
                | Error::Json(_)
                | Error::RecordNotFound(_)
                | Error::SelfProtectionTripped(_)
                | Error::ShuurokuBuilder(_)
        )
    }
}

// Basic From<String> conversion for convenience
impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}
