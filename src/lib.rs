//! Shuuroku - Manga E-book to CBZ Conversion Library
//!
//! This crate turns extracted manga e-books (EPUB containers of a library manager) into
//! CBZ archives carrying a `ComicInfo.xml` manifest, while skipping volumes that a
//! Komga catalog or the local output tree already holds.
//!
//! # Getting Started
//!
//! Load the library records, configure a [`ShuurokuConfig`] via its builder and hand it
//! the containers to convert. Each book goes through the same pipeline: filters,
//! duplicate checks, extraction, layout detection, page format resolution, cover
//! normalization, manifest synthesis and archive build.
//!
//! ```rust,no_run
//! use shuuroku::prelude::*;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> shuuroku::error::Result<()> {
//!     let library = PathBuf::from("./library");
//!
//!     // 1. Load the record snapshot exported by the library manager
//!     let store = RecordStore::from_json_file(&library.join("records.json")).await?;
//!
//!     // 2. Configure the run
//!     let config = ShuurokuConfig::builder()
//!         .server("komga.local")
//!         .username("reader")
//!         .password("secret")
//!         .publisher_filter(Filter::parse("Kodansha"))
//!         .output_root(PathBuf::from("./converted"))
//!         .build()?;
//!
//!     // 3. Convert every container under the library, one book at a time
//!     let catalog = config.komga_catalog()?;
//!     let containers = collect_containers(&library).await?;
//!     let report = config.convert_batch(&store, &catalog, &containers).await?;
//!     println!("Converted {} books", report.converted.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! The individual stages are public as well, for callers that only need part of the
//! pipeline (for example [`manifest::ComicInfo`] or [`layout::detect_layout`]).

pub mod catalog;
pub mod cover;
pub mod error;
pub mod extension;
pub mod generator;
pub mod guard;
pub mod layout;
pub mod manifest;
pub mod path_utils;
pub mod record;
pub mod sanitize;
pub mod scratch;
pub mod shuuroku;
pub mod types;
pub mod volume;

// Publicly expose the main `ShuurokuConfig` struct and its builder
pub use shuuroku::ShuurokuConfig;
pub use shuuroku::ShuurokuConfigBuilder;

// Re-export core types for direct access
pub use catalog::{Catalog, KomgaCatalog, SeriesCandidate, VolumeEntry};
pub use record::{BookRecord, RecordStore, SeriesIndex};
pub use types::{BookOutcome, CoverOutcome, Filter, Layout, Presence, RunReport};
pub use volume::VolumeNumber;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions, allowing you to
/// import everything you need with a single `use shuuroku::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        BookOutcome, BookRecord, Catalog, CoverOutcome, Filter, KomgaCatalog, Layout, Presence,
        RecordStore, RunReport, SeriesCandidate, SeriesIndex, ShuurokuConfig,
        ShuurokuConfigBuilder, VolumeEntry, VolumeNumber, error, generator, types,
    };
    pub use crate::manifest::ComicInfo;
    pub use crate::path_utils::collect_containers;
    pub use std::path::{Path, PathBuf};
}
