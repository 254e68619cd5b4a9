use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, KomgaCatalog, MAX_PAGE_SIZE};
use crate::cover::normalize_cover;
use crate::error::{Error, Result};
use crate::extension::resolve_extension;
use crate::generator::{build_archive, cbz::Cbz};
use crate::guard::{exists_in_catalog, exists_locally, output_path};
use crate::layout::detect_layout;
use crate::manifest::ComicInfo;
use crate::path_utils::book_id_from_container;
use crate::record::{BookRecord, RecordStore};
use crate::scratch::ScratchArea;
use crate::types::{BookOutcome, Filter, Presence, RunReport};

/// The Shuuroku conversion configuration, built declaratively using the builder pattern.
///
/// Every setting a run needs is fixed here once and passed through the pipeline; nothing
/// is read from global state. Once configured, it drives the per-book pipeline:
///
/// - [`convert_book`](ShuurokuConfig::convert_book): One container, looked up by the id in its folder name
/// - [`convert_record`](ShuurokuConfig::convert_record): One container with an already loaded record
/// - [`convert_batch`](ShuurokuConfig::convert_batch): An ordered list of containers, one after the other
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use shuuroku::prelude::*;
/// # use std::path::PathBuf;
/// let config = ShuurokuConfig::builder()
///     .server("komga.local")
///     .username("reader")
///     .password("secret")
///     .publisher_filter(Filter::parse("all"))
///     .scratch_path(PathBuf::from("./temp"))
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Clone, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ShuurokuConfig {
    // --- Catalog ---
    /// Host name of the Komga server, without scheme.
    #[builder(default = "\"komga.local\".to_string()")]
    pub server: String,

    /// Catalog user name.
    #[builder(default = "\"cbz_converter\".to_string()")]
    pub username: String,

    /// Catalog password.
    #[builder(default = "\"cbz_converter\".to_string()")]
    pub password: String,

    /// Series name → catalog series id, consulted before any search.
    ///
    /// Useful for series whose catalog name differs from the library name.
    #[builder(default)]
    pub series_overrides: HashMap<String, String>,

    /// How many volumes of a series are fetched for the duplicate check (at most 400).
    #[builder(default = "MAX_PAGE_SIZE")]
    pub catalog_page_size: usize,

    // --- Duplicate checks ---
    /// Skip the catalog check.
    #[builder(default = "false")]
    pub skip_remote: bool,

    /// Skip the check for an existing output archive.
    #[builder(default = "false")]
    pub skip_local: bool,

    // --- Output ---
    /// Create the output directory of an archive when it is missing.
    ///
    /// Independent of [`write_archive`](ShuurokuConfig::write_archive): the local check
    /// may create the directory even when nothing is written.
    #[builder(default = "true")]
    pub create_output_directory: bool,

    /// Write the archive. `false` runs every stage except the write (simulate-only).
    #[builder(default = "true")]
    pub write_archive: bool,

    /// Directory under which `publisher/series/Volume N.cbz` archives are placed.
    #[builder(default = "PathBuf::from(\".\")")]
    pub output_root: PathBuf,

    /// Drop non-canonical raster formats (`jpeg`, `gif`) when resolving the page format.
    #[builder(default = "false")]
    pub force_canonical_format: bool,

    // --- Selection ---
    #[builder(default)]
    pub publisher_filter: Filter,

    #[builder(default)]
    pub purchase_filter: Filter,

    // --- Scratch ---
    /// Extraction directory, shared by every book and removed after each one.
    #[builder(default = "PathBuf::from(\"./temp\")")]
    pub scratch_path: PathBuf,
}

impl std::fmt::Debug for ShuurokuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShuurokuConfig")
            .field("server", &self.server)
            .field("username", &self.username)
            // Never print credentials
            .field("password", &"<redacted>")
            .field("series_overrides", &self.series_overrides)
            .field("catalog_page_size", &self.catalog_page_size)
            .field("skip_remote", &self.skip_remote)
            .field("skip_local", &self.skip_local)
            .field("create_output_directory", &self.create_output_directory)
            .field("write_archive", &self.write_archive)
            .field("output_root", &self.output_root)
            .field("force_canonical_format", &self.force_canonical_format)
            .field("publisher_filter", &self.publisher_filter)
            .field("purchase_filter", &self.purchase_filter)
            .field("scratch_path", &self.scratch_path)
            .finish()
    }
}

impl ShuurokuConfig {
    /// Creates a new builder for configuring `ShuurokuConfig`.
    pub fn builder() -> ShuurokuConfigBuilder {
        ShuurokuConfigBuilder::default()
    }

    /// A Komga client for the configured server and credentials.
    pub fn komga_catalog(&self) -> Result<KomgaCatalog> {
        KomgaCatalog::new(&self.server, &self.username, &self.password)
    }

    /// Converts the container at `container`, looking its record up by the id encoded
    /// in the enclosing folder name (`"<Title> (<id>)"`).
    ///
    /// # Returns
    ///
    /// * `Ok(BookOutcome)` - The book was converted, simulated, filtered out or already present
    /// * `Err(Error)` - The book failed; see [`Error::is_fatal`] for whether the run should stop
    pub async fn convert_book<C: Catalog + ?Sized>(
        &self,
        store: &RecordStore,
        catalog: &C,
        container: &Path,
    ) -> Result<BookOutcome> {
        log::debug!("Looking at file: {:?}", container);
        let id = book_id_from_container(container).ok_or_else(|| {
            Error::InvalidPath(
                container.to_path_buf(),
                "No book id in the folder name".to_string(),
            )
        })?;
        log::debug!("Book ID: {}", id);
        let record = store.get(&id)?;
        self.convert_record(record, catalog, container).await
    }

    /// Runs the pipeline for one record and its container.
    ///
    /// Order: filters, catalog check, local check, extraction, layout detection,
    /// extension resolution, cover normalization, manifest synthesis, archive build.
    /// The scratch area is cleaned whenever extraction was attempted, whatever the
    /// outcome of the later stages.
    pub async fn convert_record<C: Catalog + ?Sized>(
        &self,
        record: &BookRecord,
        catalog: &C,
        container: &Path,
    ) -> Result<BookOutcome> {
        let series = record.collection_name();
        log::info!(
            "Looking at {}, Vol. {} ({})",
            series,
            record.series_index,
            record.authors.join(" & ")
        );

        if !self.publisher_filter.accepts(record.publisher.as_deref()) {
            log::info!(" Publisher does not match ({:?})", record.publisher);
            return Ok(BookOutcome::Filtered {
                field: "publisher",
                value: record.publisher.clone(),
            });
        }
        if !self.purchase_filter.accepts(record.purchase_location.as_deref()) {
            log::info!(" Purchase Location does not match ({:?})", record.purchase_location);
            return Ok(BookOutcome::Filtered {
                field: "purchase_location",
                value: record.purchase_location.clone(),
            });
        }

        let publisher = record
            .publisher
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::IncompleteRecord {
                id: record.id.clone(),
                field: "publisher",
            })?;
        let archive = output_path(
            &self.output_root,
            publisher,
            &series,
            &record.series_index.to_string(),
        );

        if !self.skip_remote {
            let target = record
                .series_index
                .as_integer()
                .ok_or_else(|| Error::IncompleteRecord {
                    id: record.id.clone(),
                    field: "series_index",
                })?;
            if exists_in_catalog(
                catalog,
                &self.series_overrides,
                &series,
                target,
                self.catalog_page_size,
            )
            .await?
            {
                log::info!(" Manga already exists in the catalog");
                return Ok(BookOutcome::AlreadyExists(Presence::Remote));
            }
        }

        if !self.skip_local && exists_locally(&archive, self.create_output_directory).await? {
            log::info!(" Manga already exists locally");
            return Ok(BookOutcome::AlreadyExists(Presence::Local));
        }

        let scratch = ScratchArea::new(&self.scratch_path);
        let result = match scratch.extract(container).await {
            Ok(()) => self.convert_extracted(record, scratch.path(), archive).await,
            Err(e) => Err(e),
        };

        log::debug!("Cleaning up scratch area");
        if let Err(cleanup_error) = scratch.clean().await {
            if cleanup_error.is_fatal() || result.is_ok() {
                return Err(cleanup_error);
            }
            log::warn!("Unable to clean scratch area: {}", cleanup_error);
        }

        if result.is_ok() {
            log::info!(" Build complete");
        }
        result
    }

    /// Detection, synthesis and packaging over an extracted container.
    async fn convert_extracted(
        &self,
        record: &BookRecord,
        extracted: &Path,
        archive: PathBuf,
    ) -> Result<BookOutcome> {
        let layout = detect_layout(extracted).await?;
        log::debug!("Main folder: '{}', images folder: '{}'", layout.root, layout.images);
        let image_folder = layout.image_folder(extracted);

        let extension = resolve_extension(&image_folder, self.force_canonical_format).await?;
        log::debug!("Image format: '{}'", extension);

        let backup_folder = image_folder
            .parent()
            .filter(|parent| parent.starts_with(extracted));
        let cover = normalize_cover(&image_folder, &extension, backup_folder).await?;
        log::debug!("Cover: {:?}", cover);

        let manifest = ComicInfo::from_record(record)?;
        let manifest_path = manifest.write_to(extracted).await?;

        if !self.write_archive {
            log::info!(" Simulate-only, not writing {:?}", archive);
            return Ok(BookOutcome::Simulated { archive });
        }

        build_archive::<Cbz>(
            &image_folder,
            &extension,
            &manifest_path,
            &archive,
            self.create_output_directory,
        )
        .await?;
        Ok(BookOutcome::Converted { archive })
    }

    /// Converts `containers` in order, one at a time.
    ///
    /// Book-scoped failures are logged, recorded in the report and skipped; a fatal
    /// error (catalog unavailable, unknown record, scratch self-protection) ends the run.
    pub async fn convert_batch<C: Catalog + ?Sized>(
        &self,
        store: &RecordStore,
        catalog: &C,
        containers: &[PathBuf],
    ) -> Result<RunReport> {
        let mut report = RunReport::default();
        for container in containers {
            match self.convert_book(store, catalog, container).await {
                Ok(outcome) => report.record(outcome),
                Err(e) if e.is_fatal() => {
                    log::error!("Aborting run at {:?}: {}", container, e);
                    return Err(e);
                }
                Err(e) => {
                    log::warn!("Skipping {:?}: {}", container, e);
                    report.failures.push((container.clone(), e.to_string()));
                }
            }
        }
        log::info!(
            "Processed {} books: {} converted, {} simulated, {} failed",
            report.processed(),
            report.converted.len(),
            report.simulated.len(),
            report.failures.len()
        );
        Ok(report)
    }
}

impl ShuurokuConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(scratch) = &self.scratch_path {
            if scratch.as_os_str().is_empty() {
                return Err("Scratch path must not be empty.".to_string());
            }
            if let Some(output_root) = &self.output_root {
                if scratch == output_root {
                    return Err("Scratch path must differ from the output root.".to_string());
                }
            }
        }

        if let Some(size) = self.catalog_page_size {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(format!(
                    "Catalog page size must be between 1 and {}.",
                    MAX_PAGE_SIZE
                ));
            }
        }

        let skip_remote = self.skip_remote.unwrap_or(false);
        if let Some(server) = &self.server {
            if server.trim().is_empty() && !skip_remote {
                return Err("Catalog server is required unless the remote check is skipped.".to_string());
            }
        }

        Ok(())
    }
}
