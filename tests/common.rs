//! Common test utilities and constants for the Shuuroku crate.
//!
//! Provides functions for setting up test directories, creating dummy page images and
//! e-book containers, reading produced archives, and an in-memory catalog.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::{Rng, distributions::Alphanumeric};
use shuuroku::catalog::{Catalog, SeriesCandidate, VolumeEntry};
use shuuroku::error::{Error, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::fs;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

#[allow(dead_code)]
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
#[allow(dead_code)]
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
#[allow(dead_code)]
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// Directories of one test run.
#[allow(dead_code)]
pub struct TestDirs {
    pub base: PathBuf,
    /// Library root containers are placed under.
    pub source: PathBuf,
    /// Output root archives are written under.
    pub target: PathBuf,
    /// Scratch area; not created up front.
    pub scratch: PathBuf,
}

/// Helper function to create a clean, uniquely named test directory.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let base = PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string));
    if base.exists() {
        fs::remove_dir_all(&base).await.unwrap();
    }
    let source = base.join("source");
    let target = base.join("target");
    fs::create_dir_all(&source).await.unwrap();
    fs::create_dir_all(&target).await.unwrap();

    TestDirs {
        scratch: base.join("scratch"),
        base,
        source,
        target,
    }
}

/// Encodes a solid 16x16 image of `color` as PNG.
#[allow(dead_code)]
pub fn png_bytes(color: Rgb<u8>) -> Vec<u8> {
    encode(color, ImageFormat::Png)
}

/// Encodes a solid 16x16 image of `color` as JPEG.
#[allow(dead_code)]
pub fn jpeg_bytes(color: Rgb<u8>) -> Vec<u8> {
    encode(color, ImageFormat::Jpeg)
}

fn encode(color: Rgb<u8>, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(16, 16, color);
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

/// Writes `bytes` to `path`, creating parent directories.
#[allow(dead_code)]
pub async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await?;
    Ok(())
}

/// Creates a minimal dummy PNG page at the given path.
#[allow(dead_code)]
pub async fn create_dummy_page(path: &Path, color: Rgb<u8>) -> Result<()> {
    write_file(path, &png_bytes(color)).await
}

/// Writes a zip container holding `entries` (name, content) at `path`.
#[allow(dead_code)]
pub async fn create_container(path: &Path, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut zip = zip::ZipWriter::new(std::fs::File::create(&path)?);
        let options = zip::write::SimpleFileOptions::default();
        for (name, bytes) in entries {
            zip.start_file(name, options)?;
            zip.write_all(&bytes)?;
        }
        zip.finish()?;
        Ok(())
    })
    .await
    .map_err(|e| Error::Other(e.to_string()))??;
    Ok(())
}

/// Entries of a typical EPUB: `OEBPS/images` with a cover and `pages` red/green/blue pages.
#[allow(dead_code)]
pub fn oebps_entries(pages: usize) -> Vec<(String, Vec<u8>)> {
    let colors = [RED, GREEN, BLUE];
    let mut entries = vec![
        ("mimetype".to_string(), b"application/epub+zip".to_vec()),
        ("OEBPS/content.opf".to_string(), b"<package/>".to_vec()),
        ("OEBPS/style.css".to_string(), b"body {}".to_vec()),
        (
            "OEBPS/images/cover.png".to_string(),
            png_bytes(Rgb([10, 10, 10])),
        ),
    ];
    for i in 0..pages {
        entries.push((
            format!("OEBPS/images/p{:03}.png", i + 1),
            png_bytes(colors[i % colors.len()]),
        ));
    }
    entries
}

/// Path of a container following the library convention `<Title> (<id>)/<Title>.epub`.
#[allow(dead_code)]
pub fn container_path(library: &Path, title: &str, id: &str) -> PathBuf {
    library
        .join("Author")
        .join(format!("{} ({})", title, id))
        .join(format!("{}.epub", title))
}

/// Entry names of a produced archive, in stored order.
#[allow(dead_code)]
pub fn archive_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    archive.file_names().map(str::to_string).collect::<Vec<_>>()
}

/// Checks if a ZIP file exists and contains at least one entry.
#[allow(dead_code)]
pub fn assert_valid_zip_file(path: &Path) {
    assert!(path.is_file(), "Output ZIP file does not exist: {:?}", path);
    assert!(
        !archive_entries(path).is_empty(),
        "Output ZIP file is empty: {:?}",
        path
    );
}

/// Reads the ComicInfo.xml from a CBZ file and returns its content.
#[allow(dead_code)]
pub fn get_comic_info_xml(cbz_path: &Path) -> String {
    let file = std::fs::File::open(cbz_path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name("ComicInfo.xml").unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

/// In-memory [`Catalog`] recording how often it was queried.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockCatalog {
    pub series: Vec<SeriesCandidate>,
    pub volumes: HashMap<String, Vec<VolumeEntry>>,
    /// Answer every request with this status instead.
    pub failing_status: Option<u16>,
    pub searches: AtomicUsize,
    pub listings: AtomicUsize,
}

#[allow(dead_code)]
impl MockCatalog {
    pub fn with_series(mut self, id: &str, name: &str, numbers: &[&str]) -> Self {
        self.series.push(SeriesCandidate {
            id: id.to_string(),
            name: name.to_string(),
        });
        self.volumes.insert(
            id.to_string(),
            numbers
                .iter()
                .map(|number| VolumeEntry {
                    number: number.to_string(),
                    title: format!("{} Vol. {}", name, number),
                })
                .collect(),
        );
        self
    }

    pub fn failing(status: u16) -> Self {
        Self {
            failing_status: Some(status),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> usize {
        self.searches.load(Ordering::SeqCst) + self.listings.load(Ordering::SeqCst)
    }

    fn check(&self, url: &str) -> Result<()> {
        match self.failing_status {
            Some(status) => Err(Error::RemoteUnavailable {
                url: url.to_string(),
                status,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    async fn search_series(&self, name: &str) -> Result<Vec<SeriesCandidate>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.check("/api/v1/series")?;
        Ok(self
            .series
            .iter()
            .filter(|s| s.name.contains(name))
            .cloned()
            .collect())
    }

    async fn series_volumes(&self, series_id: &str, page_size: usize) -> Result<Vec<VolumeEntry>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        self.check("/api/v1/series/books")?;
        Ok(self
            .volumes
            .get(series_id)
            .map(|v| v.iter().take(page_size).cloned().collect())
            .unwrap_or_default())
    }
}
