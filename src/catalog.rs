//! Remote catalog access.
//!
//! The catalog is a Komga server. Only two read endpoints are used: the series search
//! and the book listing of one series. Requests are plain sequential calls with basic
//! authentication; any non-success status is reported as [`Error::RemoteUnavailable`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Largest page the book listing is asked for.
pub const MAX_PAGE_SIZE: usize = 400;

/// A series returned by the catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeriesCandidate {
    pub id: String,
    pub name: String,
}

/// A book of a catalog series, reduced to what duplicate detection needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeEntry {
    /// Declared number: single value, comma list or dash range.
    pub number: String,
    pub title: String,
}

/// Read access to the series/volume catalog.
#[async_trait]
pub trait Catalog {
    /// Fuzzy search of series by name.
    async fn search_series(&self, name: &str) -> Result<Vec<SeriesCandidate>>;

    /// Up to `page_size` volumes of a series.
    async fn series_volumes(&self, series_id: &str, page_size: usize) -> Result<Vec<VolumeEntry>>;
}

/// Paginated envelope used by every listing endpoint.
#[derive(Debug, Deserialize)]
struct Page<T> {
    content: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct BookDto {
    metadata: BookMetadataDto,
}

#[derive(Debug, Deserialize)]
struct BookMetadataDto {
    #[serde(default)]
    number: String,
    #[serde(default)]
    title: String,
}

/// [`Catalog`] backed by a Komga server over HTTPS.
#[derive(Debug, Clone)]
pub struct KomgaCatalog {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl KomgaCatalog {
    /// Creates a client for `https://{server}`.
    ///
    /// Surrounding single quotes in the password (left over from shell quoting) are
    /// stripped.
    pub fn new(server: &str, username: &str, password: &str) -> Result<Self> {
        Self::with_base_url(format!("https://{}", server), username, password)
    }

    /// Creates a client for an explicit base URL (scheme included).
    pub fn with_base_url(base_url: String, username: &str, password: &str) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.trim_matches('\'').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("Checking url: {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Error calling catalog API: {} returned {}", url, status);
            return Err(Error::RemoteUnavailable {
                url,
                status: status.as_u16(),
            });
        }
        log::debug!("Catalog returned {}", status);

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Catalog for KomgaCatalog {
    async fn search_series(&self, name: &str) -> Result<Vec<SeriesCandidate>> {
        let search = format!("{},TITLE", regex::escape(name));
        let page: Page<SeriesCandidate> = self
            .get_json("/api/v1/series", &[("search_regex", search)])
            .await?;
        log::debug!("Found {} matching series", page.content.len());
        Ok(page.content)
    }

    async fn series_volumes(&self, series_id: &str, page_size: usize) -> Result<Vec<VolumeEntry>> {
        let size = page_size.clamp(1, MAX_PAGE_SIZE);
        let page: Page<BookDto> = self
            .get_json(
                &format!("/api/v1/series/{}/books", series_id),
                &[("size", size.to_string())],
            )
            .await?;
        log::debug!("Found {} volumes", page.content.len());
        Ok(page
            .content
            .into_iter()
            .map(|book| VolumeEntry {
                number: book.metadata.number,
                title: book.metadata.title,
            })
            .collect())
    }
}
