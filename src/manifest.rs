//! ComicInfo.xml synthesis.
//!
//! The manifest is a fixed, ordered list of tags derived from a [`BookRecord`]. Table
//! driven fields come first and are emitted only when their column holds a value; the
//! derived fields (date parts, summary, manga flags, number, title and series) follow.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tokio::fs;

use crate::error::{Error, Result};
use crate::record::{BookRecord, RecordValue};
use crate::sanitize::sanitize_summary;

/// Well-known manifest file name, stored at the top level of the archive.
pub const MANIFEST_FILE_NAME: &str = "ComicInfo.xml";

const MANIFEST_OPEN: &str = r#"<ComicInfo xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#;
const MANIFEST_CLOSE: &str = "</ComicInfo>";

/// Output tag → record column, in output order.
pub const FIELD_TABLE: &[(&str, &str)] = &[
    ("Volume", "series_index"),
    ("Writer", "authors"),
    ("Publisher", "publisher"),
    ("Tags", "tags"),
    ("Count", "*total_volumes"),
    ("AgeRating", "*age_rating"),
    ("Penciller", "*penciller"),
    ("Inker", "*inker"),
    ("Imprint", "*imprint"),
    ("Colorist", "*colorist"),
    ("Letterer", "*letterer"),
    ("CommunityRating", "*rating_cust"),
    ("CoverArtist", "*cover_artist"),
    ("Editor", "*editor"),
    ("Translator", "*translator"),
    ("Genre", "*genre"),
    ("Web", "*web"),
    ("ISBN", "*isbn"),
];

/// Tags rendered as integers whatever the column holds.
const INTEGER_TAGS: &[&str] = &["Volume", "Count"];

const MANGA_DIRECTION: &str = "YesAndRightToLeft";
const MANGA_LANGUAGE: &str = "ja";

lazy_static! {
    /// Volume token embedded in titles such as `"Foo Vol. 3-4 (Manga)"`.
    static ref TITLE_VOLUME_REGEX: Regex =
        Regex::new(r" Vol\.\s*(.+?)(?: \(Manga\).*)?$").unwrap();
    /// `YYYY-MM-DD` prefix of a publication date.
    static ref PUBDATE_REGEX: Regex = Regex::new(r"^(\d{1,4})-(\d{1,2})-(\d{1,2})").unwrap();
}

/// An ordered ComicInfo document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComicInfo {
    fields: Vec<(&'static str, String)>,
}

impl ComicInfo {
    /// Builds the manifest of a record.
    ///
    /// # Errors
    ///
    /// * [`Error::ManifestBuildFailure`] - the publication date is missing or malformed, or
    ///   an integer tag holds a non-numeric value
    pub fn from_record(record: &BookRecord) -> Result<Self> {
        let mut info = ComicInfo::default();

        for &(tag, key) in FIELD_TABLE {
            let Some(value) = record.value(key).filter(|v| !v.is_empty()) else {
                continue;
            };
            let rendered = if tag == "Volume" {
                // Combo indexes ("1-2") are tagged with their first issue
                record.series_index.as_integer().map(|n| n.to_string()).ok_or_else(|| {
                    Error::ManifestBuildFailure(format!("Volume is not a number: {:?}", value))
                })?
            } else if INTEGER_TAGS.contains(&tag) {
                render_integer(tag, &value)?
            } else {
                match value {
                    RecordValue::List(items) if tag == "Writer" => {
                        items.first().cloned().unwrap_or_default()
                    }
                    RecordValue::Text(text) if tag == "Writer" => first_author(&text),
                    RecordValue::List(items) => items.join(","),
                    RecordValue::Text(text) => text,
                    RecordValue::Number(n) => format_number(n),
                    RecordValue::Flag(b) => b.to_string(),
                }
            };
            info.push(tag, rendered);
        }

        let (year, month, day) = publication_date(record)?;
        info.push("Year", year);
        info.push("Month", month);
        info.push("Day", day);

        if let Some(comments) = record.comments.as_deref().filter(|c| !c.trim().is_empty()) {
            info.push("Summary", sanitize_summary(comments));
        }

        if record.manga {
            info.push("Manga", MANGA_DIRECTION.to_string());
            info.push("LanguageISO", MANGA_LANGUAGE.to_string());
        }

        let number = display_number(record);
        log::debug!("Vol number is: {}", number);
        let (title, series) = title_and_series(record, &number);
        info.push("Number", number);
        info.push("Title", title);
        info.push("Series", series);

        Ok(info)
    }

    fn push(&mut self, tag: &'static str, value: String) {
        self.fields.push((tag, value));
    }

    /// Value of a tag, if emitted.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v.as_str())
    }

    /// Emitted tags in document order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(t, _)| *t)
    }

    /// Serializes the document.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(MANIFEST_OPEN);
        xml.push('\n');
        for (tag, value) in &self.fields {
            xml.push_str(&format!("   <{0}>{1}</{0}>\n", tag, escape_xml(value)));
        }
        xml.push_str(MANIFEST_CLOSE);
        xml
    }

    /// Writes the document as [`MANIFEST_FILE_NAME`] into `directory`.
    pub async fn write_to(&self, directory: &Path) -> Result<PathBuf> {
        let path = directory.join(MANIFEST_FILE_NAME);
        fs::write(&path, self.to_xml()).await?;
        log::debug!("Wrote {:?}", path);
        Ok(path)
    }
}

/// Helper function to escape XML characters
fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn render_integer(tag: &str, value: &RecordValue) -> Result<String> {
    let number = match value {
        RecordValue::Number(n) => Some(*n),
        RecordValue::Text(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .map(|n| (n.trunc() as i64).to_string())
        .ok_or_else(|| Error::ManifestBuildFailure(format!("{} is not a number: {:?}", tag, value)))
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

/// First author of an `&`-joined author string.
fn first_author(joined: &str) -> String {
    joined.split('&').next().unwrap_or_default().trim().to_string()
}

/// Splits the publication date into year, month and day, dropping any time suffix.
fn publication_date(record: &BookRecord) -> Result<(String, String, String)> {
    let raw = record
        .pubdate
        .as_deref()
        .ok_or_else(|| Error::ManifestBuildFailure("record has no publication date".to_string()))?;
    let caps = PUBDATE_REGEX.captures(raw).ok_or_else(|| {
        Error::ManifestBuildFailure(format!("malformed publication date '{}'", raw))
    })?;
    Ok((caps[1].to_string(), caps[2].to_string(), caps[3].to_string()))
}

/// The display number of a book.
///
/// A combo volume token in the title (`"Vol. 1-3"`, `"Vol. 4, 5"`) renders as
/// `"start-end"`; otherwise the record index is used as an integer.
pub fn display_number(record: &BookRecord) -> String {
    if let Some(token) = TITLE_VOLUME_REGEX
        .captures(&record.title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    {
        for separator in ['-', ','] {
            let parts: Vec<&str> = token.split(separator).collect();
            if parts.len() >= 2 {
                let start = parts[parts.len() - 2].trim();
                let end = parts[parts.len() - 1].trim();
                return format!("{}-{}", start, end);
            }
        }
    }

    match record.series_index.as_integer() {
        Some(n) => n.to_string(),
        None => record.series_index.to_string(),
    }
}

/// Title and series tags.
///
/// A title that merely repeats its series becomes a generic `"Volume N"`; a distinct
/// title is kept verbatim. Books without a series are their own series.
pub fn title_and_series(record: &BookRecord, number: &str) -> (String, String) {
    match record.series.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(series) if record.title.to_lowercase().contains(&series.to_lowercase()) => {
            (format!("Volume {}", number), series.to_string())
        }
        Some(series) => (record.title.clone(), series.to_string()),
        None => (format!("Volume {}", number), record.title.clone()),
    }
}
