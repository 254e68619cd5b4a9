//! Book records and the read-only record store.
//!
//! Records come from a JSON snapshot of the e-book library (the array printed by
//! `calibredb list --fields all --for-machine`). Known columns are typed fields; custom
//! columns (keys starting with `*`) stay addressable by key through [`BookRecord::value`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::volume::VolumeNumber;

/// The volume index of a record, kept as written (a number or a combo string).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesIndex(String);

impl SeriesIndex {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The integer form used for membership tests and the `Volume` tag.
    ///
    /// Numbers are truncated (`2.5` → `2`); combo strings yield their first issue.
    pub fn as_integer(&self) -> Option<i64> {
        if let Ok(value) = self.0.trim().parse::<f64>() {
            return value.is_finite().then_some(value.trunc() as i64);
        }
        VolumeNumber::parse(&self.0).ok()?.first_issue()
    }
}

impl fmt::Display for SeriesIndex {
    /// Integral numbers render bare (`3.0` → `3`), anything else verbatim.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{}", value as i64)
            }
            _ => write!(f, "{}", self.0.trim()),
        }
    }
}

impl<'de> Deserialize<'de> for SeriesIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(SeriesIndex(n.to_string())),
            Value::String(s) => Ok(SeriesIndex(s)),
            Value::Null => Ok(SeriesIndex::default()),
            other => Err(serde::de::Error::custom(format!(
                "invalid series_index: {}",
                other
            ))),
        }
    }
}

/// A value looked up by key on a record, shaped for manifest rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Text(String),
    List(Vec<String>),
    Number(f64),
    Flag(bool),
}

impl RecordValue {
    /// Whether the value counts as present for optional manifest fields.
    pub fn is_empty(&self) -> bool {
        match self {
            RecordValue::Text(s) => s.trim().is_empty(),
            RecordValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
            RecordValue::Number(n) => *n == 0.0,
            RecordValue::Flag(b) => !b,
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(RecordValue::Text(s.clone())),
            Value::Number(n) => n.as_f64().map(RecordValue::Number),
            Value::Bool(b) => Some(RecordValue::Flag(*b)),
            Value::Array(items) => Some(RecordValue::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            Value::Null | Value::Object(_) => None,
        }
    }
}

/// One book of the library snapshot. Immutable once loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub series_index: SeriesIndex,
    #[serde(default, deserialize_with = "deserialize_authors")]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(rename = "*purchase_location", default)]
    pub purchase_location: Option<String>,
    /// `"YYYY-MM-DD[Thh:mm:ss...]"`
    #[serde(default)]
    pub pubdate: Option<String>,
    /// Date the book was added to the library.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// HTML description.
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(rename = "*manga", default, deserialize_with = "null_as_default")]
    pub manga: bool,
    /// Stored format files of this book.
    #[serde(default, deserialize_with = "null_as_default")]
    pub formats: Vec<PathBuf>,
    /// Every other column, custom ones included.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BookRecord {
    /// Looks up a column by its snapshot key.
    ///
    /// Typed columns are served from their fields, every other key from [`BookRecord::extra`].
    /// Returns `None` when the column is absent or null.
    pub fn value(&self, key: &str) -> Option<RecordValue> {
        let text = |s: &Option<String>| s.clone().map(RecordValue::Text);
        match key {
            "id" => Some(RecordValue::Text(self.id.clone())),
            "title" => Some(RecordValue::Text(self.title.clone())),
            "series" => text(&self.series),
            "series_index" => Some(RecordValue::Text(self.series_index.as_str().to_string())),
            "authors" => Some(RecordValue::List(self.authors.clone())),
            "publisher" => text(&self.publisher),
            "*purchase_location" => text(&self.purchase_location),
            "pubdate" => text(&self.pubdate),
            "timestamp" => text(&self.timestamp),
            "tags" => Some(RecordValue::List(self.tags.clone())),
            "comments" => text(&self.comments),
            "*manga" => Some(RecordValue::Flag(self.manga)),
            other => self.extra.get(other).and_then(RecordValue::from_json),
        }
    }

    /// The series name used against the catalog and for output paths.
    ///
    /// Omnibus editions share the series of their single volumes, and `&` is spelled
    /// out. Books without a series are their own series, named after the title.
    pub fn collection_name(&self) -> String {
        match self.series.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(series) => series.replace(" Omnibus", "").replace(" & ", " and "),
            None => self.title.clone(),
        }
    }

    /// The date part of the `timestamp` column.
    pub fn added_on(&self) -> Option<NaiveDate> {
        let raw = self.timestamp.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.date_naive())
            .ok()
            .or_else(|| NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok())
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

/// Authors come either as a list or as one `&`-joined string.
fn deserialize_authors<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Authors {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Option::<Authors>::deserialize(deserializer)? {
        Some(Authors::Joined(joined)) => joined
            .split('&')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect(),
        Some(Authors::List(list)) => list,
        None => Vec::new(),
    })
}

/// Unset columns are exported as `null`; they read as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read-only snapshot of book records keyed by id.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: HashMap<String, BookRecord>,
}

impl RecordStore {
    /// Builds a store from already materialized records.
    pub fn new(records: impl IntoIterator<Item = BookRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    /// Parses a snapshot JSON array.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<BookRecord> = serde_json::from_str(json)?;
        log::debug!("Loaded {} book records", records.len());
        Ok(Self::new(records))
    }

    /// Reads and parses a snapshot file.
    pub async fn from_json_file(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&json)
    }

    pub fn get(&self, id: &str) -> Result<&BookRecord> {
        self.records
            .get(id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The `.epub` containers of every record added on or after `date`, sorted.
    pub fn added_on_or_after(&self, date: NaiveDate) -> Vec<PathBuf> {
        let mut containers: Vec<PathBuf> = self
            .records
            .values()
            .filter(|record| record.added_on().is_some_and(|added| added >= date))
            .flat_map(|record| record.formats.iter())
            .filter(|format| format.extension().is_some_and(|ext| ext == "epub"))
            .cloned()
            .collect();
        containers.sort();
        log::debug!("Found {} containers added since {}", containers.len(), date);
        containers
    }
}
