//! Core data types, enums, and reports for the Shuuroku conversion pipeline.
//!
//! This module defines the small value types passed between stages:
//! - Detection results (`Layout`, `CoverOutcome`)
//! - Configuration inputs (`Filter`)
//! - Per-book and per-run results (`BookOutcome`, `Presence`, `RunReport`)

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the pages of an extracted container live.
///
/// Both names are relative; `"."` stands for the enclosing folder itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub root: String,
    pub images: String,
}

/// Result of cover normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverOutcome {
    /// A distinct cover sorts before every page.
    Kept { cover: String },
    /// The cover equalled the first page and was removed; readers use page 1.
    Deduplicated {
        removed: String,
        renamed_with: Option<&'static str>,
    },
    /// No image could be determined; conversion proceeds without a guaranteed cover.
    Unresolved,
}

/// A publisher or purchase-location filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    All,
    Exact(String),
}

impl Filter {
    /// Wildcard keyword accepted by [`Filter::parse`].
    pub const WILDCARD: &'static str = "all";

    pub fn parse(value: &str) -> Self {
        if value == Self::WILDCARD {
            Filter::All
        } else {
            Filter::Exact(value.to_string())
        }
    }

    pub fn accepts(&self, value: Option<&str>) -> bool {
        match self {
            Filter::All => true,
            Filter::Exact(expected) => value == Some(expected.as_str()),
        }
    }
}

/// Which source of truth already holds a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Remote,
    Local,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Remote => write!(f, "in the catalog"),
            Presence::Local => write!(f, "locally"),
        }
    }
}

/// How a single book ended, short of an error.
#[derive(Debug, Clone, PartialEq)]
pub enum BookOutcome {
    /// The archive was written.
    Converted { archive: PathBuf },
    /// Everything ran except the archive write.
    Simulated { archive: PathBuf },
    /// A publisher or purchase-location filter rejected the record.
    Filtered {
        field: &'static str,
        value: Option<String>,
    },
    AlreadyExists(Presence),
}

/// Tally of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub converted: Vec<PathBuf>,
    pub simulated: Vec<PathBuf>,
    pub filtered: usize,
    pub already_remote: usize,
    pub already_local: usize,
    /// Container and reason of every book that failed without ending the run.
    pub failures: Vec<(PathBuf, String)>,
}

impl RunReport {
    pub fn record(&mut self, outcome: BookOutcome) {
        match outcome {
            BookOutcome::Converted { archive } => self.converted.push(archive),
            BookOutcome::Simulated { archive } => self.simulated.push(archive),
            BookOutcome::Filtered { .. } => self.filtered += 1,
            BookOutcome::AlreadyExists(Presence::Remote) => self.already_remote += 1,
            BookOutcome::AlreadyExists(Presence::Local) => self.already_local += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.converted.len()
            + self.simulated.len()
            + self.filtered
            + self.already_remote
            + self.already_local
            + self.failures.len()
    }
}
