//! Volume numbers: single issues and combo volumes.
//!
//! A combo volume is one entry that stands for several consecutive issues, written either
//! as a dash range (`"3-5"`, end inclusive) or as a comma list (`"3,4,5"`). Membership
//! tests compare integer-valued strings, so `"04"` and `"4.0"` both count as `"4"`.

use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// A parsed volume number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeNumber {
    Single(String),
    /// Explicit list of issue numbers.
    Combo(Vec<String>),
    /// Dash range, both ends included.
    Range { start: i64, end: i64 },
}

impl VolumeNumber {
    /// Parses a declared number.
    ///
    /// Comma lists win over dashes, as a list never contains a range. Ranges must have
    /// integer bounds and must not run backwards.
    ///
    /// # Errors
    ///
    /// * [`Error::MalformedVolumeRange`] - empty input, empty list item, non-integer or descending range
    pub fn parse(declared: &str) -> Result<Self> {
        let declared = declared.trim();
        if declared.is_empty() {
            return Err(Error::MalformedVolumeRange(declared.to_string()));
        }

        if declared.contains(',') {
            let items = declared
                .split(',')
                .map(|item| {
                    let item = item.trim();
                    if item.is_empty() {
                        Err(Error::MalformedVolumeRange(declared.to_string()))
                    } else {
                        Ok(normalize_number(item))
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(VolumeNumber::Combo(items));
        }

        if let Some((start, end)) = declared.split_once('-') {
            let bound = |s: &str| {
                s.trim()
                    .parse::<i64>()
                    .map_err(|_| Error::MalformedVolumeRange(declared.to_string()))
            };
            let (start, end) = (bound(start)?, bound(end)?);
            if end < start {
                return Err(Error::MalformedVolumeRange(declared.to_string()));
            }
            return Ok(VolumeNumber::Range { start, end });
        }

        Ok(VolumeNumber::Single(normalize_number(declared)))
    }

    /// The set of integer-valued strings this number covers.
    ///
    /// Ranges are expanded; prefer [`VolumeNumber::contains`] for membership tests.
    pub fn members(&self) -> BTreeSet<String> {
        match self {
            VolumeNumber::Single(n) => BTreeSet::from([n.clone()]),
            VolumeNumber::Combo(items) => items.iter().cloned().collect(),
            VolumeNumber::Range { start, end } => (*start..=*end).map(|n| n.to_string()).collect(),
        }
    }

    /// Whether the integer `target` is one of the covered issues.
    pub fn contains(&self, target: i64) -> bool {
        match self {
            VolumeNumber::Single(n) => *n == target.to_string(),
            VolumeNumber::Combo(items) => {
                let target = target.to_string();
                items.iter().any(|item| *item == target)
            }
            VolumeNumber::Range { start, end } => (*start..=*end).contains(&target),
        }
    }

    /// Lowest integer issue covered, if any.
    pub fn first_issue(&self) -> Option<i64> {
        match self {
            VolumeNumber::Single(n) => n.parse().ok(),
            VolumeNumber::Combo(items) => items.iter().filter_map(|m| m.parse().ok()).min(),
            VolumeNumber::Range { start, .. } => Some(*start),
        }
    }
}

/// Renders integral numbers without decoration (`"04"` → `"4"`, `"3.0"` → `"3"`).
/// Anything else is kept verbatim.
fn normalize_number(raw: &str) -> String {
    match raw.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.is_finite() => (value as i64).to_string(),
        _ => raw.to_string(),
    }
}
