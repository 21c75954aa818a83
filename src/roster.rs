//! Station roster loaded from the station details CSV.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// One station record with valid coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub county: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub open_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(default)]
    county: Option<String>,
    #[serde(default, rename = "station code", alias = "station_code")]
    code: Option<String>,
    #[serde(default, rename = "station name", alias = "station_name")]
    name: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    longitude: Option<f64>,
    #[serde(
        default,
        rename = "open year",
        alias = "open_year",
        deserialize_with = "csv::invalid_option"
    )]
    open_year: Option<i32>,
}

/// Ordered list of stations available to the distributor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StationRoster {
    entries: Vec<RosterEntry>,
}

impl StationRoster {
    /// Loads the roster from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its header row is unreadable.
    pub fn load_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let roster = Self::from_reader(file)?;
        info!(path = %path.display(), stations = roster.len(), "station roster loaded");
        Ok(roster)
    }

    /// Loads the roster from any reader.
    ///
    /// Headers are trimmed and lower-cased. Rows without numeric latitude and
    /// longitude are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the header row cannot be read.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers: csv::StringRecord = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        rdr.set_headers(headers);

        let mut entries = Vec::new();
        let mut dropped = 0_usize;
        for row in rdr.deserialize::<RosterRow>() {
            let entry = row.ok().and_then(|row| {
                Some(RosterEntry {
                    latitude: row.latitude.filter(|v| v.is_finite())?,
                    longitude: row.longitude.filter(|v| v.is_finite())?,
                    county: row.county,
                    code: row.code,
                    name: row.name.filter(|n| !n.is_empty()),
                    open_year: row.open_year,
                })
            });
            match entry {
                Some(entry) => entries.push(entry),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(dropped, "dropped station rows without valid coordinates");
        }
        Ok(Self { entries })
    }

    /// Station names in roster order, truncated to `cap`.
    ///
    /// Unnamed entries are `None`; the distributor gives them an ordinal name.
    pub fn names(&self, cap: usize) -> Vec<Option<String>> {
        self.entries
            .iter()
            .take(cap)
            .map(|e| e.name.clone())
            .collect()
    }

    /// Returns the entries.
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    /// Number of stations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the roster has no stations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
