use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::TrajectoryPoint;
use crate::error::{Error, Result};

/// One row of the facility dataset, after header normalisation.
#[derive(Debug, Deserialize)]
struct DatasetRow {
    #[serde(default, alias = "timestamp", alias = "ds")]
    datetime: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    load_kw: Option<f32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    shifted_load_kw: Option<f32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    served_kw: Option<f32>,
    #[serde(default, alias = "trend_kw", deserialize_with = "csv::invalid_option")]
    trend: Option<f32>,
    #[serde(default, alias = "forecast_kw", deserialize_with = "csv::invalid_option")]
    yhat: Option<f32>,
}

impl From<DatasetRow> for TrajectoryPoint {
    fn from(row: DatasetRow) -> Self {
        Self {
            timestamp: row.datetime.unwrap_or_default(),
            load_kw: row.load_kw,
            shifted_load_kw: row.shifted_load_kw,
            served_kw: row.served_kw,
            trend_kw: row.trend,
            forecast_kw: row.yhat,
        }
    }
}

/// Loads the facility dataset from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its header row is unreadable.
pub fn load_path(path: &Path) -> Result<Vec<TrajectoryPoint>> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let points = load_reader(file)?;
    info!(path = %path.display(), points = points.len(), "trajectory loaded");
    Ok(points)
}

/// Loads the facility dataset from any reader.
///
/// Expected columns are `Datetime`, `load_kW`, `shifted_load_kW`, `served_kW`,
/// `trend` and `yhat`; header case and surrounding whitespace are ignored and
/// unknown columns are skipped. Numeric cells that do not parse become empty
/// readings. Rows that cannot be read at all are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the header row cannot be read.
pub fn load_reader(reader: impl Read) -> Result<Vec<TrajectoryPoint>> {
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

    let mut points = Vec::new();
    for (line, row) in rdr.deserialize::<DatasetRow>().enumerate() {
        match row {
            Ok(row) => points.push(row.into()),
            Err(e) => warn!(row = line + 1, error = %e, "skipping unreadable trajectory row"),
        }
    }
    Ok(points)
}
