//! Defines data structures for the application.
//!
//! Includes structs for:
//! - Deserializing Open-Meteo forecast responses (`ForecastResponse`).
//! - The tabular unit handed between pipeline stages (`WeatherFrame`, `ObservationRow`).
//! - Rows read back from the warehouse (`FactRow`) and load results (`LoadSummary`).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// --- Open-Meteo Response Structs ---

/// Response of the `/v1/forecast` endpoint, restricted to the hourly block.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
    pub hourly: HourlyData,
}

/// Parallel, time-aligned hourly sequences. Readings may be `null`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HourlyData {
    /// Local ISO timestamps without offset, e.g. `2025-11-04T10:00`.
    pub time: Vec<String>,
    pub temperature_2m: Vec<Option<f64>>,
    pub relative_humidity_2m: Vec<Option<f64>>,
    pub wind_speed_10m: Vec<Option<f64>>,
    /// Only present when precipitation was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<Vec<Option<f64>>>,
}

// --- Tabular Frame ---

/// A named column of the observation table.
///
/// The declaration order is the canonical column order used in staging snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Time,
    Temperature,
    Humidity,
    WindSpeed,
    Precipitation,
    City,
    Latitude,
    Longitude,
    DateExtracted,
    TempCategory,
    HighWindFlag,
    IsRaining,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Time,
        Column::Temperature,
        Column::Humidity,
        Column::WindSpeed,
        Column::Precipitation,
        Column::City,
        Column::Latitude,
        Column::Longitude,
        Column::DateExtracted,
        Column::TempCategory,
        Column::HighWindFlag,
        Column::IsRaining,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Time => "time",
            Column::Temperature => "temperature",
            Column::Humidity => "humidity",
            Column::WindSpeed => "wind_speed",
            Column::Precipitation => "precipitation",
            Column::City => "city",
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
            Column::DateExtracted => "date_extracted",
            Column::TempCategory => "temp_category",
            Column::HighWindFlag => "high_wind_flag",
            Column::IsRaining => "is_raining",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Column::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Columns produced by the normalizer for every fetch.
pub const RAW_COLUMNS: [Column; 8] = [
    Column::Time,
    Column::Temperature,
    Column::Humidity,
    Column::WindSpeed,
    Column::City,
    Column::Latitude,
    Column::Longitude,
    Column::DateExtracted,
];

/// One (location, hour) reading.
///
/// Values of columns the owning frame does not carry are left at their defaults
/// (`None`, `0`, `false`) and are never read.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub precipitation: Option<f64>,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date_extracted: DateTime<Utc>,
    pub temp_category: Option<String>,
    pub high_wind_flag: i32,
    pub is_raining: bool,
}

impl ObservationRow {
    /// Creates a row carrying only the location metadata and timestamps.
    pub fn new(
        time: NaiveDateTime,
        city: &str,
        latitude: f64,
        longitude: f64,
        date_extracted: DateTime<Utc>,
    ) -> Self {
        Self {
            time,
            temperature: None,
            humidity: None,
            wind_speed: None,
            precipitation: None,
            city: city.to_string(),
            latitude,
            longitude,
            date_extracted,
            temp_category: None,
            high_wind_flag: 0,
            is_raining: false,
        }
    }
}

/// The tabular unit crossing stage boundaries: a set of present columns plus rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherFrame {
    pub columns: BTreeSet<Column>,
    pub rows: Vec<ObservationRow>,
}

impl WeatherFrame {
    pub fn new(columns: impl IntoIterator<Item = Column>, rows: Vec<ObservationRow>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Returns the names of `required` columns this frame does not carry, in the given order.
    pub fn missing(&self, required: &[Column]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.has(**c))
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest `time` of the frame, `None` when empty.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.rows.iter().map(|r| r.time).min()?;
        let max = self.rows.iter().map(|r| r.time).max()?;
        Some((min, max))
    }
}

// --- Warehouse Structs ---

/// A row of `fact_weather`. Derives `sqlx::FromRow` for easy mapping from query results.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FactRow {
    pub id: i32,
    pub location_id: i32,
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub temp_category: Option<String>,
    pub high_wind_flag: i32,
    pub is_raining: Option<bool>,
    pub date_extracted: DateTime<Utc>,
}

/// Outcome of one `load_batch` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    pub location_id: i32,
    pub range_start: NaiveDateTime,
    pub range_end: NaiveDateTime,
    pub rows_deleted: u64,
    pub rows_inserted: u64,
}
