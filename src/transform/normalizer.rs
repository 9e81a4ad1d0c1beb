//! Flattens an Open-Meteo forecast into a `WeatherFrame`.
//!
//! One row per hourly timestamp, each annotated with the batch's city, coordinates and
//! extraction time. No value is cleaned or rounded here.

use crate::error::{AppError, Result};
use crate::models::{Column, ForecastResponse, ObservationRow, WeatherFrame, RAW_COLUMNS};
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use tracing::{debug, info};

const UNKNOWN_CITY: &str = "Unknown";

/// Converts a raw forecast into one row per hourly timestamp.
///
/// The city recorded on every row is `city` when given, otherwise the timezone reported by
/// the API, otherwise `"Unknown"`. `extracted_at` is truncated to microseconds, the
/// precision of both the staging snapshot and the warehouse.
///
/// # Errors
///
/// Returns `AppError::MalformedResponse` if the hourly sequences differ in length or a
/// timestamp cannot be parsed.
pub fn normalize(
    raw: &ForecastResponse,
    city: Option<&str>,
    extracted_at: DateTime<Utc>,
) -> Result<WeatherFrame> {
    let hourly = &raw.hourly;
    // Every hourly sequence is indexed by position in `time`
    let expected = hourly.time.len();

    let mut sequences = vec![
        ("temperature_2m", hourly.temperature_2m.len()),
        ("relative_humidity_2m", hourly.relative_humidity_2m.len()),
        ("wind_speed_10m", hourly.wind_speed_10m.len()),
    ];
    if let Some(precipitation) = &hourly.precipitation {
        sequences.push(("precipitation", precipitation.len()));
    }
    if let Some((name, len)) = sequences.iter().find(|(_, len)| *len != expected) {
        return Err(AppError::MalformedResponse(format!(
            "hourly.{} has {} values but hourly.time has {}",
            name, len, expected
        )));
    }

    let city = city
        .or(raw.timezone.as_deref())
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(UNKNOWN_CITY);
    let extracted_at = extracted_at.trunc_subsecs(6); // Parquet and TIMESTAMPTZ both stop at µs

    let rows = hourly
        .time
        .iter()
        .enumerate()
        .map(|(i, time)| {
            let mut row = ObservationRow::new(
                parse_hour(time)?,
                city,
                raw.latitude,
                raw.longitude,
                extracted_at,
            );
            row.temperature = hourly.temperature_2m[i];
            row.humidity = hourly.relative_humidity_2m[i];
            row.wind_speed = hourly.wind_speed_10m[i];
            row.precipitation = hourly.precipitation.as_ref().and_then(|p| p[i]);
            Ok(row)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut frame = WeatherFrame::new(RAW_COLUMNS, rows);
    if hourly.precipitation.is_some() {
        frame.columns.insert(Column::Precipitation);
    } else {
        debug!("Forecast carries no precipitation; column left out of the frame");
    }

    info!("Normalized {} hourly rows for {}", frame.len(), city);
    Ok(frame)
}

fn parse_hour(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| AppError::MalformedResponse(format!("invalid hourly time '{}': {}", raw, e)))
}
