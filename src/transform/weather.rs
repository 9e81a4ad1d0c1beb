//! The transform stage: cleaning and enrichment of a normalized frame.
//!
//! Pure and synchronous; reads nothing but its input frame and the `TransformConfig`.

use crate::config::TransformConfig;
use crate::error::{AppError, Result};
use crate::models::{Column, ObservationRow, WeatherFrame};
use rayon::prelude::*;
use tracing::{debug, info};

/// Columns the transform stage cannot work without.
pub const TRANSFORM_INPUT_COLUMNS: [Column; 3] =
    [Column::Temperature, Column::Humidity, Column::WindSpeed];

/// Columns added by `transform_weather`.
pub const DERIVED_COLUMNS: [Column; 3] =
    [Column::TempCategory, Column::HighWindFlag, Column::IsRaining];

/// Rounds to one decimal place, halves away from zero (`2.25` becomes `2.3`).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Cleans and enriches a frame.
///
/// Rows without a temperature are dropped. Temperature, humidity and wind speed are rounded
/// to one decimal; then each surviving row gets a temperature category (from the rounded
/// temperature), a high-wind flag and a rain flag. Null humidity or wind speed never drops
/// a row. The input frame is left untouched.
///
/// # Errors
///
/// Returns `AppError::MissingColumns` if the frame lacks temperature, humidity or wind speed.
pub fn transform_weather(frame: &WeatherFrame, config: &TransformConfig) -> Result<WeatherFrame> {
    let missing = frame.missing(&TRANSFORM_INPUT_COLUMNS);
    if !missing.is_empty() {
        return Err(AppError::MissingColumns {
            stage: "transform",
            columns: missing,
        });
    }

    debug!(
        "Categorizing on edges {:?} as {:?}, high wind above {}",
        config.bins.edges(),
        config.bins.labels(),
        config.high_wind_threshold
    );
    // Parallel, order-preserving: `collect` on an indexed iterator keeps input order
    let rows: Vec<ObservationRow> = frame
        .rows
        .par_iter()
        .filter(|row| row.temperature.is_some())
        .map(|row| enrich(row, config))
        .collect();

    let dropped = frame.len() - rows.len();
    if dropped > 0 {
        debug!("Dropped {} rows without temperature", dropped);
    }

    // Input columns stay; precipitation is carried through when present
    let mut columns = frame.columns.clone();
    columns.extend(DERIVED_COLUMNS);

    info!("Transformed {} rows ({} dropped)", rows.len(), dropped);
    Ok(WeatherFrame { columns, rows })
}

fn enrich(row: &ObservationRow, config: &TransformConfig) -> ObservationRow {
    let mut row = row.clone();
    // Round first, then derive everything from the rounded values
    row.temperature = row.temperature.map(round1);
    row.humidity = row.humidity.map(round1);
    row.wind_speed = row.wind_speed.map(round1);

    row.temp_category = row
        .temperature
        .and_then(|t| config.bins.categorize(t))
        .map(str::to_string);
    // Strictly above the threshold; unknown wind is not high wind
    row.high_wind_flag = match row.wind_speed {
        Some(speed) if speed > config.high_wind_threshold => 1,
        _ => 0,
    };
    row.is_raining = row.precipitation.unwrap_or(0.0) > 0.0; // Missing precipitation counts as dry
    row
}
