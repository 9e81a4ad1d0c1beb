//! Provides clients for interacting with external APIs.
//!
//! Includes:
//! - `open_meteo`: Client for the Open-Meteo hourly forecast API.

mod open_meteo;

pub use open_meteo::*;
