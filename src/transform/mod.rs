//! Turns raw forecasts into warehouse-ready frames.
//!
//! - `normalizer`: raw API structure to a tabular `WeatherFrame`.
//! - `weather`: cleaning and enrichment of a frame (the transform stage).

mod normalizer;
mod weather;

pub use normalizer::*;
pub use weather::*;
