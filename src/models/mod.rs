//! Defines the data structures and models used throughout the application.
//!
//! This includes structures representing data fetched from the weather API,
//! the tabular frame handed between pipeline stages, and rows read back from the warehouse.

mod weather;

pub use weather::*;
