//! Fixed locations of the staging snapshots.

use std::path::PathBuf;

const RAW_SNAPSHOT: &str = "weather_raw.parquet";
const TRANSFORMED_SNAPSHOT: &str = "weather_transformed.parquet";

/// The staging directory and the snapshots kept in it.
///
/// `fetch` writes the raw snapshot, `transform` turns it into the transformed snapshot and
/// `load` reads that one. Both are overwritten on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Normalized rows as fetched, before any cleaning.
    pub fn raw(&self) -> PathBuf {
        self.dir.join(RAW_SNAPSHOT)
    }

    /// Cleaned and enriched rows, ready to load.
    pub fn transformed(&self) -> PathBuf {
        self.dir.join(TRANSFORMED_SNAPSHOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_live_in_the_staging_dir() {
        let area = StagingArea::new("data/staging");
        assert_eq!(area.raw(), PathBuf::from("data/staging/weather_raw.parquet"));
        assert_eq!(
            area.transformed(),
            PathBuf::from("data/staging/weather_transformed.parquet")
        );
        assert_ne!(area.raw(), area.transformed());
    }
}
