//! Durable hand-off between pipeline stages.
//!
//! Each stage reads its input from, and writes its output to, a Parquet snapshot on disk,
//! so no row set ever travels through the scheduler that sequences the stages.

mod area;
mod snapshot;

pub use area::*;
pub use snapshot::*;
