//! Database row types.

pub mod market;
pub mod snapshot;

pub use market::MarketRecord;
pub use snapshot::SnapshotRecord;
