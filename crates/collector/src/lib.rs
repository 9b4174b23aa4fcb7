//! On-chain funding-rate acquisition.
//!
//! [`ChainClient`] queries the perps contract over the LCD gateway,
//! [`FundingCollector`] turns each poll into a stored snapshot and
//! [`CollectorScheduler`] drives it on a cron schedule.

pub mod chain_client;
pub mod error;
pub mod funding_collector;
pub mod scheduler;
pub mod types;

pub use chain_client::{snapshot_from_states, ChainClient, PerpMarketState};
pub use error::ChainError;
pub use funding_collector::FundingCollector;
pub use scheduler::CollectorScheduler;
pub use types::{CollectorEvent, CollectorStats, PollOutcome};
