pub mod analysis;
pub mod config;
pub mod config_loader;
pub mod market;
pub mod traits;

pub use analysis::{AnalysisRequest, ChatMessage, ChatRequest, ChatRole, DataType};
pub use config::{
    AdvisorConfig, AppConfig, ChainConfig, CollectorConfig, ServerConfig, StorageBackend,
    StorageConfig,
};
pub use config_loader::ConfigLoader;
pub use market::{
    fixed_point_to_usd, market_display_name, timestamp_to_datetime, HistoricalSeries, MarketInfo,
    MarketRate, Snapshot, OI_SCALE,
};
pub use traits::{MarketAnalyst, MarketRegistry, SnapshotStore, TextStream};
