use chrono::{DateTime, Utc};
use perp_risk_core::MarketInfo;
use serde::{Deserialize, Serialize};

/// A row of `markets`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MarketRecord {
    pub denom: String,
    pub display: String,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<MarketRecord> for MarketInfo {
    fn from(record: MarketRecord) -> Self {
        MarketInfo::new(record.denom, record.display)
    }
}
