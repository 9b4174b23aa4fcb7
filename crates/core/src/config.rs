use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub chain: ChainConfig,
    pub collector: CollectorConfig,
    pub advisor: AdvisorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Socket address in `host:port` form.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Where snapshots are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per UTC hour under `data_dir`.
    #[default]
    File,
    /// `funding_snapshots` table in PostgreSQL.
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: "./data".to_string(),
            database_url: None,
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// LCD (REST) gateway of the chain hosting the perps contract.
    pub lcd_url: String,
    pub perps_contract: String,
    /// Registry contract listing tradable markets and their display names.
    pub markets_contract: String,
    /// Page size for the `markets` query.
    pub market_limit: u32,
    pub requests_per_second: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            lcd_url: "https://rest-lb.neutron.org".to_string(),
            perps_contract: "neutron1g3catxyv0fk8zzsra2mjc0v4s69a7xygdjt85t54l7ym3gv0un4q2xhaf6"
                .to_string(),
            markets_contract: "neutron17v2cwmaynxhc004uph4rle45feepg0z86wwxkue2kc0t5hx82f2s6gmu73"
                .to_string(),
            market_limit: 50,
            requests_per_second: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Six-field cron expression (seconds first), evaluated in UTC.
    pub cron_schedule: String,
    /// A poll is skipped while the newest stored snapshot is younger than this.
    pub cache_ttl_secs: u64,
    pub market_cache_ttl_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            cron_schedule: "0 */15 * * * *".to_string(),
            cache_ttl_secs: 300,
            market_cache_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub api_url: String,
    pub chat_model: String,
    /// Falls back to `MISTRAL_API_KEY` when unset.
    pub api_key: Option<String>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.mistral.ai/v1".to_string(),
            chat_model: "mistral-small-latest".to_string(),
            api_key: None,
        }
    }
}

impl AdvisorConfig {
    /// API key from config, else from the `MISTRAL_API_KEY` environment variable.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("MISTRAL_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "0.0.0.0:8080");
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.data_dir, "./data");
        assert_eq!(config.chain.market_limit, 50);
        assert_eq!(config.collector.cron_schedule, "0 */15 * * * *");
        assert_eq!(config.collector.cache_ttl_secs, 300);
        assert_eq!(config.advisor.chat_model, "mistral-small-latest");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.max_connections, 10);
    }

    #[test]
    fn test_storage_backend_names() {
        let backend: StorageBackend = serde_json::from_str("\"postgres\"").unwrap();
        assert_eq!(backend, StorageBackend::Postgres);
    }

    #[test]
    fn test_configured_api_key_wins() {
        let config = AdvisorConfig {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("from-config"));
    }
}
