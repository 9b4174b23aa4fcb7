use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by merging TOML, environment variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml", None)
    }

    /// Loads application configuration with a specific profile.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        Self::load_from("config/Config.toml", Some(profile))
    }

    /// Loads configuration rooted at an explicit TOML path.
    ///
    /// A profile `p` adds `Config.p.toml` next to the base file. Missing files
    /// are skipped, so an empty directory yields [`AppConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed.
    pub fn load_from(config_path: &str, profile: Option<&str>) -> Result<AppConfig> {
        Self::figment(config_path, profile)
            .extract()
            .with_context(|| format!("Failed to load configuration from {config_path}"))
    }

    fn figment(config_path: &str, profile: Option<&str>) -> Figment {
        let base = Path::new(config_path);
        let dir = base.parent().unwrap_or_else(|| Path::new("."));

        let mut figment = Figment::new().merge(Toml::file(base));

        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(dir.join(format!("Config.{profile}.toml"))));
        }

        figment
            .merge(Env::prefixed("APP_").split("__"))
            .join(Json::file(dir.join("Config.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use figment::Jail;

    #[test]
    fn test_load_defaults_when_no_files() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load_from("config/Config.toml", None).unwrap();
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.storage.backend, StorageBackend::File);
            Ok(())
        });
    }

    #[test]
    fn test_toml_then_profile_then_env() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/Config.toml",
                r#"
                [server]
                port = 9000

                [storage]
                backend = "postgres"
                database_url = "postgresql://localhost/perp_risk"
                "#,
            )?;
            jail.create_file(
                "config/Config.prod.toml",
                r#"
                [collector]
                cache_ttl_secs = 60
                "#,
            )?;
            jail.set_env("APP_SERVER__HOST", "127.0.0.1");

            let config = ConfigLoader::load_from("config/Config.toml", Some("prod")).unwrap();
            assert_eq!(config.server.port, 9000);
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.storage.backend, StorageBackend::Postgres);
            assert_eq!(
                config.storage.database_url.as_deref(),
                Some("postgresql://localhost/perp_risk")
            );
            assert_eq!(config.collector.cache_ttl_secs, 60);
            Ok(())
        });
    }
}
