use serde::Deserialize;
use tracing::debug;

/// Root application configuration. Loaded from an optional `super-admin.toml`
/// file and environment variables with the prefix `SUPER_ADMIN__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Label written to `performedBy` on every audit entry.
    #[serde(default = "default_actor_label")]
    pub actor_label: String,
    /// Rows shown in the dashboard's recent workspaces/users cards.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// JSON fixture loaded into the memory backend at startup.
    #[serde(default)]
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub json: bool,
}

// Default functions
fn default_actor_label() -> String {
    "Super Admin".to_string()
}
fn default_recent_limit() -> usize {
    5
}
fn default_backend() -> StoreBackend {
    StoreBackend::Memory
}
fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}
fn default_key_prefix() -> String {
    "console".to_string()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            actor_label: default_actor_label(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            seed_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the optional config file and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("super-admin")
    }

    /// Load configuration using `file_stem` as the config file name
    /// (any extension the `config` crate understands).
    pub fn load_from(file_stem: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(
                config::Environment::with_prefix("SUPER_ADMIN")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let loaded: Self = config.try_deserialize()?;
        debug!(
            backend = ?loaded.store.backend,
            actor = %loaded.console.actor_label,
            "Configuration resolved"
        );
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.console.actor_label, "Super Admin");
        assert_eq!(cfg.console.recent_limit, 5);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.store.key_prefix, "console");
        assert!(cfg.store.seed_path.is_none());
        assert!(!cfg.log.json);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let cfg: AppConfig = serde_json::from_value(serde_json::json!({
            "store": {"backend": "redis"},
            "console": {"actor_label": "Ops Oncall"}
        }))
        .unwrap();
        assert_eq!(cfg.store.backend, StoreBackend::Redis);
        assert_eq!(cfg.store.redis_url, "redis://localhost:6379");
        assert_eq!(cfg.console.actor_label, "Ops Oncall");
        assert_eq!(cfg.console.recent_limit, 5);
    }
}
