use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use push_core::DeliveryMode;
use push_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PUSH_GATEWAY_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "push-gateway.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Config file not found at {0}")]
    NotFound(PathBuf),
    #[error("No provider configured, add an [apns] or [fcm] section")]
    NoProviders,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default)]
    pub engine: EngineConfig,
    pub apns: Option<ApnsConfig>,
    pub fcm: Option<FcmConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApnsConfig {
    /// PKCS12 certificate file.
    pub certificate: PathBuf,
    #[serde(default)]
    pub password: String,
    /// App bundle id.
    pub topic: String,
    #[serde(default)]
    pub mode: DeliveryMode,
    #[serde(default = "default_streams")]
    pub streams: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmConfig {
    pub api_key: String,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default)]
    pub mode: DeliveryMode,
    pub endpoint: Option<String>,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_streams() -> usize {
    push_apns::DEFAULT_STREAMS
}

fn default_retry_count() -> u32 {
    3
}

impl GatewayConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(content)?;
        if config.apns.is_none() && config.fcm.is_none() {
            return Err(ConfigError::NoProviders);
        }
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = GatewayConfig::parse(
            r#"
            listen = "127.0.0.1:9000"

            [engine]
            senders = 4
            aggregation_timeout_secs = 0

            [apns]
            certificate = "/etc/push/apns.p12"
            topic = "com.example.app"
            mode = "sandbox"

            [fcm]
            api_key = "server-key"
            retry_count = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.listen.port(), 9000);
        assert_eq!(config.engine.senders, 4);
        assert_eq!(config.engine.aggregation_timeout(), None);
        assert_eq!(config.engine.queue_capacity, 100_000);

        let apns = config.apns.unwrap();
        assert_eq!(apns.mode, DeliveryMode::Sandbox);
        assert_eq!(apns.password, "");
        assert_eq!(apns.streams, push_apns::DEFAULT_STREAMS);

        let fcm = config.fcm.unwrap();
        assert_eq!(fcm.retry_count, 5);
        assert_eq!(fcm.mode, DeliveryMode::Production);
        assert!(fcm.endpoint.is_none());
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::parse("[fcm]\napi_key = \"k\"\n").unwrap();

        assert_eq!(config.listen, default_listen());
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.fcm.unwrap().retry_count, 3);
    }

    #[test]
    fn test_requires_a_provider() {
        assert!(matches!(
            GatewayConfig::parse("listen = \"0.0.0.0:1\"\n"),
            Err(ConfigError::NoProviders)
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            GatewayConfig::load(Path::new("/nonexistent/push-gateway.toml")),
            Err(ConfigError::NotFound(_))
        ));
    }
}
