use crate::core::accounts::firestore::FirestoreAccountConfig;
use crate::core::adapters::http_adapter::HttpAdapterConfig;
use crate::core::models::Account;
use config::Config;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_dummy_account() -> Account {
    Account::new("dummy")
}

/// Selects which `AccountStore` backend the startup pipeline wires up
/// (§4.6, §6 `dataCache.type`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataCacheConfig {
    Dummy {
        #[serde(default = "default_dummy_account")]
        default_account: Account,
    },
    File {
        path: PathBuf,
    },
    Firestore(FirestoreAccountConfig),
}

impl Default for DataCacheConfig {
    fn default() -> Self {
        DataCacheConfig::Dummy {
            default_account: default_dummy_account(),
        }
    }
}

/// Bounds and TTL for the `CachedAccountStore` layer wrapping every
/// backend (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
pub struct AccountCacheConfig {
    #[serde(default = "AccountCacheConfig::default_max_capacity")]
    pub max_capacity: u64,
    #[serde(with = "humantime_serde", default = "AccountCacheConfig::default_ttl")]
    pub ttl: std::time::Duration,
}

impl AccountCacheConfig {
    fn default_max_capacity() -> u64 {
        10_000
    }

    fn default_ttl() -> std::time::Duration {
        std::time::Duration::from_secs(300)
    }
}

impl Default for AccountCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: Self::default_max_capacity(),
            ttl: Self::default_ttl(),
        }
    }
}

/// The user-sync cookie's own identity (§6 `hostCookie`), independent of
/// any one bidder's `familyName`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, Builder)]
pub struct HostCookieConfig {
    pub domain: String,
    pub family: String,
    pub cookie_name: String,
    pub opt_out_url: String,
    pub opt_in_url: String,
}

/// Recognized but not load-bearing beyond schema fidelity: §6 lists
/// `metrics.{host,database,username,password}` as a recognized config
/// block, carried here even though this rework's own metrics are emitted
/// through `opentelemetry` rather than a separate database connection.
#[derive(Debug, Clone, Serialize, Deserialize, Default, Builder)]
pub struct MetricsDbConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
pub struct AppConfig {
    #[serde(default)]
    pub external_url: String,
    #[serde(default = "AppConfig::default_host")]
    pub host: String,
    #[serde(default = "AppConfig::default_port")]
    pub port: u16,
    #[serde(default = "AppConfig::default_admin_port")]
    pub admin_port: u16,
    #[serde(default = "AppConfig::default_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "AppConfig::default_max_timeout_ms")]
    pub max_timeout_ms: u64,
    #[serde(default)]
    pub data_cache: DataCacheConfig,
    #[serde(default)]
    pub account_cache: AccountCacheConfig,
    #[serde(default)]
    pub bidders: Vec<HttpAdapterConfig>,
    pub cache_url: Option<String>,
    #[serde(default)]
    pub host_cookie: HostCookieConfig,
    pub recaptcha_secret: Option<String>,
    #[serde(default)]
    pub metrics: MetricsDbConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8000
    }

    fn default_admin_port() -> u16 {
        8001
    }

    fn default_timeout_ms() -> u64 {
        250
    }

    fn default_max_timeout_ms() -> u64 {
        1_000
    }

    /// `timeoutMillis` resolution per §4.1: missing defaults to
    /// `default_timeout_ms`, present is clamped to `max_timeout_ms`.
    pub fn resolve_timeout_ms(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_timeout_ms)
            .min(self.max_timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            external_url: String::new(),
            host: Self::default_host(),
            port: Self::default_port(),
            admin_port: Self::default_admin_port(),
            default_timeout_ms: Self::default_timeout_ms(),
            max_timeout_ms: Self::default_max_timeout_ms(),
            data_cache: DataCacheConfig::default(),
            account_cache: AccountCacheConfig::default(),
            bidders: Vec::new(),
            cache_url: None,
            host_cookie: HostCookieConfig::default(),
            recaptcha_secret: None,
            metrics: MetricsDbConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtelProto {
    Http,
    Grpc,
}

impl Default for OtelProto {
    fn default() -> Self {
        OtelProto::Grpc
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    Daily,
    Hourly,
    Never,
}

impl Default for FileRotation {
    fn default() -> Self {
        FileRotation::Daily
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSink {
    /// Whether spans should be exported to this sink.
    pub spans: bool,
    pub dest: LogType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogType {
    Stdout {
        #[serde(default = "default_logtype_color")]
        color: bool,
        #[serde(default)]
        json: bool,
    },
    File {
        path: PathBuf,
        #[serde(default)]
        json: bool,
        #[serde(default)]
        rotation: FileRotation,
        #[serde(default)]
        max_files: usize,
    },
    Otel {
        endpoint: String,
        #[serde(default)]
        proto: OtelProto,
    },
}

fn default_logtype_color() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub span_sample_rate: f32,
    #[serde(default)]
    pub sinks: Vec<LogSink>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            span_sample_rate: 0.01,
            sinks: vec![LogSink {
                spans: true,
                dest: LogType::Stdout {
                    color: true,
                    json: false,
                },
            }],
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.sinks.is_empty() {
            anyhow::bail!("At least one logging sink must be configured");
        }

        self.level.parse::<tracing::Level>().map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: trace, debug, info, warn, error",
                self.level
            )
        })?;

        if !(0.0..=1.0).contains(&self.span_sample_rate) {
            anyhow::bail!(
                "span_sample_rate must be between 0.0 and 1.0, got {}",
                self.span_sample_rate
            );
        }

        Ok(())
    }
}

impl AppConfig {
    /// Loads `hbauction.{yaml,json}` from `.` then `/etc/config` (first
    /// match wins), layering `HBAUCTION_`-prefixed environment overrides
    /// on top with `__` as the nesting separator, e.g.
    /// `HBAUCTION_SERVER__PORT=8080` (§9 ambient design notes).
    pub fn load() -> Result<AppConfig, anyhow::Error> {
        let mut builder = Config::builder();

        for dir in [".", "/etc/config"] {
            builder = builder
                .add_source(config::File::with_name(&format!("{dir}/hbauction")).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("HBAUCTION")
                .separator("__")
                .convert_case(config::Case::Snake),
        );

        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_missing_timeout_to_the_configured_default() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.resolve_timeout_ms(None), 250);
    }

    #[test]
    fn clamps_an_overlong_requested_timeout() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.resolve_timeout_ms(Some(10_000)), cfg.max_timeout_ms);
    }

    #[test]
    fn default_data_cache_is_the_dummy_backend() {
        assert!(matches!(
            AppConfig::default().data_cache,
            DataCacheConfig::Dummy { .. }
        ));
    }
}
