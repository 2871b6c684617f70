use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Budget used when nothing (or a non-positive value) is configured.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// Seconds subtracted from the budget to form the reader's fallback hint.
const FALLBACK_MARGIN_SECONDS: u64 = 4;

pub const DEFAULT_READER_ENDPOINT: &str = "https://r.jina.ai";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

/// Hard timeout for a backend call, in whole seconds. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget(u64);

impl TimeoutBudget {
    /// Accepts the raw configured value; anything `<= 0` becomes the default.
    pub fn from_configured(seconds: i64) -> Self {
        match u64::try_from(seconds) {
            Ok(s) if s > 0 => TimeoutBudget(s),
            _ => TimeoutBudget(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    pub fn seconds(&self) -> u64 {
        self.0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }

    /// Advisory sub-timeout forwarded to the remote reader, `budget - 4`,
    /// present only when positive.
    pub fn fallback_hint(&self) -> Option<u64> {
        self.0.checked_sub(FALLBACK_MARGIN_SECONDS).filter(|hint| *hint > 0)
    }
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        TimeoutBudget(DEFAULT_TIMEOUT_SECONDS)
    }
}

/// Raw, unvalidated settings as they come out of figment.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawConfig {
    host: String,
    port: u16,
    #[serde(default)]
    log_json: bool,
    #[serde(default)]
    scrape: RawScrape,
    #[serde(default)]
    reader: RawReader,
    #[serde(default)]
    pdf: RawPdf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawScrape {
    timeout_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawReader {
    endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPdf {
    max_bytes: u64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3002,
            log_json: false,
            scrape: RawScrape::default(),
            reader: RawReader::default(),
            pdf: RawPdf::default(),
        }
    }
}

impl Default for RawScrape {
    fn default() -> Self {
        Self { timeout_seconds: DEFAULT_TIMEOUT_SECONDS as i64 }
    }
}

impl Default for RawReader {
    fn default() -> Self {
        Self { endpoint: DEFAULT_READER_ENDPOINT.to_string() }
    }
}

impl Default for RawPdf {
    fn default() -> Self {
        Self { max_bytes: 2 * 1024 * 1024 }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub timeout_budget: TimeoutBudget,
    pub reader_endpoint: String,
    pub pdf_max_bytes: u64,
    pub log_json: bool,
}

impl Config {
    /// Load configuration from `.env`, an optional TOML file and the environment.
    ///
    /// Precedence (highest wins):
    /// 1. `GATEWAY_*` variables, `__` separating nested keys
    ///    (`GATEWAY_SCRAPE__TIMEOUT_SECONDS`)
    /// 2. plain `HOST` / `PORT`
    /// 3. TOML file named by `GATEWAY_CONFIG_FILE`
    /// 4. built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut figment = Figment::from(Serialized::defaults(RawConfig::default()));

        if let Ok(config_path) = std::env::var("GATEWAY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment
            .merge(Env::raw().only(&["HOST", "PORT"]).map(|key| key.as_str().to_lowercase().into()))
            .merge(
                Env::prefixed("GATEWAY_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            );

        Self::from_figment(figment)
    }

    /// Extract and validate a configuration from an already layered figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let raw: RawConfig = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        let ip = IpAddr::from_str(&raw.host).map_err(|e| ConfigError::Invalid {
            field: "host".into(),
            reason: format!("invalid host address: {}", e),
        })?;

        if raw.port == 0 {
            return Err(ConfigError::Invalid { field: "port".into(), reason: "must be greater than 0".into() });
        }

        if raw.reader.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "reader.endpoint".into(), reason: "must not be empty".into() });
        }

        if raw.pdf.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "pdf.max_bytes".into(), reason: "must be greater than 0".into() });
        }

        Ok(Config {
            server_addr: SocketAddr::new(ip, raw.port),
            timeout_budget: TimeoutBudget::from_configured(raw.scrape.timeout_seconds),
            reader_endpoint: raw.reader.endpoint,
            pdf_max_bytes: raw.pdf.max_bytes,
            log_json: raw.log_json,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let raw = RawConfig::default();
        Config {
            server_addr: SocketAddr::new(IpAddr::from([127, 0, 0, 1]), raw.port),
            timeout_budget: TimeoutBudget::default(),
            reader_endpoint: raw.reader.endpoint,
            pdf_max_bytes: raw.pdf.max_bytes,
            log_json: raw.log_json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figment_from_toml(toml: &str) -> Figment {
        Figment::from(Serialized::defaults(RawConfig::default())).merge(Toml::string(toml))
    }

    #[test]
    fn test_budget_defaults_when_not_positive() {
        assert_eq!(TimeoutBudget::from_configured(0).seconds(), 15);
        assert_eq!(TimeoutBudget::from_configured(-3).seconds(), 15);
        assert_eq!(TimeoutBudget::from_configured(30).seconds(), 30);
        assert_eq!(TimeoutBudget::default().duration(), Duration::from_secs(15));
    }

    #[test]
    fn test_fallback_hint() {
        assert_eq!(TimeoutBudget::from_configured(15).fallback_hint(), Some(11));
        assert_eq!(TimeoutBudget::from_configured(5).fallback_hint(), Some(1));
        assert_eq!(TimeoutBudget::from_configured(4).fallback_hint(), None);
        assert_eq!(TimeoutBudget::from_configured(1).fallback_hint(), None);
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_figment(figment_from_toml("")).unwrap();
        assert_eq!(config.server_addr, "127.0.0.1:3002".parse::<SocketAddr>().unwrap());
        assert_eq!(config.timeout_budget.seconds(), 15);
        assert_eq!(config.reader_endpoint, "https://r.jina.ai");
        assert_eq!(config.pdf_max_bytes, 2 * 1024 * 1024);
        assert!(!config.log_json);
    }

    #[test]
    fn test_nested_timeout_override() {
        let config = Config::from_figment(figment_from_toml("[scrape]\ntimeout_seconds = 42\n")).unwrap();
        assert_eq!(config.timeout_budget.seconds(), 42);
    }

    #[test]
    fn test_negative_timeout_falls_back() {
        let config = Config::from_figment(figment_from_toml("[scrape]\ntimeout_seconds = -1\n")).unwrap();
        assert_eq!(config.timeout_budget, TimeoutBudget::default());
    }

    #[test]
    fn test_invalid_host() {
        let result = Config::from_figment(figment_from_toml("host = \"not-an-ip\"\n"));
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "host"));
    }

    #[test]
    fn test_zero_port_rejected() {
        let result = Config::from_figment(figment_from_toml("port = 0\n"));
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "port"));
    }

    #[test]
    fn test_unparseable_value() {
        let result = Config::from_figment(figment_from_toml("[scrape]\ntimeout_seconds = \"soon\"\n"));
        assert!(matches!(result, Err(ConfigError::LoadFailed(_))));
    }
    #[test]
    fn test_load_reads_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GATEWAY_SCRAPE__TIMEOUT_SECONDS", 42);
            jail.set_env("PORT", 4000);

            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config.timeout_budget.seconds(), 42);
            assert_eq!(config.timeout_budget.fallback_hint(), Some(38));
            assert_eq!(config.server_addr.port(), 4000);
            Ok(())
        });
    }

    #[test]
    fn test_load_zero_timeout_uses_default() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GATEWAY_SCRAPE__TIMEOUT_SECONDS", 0);

            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config.timeout_budget.seconds(), 15);
            Ok(())
        });
    }

    #[test]
    fn test_load_env_overrides_config_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("gateway.toml", "port = 5000\n[scrape]\ntimeout_seconds = 20\n")?;
            jail.set_env("GATEWAY_CONFIG_FILE", "gateway.toml");
            jail.set_env("GATEWAY_PORT", 6000);

            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config.timeout_budget.seconds(), 20);
            assert_eq!(config.server_addr.port(), 6000);
            Ok(())
        });
    }
}

