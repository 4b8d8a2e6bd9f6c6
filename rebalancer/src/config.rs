//! JSON configuration loading and validation.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use driftbook::{AssetTarget, decimal_from_f64, validate_targets};
use driftbook_broker::bitkub::client::DEFAULT_BASE_URL;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    /// Assets in priority order; the last one absorbs the remaining weight.
    pub balancers: Vec<BalancerConfig>,
    /// Drift (as a fraction) above which the portfolio is rebalanced.
    pub trigger_percent: f64,
    /// Minutes to sleep between cycles.
    pub interval_minute: f64,
    /// Quote currency, e.g. `"THB"`.
    pub base_fiat: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Stop after this many failed cycles in a row. Unset retries forever.
    #[serde(default)]
    pub max_consecutive_failures: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancerConfig {
    pub asset_name: String,
    pub expected_percent: f64,
}

fn default_api_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_request_timeout() -> u64 {
    10
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("balancers", &self.balancers)
            .field("trigger_percent", &self.trigger_percent)
            .field("interval_minute", &self.interval_minute)
            .field("base_fiat", &self.base_fiat)
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("max_consecutive_failures", &self.max_consecutive_failures)
            .finish()
    }
}

/// Everything a single cycle needs, derived from [`Config`].
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub targets: Vec<AssetTarget>,
    pub base_fiat: String,
    pub trigger_threshold: Decimal,
    /// Plan and log orders without placing them.
    pub dry_run: bool,
}

impl Config {
    /// Load config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants, including the target weight invariants.
    fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.trigger_percent) {
            return Err(Error::Config("TRIGGER_PERCENT must be in [0.0, 1.0)".into()));
        }
        if !self.interval_minute.is_finite() || self.interval_minute <= 0.0 {
            return Err(Error::Config("INTERVAL_MINUTE must be > 0".into()));
        }
        self.interval()?;
        if self.base_fiat.trim().is_empty() {
            return Err(Error::Config("BASE_FIAT must not be empty".into()));
        }
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(Error::Config("API_KEY and API_SECRET are required".into()));
        }
        if self.max_consecutive_failures == Some(0) {
            return Err(Error::Config("MAX_CONSECUTIVE_FAILURES must be >= 1".into()));
        }
        validate_targets(&self.targets()?)?;
        Ok(())
    }

    /// Configured targets in file order.
    pub fn targets(&self) -> Result<Vec<AssetTarget>> {
        self.balancers
            .iter()
            .map(|b| {
                let weight = decimal_from_f64(b.expected_percent).ok_or_else(|| {
                    Error::Config(format!("expectedPercent for {} is not a number", b.asset_name))
                })?;
                Ok(AssetTarget::new(b.asset_name.clone(), weight))
            })
            .collect()
    }

    pub fn trigger_threshold(&self) -> Result<Decimal> {
        decimal_from_f64(self.trigger_percent)
            .ok_or_else(|| Error::Config("TRIGGER_PERCENT is not a number".into()))
    }

    /// Sleep between cycles.
    pub fn interval(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.interval_minute * 60.0).map_err(|_| {
            Error::Config(format!("INTERVAL_MINUTE {} is out of range", self.interval_minute))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cycle_settings(&self, dry_run: bool) -> Result<CycleSettings> {
        Ok(CycleSettings {
            targets: self.targets()?,
            base_fiat: self.base_fiat.clone(),
            trigger_threshold: self.trigger_threshold()?,
            dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn example_json() -> &'static str {
        r#"{
            "BALANCERS": [
                { "assetName": "BTC", "expectedPercent": 0.4 },
                { "assetName": "ETH", "expectedPercent": 0.35 },
                { "assetName": "THB", "expectedPercent": 0.25 }
            ],
            "TRIGGER_PERCENT": 0.05,
            "INTERVAL_MINUTE": 15,
            "BASE_FIAT": "THB",
            "API_KEY": "key",
            "API_SECRET": "secret"
        }"#
    }

    fn with(key: &str, value: &str) -> String {
        let mut json: serde_json::Value = serde_json::from_str(example_json()).unwrap();
        json[key] = serde_json::from_str(value).unwrap();
        json.to_string()
    }

    #[test]
    fn parse_example_config() {
        let config = Config::from_json(example_json()).unwrap();
        assert_eq!(config.balancers.len(), 3);
        assert_eq!(config.balancers[0].asset_name, "BTC");
        assert_eq!(config.base_fiat, "THB");
        assert_eq!(config.api_url, "https://api.bitkub.com");
        assert_eq!(config.max_consecutive_failures, None);
        assert_eq!(config.interval().unwrap(), Duration::from_secs(900));
    }

    #[test]
    fn targets_are_exact_decimals() {
        let config = Config::from_json(example_json()).unwrap();
        let targets = config.targets().unwrap();
        assert_eq!(targets[0].target_weight, dec!(0.4));
        assert_eq!(targets[1].target_weight, dec!(0.35));
        assert_eq!(config.trigger_threshold().unwrap(), dec!(0.05));
    }

    #[test]
    fn cycle_settings_carry_dry_run() {
        let config = Config::from_json(example_json()).unwrap();
        let settings = config.cycle_settings(true).unwrap();
        assert!(settings.dry_run);
        assert_eq!(settings.targets.len(), 3);
        assert_eq!(settings.base_fiat, "THB");
    }

    #[test]
    fn fractional_interval() {
        let config = Config::from_json(&with("INTERVAL_MINUTE", "0.5")).unwrap();
        assert_eq!(config.interval().unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn validate_catches_bad_trigger() {
        assert!(Config::from_json(&with("TRIGGER_PERCENT", "1.5")).is_err());
        assert!(Config::from_json(&with("TRIGGER_PERCENT", "-0.1")).is_err());
    }

    #[test]
    fn validate_catches_bad_interval() {
        assert!(Config::from_json(&with("INTERVAL_MINUTE", "0")).is_err());
        assert!(Config::from_json(&with("INTERVAL_MINUTE", "-5")).is_err());
    }

    #[test]
    fn validate_catches_oversized_interval() {
        match Config::from_json(&with("INTERVAL_MINUTE", "1e300")) {
            Err(Error::Config(msg)) => assert!(msg.contains("out of range")),
            other => panic!("expected interval range error, got {other:?}"),
        }
    }

    #[test]
    fn validate_catches_empty_base_fiat() {
        assert!(Config::from_json(&with("BASE_FIAT", "\"\"")).is_err());
    }

    #[test]
    fn validate_catches_overweight_targets() {
        let json = with(
            "BALANCERS",
            r#"[
                { "assetName": "BTC", "expectedPercent": 0.7 },
                { "assetName": "ETH", "expectedPercent": 0.6 },
                { "assetName": "THB", "expectedPercent": 0.1 }
            ]"#,
        );
        match Config::from_json(&json) {
            Err(Error::Rebalance(driftbook::RebalanceError::Config(msg))) => {
                assert!(msg.contains("> 1"));
            }
            other => panic!("expected weight config error, got {other:?}"),
        }
    }

    #[test]
    fn validate_catches_empty_balancers() {
        assert!(Config::from_json(&with("BALANCERS", "[]")).is_err());
    }

    #[test]
    fn validate_catches_zero_failure_limit() {
        assert!(Config::from_json(&with("MAX_CONSECUTIVE_FAILURES", "0")).is_err());
        let config = Config::from_json(&with("MAX_CONSECUTIVE_FAILURES", "3")).unwrap();
        assert_eq!(config.max_consecutive_failures, Some(3));
    }

    #[test]
    fn missing_credentials_rejected() {
        let json = r#"{
            "BALANCERS": [{ "assetName": "BTC", "expectedPercent": 1 }],
            "TRIGGER_PERCENT": 0.05,
            "INTERVAL_MINUTE": 1,
            "BASE_FIAT": "THB"
        }"#;
        assert!(matches!(Config::from_json(json), Err(Error::ConfigParse(_))));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = Config::from_json(example_json()).unwrap();
        let s = format!("{config:?}");
        assert!(!s.contains("secret\""));
        assert!(s.contains("<redacted>"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, example_json()).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.balancers.len(), 3);
    }

    #[test]
    fn load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
