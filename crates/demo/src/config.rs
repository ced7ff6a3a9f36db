//! Demo configuration management

use crate::connection::ConnectionUrl;
use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use hub::{CancellationToken, DetachPolicy, HubModel, HubOptions, WaitConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// LEGO set driven by the demo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Product {
    /// Express Passenger Train (60337), Smart Hub
    ExpressTrain,
    /// Porsche GT4 e-Performance (42176), Technic Move Hub
    PorscheGt4,
}

impl Product {
    pub fn hub_model(&self) -> HubModel {
        match self {
            Product::ExpressTrain => HubModel::SmartHub,
            Product::PorscheGt4 => HubModel::TechnicMoveHub,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    pub demo: DemoSettings,
    #[serde(default)]
    pub readiness: ReadinessSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoSettings {
    pub log_level: String,
    pub model: Product,
    /// `auto://` or `sim://[address][?delay_ms=N]`
    pub connection: String,
    /// Overrides the advertised hub name of the model
    #[serde(default)]
    pub hub_name: Option<String>,
    /// Length of one demo pause step in milliseconds
    #[serde(default = "DemoSettings::default_pace_ms")]
    pub pace_ms: u64,
}

impl DemoSettings {
    fn default_pace_ms() -> u64 {
        1000
    }
}

/// Device wait after connecting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessSettings {
    #[serde(default = "ReadinessSettings::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "ReadinessSettings::default_interval_ms")]
    pub interval_ms: u64,
    /// Wall-clock limit on the whole wait
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    #[serde(default)]
    pub detach_policy: DetachPolicy,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            interval_ms: Self::default_interval_ms(),
            deadline_ms: None,
            detach_policy: DetachPolicy::default(),
        }
    }
}

impl ReadinessSettings {
    fn default_max_attempts() -> u32 {
        hub::waiter::DEFAULT_MAX_ATTEMPTS
    }

    fn default_interval_ms() -> u64 {
        hub::waiter::DEFAULT_INTERVAL.as_millis() as u64
    }

    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig {
            max_attempts: self.max_attempts,
            interval: Duration::from_millis(self.interval_ms),
            deadline: self.deadline_ms.map(Duration::from_millis),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            demo: DemoSettings {
                log_level: "info".to_string(),
                model: Product::ExpressTrain,
                connection: "auto://".to_string(),
                hub_name: None,
                pace_ms: DemoSettings::default_pace_ms(),
            },
            readiness: ReadinessSettings::default(),
        }
    }
}

impl DemoConfig {
    /// Load configuration from the specified path, or the default location
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref()),
            None => {
                let default = Self::default_path();
                if !default.exists() {
                    return Err(anyhow!("No configuration file found, using defaults"));
                }
                default
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: DemoConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("lego-hub").join("demo.toml")
        } else {
            PathBuf::from(".config/lego-hub/demo.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.demo.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.demo.log_level,
                valid_levels.join(", ")
            ));
        }

        self.demo
            .connection
            .parse::<ConnectionUrl>()
            .context("Invalid connection URL")?;

        if let Some(name) = &self.demo.hub_name
            && name.is_empty()
        {
            return Err(anyhow!("Hub name must not be empty"));
        }

        if self.readiness.max_attempts == 0 {
            return Err(anyhow!("readiness.max_attempts must be at least 1"));
        }

        if self.readiness.deadline_ms == Some(0) {
            return Err(anyhow!("readiness.deadline_ms must be greater than 0"));
        }

        Ok(())
    }

    /// Hub runtime options for this configuration
    pub fn hub_options(&self, cancel: CancellationToken) -> HubOptions {
        HubOptions {
            wait: self.readiness.wait_config(),
            detach_policy: self.readiness.detach_policy,
            cancel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DemoConfig::default();
        assert_eq!(config.demo.log_level, "info");
        assert_eq!(config.demo.model, Product::ExpressTrain);
        assert_eq!(config.demo.connection, "auto://");
        assert_eq!(config.readiness.max_attempts, 100);
        assert_eq!(config.readiness.interval_ms, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = DemoConfig::default();
        config.demo.model = Product::PorscheGt4;
        config.readiness.detach_policy = DetachPolicy::Sticky;

        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("model = \"porsche-gt4\""));
        assert!(toml_str.contains("detach_policy = \"sticky\""));

        let parsed: DemoConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.demo.model, Product::PorscheGt4);
        assert_eq!(parsed.readiness.detach_policy, DetachPolicy::Sticky);
    }

    #[test]
    fn test_readiness_section_optional() {
        let config: DemoConfig = toml::from_str(
            r#"
            [demo]
            log_level = "debug"
            model = "express-train"
            connection = "sim://?delay_ms=5"
            "#,
        )
        .unwrap();

        assert_eq!(config.demo.pace_ms, 1000);
        assert_eq!(config.readiness.wait_config(), WaitConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_model_rejected() {
        let result: std::result::Result<DemoConfig, _> = toml::from_str(
            r#"
            [demo]
            log_level = "info"
            model = "millennium-falcon"
            connection = "auto://"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = DemoConfig::default();

        config.demo.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
        config.demo.log_level = "warn".to_string();

        config.demo.connection = "gatt://00-16-53".to_string();
        assert!(config.validate().is_err());
        config.demo.connection = "sim://".to_string();

        config.readiness.max_attempts = 0;
        assert!(config.validate().is_err());
        config.readiness.max_attempts = 5;

        config.demo.hub_name = Some(String::new());
        assert!(config.validate().is_err());
        config.demo.hub_name = Some("HUB NO.4".to_string());

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hub_options() {
        let mut config = DemoConfig::default();
        config.readiness.max_attempts = 7;
        config.readiness.interval_ms = 20;
        config.readiness.deadline_ms = Some(500);

        let options = config.hub_options(CancellationToken::new());
        assert_eq!(options.wait.max_attempts, 7);
        assert_eq!(options.wait.interval, Duration::from_millis(20));
        assert_eq!(options.wait.deadline, Some(Duration::from_millis(500)));
        assert_eq!(options.detach_policy, DetachPolicy::Clear);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("demo.toml");

        let mut config = DemoConfig::default();
        config.demo.hub_name = Some("Technic Move  ".to_string());
        config.demo.pace_ms = 10;
        config.save(&path).unwrap();

        let loaded = DemoConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.demo.hub_name.as_deref(), Some("Technic Move  "));
        assert_eq!(loaded.demo.pace_ms, 10);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.toml");
        fs::write(
            &path,
            "[demo]\nlog_level = \"loud\"\nmodel = \"express-train\"\nconnection = \"auto://\"\n",
        )
        .unwrap();

        assert!(DemoConfig::load(Some(path)).is_err());
        assert!(DemoConfig::load(Some(dir.path().join("missing.toml"))).is_err());
    }
}
