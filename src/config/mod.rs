//! Configuration module
//!
//! Handles loading and layering configuration: defaults, then an optional
//! YAML/JSON file, then environment variables, then command-line flags.

mod env;

pub use env::{print_env_help, EnvConfig, KubeconfigPath};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::executor::{ControllerSettings, PollPolicy};

/// Time a client pod needs beyond its iperf3 run to be scheduled, pull the
/// image and exit
const POD_STARTUP_MARGIN_SECS: u64 = 30;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Namespace for the iperf3 pods
    pub namespace: String,

    /// iperf3 container image
    pub image: String,

    /// iperf3 client run time in seconds
    pub duration_secs: u64,

    /// Interval samples discarded at the start of each client log
    pub omit_start: usize,

    /// Interval samples discarded at the end of each client log
    pub omit_end: usize,

    /// Pod status poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Ceiling for server pods to get an address
    pub address_timeout_secs: u64,

    /// Ceiling for client pods to finish
    pub completion_timeout_secs: u64,

    /// Ceiling for each pod deletion during cleanup
    pub delete_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            image: "networkstatic/iperf3".to_string(),
            duration_secs: 70,
            omit_start: 10,
            omit_end: 10,
            poll_interval_ms: 1000,
            address_timeout_secs: 300,
            completion_timeout_secs: 600,
            delete_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if is_yaml_file(path.as_ref()) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Overlay values set in the environment
    pub fn apply_env(mut self, env: &EnvConfig) -> Self {
        if let Some(namespace) = &env.namespace {
            self.namespace = namespace.clone();
        }
        if let Some(image) = &env.image {
            self.image = image.clone();
        }
        if let Some(duration) = env.duration {
            self.duration_secs = duration;
        }
        if let Some(interval) = env.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        self
    }

    /// Reject settings that cannot produce a measurement
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            bail!("namespace must not be empty");
        }
        if self.image.is_empty() {
            bail!("image must not be empty");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll interval must be positive");
        }
        // iperf3 prints one interval line per second of run time
        if self.duration_secs as usize <= self.omit_start + self.omit_end {
            bail!(
                "duration of {}s leaves no samples after omitting {} + {}",
                self.duration_secs,
                self.omit_start,
                self.omit_end
            );
        }
        let required = self.duration_secs.saturating_add(POD_STARTUP_MARGIN_SECS);
        if self.completion_timeout_secs < required {
            bail!(
                "completion timeout of {}s must be at least the {}s run time plus {}s for pod startup",
                self.completion_timeout_secs,
                self.duration_secs,
                POD_STARTUP_MARGIN_SECS
            );
        }
        if self.address_timeout_secs == 0 || self.delete_timeout_secs == 0 {
            bail!("address and delete timeouts must be positive");
        }
        Ok(())
    }

    /// Settings for the workload controller
    pub fn controller_settings(&self) -> ControllerSettings {
        let interval = Duration::from_millis(self.poll_interval_ms);

        ControllerSettings {
            image: self.image.clone(),
            duration_secs: self.duration_secs,
            omit_start: self.omit_start,
            omit_end: self.omit_end,
            address_poll: PollPolicy::new(
                interval,
                Duration::from_secs(self.address_timeout_secs),
            ),
            completion_poll: PollPolicy::new(
                interval,
                Duration::from_secs(self.completion_timeout_secs),
            ),
            delete_timeout: Duration::from_secs(self.delete_timeout_secs),
        }
    }
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.duration_secs, 70);
        assert!(config.validate().is_ok());
        assert_eq!(config.controller_settings(), ControllerSettings::default());
    }

    #[test]
    fn test_load_partial_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("k8s-iperf3.yaml");
        std::fs::write(&path, "namespace: bench\nduration_secs: 30\nomit_end: 5\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.namespace, "bench");
        assert_eq!(config.duration_secs, 30);
        assert_eq!(config.omit_start, 10);
        assert_eq!(config.omit_end, 5);
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("k8s-iperf3.json");
        let config = AppConfig {
            image: "registry.local/iperf3:3.16".to_string(),
            ..Default::default()
        };

        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ namespace").unwrap();

        assert!(AppConfig::load(&path).is_err());
        assert!(AppConfig::load(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_apply_env() {
        let env = EnvConfig {
            namespace: Some("perf".to_string()),
            duration: Some(40),
            ..Default::default()
        };

        let config = AppConfig::default().apply_env(&env);
        assert_eq!(config.namespace, "perf");
        assert_eq!(config.duration_secs, 40);
        assert_eq!(config.image, "networkstatic/iperf3");
    }

    #[test]
    fn test_validate_rejects_exhausting_omits() {
        let config = AppConfig {
            duration_secs: 20,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_run_longer_than_completion_timeout() {
        let config = AppConfig {
            duration_secs: 900,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            completion_timeout_secs: 70,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            duration_secs: 900,
            completion_timeout_secs: 930,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let config = AppConfig {
            delete_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            address_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
