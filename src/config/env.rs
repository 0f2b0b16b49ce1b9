//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "K8S_IPERF3";

/// Kubeconfig used when neither a flag, `KUBECONFIG` nor a home directory exists
const FALLBACK_KUBECONFIG: &str = ".kubeconfig";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvConfig {
    /// Namespace from K8S_IPERF3_NAMESPACE
    pub namespace: Option<String>,
    /// Image from K8S_IPERF3_IMAGE
    pub image: Option<String>,
    /// Client duration from K8S_IPERF3_DURATION
    pub duration: Option<u64>,
    /// Poll interval from K8S_IPERF3_POLL_INTERVAL_MS
    pub poll_interval_ms: Option<u64>,
    /// Config file from K8S_IPERF3_CONFIG
    pub config_file: Option<String>,
    /// Verbose from K8S_IPERF3_VERBOSE
    pub verbose: Option<bool>,
    /// Kubeconfig from KUBECONFIG
    pub kubeconfig: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}")).filter(|v| !v.is_empty());

        Self {
            namespace: get("NAMESPACE"),
            image: get("IMAGE"),
            duration: get("DURATION").and_then(|v| v.parse().ok()),
            poll_interval_ms: get("POLL_INTERVAL_MS").and_then(|v| v.parse().ok()),
            config_file: get("CONFIG"),
            verbose: get("VERBOSE").map(|v| parse_bool(&v)),
            kubeconfig: lookup("KUBECONFIG").filter(|v| !v.is_empty()),
        }
    }

    /// Kubeconfig path: explicit flag, then `KUBECONFIG`, then
    /// `~/.kube/config`, then `.kubeconfig`
    pub fn kubeconfig_path(&self, explicit: Option<&str>) -> KubeconfigPath {
        resolve_kubeconfig(
            explicit,
            self.kubeconfig.as_deref(),
            dirs::home_dir().as_deref(),
        )
    }
}

/// Where a kubeconfig path was taken from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KubeconfigSource {
    Flag,
    Environment,
    Default,
}

/// Resolved kubeconfig location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KubeconfigPath {
    pub path: PathBuf,
    pub source: KubeconfigSource,
}

impl KubeconfigPath {
    fn new(path: impl Into<PathBuf>, source: KubeconfigSource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    /// A path the user asked for must exist; only the default may fall
    /// back to the inferred configuration
    pub fn is_required(&self) -> bool {
        self.source != KubeconfigSource::Default
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

fn resolve_kubeconfig(
    explicit: Option<&str>,
    env_value: Option<&str>,
    home: Option<&Path>,
) -> KubeconfigPath {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return KubeconfigPath::new(path, KubeconfigSource::Flag);
    }

    // KUBECONFIG may list several files; the first one wins
    if let Some(first) = env_value.and_then(|v| env::split_paths(v).next()) {
        if !first.as_os_str().is_empty() {
            return KubeconfigPath::new(first, KubeconfigSource::Environment);
        }
    }

    let path = match home {
        Some(home) => home.join(".kube").join("config"),
        None => PathBuf::from(FALLBACK_KUBECONFIG),
    };
    KubeconfigPath::new(path, KubeconfigSource::Default)
}

/// Print the recognised environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_NAMESPACE         Namespace for the iperf3 pods");
    println!("  {ENV_PREFIX}_IMAGE             iperf3 container image");
    println!("  {ENV_PREFIX}_DURATION          Client run time in seconds");
    println!("  {ENV_PREFIX}_POLL_INTERVAL_MS  Pod status poll interval");
    println!("  {ENV_PREFIX}_CONFIG            Path to configuration file");
    println!("  {ENV_PREFIX}_VERBOSE           Enable debug logging (true/false)");
    println!("  KUBECONFIG                    Path to kubeconfig file");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::from_lookup(lookup(&[]));
        assert_eq!(config, EnvConfig::default());
    }

    #[test]
    fn test_env_config_prefixed_vars() {
        let config = EnvConfig::from_lookup(lookup(&[
            ("K8S_IPERF3_NAMESPACE", "bench"),
            ("K8S_IPERF3_DURATION", "30"),
            ("K8S_IPERF3_POLL_INTERVAL_MS", "fast"),
            ("K8S_IPERF3_VERBOSE", "yes"),
            ("KUBECONFIG", "/etc/kube/admin.conf"),
        ]));

        assert_eq!(config.namespace.as_deref(), Some("bench"));
        assert_eq!(config.duration, Some(30));
        assert_eq!(config.poll_interval_ms, None);
        assert_eq!(config.verbose, Some(true));
        assert_eq!(config.kubeconfig.as_deref(), Some("/etc/kube/admin.conf"));
    }

    #[test]
    fn test_resolve_kubeconfig_precedence() {
        let home = Path::new("/home/bench");

        assert_eq!(
            resolve_kubeconfig(Some("/tmp/kc"), Some("/etc/kc"), Some(home)),
            KubeconfigPath::new("/tmp/kc", KubeconfigSource::Flag)
        );
        assert_eq!(
            resolve_kubeconfig(None, Some("/etc/kc"), Some(home)),
            KubeconfigPath::new("/etc/kc", KubeconfigSource::Environment)
        );
        assert_eq!(
            resolve_kubeconfig(None, None, Some(home)),
            KubeconfigPath::new("/home/bench/.kube/config", KubeconfigSource::Default)
        );
        assert_eq!(
            resolve_kubeconfig(None, None, None),
            KubeconfigPath::new(".kubeconfig", KubeconfigSource::Default)
        );
    }

    #[test]
    fn test_only_default_kubeconfig_is_optional() {
        let home = Path::new("/home/bench");

        assert!(resolve_kubeconfig(Some("/etc/kube/prod.conf"), None, Some(home)).is_required());
        assert!(resolve_kubeconfig(None, Some("/etc/kc"), Some(home)).is_required());
        assert!(!resolve_kubeconfig(None, None, Some(home)).is_required());
        assert!(!resolve_kubeconfig(Some(""), Some(""), None).is_required());
    }
}
