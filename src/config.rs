//! Discovery configuration helpers.
//!
//! A config file (JSON or YAML) supplies defaults; command-line flags are
//! layered on top by the binary before `validate_config` runs.
use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the CF CLI home directory.
pub const CF_HOME_ENV: &str = "CF_HOME";
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Control-plane flavor reached by live discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Classic Cloud Foundry API with token auth.
    #[default]
    Cf,
    /// Kubernetes-native CF API with client-certificate auth.
    Korifi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Manifest file (or directory, for listing) used instead of a live API.
    pub manifest_path: Option<PathBuf>,
    pub platform: Platform,
    pub api_endpoint: Option<String>,
    pub cf_home: Option<PathBuf>,
    pub kubeconfig: Option<PathBuf>,
    pub korifi_username: Option<String>,
    pub skip_ssl_validation: bool,
    pub space_names: Vec<String>,
    /// Replace secrets with placeholders in the discovered content.
    pub redact: bool,
    /// Metadata version applied when the source does not set one.
    pub version: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            manifest_path: None,
            platform: Platform::Cf,
            api_endpoint: None,
            cf_home: None,
            kubeconfig: None,
            korifi_username: None,
            skip_ssl_validation: false,
            space_names: Vec::new(),
            redact: true,
            version: None,
        }
    }
}

pub fn default_config() -> DiscoveryConfig {
    DiscoveryConfig::default()
}

/// Load a config file; `.json` is parsed as JSON, anything else as YAML.
pub fn load_config(path: &Path) -> Result<DiscoveryConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config: DiscoveryConfig = if is_json {
        serde_json::from_str(&text).with_context(|| format!("parse config JSON {}", path.display()))?
    } else {
        serde_yaml::from_str(&text).with_context(|| format!("parse config YAML {}", path.display()))?
    };
    Ok(config)
}

/// Reject settings that contradict each other.
pub fn validate_config(config: &DiscoveryConfig) -> Result<()> {
    if let Some(endpoint) = config.api_endpoint.as_deref() {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(anyhow!(
                "api_endpoint must be an http(s) URL (got {endpoint:?})"
            ));
        }
    }
    if let Some(version) = config.version.as_deref() {
        if version.trim().is_empty() {
            return Err(anyhow!("version must be non-empty when set"));
        }
    }
    if config.space_names.iter().any(|name| name.trim().is_empty()) {
        return Err(anyhow!("space_names must not contain empty entries"));
    }
    if config.platform == Platform::Cf
        && (config.kubeconfig.is_some() || config.korifi_username.is_some())
    {
        return Err(anyhow!(
            "kubeconfig and korifi_username only apply to the korifi platform"
        ));
    }
    Ok(())
}

/// Checks that must pass before live discovery issues any request.
pub fn validate_live_request(config: &DiscoveryConfig, space: &str, app: &str) -> Result<()> {
    if space.trim().is_empty() {
        return Err(anyhow!("no space provided for live discovery"));
    }
    if app.trim().is_empty() {
        return Err(anyhow!("no application name provided for live discovery"));
    }
    validate_live_target(config)
}

/// Endpoint and credential settings the selected platform cannot do without.
pub fn validate_live_target(config: &DiscoveryConfig) -> Result<()> {
    if config.platform == Platform::Korifi {
        if config.api_endpoint.is_none() {
            return Err(anyhow!("korifi discovery requires api_endpoint"));
        }
        if config.korifi_username.is_none() {
            return Err(anyhow!("korifi discovery requires korifi_username"));
        }
    }
    Ok(())
}

/// Directory holding `.cf/config.json`: config value, then `$CF_HOME`, then home.
pub fn resolve_cf_home(config: &DiscoveryConfig) -> Result<PathBuf> {
    if let Some(home) = &config.cf_home {
        return Ok(home.clone());
    }
    if let Some(home) = env::var_os(CF_HOME_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory for CF config"))
}

/// Kubeconfig path: config value, then `$KUBECONFIG`, then `~/.kube/config`.
pub fn resolve_kubeconfig(config: &DiscoveryConfig) -> Result<PathBuf> {
    if let Some(path) = &config.kubeconfig {
        return Ok(path.clone());
    }
    if let Some(path) = env::var_os(KUBECONFIG_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home =
        dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory for kubeconfig"))?;
    Ok(home.join(".kube").join("config"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
