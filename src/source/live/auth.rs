//! Control-plane credentials.
//!
//! Classic CF reuses the token the `cf` CLI stored after `cf login`; Korifi
//! authenticates with the client certificate of a kubeconfig user.
use crate::config::{resolve_cf_home, resolve_kubeconfig, DiscoveryConfig, Platform};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Full `Authorization` value as stored by the CF CLI (`bearer ...`).
    Token(String),
    /// Base64 of the PEM certificate followed by its PEM key.
    ClientCert(String),
}

impl Credentials {
    pub fn authorization(&self) -> String {
        match self {
            Credentials::Token(token) => token.clone(),
            Credentials::ClientCert(blob) => format!("ClientCert {blob}"),
        }
    }
}

/// Everything needed to build an API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTarget {
    pub api_endpoint: String,
    pub credentials: Credentials,
    pub skip_ssl_validation: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct CfCliConfig {
    target: String,
    access_token: String,
    #[serde(rename = "SSLDisabled")]
    ssl_disabled: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KubeConfig {
    users: Vec<NamedKubeUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NamedKubeUser {
    name: String,
    user: KubeUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct KubeUser {
    client_certificate_data: Option<String>,
    client_key_data: Option<String>,
}

/// Resolve endpoint and credentials for the configured platform.
///
/// Reads local files only; no request is issued here.
pub fn resolve_target(config: &DiscoveryConfig) -> Result<ApiTarget> {
    match config.platform {
        Platform::Cf => cf_target(config),
        Platform::Korifi => korifi_target(config),
    }
}

fn cf_target(config: &DiscoveryConfig) -> Result<ApiTarget> {
    let path = resolve_cf_home(config)?.join(".cf").join("config.json");
    let text = fs::read_to_string(&path)
        .with_context(|| format!("read CF CLI config {}", path.display()))?;
    cf_target_from_str(&text, config, &path)
}

fn cf_target_from_str(text: &str, config: &DiscoveryConfig, path: &Path) -> Result<ApiTarget> {
    let cli: CfCliConfig = serde_json::from_str(text)
        .with_context(|| format!("parse CF CLI config {}", path.display()))?;
    let api_endpoint = config
        .api_endpoint
        .clone()
        .filter(|endpoint| !endpoint.is_empty())
        .unwrap_or(cli.target);
    if api_endpoint.is_empty() {
        return Err(anyhow!(
            "no CF API endpoint: set api_endpoint or target one with the cf CLI"
        ));
    }
    if cli.access_token.is_empty() {
        return Err(anyhow!(
            "no access token in {}; log in with the cf CLI first",
            path.display()
        ));
    }
    Ok(ApiTarget {
        api_endpoint,
        credentials: Credentials::Token(cli.access_token),
        skip_ssl_validation: config.skip_ssl_validation || cli.ssl_disabled,
    })
}

fn korifi_target(config: &DiscoveryConfig) -> Result<ApiTarget> {
    let api_endpoint = config
        .api_endpoint
        .clone()
        .ok_or_else(|| anyhow!("korifi discovery requires api_endpoint"))?;
    let username = config
        .korifi_username
        .as_deref()
        .ok_or_else(|| anyhow!("korifi discovery requires korifi_username"))?;
    let path = resolve_kubeconfig(config)?;
    let text = fs::read_to_string(&path)
        .with_context(|| format!("read kubeconfig {}", path.display()))?;
    let blob = client_cert_blob(&text, username)
        .with_context(|| format!("load client certificate from {}", path.display()))?;
    // Korifi clusters serve self-signed certificates.
    Ok(ApiTarget {
        api_endpoint,
        credentials: Credentials::ClientCert(blob),
        skip_ssl_validation: true,
    })
}

/// Concatenate the decoded certificate and key of `username` and re-encode
/// them as one base64 blob.
pub fn client_cert_blob(kubeconfig: &str, username: &str) -> Result<String> {
    let config: KubeConfig = serde_yaml::from_str(kubeconfig).context("parse kubeconfig")?;
    let user = config
        .users
        .into_iter()
        .find(|entry| entry.name == username)
        .map(|entry| entry.user)
        .ok_or_else(|| anyhow!("user {username:?} not found in kubeconfig"))?;
    let (Some(cert), Some(key)) = (user.client_certificate_data, user.client_key_data) else {
        return Err(anyhow!("could not find certificate data for user {username:?}"));
    };
    let mut pem = BASE64_STANDARD
        .decode(cert.trim())
        .context("decode client-certificate-data")?;
    let key = BASE64_STANDARD
        .decode(key.trim())
        .context("decode client-key-data")?;
    pem.extend_from_slice(&key);
    Ok(BASE64_STANDARD.encode(pem))
}
