//! Raw Cloud Foundry manifest shape.
//!
//! Mirrors the upstream manifest schema, including the legacy convention of
//! declaring process fields inline on the application record. Both source
//! adapters produce this shape; the normalizer consumes it.
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

/// A single application entry of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppManifest {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buildpacks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker: Option<AppManifestDocker>,
    #[serde(
        deserialize_with = "deserialize_env",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub env: BTreeMap<String, String>,
    #[serde(rename = "random-route", skip_serializing_if = "is_false")]
    pub random_route: bool,
    #[serde(rename = "no-route", skip_serializing_if = "is_false")]
    pub no_route: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<AppManifestRoute>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<AppManifestService>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidecars: Option<Vec<AppManifestSidecar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processes: Option<Vec<AppManifestProcess>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stack: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AppMetadata>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, bool>,
    /// Process fields declared directly on the application record.
    #[serde(flatten)]
    pub process: AppManifestProcess,
}

impl AppManifest {
    /// True when decoding produced nothing at all, which is how a
    /// multi-application document looks through the single-app shape.
    pub fn is_zero(&self) -> bool {
        *self == AppManifest::default()
    }
}

/// Process-level fields, used both inline and as `processes` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppManifestProcess {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub process_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(rename = "disk_quota", skip_serializing_if = "String::is_empty")]
    pub disk_quota: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub health_check_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub health_check_http_endpoint: String,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub health_check_invocation_timeout: u32,
    /// `None` distinguishes an absent count from an explicit one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub log_rate_limit_per_second: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub memory: String,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub timeout: i64,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub health_check_interval: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub readiness_health_check_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub readiness_health_check_http_endpoint: String,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub readiness_health_invocation_timeout: u32,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub readiness_health_check_interval: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub lifecycle: String,
}

impl AppManifestProcess {
    pub fn is_zero(&self) -> bool {
        *self == AppManifestProcess::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppManifestDocker {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppManifestRoute {
    pub route: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<AppRouteOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppRouteOptions {
    #[serde(rename = "loadbalancing", skip_serializing_if = "String::is_empty")]
    pub load_balancing: String,
}

/// A service binding, written either as a bare instance name or as a map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ServiceEntry")]
pub struct AppManifestService {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub binding_name: String,
    /// Kept untyped until normalization so a malformed value is reported
    /// against its position in the list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl AppManifestService {
    pub fn named(name: impl Into<String>) -> Self {
        AppManifestService {
            name: name.into(),
            ..AppManifestService::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServiceEntry {
    Name(String),
    Binding(ServiceBinding),
}

#[derive(Deserialize)]
struct ServiceBinding {
    #[serde(default)]
    name: String,
    #[serde(default)]
    binding_name: String,
    #[serde(default)]
    parameters: Option<Value>,
}

impl From<ServiceEntry> for AppManifestService {
    fn from(entry: ServiceEntry) -> Self {
        match entry {
            ServiceEntry::Name(name) => AppManifestService::named(name),
            ServiceEntry::Binding(binding) => AppManifestService {
                name: binding.name,
                binding_name: binding.binding_name,
                parameters: binding.parameters,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppManifestSidecar {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub process_types: Vec<String>,
    pub command: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub memory: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, Option<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, Option<String>>,
}

/// Multi-application manifest document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudFoundryManifest {
    #[serde(
        deserialize_with = "deserialize_scalar",
        skip_serializing_if = "String::is_empty"
    )]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub space: String,
    pub applications: Vec<AppManifest>,
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn deserialize_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(value).ok_or_else(|| de::Error::custom("expected a scalar value"))
}

/// Manifests commonly write `PORT: 8080` or `DEBUG: true`; the platform
/// treats every environment value as a string.
fn deserialize_env<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    let mut env = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let text = scalar_to_string(value).ok_or_else(|| {
            de::Error::custom(format!("env value for {key:?} must be a scalar"))
        })?;
        env.insert(key, text);
    }
    Ok(env)
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
