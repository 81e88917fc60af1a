//! Canonical, platform-neutral application model.
//!
//! Field names on the wire follow the keys downstream templates expect
//! (`buildPacks`, `healthCheck`, `logRateLimit`, ...). Metadata, routing and
//! the process template are flattened onto the application record.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Declares a string-backed vocabulary that keeps unrecognized values.
///
/// Unknown values survive decoding as `Other` so the validator can report
/// them instead of the decoder rejecting the whole document.
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub const ACCEPTED: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $text,)+
                    $name::Other(value) => value,
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, $name::Other(_))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($text => $name::$variant,)+
                    _ => $name::Other(value),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name::from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

open_enum! {
    /// Process type. Only `web` and `worker` are accepted.
    ProcessType { Web => "web", Worker => "worker" }
}

open_enum! {
    /// Health or readiness probe mechanism.
    ProbeType { Http => "http", Process => "process", Port => "port" }
}

open_enum! {
    RouteProtocol { Http1 => "http1", Http2 => "http2", Tcp => "tcp" }
}

open_enum! {
    LoadBalancing { RoundRobin => "round-robin", LeastConnection => "least-connection" }
}

open_enum! {
    /// How the platform builds the droplet for a process.
    Lifecycle { Buildpack => "buildpack", Cnb => "cnb", Docker => "docker" }
}

/// Map an optional raw string onto a vocabulary; empty means unset.
pub fn optional_value<T: From<String>>(raw: &str) -> Option<T> {
    if raw.is_empty() {
        None
    } else {
        Some(T::from(raw.to_string()))
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(flatten)]
    pub routes: RouteSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processes: Vec<ProcessSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sidecars: Vec<SidecarSpec>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stack: String,
    /// Seconds the platform waits for the application to start.
    #[serde(default)]
    pub timeout: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_packs: Vec<String>,
    #[serde(default, skip_serializing_if = "Docker::is_empty")]
    pub docker: Docker,
    /// Process-level defaults declared without a process type.
    #[serde(flatten)]
    pub process_template: ProcessSpecTemplate,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    /// Empty when the application comes from a standalone manifest file.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub space: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    #[serde(default, skip_serializing_if = "is_false")]
    pub no_route: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub random_route: bool,
    /// `None` when the source declared no routes block at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<Route>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub route: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<RouteProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RouteOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancing: Option<LoadBalancing>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub binding_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub process_type: Option<ProcessType>,
    #[serde(flatten)]
    pub template: ProcessSpecTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSpecTemplate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(rename = "disk", default, skip_serializing_if = "String::is_empty")]
    pub disk_quota: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memory: String,
    #[serde(default, skip_serializing_if = "ProbeSpec::is_empty")]
    pub health_check: ProbeSpec,
    #[serde(default, skip_serializing_if = "ProbeSpec::is_empty")]
    pub readiness_check: ProbeSpec,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub instances: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log_rate_limit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,
}

impl ProcessSpecTemplate {
    pub fn is_empty(&self) -> bool {
        *self == ProcessSpecTemplate::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSpec {
    #[serde(default)]
    pub endpoint: String,
    /// Seconds a single probe invocation may take.
    #[serde(rename = "timeout", default)]
    pub invocation_timeout: i64,
    /// Seconds between probe invocations.
    #[serde(default)]
    pub interval: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub probe_type: Option<ProbeType>,
}

impl ProbeSpec {
    pub fn is_empty(&self) -> bool {
        *self == ProbeSpec::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarSpec {
    #[serde(default)]
    pub name: String,
    /// Always present on the wire, possibly as an empty list.
    #[serde(default)]
    pub process_types: Vec<ProcessType>,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub memory: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docker {
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
}

impl Docker {
    pub fn is_empty(&self) -> bool {
        self.image.is_empty() && self.username.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_enum_keeps_unknown_values() {
        assert_eq!(ProcessType::from("web"), ProcessType::Web);
        let other = ProcessType::from("task");
        assert!(!other.is_known());
        assert_eq!(other.as_str(), "task");
        assert_eq!(
            LoadBalancing::from("least-connection"),
            LoadBalancing::LeastConnection
        );
    }

    #[test]
    fn optional_value_treats_empty_as_unset() {
        assert_eq!(optional_value::<RouteProtocol>(""), None);
        assert_eq!(
            optional_value::<RouteProtocol>("http2"),
            Some(RouteProtocol::Http2)
        );
    }

    #[test]
    fn sidecar_process_types_serialize_even_when_empty() {
        let sidecar = SidecarSpec {
            name: "logger".to_string(),
            process_types: Vec::new(),
            command: "run-logger".to_string(),
            memory: "256M".to_string(),
        };
        let value = serde_json::to_value(&sidecar).expect("serialize sidecar");
        assert_eq!(value["processTypes"], serde_json::json!([]));
    }
}
