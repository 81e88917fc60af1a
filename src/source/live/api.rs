//! v3 REST client shared by classic CF and Korifi.
//!
//! Only the resource fields discovery reads are modelled; everything else in
//! the responses is ignored.
use super::auth::ApiTarget;
use super::ControlPlane;
use crate::util::truncate_string;
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use ureq::tls::TlsConfig;
use ureq::Agent;

const MAX_ERROR_BODY: usize = 512;
const PAGE_SIZE: &str = "100";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct App {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub lifecycle: Lifecycle,
    #[serde(default)]
    pub metadata: ResourceMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Lifecycle {
    /// `buildpack`, `cnb` or `docker`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: LifecycleData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LifecycleData {
    #[serde(default)]
    pub buildpacks: Vec<String>,
    #[serde(default)]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceMetadata {
    #[serde(default)]
    pub labels: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppEnv {
    #[serde(default)]
    pub environment_variables: BTreeMap<String, Value>,
    /// Holds `VCAP_SERVICES` among others.
    #[serde(default)]
    pub system_env_json: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Process {
    #[serde(default)]
    pub guid: String,
    #[serde(rename = "type")]
    pub process_type: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub instances: u32,
    #[serde(default)]
    pub memory_in_mb: u64,
    #[serde(default)]
    pub disk_in_mb: u64,
    /// `-1` means unlimited.
    #[serde(default)]
    pub log_rate_limit_in_bytes_per_second: Option<i64>,
    #[serde(default)]
    pub health_check: HealthCheck,
    #[serde(default)]
    pub readiness_health_check: HealthCheck,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthCheck {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: HealthCheckData,
}

/// Which fields are present depends on the check type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthCheckData {
    /// Seconds the process may take to start.
    #[serde(default)]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub invocation_timeout: Option<u32>,
    #[serde(default)]
    pub interval: Option<u32>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Route {
    pub guid: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub options: Option<RouteOptions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteOptions {
    #[serde(default)]
    pub loadbalancing: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Destination {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sidecar {
    #[serde(default)]
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub process_types: Vec<String>,
    #[serde(default)]
    pub memory_in_mb: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Droplet {
    #[serde(default)]
    pub guid: String,
    /// Set for docker-lifecycle droplets only.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default)]
    pagination: Pagination,
    resources: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    next: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[derive(Debug, Deserialize)]
struct DestinationList {
    #[serde(default)]
    destinations: Vec<Destination>,
}

/// Blocking client over one explicit `ureq::Agent`.
pub struct CfApiClient {
    agent: Agent,
    base_url: String,
    authorization: String,
}

impl CfApiClient {
    pub fn new(target: &ApiTarget) -> Self {
        let tls_config = TlsConfig::builder()
            .disable_verification(target.skip_ssl_validation)
            .build();
        let agent = Agent::config_builder()
            .tls_config(tls_config)
            .build()
            .new_agent();
        CfApiClient {
            agent,
            base_url: target.api_endpoint.trim_end_matches('/').to_string(),
            authorization: target.credentials.authorization(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        resource: &str,
    ) -> Result<T> {
        let mut request = self
            .agent
            .get(url)
            .header("Authorization", self.authorization.as_str())
            .header("Accept", "application/json");
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        tracing::debug!(resource, url, "GET");
        let response = request.call().map_err(|err| match err {
            ureq::Error::StatusCode(code) => {
                anyhow!("{resource} request to {url} returned HTTP {code}")
            }
            other => anyhow!("{resource} request to {url} failed: {other}"),
        })?;
        let body = response
            .into_body()
            .read_to_string()
            .with_context(|| format!("read {resource} response body"))?;
        serde_json::from_str(&body).with_context(|| {
            format!(
                "decode {resource} response: {}",
                truncate_string(body.trim(), MAX_ERROR_BODY)
            )
        })
    }

    /// Fetch every page of a list endpoint, following `pagination.next`.
    fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        resource: &str,
    ) -> Result<Vec<T>> {
        let mut first_query = vec![("per_page", PAGE_SIZE)];
        first_query.extend_from_slice(query);
        let mut page: ListResponse<T> = self.get_json(&self.url(path), &first_query, resource)?;
        let mut resources = Vec::new();
        loop {
            resources.append(&mut page.resources);
            let Some(next) = page.pagination.next.take() else {
                break;
            };
            page = self.get_json(&next.href, &[], resource)?;
        }
        Ok(resources)
    }
}

impl ControlPlane for CfApiClient {
    fn find_spaces(&self, name: &str) -> Result<Vec<Space>> {
        self.list_all("/v3/spaces", &[("names", name)], "spaces")
    }

    fn find_apps(&self, space_guid: &str, name: &str) -> Result<Vec<App>> {
        self.list_all(
            "/v3/apps",
            &[("space_guids", space_guid), ("names", name)],
            "apps",
        )
    }

    fn list_apps(&self, space_guid: &str) -> Result<Vec<App>> {
        self.list_all("/v3/apps", &[("space_guids", space_guid)], "apps")
    }

    fn app_env(&self, app_guid: &str) -> Result<AppEnv> {
        let url = self.url(&format!("/v3/apps/{app_guid}/env"));
        self.get_json(&url, &[], "app environment")
    }

    fn app_processes(&self, app_guid: &str) -> Result<Vec<Process>> {
        self.list_all(&format!("/v3/apps/{app_guid}/processes"), &[], "processes")
    }

    fn app_routes(&self, app_guid: &str) -> Result<Vec<Route>> {
        self.list_all(&format!("/v3/apps/{app_guid}/routes"), &[], "routes")
    }

    fn route_destinations(&self, route_guid: &str) -> Result<Vec<Destination>> {
        let url = self.url(&format!("/v3/routes/{route_guid}/destinations"));
        let list: DestinationList = self.get_json(&url, &[], "route destinations")?;
        Ok(list.destinations)
    }

    fn app_sidecars(&self, app_guid: &str) -> Result<Vec<Sidecar>> {
        self.list_all(&format!("/v3/apps/{app_guid}/sidecars"), &[], "sidecars")
    }

    fn current_droplet(&self, app_guid: &str) -> Result<Droplet> {
        let url = self.url(&format!("/v3/apps/{app_guid}/droplets/current"));
        self.get_json(&url, &[], "current droplet")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::live::auth::Credentials;
    use serde_json::json;

    #[test]
    fn process_resource_decodes_optional_probe_fields() {
        let process: Process = serde_json::from_value(json!({
            "guid": "p-1",
            "type": "web",
            "command": null,
            "instances": 2,
            "memory_in_mb": 512,
            "disk_in_mb": 1024,
            "log_rate_limit_in_bytes_per_second": -1,
            "health_check": {"type": "http", "data": {"timeout": 60, "invocation_timeout": 2, "endpoint": "/up"}},
            "readiness_health_check": {"type": "process", "data": {"invocation_timeout": null, "interval": null}},
            "relationships": {}
        }))
        .expect("decode process");
        assert_eq!(process.process_type, "web");
        assert_eq!(process.command, None);
        assert_eq!(process.health_check.data.endpoint.as_deref(), Some("/up"));
        assert_eq!(process.health_check.data.invocation_timeout, Some(2));
        assert_eq!(process.readiness_health_check.kind, "process");
        assert_eq!(process.readiness_health_check.data.interval, None);
    }

    #[test]
    fn route_resource_decodes_load_balancing_option() {
        let route: Route = serde_json::from_value(json!({
            "guid": "r-1",
            "url": "orders.example.com",
            "options": {"loadbalancing": "least-connection"}
        }))
        .expect("decode route");
        assert_eq!(
            route.options.and_then(|options| options.loadbalancing).as_deref(),
            Some("least-connection")
        );

        let bare: Route = serde_json::from_value(json!({"guid": "r-2", "url": "b.example.com", "options": {}}))
            .expect("decode bare route");
        assert!(bare.options.and_then(|options| options.loadbalancing).is_none());
    }

    #[test]
    fn list_response_exposes_next_page() {
        let page: ListResponse<Space> = serde_json::from_value(json!({
            "pagination": {"total_results": 2, "next": {"href": "https://api/v3/spaces?page=2"}},
            "resources": [{"guid": "s-1", "name": "dev"}]
        }))
        .expect("decode page");
        assert_eq!(page.resources.len(), 1);
        assert_eq!(
            page.pagination.next.map(|link| link.href).as_deref(),
            Some("https://api/v3/spaces?page=2")
        );

        let last: ListResponse<Space> =
            serde_json::from_value(json!({"pagination": {"next": null}, "resources": []}))
                .expect("decode last page");
        assert!(last.pagination.next.is_none());
    }

    #[test]
    fn client_trims_trailing_slash_from_endpoint() {
        let client = CfApiClient::new(&ApiTarget {
            api_endpoint: "https://api.example.com/".to_string(),
            credentials: Credentials::Token("bearer t".to_string()),
            skip_ssl_validation: false,
        });
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(client.url("/v3/apps"), "https://api.example.com/v3/apps");
    }
}
