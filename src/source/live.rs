//! Live control-plane adapter.
//!
//! [`ControlPlane`] is the seam between HTTP and assembly: the functions in
//! this module only see decoded v3 resources, so they run unchanged against
//! [`api::CfApiClient`] or a test double.
pub mod api;
pub mod auth;
pub mod vcap;

use crate::config::{DiscoveryConfig, Platform};
use crate::manifest::{
    AppManifest, AppManifestDocker, AppManifestProcess, AppManifestRoute, AppManifestSidecar,
    AppMetadata, AppRouteOptions,
};
use crate::util::normalize_metadata_name;
use anyhow::{anyhow, Context, Result};
use api::{App, AppEnv, CfApiClient, Destination, Droplet, HealthCheck, Process, Route, Sidecar, Space};
use serde_json::Value;
use std::collections::BTreeMap;

const BUILDPACK_LIFECYCLE: &str = "buildpack";
const DOCKER_LIFECYCLE: &str = "docker";

/// Read access to the v3 resources discovery needs.
pub trait ControlPlane {
    /// Spaces whose name equals `name`.
    fn find_spaces(&self, name: &str) -> Result<Vec<Space>>;
    /// Applications named `name` inside one space.
    fn find_apps(&self, space_guid: &str, name: &str) -> Result<Vec<App>>;
    fn list_apps(&self, space_guid: &str) -> Result<Vec<App>>;
    fn app_env(&self, app_guid: &str) -> Result<AppEnv>;
    fn app_processes(&self, app_guid: &str) -> Result<Vec<Process>>;
    fn app_routes(&self, app_guid: &str) -> Result<Vec<Route>>;
    fn route_destinations(&self, route_guid: &str) -> Result<Vec<Destination>>;
    fn app_sidecars(&self, app_guid: &str) -> Result<Vec<Sidecar>>;
    fn current_droplet(&self, app_guid: &str) -> Result<Droplet>;
}

/// Resolve the configured endpoint and credentials and build a client.
pub fn connect(config: &DiscoveryConfig) -> Result<CfApiClient> {
    let target = auth::resolve_target(config)?;
    tracing::info!(
        endpoint = %target.api_endpoint,
        platform = ?config.platform,
        skip_ssl_validation = target.skip_ssl_validation,
        "connecting to control plane"
    );
    Ok(CfApiClient::new(&target))
}

fn exactly_one<T>(mut items: Vec<T>, kind: &str, name: &str) -> Result<T> {
    match items.len() {
        0 => Err(anyhow!("{kind} {name:?} not found")),
        1 => Ok(items.remove(0)),
        count => Err(anyhow!("{kind} {name:?} is ambiguous: {count} matches")),
    }
}

pub fn resolve_space(cp: &dyn ControlPlane, name: &str) -> Result<Space> {
    let spaces = cp
        .find_spaces(name)
        .with_context(|| format!("look up space {name:?}"))?;
    exactly_one(spaces, "space", name)
}

pub fn resolve_app(cp: &dyn ControlPlane, space: &Space, name: &str) -> Result<App> {
    let apps = cp
        .find_apps(&space.guid, name)
        .with_context(|| format!("look up application {name:?} in space {:?}", space.name))?;
    exactly_one(apps, "application", name)
}

/// Look up `app_name` in `space_name` and assemble its manifest.
pub fn manifest_for_app(
    cp: &dyn ControlPlane,
    platform: Platform,
    space_name: &str,
    app_name: &str,
) -> Result<AppManifest> {
    let space = resolve_space(cp, space_name)?;
    let app = resolve_app(cp, &space, app_name)?;
    assemble_manifest(cp, platform, &app)
        .with_context(|| format!("assemble manifest for {space_name}/{app_name}"))
}

/// Build the raw manifest of one application from its live resources.
pub fn assemble_manifest(cp: &dyn ControlPlane, platform: Platform, app: &App) -> Result<AppManifest> {
    tracing::info!(app = %app.name, guid = %app.guid, "assembling manifest from live resources");

    let env = cp
        .app_env(&app.guid)
        .with_context(|| format!("fetch environment of {:?}", app.name))?;
    let services = vcap::services_from_env(&env.system_env_json)
        .with_context(|| format!("read service bindings of {:?}", app.name))?;

    let processes = cp
        .app_processes(&app.guid)
        .with_context(|| format!("fetch processes of {:?}", app.name))?
        .iter()
        .map(|process| manifest_process(process, &app.lifecycle.kind))
        .collect::<Vec<_>>();

    let mut routes = Vec::new();
    for route in cp
        .app_routes(&app.guid)
        .with_context(|| format!("fetch routes of {:?}", app.name))?
    {
        let destinations = cp
            .route_destinations(&route.guid)
            .with_context(|| format!("fetch destinations of route {}", route.url))?;
        routes.push(manifest_route(route, &destinations));
    }

    let sidecars = cp
        .app_sidecars(&app.guid)
        .with_context(|| format!("fetch sidecars of {:?}", app.name))?
        .into_iter()
        .map(manifest_sidecar)
        .collect::<Vec<_>>();

    let docker = if app.lifecycle.kind == DOCKER_LIFECYCLE {
        let droplet = cp
            .current_droplet(&app.guid)
            .with_context(|| format!("fetch current droplet of {:?}", app.name))?;
        droplet.image.map(|image| AppManifestDocker {
            image,
            ..AppManifestDocker::default()
        })
    } else {
        None
    };

    let buildpacks = if app.lifecycle.kind == BUILDPACK_LIFECYCLE {
        app.lifecycle.data.buildpacks.clone()
    } else {
        Vec::new()
    };

    let name = match platform {
        Platform::Cf => app.name.clone(),
        Platform::Korifi => {
            let normalized = normalize_metadata_name(app.name.trim());
            if normalized != app.name {
                tracing::debug!(app = %app.name, normalized = %normalized, "normalized application name");
            }
            normalized
        }
    };

    tracing::info!(
        app = %name,
        processes = processes.len(),
        routes = routes.len(),
        services = services.as_ref().map_or(0, Vec::len),
        sidecars = sidecars.len(),
        "assembled manifest"
    );

    Ok(AppManifest {
        name,
        buildpacks,
        docker,
        env: stringify_env(env.environment_variables),
        routes: Some(routes),
        services,
        sidecars: (!sidecars.is_empty()).then_some(sidecars),
        processes: Some(processes),
        stack: app.lifecycle.data.stack.clone().unwrap_or_default(),
        metadata: Some(AppMetadata {
            labels: app.metadata.labels.clone(),
            annotations: app.metadata.annotations.clone(),
        }),
        ..AppManifest::default()
    })
}

fn stringify_env(vars: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    vars.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, text)
        })
        .collect()
}

fn megabytes(value: u64) -> String {
    if value == 0 {
        String::new()
    } else {
        format!("{value}MB")
    }
}

/// `(endpoint, invocation timeout, interval)` of a check.
fn probe_fields(check: &HealthCheck) -> (String, u32, u32) {
    let data = &check.data;
    (
        data.endpoint.clone().unwrap_or_default(),
        data.invocation_timeout.unwrap_or_default(),
        data.interval.unwrap_or_default(),
    )
}

fn manifest_process(process: &Process, lifecycle: &str) -> AppManifestProcess {
    let (health_endpoint, health_timeout, health_interval) = probe_fields(&process.health_check);
    let (readiness_endpoint, readiness_timeout, readiness_interval) =
        probe_fields(&process.readiness_health_check);
    let log_rate_limit = match process.log_rate_limit_in_bytes_per_second {
        Some(rate) if rate >= 0 => rate.to_string(),
        _ => String::new(),
    };
    AppManifestProcess {
        process_type: process.process_type.clone(),
        command: process.command.clone().unwrap_or_default(),
        disk_quota: megabytes(process.disk_in_mb),
        health_check_type: process.health_check.kind.clone(),
        health_check_http_endpoint: health_endpoint,
        health_check_invocation_timeout: health_timeout,
        health_check_interval: health_interval,
        instances: Some(process.instances),
        log_rate_limit_per_second: log_rate_limit,
        memory: megabytes(process.memory_in_mb),
        timeout: process
            .health_check
            .data
            .timeout
            .map(i64::from)
            .unwrap_or_default(),
        readiness_health_check_type: process.readiness_health_check.kind.clone(),
        readiness_health_check_http_endpoint: readiness_endpoint,
        readiness_health_invocation_timeout: readiness_timeout,
        readiness_health_check_interval: readiness_interval,
        lifecycle: lifecycle.to_string(),
    }
}

fn manifest_route(route: Route, destinations: &[Destination]) -> AppManifestRoute {
    let protocol = destinations
        .first()
        .and_then(|destination| destination.protocol.clone())
        .unwrap_or_default();
    let options = route
        .options
        .and_then(|options| options.loadbalancing)
        .filter(|balancing| !balancing.is_empty())
        .map(|load_balancing| AppRouteOptions { load_balancing });
    AppManifestRoute {
        route: route.url,
        protocol,
        options,
    }
}

fn manifest_sidecar(sidecar: Sidecar) -> AppManifestSidecar {
    AppManifestSidecar {
        name: sidecar.name,
        process_types: sidecar.process_types,
        command: sidecar.command,
        memory: sidecar.memory_in_mb.map(megabytes).unwrap_or_default(),
    }
}

#[cfg(test)]
#[path = "live_tests.rs"]
mod tests;
