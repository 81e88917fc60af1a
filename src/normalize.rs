//! Raw manifest to canonical application.
//!
//! Pure functions: the raw input is never mutated and nothing is returned
//! unless the result passes validation.
use crate::error::DiscoverError;
use crate::manifest::AppManifest;
use crate::model::{Application, Metadata};
use crate::validate::{validate, ViolationList};

mod parse;
mod process;

pub use parse::{parse_docker, parse_route_spec, parse_services, parse_sidecars};
pub use process::{parse_health_check, parse_process, parse_readiness_check, reconcile_processes};

/// Seconds the platform waits for an application to start.
pub const DEFAULT_TIMEOUT: i64 = 60;
pub const DEFAULT_INSTANCES: u32 = 1;
pub const DEFAULT_MEMORY: &str = "1G";
pub const DEFAULT_LOG_RATE_LIMIT: &str = "16K";
pub const DEFAULT_VERSION: &str = "1";
pub const DEFAULT_PROBE_ENDPOINT: &str = "/";
pub const DEFAULT_PROBE_TIMEOUT: i64 = 1;
pub const DEFAULT_PROBE_INTERVAL: i64 = 30;

/// Map one raw application onto the canonical model.
///
/// `version` overrides the default metadata version (a multi-application
/// manifest carries one); `space` is empty for standalone manifest files.
pub fn normalize(
    raw: &AppManifest,
    version: &str,
    space: &str,
) -> Result<Application, DiscoverError> {
    let app = build_application(raw, version, space)?;
    let violations = validate(&app);
    if !violations.is_empty() {
        return Err(DiscoverError::Validation {
            name: app.metadata.name,
            violations: ViolationList(violations),
        });
    }
    Ok(app)
}

/// Apply defaults and merge rules without validating the result.
pub fn build_application(
    raw: &AppManifest,
    version: &str,
    space: &str,
) -> Result<Application, DiscoverError> {
    let (processes, process_template) = reconcile_processes(raw);
    let metadata = raw.metadata.clone().unwrap_or_default();

    // An inline timeout belongs to the inline process once it has a type.
    let timeout = if raw.process.timeout != 0 && raw.process.process_type.is_empty() {
        raw.process.timeout
    } else {
        DEFAULT_TIMEOUT
    };

    Ok(Application {
        metadata: Metadata {
            name: raw.name.clone(),
            space: space.to_string(),
            labels: metadata.labels,
            annotations: metadata.annotations,
            version: if version.is_empty() {
                DEFAULT_VERSION.to_string()
            } else {
                version.to_string()
            },
        },
        env: raw.env.clone(),
        routes: parse_route_spec(raw.routes.as_deref(), raw.random_route, raw.no_route),
        services: parse_services(raw.services.as_deref())?,
        processes,
        sidecars: parse_sidecars(raw.sidecars.as_deref()),
        stack: raw.stack.clone(),
        timeout,
        build_packs: raw.buildpacks.clone(),
        docker: parse_docker(raw.docker.as_ref()),
        process_template,
        path: raw.path.clone(),
        features: raw.features.clone(),
    })
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
