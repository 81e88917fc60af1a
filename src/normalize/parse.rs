//! Route, service, sidecar and docker mapping.
use crate::error::DiscoverError;
use crate::manifest::{AppManifestDocker, AppManifestRoute, AppManifestService, AppManifestSidecar};
use crate::model::{
    optional_value, Docker, ProcessType, Route, RouteOptions, RouteSpec, ServiceSpec, SidecarSpec,
};
use serde_json::Value;

/// `no_route` wins outright: any declared routes are dropped.
pub fn parse_route_spec(
    routes: Option<&[AppManifestRoute]>,
    random_route: bool,
    no_route: bool,
) -> RouteSpec {
    if no_route {
        return RouteSpec {
            no_route: true,
            ..RouteSpec::default()
        };
    }
    RouteSpec {
        no_route: false,
        random_route,
        routes: routes.map(|routes| routes.iter().map(parse_route).collect()),
    }
}

fn parse_route(raw: &AppManifestRoute) -> Route {
    Route {
        route: raw.route.clone(),
        protocol: optional_value(&raw.protocol),
        options: raw.options.as_ref().map(|options| RouteOptions {
            load_balancing: optional_value(&options.load_balancing),
        }),
    }
}

pub fn parse_services(
    services: Option<&[AppManifestService]>,
) -> Result<Vec<ServiceSpec>, DiscoverError> {
    services
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(idx, service)| parse_service(idx, service))
        .collect()
}

fn parse_service(idx: usize, raw: &AppManifestService) -> Result<ServiceSpec, DiscoverError> {
    let parameters = match &raw.parameters {
        None | Some(Value::Null) => Default::default(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        Some(other) => {
            return Err(DiscoverError::Parse {
                field: format!("services[{idx}].parameters"),
                reason: format!("expected a mapping, found {}", value_kind(other)),
            })
        }
    };
    Ok(ServiceSpec {
        name: raw.name.clone(),
        parameters,
        binding_name: raw.binding_name.clone(),
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

pub fn parse_sidecars(sidecars: Option<&[AppManifestSidecar]>) -> Vec<SidecarSpec> {
    sidecars
        .unwrap_or_default()
        .iter()
        .map(|raw| SidecarSpec {
            name: raw.name.clone(),
            process_types: raw
                .process_types
                .iter()
                .map(|value| ProcessType::from(value.as_str()))
                .collect(),
            command: raw.command.clone(),
            memory: raw.memory.clone(),
        })
        .collect()
}

/// Absent docker settings map to the zero value, never to `None`.
pub fn parse_docker(docker: Option<&AppManifestDocker>) -> Docker {
    docker
        .map(|raw| Docker {
            image: raw.image.clone(),
            username: raw.username.clone(),
        })
        .unwrap_or_default()
}
