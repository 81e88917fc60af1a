//! Canonical model invariants.
//!
//! Each check is a plain function over one model type that appends to a
//! shared collector, so every violation in the object graph is reported at
//! once rather than stopping at the first.
use crate::model::{
    Application, Docker, Lifecycle, LoadBalancing, ProbeSpec, ProbeType, ProcessSpec,
    ProcessSpecTemplate, ProcessType, Route, RouteProtocol, ServiceSpec, SidecarSpec,
};
use serde::Serialize;
use std::fmt;

pub const MAX_TIMEOUT: i64 = 180;

/// One failed constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Dotted path from the application root, e.g. `application.services[0].name`.
    pub field: String,
    /// Constraint tag, with its parameter when it has one (`max=180`).
    pub constraint: String,
    pub value: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation failed for field '{}': actual value '{}' does not satisfy constraint '{}'",
            self.field, self.value, self.constraint
        )
    }
}

/// Aggregate of every violation found in one application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViolationList(pub Vec<FieldViolation>);

impl fmt::Display for ViolationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for violation in &self.0 {
            write!(f, "\n{violation}")?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Collector {
    violations: Vec<FieldViolation>,
}

impl Collector {
    fn push(&mut self, field: &str, constraint: impl Into<String>, value: impl fmt::Display) {
        self.violations.push(FieldViolation {
            field: field.to_string(),
            constraint: constraint.into(),
            value: value.to_string(),
        });
    }

    fn required(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            self.push(field, "required", value);
        }
    }

    fn one_of(&mut self, field: &str, value: &str, known: bool, accepted: &[&str]) {
        if !known {
            self.push(field, format!("oneof={}", accepted.join(" ")), value);
        }
    }

    fn min(&mut self, field: &str, value: i64, min: i64) {
        if value < min {
            self.push(field, format!("min={min}"), value);
        }
    }

    fn max(&mut self, field: &str, value: i64, max: i64) {
        if value > max {
            self.push(field, format!("max={max}"), value);
        }
    }
}

/// Check every invariant of `app`; an empty list means it is valid.
pub fn validate(app: &Application) -> Vec<FieldViolation> {
    let mut out = Collector::default();
    let root = "application";

    out.required(&format!("{root}.name"), &app.metadata.name);
    out.min(&format!("{root}.timeout"), app.timeout, 0);
    out.max(&format!("{root}.timeout"), app.timeout, MAX_TIMEOUT);

    if let Some(routes) = &app.routes.routes {
        for (idx, route) in routes.iter().enumerate() {
            validate_route(&mut out, &format!("{root}.routes[{idx}]"), route);
        }
    }
    for (idx, service) in app.services.iter().enumerate() {
        validate_service(&mut out, &format!("{root}.services[{idx}]"), service);
    }
    for (idx, process) in app.processes.iter().enumerate() {
        validate_process(&mut out, &format!("{root}.processes[{idx}]"), process);
    }
    for (idx, sidecar) in app.sidecars.iter().enumerate() {
        validate_sidecar(&mut out, &format!("{root}.sidecars[{idx}]"), sidecar);
    }
    validate_docker(&mut out, &format!("{root}.docker"), &app.docker);
    validate_template(&mut out, root, &app.process_template);

    out.violations
}

fn validate_route(out: &mut Collector, path: &str, route: &Route) {
    out.required(&format!("{path}.route"), &route.route);
    if let Some(protocol) = &route.protocol {
        out.one_of(
            &format!("{path}.protocol"),
            protocol.as_str(),
            protocol.is_known(),
            RouteProtocol::ACCEPTED,
        );
    }
    if let Some(balancing) = route.options.as_ref().and_then(|o| o.load_balancing.as_ref()) {
        out.one_of(
            &format!("{path}.options.loadBalancing"),
            balancing.as_str(),
            balancing.is_known(),
            LoadBalancing::ACCEPTED,
        );
    }
}

fn validate_service(out: &mut Collector, path: &str, service: &ServiceSpec) {
    out.required(&format!("{path}.name"), &service.name);
}

fn validate_process(out: &mut Collector, path: &str, process: &ProcessSpec) {
    let field = format!("{path}.type");
    match &process.process_type {
        None => out.required(&field, ""),
        Some(kind) => out.one_of(&field, kind.as_str(), kind.is_known(), ProcessType::ACCEPTED),
    }
    validate_template(out, path, &process.template);
}

/// Probes on a template may be absent entirely; a present probe must be whole.
fn validate_template(out: &mut Collector, path: &str, template: &ProcessSpecTemplate) {
    if !template.health_check.is_empty() {
        validate_probe(out, &format!("{path}.healthCheck"), &template.health_check);
    }
    if !template.readiness_check.is_empty() {
        validate_probe(
            out,
            &format!("{path}.readinessCheck"),
            &template.readiness_check,
        );
    }
    if let Some(lifecycle) = &template.lifecycle {
        out.one_of(
            &format!("{path}.lifecycle"),
            lifecycle.as_str(),
            lifecycle.is_known(),
            Lifecycle::ACCEPTED,
        );
    }
}

fn validate_probe(out: &mut Collector, path: &str, probe: &ProbeSpec) {
    let field = format!("{path}.type");
    match &probe.probe_type {
        None => out.required(&field, ""),
        Some(kind) => out.one_of(&field, kind.as_str(), kind.is_known(), ProbeType::ACCEPTED),
    }
    out.min(&format!("{path}.timeout"), probe.invocation_timeout, 0);
    out.min(&format!("{path}.interval"), probe.interval, 0);
}

fn validate_sidecar(out: &mut Collector, path: &str, sidecar: &SidecarSpec) {
    out.required(&format!("{path}.name"), &sidecar.name);
    out.required(&format!("{path}.command"), &sidecar.command);
    out.required(&format!("{path}.memory"), &sidecar.memory);
    for (idx, kind) in sidecar.process_types.iter().enumerate() {
        out.one_of(
            &format!("{path}.processTypes[{idx}]"),
            kind.as_str(),
            kind.is_known(),
            ProcessType::ACCEPTED,
        );
    }
}

fn validate_docker(out: &mut Collector, path: &str, docker: &Docker) {
    if !docker.is_empty() {
        out.required(&format!("{path}.image"), &docker.image);
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
