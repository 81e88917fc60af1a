//! Probe defaulting and process reconciliation.
use super::{
    DEFAULT_INSTANCES, DEFAULT_LOG_RATE_LIMIT, DEFAULT_MEMORY, DEFAULT_PROBE_ENDPOINT,
    DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_TIMEOUT,
};
use crate::manifest::{AppManifest, AppManifestProcess};
use crate::model::{optional_value, ProbeSpec, ProbeType, ProcessSpec, ProcessSpecTemplate};

fn parse_probe(
    probe_type: &str,
    endpoint: &str,
    invocation_timeout: u32,
    interval: u32,
    default_type: ProbeType,
) -> ProbeSpec {
    ProbeSpec {
        endpoint: if endpoint.is_empty() {
            DEFAULT_PROBE_ENDPOINT.to_string()
        } else {
            endpoint.to_string()
        },
        invocation_timeout: if invocation_timeout == 0 {
            DEFAULT_PROBE_TIMEOUT
        } else {
            i64::from(invocation_timeout)
        },
        interval: if interval == 0 {
            DEFAULT_PROBE_INTERVAL
        } else {
            i64::from(interval)
        },
        probe_type: Some(optional_value(probe_type).unwrap_or(default_type)),
    }
}

/// Liveness probe; the type defaults to `port`.
pub fn parse_health_check(raw: &AppManifestProcess) -> ProbeSpec {
    parse_probe(
        &raw.health_check_type,
        &raw.health_check_http_endpoint,
        raw.health_check_invocation_timeout,
        raw.health_check_interval,
        ProbeType::Port,
    )
}

/// Readiness probe; the type defaults to `process`.
pub fn parse_readiness_check(raw: &AppManifestProcess) -> ProbeSpec {
    parse_probe(
        &raw.readiness_health_check_type,
        &raw.readiness_health_check_http_endpoint,
        raw.readiness_health_invocation_timeout,
        raw.readiness_health_check_interval,
        ProbeType::Process,
    )
}

/// Fields copied as-is; defaults are layered on by the callers.
fn verbatim_template(raw: &AppManifestProcess) -> ProcessSpecTemplate {
    ProcessSpecTemplate {
        command: raw.command.clone(),
        disk_quota: raw.disk_quota.clone(),
        memory: raw.memory.clone(),
        health_check: parse_health_check(raw),
        readiness_check: parse_readiness_check(raw),
        instances: raw.instances.unwrap_or(0),
        log_rate_limit: raw.log_rate_limit_per_second.clone(),
        lifecycle: optional_value(&raw.lifecycle),
    }
}

/// A typed process with every default applied.
pub fn parse_process(raw: &AppManifestProcess) -> ProcessSpec {
    let mut template = verbatim_template(raw);
    if template.memory.is_empty() {
        template.memory = DEFAULT_MEMORY.to_string();
    }
    if template.instances == 0 {
        template.instances = DEFAULT_INSTANCES;
    }
    if template.log_rate_limit.is_empty() {
        template.log_rate_limit = DEFAULT_LOG_RATE_LIMIT.to_string();
    }
    ProcessSpec {
        process_type: optional_value(&raw.process_type),
        template,
    }
}

/// Resolve the inline process block against the explicit process list.
///
/// List entries keep their order. Inline fields with a `type` become one more
/// process after them; without a `type` they become the application-wide
/// template. The template always carries an instance count.
pub fn reconcile_processes(raw: &AppManifest) -> (Vec<ProcessSpec>, ProcessSpecTemplate) {
    let mut processes: Vec<ProcessSpec> = raw
        .processes
        .iter()
        .flatten()
        .map(parse_process)
        .collect();
    let inline = &raw.process;

    if !inline.process_type.is_empty() {
        tracing::debug!(
            app = %raw.name,
            process_type = %inline.process_type,
            listed = processes.len(),
            "inline process fields form a standalone process"
        );
        processes.push(parse_process(inline));
        return (
            processes,
            ProcessSpecTemplate {
                instances: DEFAULT_INSTANCES,
                ..ProcessSpecTemplate::default()
            },
        );
    }

    // Timeout is an application field even when declared inline.
    let template_fields = AppManifestProcess {
        timeout: 0,
        ..inline.clone()
    };
    if template_fields.is_zero() {
        tracing::debug!(app = %raw.name, "no inline process fields; bare template");
        return (
            processes,
            ProcessSpecTemplate {
                instances: DEFAULT_INSTANCES,
                ..ProcessSpecTemplate::default()
            },
        );
    }

    tracing::debug!(app = %raw.name, "inline process fields form the process template");
    let mut template = verbatim_template(inline);
    if template.instances == 0 {
        template.instances = DEFAULT_INSTANCES;
    }
    (processes, template)
}
