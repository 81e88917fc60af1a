use super::*;
use crate::model::{Metadata, RouteOptions, RouteSpec};

fn valid_app() -> Application {
    Application {
        metadata: Metadata {
            name: "app".to_string(),
            version: "1".to_string(),
            ..Metadata::default()
        },
        timeout: 60,
        ..Application::default()
    }
}

fn fields(violations: &[FieldViolation]) -> Vec<&str> {
    violations.iter().map(|v| v.field.as_str()).collect()
}

#[test]
fn valid_application_has_no_violations() {
    assert!(validate(&valid_app()).is_empty());
}

#[test]
fn timeout_range_is_enforced() {
    let mut app = valid_app();
    app.timeout = 181;
    let violations = validate(&app);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].field, "application.timeout");
    assert_eq!(violations[0].constraint, "max=180");
    assert_eq!(violations[0].value, "181");

    app.timeout = -1;
    let violations = validate(&app);
    assert_eq!(violations[0].constraint, "min=0");
}

#[test]
fn every_violation_is_collected() {
    let mut app = valid_app();
    app.metadata.name.clear();
    app.services.push(ServiceSpec::default());
    app.processes.push(ProcessSpec {
        process_type: Some(ProcessType::from("task")),
        template: ProcessSpecTemplate {
            health_check: ProbeSpec {
                endpoint: "/".to_string(),
                invocation_timeout: -1,
                interval: 30,
                probe_type: None,
            },
            ..ProcessSpecTemplate::default()
        },
    });
    app.sidecars.push(SidecarSpec {
        process_types: vec![ProcessType::Web, ProcessType::from("cron")],
        ..SidecarSpec::default()
    });
    app.docker = Docker {
        image: String::new(),
        username: "bot".to_string(),
    };
    app.routes = RouteSpec {
        routes: Some(vec![Route {
            route: String::new(),
            protocol: Some(RouteProtocol::from("udp")),
            options: Some(RouteOptions {
                load_balancing: Some(LoadBalancing::from("random")),
            }),
        }]),
        ..RouteSpec::default()
    };

    let violations = validate(&app);
    assert_eq!(
        fields(&violations),
        vec![
            "application.name",
            "application.routes[0].route",
            "application.routes[0].protocol",
            "application.routes[0].options.loadBalancing",
            "application.services[0].name",
            "application.processes[0].type",
            "application.processes[0].healthCheck.type",
            "application.processes[0].healthCheck.timeout",
            "application.sidecars[0].name",
            "application.sidecars[0].command",
            "application.sidecars[0].memory",
            "application.sidecars[0].processTypes[1]",
            "application.docker.image",
        ]
    );
    let process_type = &violations[5];
    assert_eq!(process_type.constraint, "oneof=web worker");
    assert_eq!(process_type.value, "task");
}

#[test]
fn template_lifecycle_is_checked() {
    let mut app = valid_app();
    app.process_template.lifecycle = Some(Lifecycle::from("kpack"));
    let violations = validate(&app);
    assert_eq!(fields(&violations), vec!["application.lifecycle"]);
    assert_eq!(violations[0].constraint, "oneof=buildpack cnb docker");
}

#[test]
fn violation_list_display_enumerates_each_entry() {
    let list = ViolationList(vec![
        FieldViolation {
            field: "application.name".to_string(),
            constraint: "required".to_string(),
            value: String::new(),
        },
        FieldViolation {
            field: "application.timeout".to_string(),
            constraint: "max=180".to_string(),
            value: "200".to_string(),
        },
    ]);
    let text = list.to_string();
    assert_eq!(text.lines().filter(|line| !line.is_empty()).count(), 2);
    assert!(text.contains("'application.timeout': actual value '200'"), "{text}");
    assert!(text.contains("constraint 'max=180'"), "{text}");
}
