//! Secret extraction.
//!
//! Sensitive values are swapped for `$(<token>)` placeholders and returned in
//! a side map keyed by token, so the rendered application can be shared while
//! the secrets travel separately.
use crate::model::Application;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Service parameter holding binding credentials.
pub const CREDENTIALS_KEY: &str = "credentials";

/// Token to original value.
pub type SecretMap = BTreeMap<String, Value>;

pub fn placeholder(token: &str) -> String {
    format!("$({token})")
}

fn is_placeholder(value: &str) -> bool {
    value
        .strip_prefix("$(")
        .and_then(|rest| rest.strip_suffix(')'))
        .is_some_and(|token| Uuid::parse_str(token).is_ok())
}

#[derive(Debug, Clone, Copy)]
pub struct Redactor {
    enabled: bool,
}

impl Redactor {
    pub fn new(enabled: bool) -> Self {
        Redactor { enabled }
    }

    /// Replace secrets in `app` in place and return what was taken out.
    ///
    /// Running it again over redacted data finds only placeholders and
    /// returns an empty map.
    pub fn redact(&self, app: &mut Application) -> SecretMap {
        let mut secrets = SecretMap::new();
        if !self.enabled {
            return secrets;
        }

        if !app.docker.username.is_empty() && !is_placeholder(&app.docker.username) {
            let token = Uuid::new_v4().to_string();
            let username = std::mem::replace(&mut app.docker.username, placeholder(&token));
            secrets.insert(token, Value::String(username));
        }

        for service in &mut app.services {
            let Some(credentials) = service.parameters.get_mut(CREDENTIALS_KEY) else {
                continue;
            };
            if credentials.as_str().is_some_and(is_placeholder) {
                continue;
            }
            let token = Uuid::new_v4().to_string();
            let original = std::mem::replace(credentials, Value::String(placeholder(&token)));
            secrets.insert(token, original);
        }

        tracing::debug!(
            app = %app.metadata.name,
            redacted = secrets.len(),
            "extracted sensitive values"
        );
        secrets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Docker, ServiceSpec};
    use serde_json::json;

    fn app_with_secrets() -> Application {
        let mut app = Application::default();
        app.metadata.name = "app".to_string();
        app.services = vec![
            ServiceSpec {
                name: "db".to_string(),
                parameters: BTreeMap::from([
                    (CREDENTIALS_KEY.to_string(), json!("secret-blob")),
                    ("plan".to_string(), json!("small")),
                ]),
                ..ServiceSpec::default()
            },
            ServiceSpec {
                name: "queue".to_string(),
                ..ServiceSpec::default()
            },
        ];
        app.docker = Docker {
            image: "registry/app:1".to_string(),
            username: "deployer".to_string(),
        };
        app
    }

    #[test]
    fn credentials_and_docker_username_are_replaced() {
        let mut app = app_with_secrets();
        let secrets = Redactor::new(true).redact(&mut app);
        assert_eq!(secrets.len(), 2);

        let credentials = app.services[0].parameters[CREDENTIALS_KEY]
            .as_str()
            .expect("placeholder string")
            .to_string();
        assert!(is_placeholder(&credentials), "{credentials}");
        let token = &credentials[2..credentials.len() - 1];
        assert_eq!(secrets[token], json!("secret-blob"));
        assert_eq!(app.services[0].parameters["plan"], json!("small"));

        assert!(is_placeholder(&app.docker.username));
        let token = &app.docker.username[2..app.docker.username.len() - 1];
        assert_eq!(secrets[token], json!("deployer"));
        assert_eq!(app.docker.image, "registry/app:1");
    }

    #[test]
    fn second_pass_finds_nothing() {
        let mut app = app_with_secrets();
        let redactor = Redactor::new(true);
        let first = redactor.redact(&mut app);
        let redacted = app.clone();
        let second = redactor.redact(&mut app);
        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(app, redacted);
    }

    #[test]
    fn disabled_redactor_is_a_pass_through() {
        let mut app = app_with_secrets();
        let before = app.clone();
        let secrets = Redactor::new(false).redact(&mut app);
        assert!(secrets.is_empty());
        assert_eq!(app, before);
    }

    #[test]
    fn structured_credentials_are_kept_whole() {
        let mut app = app_with_secrets();
        app.services[0]
            .parameters
            .insert(CREDENTIALS_KEY.to_string(), json!({"user": "u", "pass": "p"}));
        let secrets = Redactor::new(true).redact(&mut app);
        assert!(secrets
            .values()
            .any(|value| value == &json!({"user": "u", "pass": "p"})));
    }
}
