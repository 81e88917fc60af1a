//! Projection of the canonical application onto a generic value mapping.
use crate::error::DiscoverError;
use crate::model::Application;
use crate::redact::SecretMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed generic mapping handed to template renderers.
pub type Content = Map<String, Value>;

/// What one discovery hands back: the application and the secrets taken out of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoverResult {
    pub content: Content,
    #[serde(default)]
    pub secret: SecretMap,
}

impl Application {
    pub fn to_content(&self) -> Result<Content, DiscoverError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(DiscoverError::Parse {
                field: "application".to_string(),
                reason: format!("projected to a non-mapping value: {other}"),
            }),
        }
    }

    pub fn from_content(content: &Content) -> Result<Application, DiscoverError> {
        Ok(serde_json::from_value(Value::Object(content.clone()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::AppManifest;
    use crate::normalize::normalize;
    use serde_json::json;

    const FULL_MANIFEST: &str = r#"
name: full
buildpacks: [python_buildpack, nodejs_buildpack]
stack: cflinuxfs4
path: ./src
timeout: 90
memory: 256M
health-check-interval: 15
env:
  MODE: prod
random-route: true
routes:
  - route: a.example.com
    protocol: http2
    options:
      loadbalancing: round-robin
  - route: b.example.com
services:
  - db
  - name: cache
    binding_name: redis
    parameters:
      credentials: {password: p}
      plan: small
sidecars:
  - name: logger
    process_types: [web]
    command: run-logger
    memory: 64M
processes:
  - type: worker
    command: work
    readiness-health-check-type: http
    lifecycle: cnb
docker:
  image: registry/app:1
  username: bot
metadata:
  labels: {team: core}
  annotations: {note: null}
features:
  ssh: true
"#;

    #[test]
    fn content_round_trips_to_the_same_application() {
        let raw: AppManifest = serde_yaml::from_str(FULL_MANIFEST).expect("decode manifest");
        let app = normalize(&raw, "", "dev").expect("normalize");
        let content = app.to_content().expect("to content");
        let decoded = Application::from_content(&content).expect("from content");
        assert_eq!(decoded, app);
    }

    #[test]
    fn content_uses_flattened_wire_keys() {
        let raw: AppManifest = serde_yaml::from_str(FULL_MANIFEST).expect("decode manifest");
        let content = normalize(&raw, "", "dev")
            .expect("normalize")
            .to_content()
            .expect("to content");
        assert_eq!(content["name"], json!("full"));
        assert_eq!(content["space"], json!("dev"));
        assert_eq!(content["version"], json!("1"));
        assert_eq!(content["randomRoute"], json!(true));
        assert_eq!(content["timeout"], json!(90));
        assert_eq!(content["memory"], json!("256M"));
        assert_eq!(content["instances"], json!(1));
        assert_eq!(content["healthCheck"]["interval"], json!(15));
        assert_eq!(
            content["buildPacks"],
            json!(["python_buildpack", "nodejs_buildpack"])
        );
        assert_eq!(content["routes"][0]["options"]["loadBalancing"], json!("round-robin"));
        assert_eq!(content["sidecars"][0]["processTypes"], json!(["web"]));
        assert_eq!(content["services"][1]["bindingName"], json!("redis"));
        assert_eq!(content["processes"][0]["lifecycle"], json!("cnb"));
        assert!(!content.contains_key("noRoute"));
    }

    #[test]
    fn malformed_content_reports_a_conversion_error() {
        let mut content = Content::new();
        content.insert("name".to_string(), json!(42));
        let err = Application::from_content(&content).expect_err("name is not a string");
        assert!(matches!(err, DiscoverError::Content(_)), "{err:?}");
        assert!(
            err.to_string().starts_with("failed to convert application content"),
            "{err}"
        );
    }
}
