//! `VCAP_SERVICES` decoding.
use crate::manifest::AppManifestService;
use crate::redact::CREDENTIALS_KEY;
use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const VCAP_SERVICES: &str = "VCAP_SERVICES";

/// Service bindings found in an application's system environment.
///
/// `Ok(None)` when the environment carries no `VCAP_SERVICES` at all.
pub fn services_from_env(
    system_env: &BTreeMap<String, Value>,
) -> Result<Option<Vec<AppManifestService>>> {
    match system_env.get(VCAP_SERVICES) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_vcap_services(value).map(Some),
    }
}

/// Decode `VCAP_SERVICES`, given either as an object or as its JSON text.
///
/// Two layouts are understood. CF's native one groups bindings by service
/// label: `{"<label>": [{"name", "binding_name", "credentials"}]}`. The
/// flattened one keys each binding by instance name:
/// `{"<instance>": {"name", "credentials"}}`, where `name` is the binding
/// name.
pub fn parse_vcap_services(value: &Value) -> Result<Vec<AppManifestService>> {
    let decoded;
    let object = match value {
        Value::Object(object) => object,
        Value::String(text) => {
            decoded = serde_json::from_str::<Value>(text).context("parse VCAP_SERVICES JSON")?;
            decoded
                .as_object()
                .ok_or_else(|| anyhow!("VCAP_SERVICES must be a JSON object"))?
        }
        other => {
            return Err(anyhow!(
                "VCAP_SERVICES must be an object or JSON string, got {other}"
            ))
        }
    };

    let mut services = Vec::new();
    for (key, entry) in object {
        match entry {
            Value::Array(bindings) => {
                for (idx, binding) in bindings.iter().enumerate() {
                    let binding = binding
                        .as_object()
                        .ok_or_else(|| anyhow!("VCAP_SERVICES[{key:?}][{idx}] must be an object"))?;
                    services.push(AppManifestService {
                        name: string_field(binding, "name"),
                        binding_name: string_field(binding, "binding_name"),
                        parameters: credentials_parameters(binding),
                    });
                }
            }
            Value::Object(binding) => services.push(AppManifestService {
                name: key.clone(),
                binding_name: string_field(binding, "name"),
                parameters: credentials_parameters(binding),
            }),
            other => {
                return Err(anyhow!(
                    "VCAP_SERVICES[{key:?}] must be an object or list, got {other}"
                ))
            }
        }
    }
    Ok(services)
}

fn string_field(binding: &Map<String, Value>, key: &str) -> String {
    binding
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn credentials_parameters(binding: &Map<String, Value>) -> Option<Value> {
    let credentials = binding.get(CREDENTIALS_KEY).filter(|value| !value.is_null())?;
    let mut parameters = Map::new();
    parameters.insert(CREDENTIALS_KEY.to_string(), credentials.clone());
    Some(Value::Object(parameters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn native_layout_is_grouped_by_label() {
        let value = json!({
            "postgres": [
                {"name": "orders-db", "binding_name": "db", "credentials": {"uri": "postgres://u:p@h/db"}},
                {"name": "audit-db", "credentials": {}}
            ],
            "redis": [{"name": "cache"}]
        });
        let services = parse_vcap_services(&value).expect("parse");
        assert_eq!(services.len(), 3);
        assert_eq!(services[0].name, "orders-db");
        assert_eq!(services[0].binding_name, "db");
        assert_eq!(
            services[0].parameters,
            Some(json!({"credentials": {"uri": "postgres://u:p@h/db"}}))
        );
        assert_eq!(services[1].parameters, Some(json!({"credentials": {}})));
        assert_eq!(services[2].name, "cache");
        assert_eq!(services[2].parameters, None);
    }

    #[test]
    fn flattened_layout_uses_key_as_instance_name() {
        let text = r#"{"my-db": {"name": "db-binding", "credentials": {"password": "pw"}}}"#;
        let services = parse_vcap_services(&Value::String(text.to_string())).expect("parse");
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "my-db");
        assert_eq!(services[0].binding_name, "db-binding");
        assert_eq!(
            services[0].parameters,
            Some(json!({"credentials": {"password": "pw"}}))
        );
    }

    #[test]
    fn missing_vcap_services_means_no_services() {
        let mut env = BTreeMap::new();
        assert_eq!(services_from_env(&env).expect("empty env"), None);
        env.insert(VCAP_SERVICES.to_string(), json!({}));
        assert_eq!(services_from_env(&env).expect("empty object"), Some(Vec::new()));
    }

    #[test]
    fn malformed_vcap_services_is_an_error() {
        assert!(parse_vcap_services(&json!(42)).is_err());
        assert!(parse_vcap_services(&Value::String("{not json".to_string())).is_err());
        assert!(parse_vcap_services(&json!({"svc": "plain"})).is_err());
    }
}
