//! Manifest file adapter.
use crate::manifest::{AppManifest, CloudFoundryManifest};
use crate::util::display_path;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One application picked out of a manifest file, with the manifest-level
/// settings that apply to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestSelection {
    pub manifest: AppManifest,
    /// Manifest-level version, empty when the file declares none.
    pub version: String,
    pub space: String,
}

/// Decode every YAML document in `text` into the multi-application shape.
///
/// A document is first read as a single application; when that yields
/// nothing it is read as `{version, space, applications}`.
pub fn decode_manifests(text: &str) -> Result<Vec<CloudFoundryManifest>> {
    let mut manifests = Vec::new();
    for (idx, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let mut value = serde_yaml::Value::deserialize(document)
            .with_context(|| format!("parse YAML document {idx}"))?;
        value
            .apply_merge()
            .with_context(|| format!("resolve YAML merge keys in document {idx}"))?;
        if value.is_null() {
            continue;
        }
        let has_applications = value.get("applications").is_some();
        match serde_yaml::from_value::<AppManifest>(value.clone()) {
            Ok(app) if !app.is_zero() => manifests.push(CloudFoundryManifest {
                applications: vec![app],
                ..CloudFoundryManifest::default()
            }),
            Err(err) if !has_applications => {
                return Err(err).with_context(|| format!("decode manifest document {idx}"));
            }
            _ => {
                let manifest: CloudFoundryManifest = serde_yaml::from_value(value)
                    .with_context(|| format!("decode multi-application document {idx}"))?;
                manifests.push(manifest);
            }
        }
    }
    Ok(manifests)
}

/// Read `path` and select one application: the first named `app_name`, or
/// the first application when no name is given.
pub fn read_manifest(path: &Path, app_name: Option<&str>) -> Result<ManifestSelection> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read manifest file {}", path.display()))?;
    let manifests =
        decode_manifests(&text).with_context(|| format!("decode manifest {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        documents = manifests.len(),
        "decoded manifest file"
    );

    let selected = manifests.iter().find_map(|manifest| {
        manifest
            .applications
            .iter()
            .find(|app| match app_name {
                Some(name) => app.name == name,
                None => true,
            })
            .map(|app| ManifestSelection {
                manifest: app.clone(),
                version: manifest.version.clone(),
                space: manifest.space.clone(),
            })
    });

    match (selected, app_name) {
        (Some(selection), _) => Ok(selection),
        (None, Some(name)) => Err(anyhow!(
            "application {name:?} not found in manifest {}",
            path.display()
        )),
        (None, None) => Err(anyhow!(
            "no applications found in manifest {}",
            path.display()
        )),
    }
}

fn has_yaml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
}

fn app_names_in_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read manifest file {}", path.display()))?;
    let manifests =
        decode_manifests(&text).with_context(|| format!("decode manifest {}", path.display()))?;
    Ok(manifests
        .into_iter()
        .flat_map(|manifest| manifest.applications)
        .map(|app| app.name)
        .filter(|name| !name.is_empty())
        .collect())
}

/// Application names declared by a manifest file, or by every `*.yml` /
/// `*.yaml` file directly inside a directory.
///
/// Directory entries that cannot be read or decoded are logged and skipped.
pub fn list_manifest_apps(path: &Path) -> Result<Vec<String>> {
    let metadata =
        fs::metadata(path).with_context(|| format!("stat manifest path {}", path.display()))?;
    if !metadata.is_dir() {
        let names = app_names_in_file(path)?;
        if names.is_empty() {
            return Err(anyhow!("no app name found in manifest file {}", path.display()));
        }
        return Ok(names);
    }

    let mut entries: Vec<_> = fs::read_dir(path)
        .with_context(|| format!("read manifest directory {}", path.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect();
    entries.sort();

    let mut names = Vec::new();
    for entry in entries {
        let shown = display_path(&entry, Some(path));
        if entry.is_dir() || !has_yaml_extension(&entry) {
            tracing::debug!(file = %shown, "skipping non-manifest entry");
            continue;
        }
        match app_names_in_file(&entry) {
            Ok(found) if found.is_empty() => {
                tracing::warn!(file = %shown, "manifest declares no application name");
            }
            Ok(found) => names.extend(found),
            Err(err) => {
                tracing::warn!(file = %shown, error = %format!("{err:#}"), "skipping manifest");
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
