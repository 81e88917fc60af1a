//! Discovery pipeline.
//!
//! Source -> raw manifest -> normalize (validates) -> redact -> content.
use crate::config::Platform;
use crate::content::DiscoverResult;
use crate::error::DiscoverError;
use crate::manifest::AppManifest;
use crate::normalize::normalize;
use crate::redact::Redactor;
use crate::source::file::read_manifest;
use crate::source::live::{assemble_manifest, manifest_for_app, resolve_space, ControlPlane};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Caller-side settings applied to every discovered application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverOptions {
    pub redact: bool,
    /// Version used when the source does not declare one.
    pub version: Option<String>,
    /// Space recorded in metadata; wins over a manifest's own `space`.
    pub space: Option<String>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        DiscoverOptions {
            redact: true,
            version: None,
            space: None,
        }
    }
}

/// Where the raw manifest comes from.
pub enum Source<'a> {
    File {
        path: &'a Path,
        app: Option<&'a str>,
    },
    Live {
        control_plane: &'a dyn ControlPlane,
        platform: Platform,
        space: &'a str,
        app: &'a str,
    },
}

/// Normalize, optionally redact and project one raw manifest.
pub fn discover_manifest(
    raw: &AppManifest,
    version: &str,
    space: &str,
    redact: bool,
) -> Result<DiscoverResult, DiscoverError> {
    let mut app = normalize(raw, version, space)?;
    let secret = Redactor::new(redact).redact(&mut app);
    let content = app.to_content()?;
    Ok(DiscoverResult { content, secret })
}

pub fn discover(source: Source<'_>, options: &DiscoverOptions) -> Result<DiscoverResult> {
    let default_version = options.version.as_deref().unwrap_or_default();
    match source {
        Source::File { path, app } => {
            let selection = read_manifest(path, app)?;
            let version = if selection.version.is_empty() {
                default_version
            } else {
                selection.version.as_str()
            };
            let space = options.space.as_deref().unwrap_or(&selection.space);
            tracing::info!(
                path = %path.display(),
                app = %selection.manifest.name,
                "discovering application from manifest"
            );
            discover_manifest(&selection.manifest, version, space, options.redact)
                .with_context(|| format!("discover {:?} from {}", selection.manifest.name, path.display()))
        }
        Source::Live {
            control_plane,
            platform,
            space,
            app,
        } => {
            tracing::info!(space, app, "discovering application from control plane");
            let raw = manifest_for_app(control_plane, platform, space, app)?;
            discover_manifest(&raw, default_version, space, options.redact)
                .with_context(|| format!("discover {space}/{app}"))
        }
    }
}

/// Outcome for one application of a space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceDiscovery {
    pub space: String,
    /// Empty when the space itself could not be resolved or listed.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DiscoverResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Discover every application of `space`.
///
/// Failing applications are reported in their entry; the others still run.
/// Only failing to find or list the space itself is an error.
pub fn discover_space(
    cp: &dyn ControlPlane,
    platform: Platform,
    space: &str,
    options: &DiscoverOptions,
) -> Result<Vec<SpaceDiscovery>> {
    let resolved = resolve_space(cp, space)?;
    let apps = cp
        .list_apps(&resolved.guid)
        .with_context(|| format!("list applications in space {space:?}"))?;
    tracing::info!(space, apps = apps.len(), "discovering space");

    let version = options.version.as_deref().unwrap_or_default();
    let mut outcomes = Vec::with_capacity(apps.len());
    for app in apps {
        let outcome = assemble_manifest(cp, platform, &app).and_then(|raw| {
            discover_manifest(&raw, version, space, options.redact).map_err(anyhow::Error::from)
        });
        let entry = match outcome {
            Ok(result) => SpaceDiscovery {
                space: space.to_string(),
                app: app.name,
                result: Some(result),
                error: None,
            },
            Err(err) => {
                tracing::warn!(space, app = %app.name, error = %format!("{err:#}"), "discovery failed");
                SpaceDiscovery {
                    space: space.to_string(),
                    app: app.name,
                    result: None,
                    error: Some(format!("{err:#}")),
                }
            }
        };
        outcomes.push(entry);
    }
    Ok(outcomes)
}

/// Discover every application of every space in `spaces`.
///
/// A space that cannot be resolved or listed becomes a single entry with an
/// empty `app` and the error; the remaining spaces still run.
pub fn discover_spaces(
    cp: &dyn ControlPlane,
    platform: Platform,
    spaces: &[String],
    options: &DiscoverOptions,
) -> Vec<SpaceDiscovery> {
    let mut outcomes = Vec::new();
    for space in spaces {
        match discover_space(cp, platform, space, options) {
            Ok(found) => outcomes.extend(found),
            Err(err) => {
                tracing::warn!(space = %space, error = %format!("{err:#}"), "space discovery failed");
                outcomes.push(SpaceDiscovery {
                    space: space.clone(),
                    app: String::new(),
                    result: None,
                    error: Some(format!("{err:#}")),
                });
            }
        }
    }
    outcomes
}
