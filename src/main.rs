use anyhow::{anyhow, Context, Result};
use cf_discover::config::{
    default_config, load_config, validate_config, validate_live_request, validate_live_target,
    DiscoveryConfig,
};
use cf_discover::discover::{discover, discover_manifest, discover_spaces, DiscoverOptions, Source};
use cf_discover::output::{render, write_output, OutputFormat};
use cf_discover::source::file::list_manifest_apps;
use cf_discover::source::live::{connect, manifest_for_app, resolve_space, ControlPlane};
use clap::Parser;
use std::collections::BTreeMap;
use std::fs;

mod cli;
use cli::{CommonArgs, ConnectionArgs, ListArgs, LiveArgs, ManifestArgs, RootArgs};

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "CF_DISCOVER_LOG";

fn main() -> Result<()> {
    let args = RootArgs::parse();
    match args.command {
        cli::Command::Manifest(args) => {
            init_logging(args.common.verbose);
            cmd_manifest(args)
        }
        cli::Command::Live(args) => {
            init_logging(args.common.verbose);
            cmd_live(args)
        }
        cli::Command::List(args) => {
            init_logging(args.common.verbose);
            cmd_list(args)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn base_config(common: &CommonArgs) -> Result<DiscoveryConfig> {
    let mut config = match &common.config {
        Some(path) => load_config(path)?,
        None => default_config(),
    };
    if common.no_redact {
        config.redact = false;
    }
    Ok(config)
}

fn apply_connection(config: &mut DiscoveryConfig, args: &ConnectionArgs) {
    if let Some(platform) = args.platform {
        config.platform = platform;
    }
    if let Some(endpoint) = &args.api_endpoint {
        config.api_endpoint = Some(endpoint.clone());
    }
    if let Some(cf_home) = &args.cf_home {
        config.cf_home = Some(cf_home.clone());
    }
    if let Some(kubeconfig) = &args.kubeconfig {
        config.kubeconfig = Some(kubeconfig.clone());
    }
    if let Some(username) = &args.korifi_username {
        config.korifi_username = Some(username.clone());
    }
    if args.skip_ssl_validation {
        config.skip_ssl_validation = true;
    }
}

fn options(config: &DiscoveryConfig, space: Option<String>) -> DiscoverOptions {
    DiscoverOptions {
        redact: config.redact,
        version: config.version.clone(),
        space,
    }
}

fn cmd_manifest(args: ManifestArgs) -> Result<()> {
    let mut config = base_config(&args.common)?;
    if let Some(path) = args.path {
        config.manifest_path = Some(path);
    }
    if let Some(version) = args.version {
        config.version = Some(version);
    }
    validate_config(&config)?;

    let path = config
        .manifest_path
        .clone()
        .ok_or_else(|| anyhow!("no manifest given: pass --path or set manifest_path"))?;
    let result = discover(
        Source::File {
            path: &path,
            app: args.app.as_deref(),
        },
        &options(&config, args.space),
    )?;
    write_output(&result, args.common.out.as_deref(), args.common.format)
}

fn cmd_live(args: LiveArgs) -> Result<()> {
    let mut config = base_config(&args.common)?;
    apply_connection(&mut config, &args.connection);
    if !args.space.is_empty() {
        config.space_names = args.space;
    }
    if let Some(version) = args.version {
        config.version = Some(version);
    }
    validate_config(&config)?;

    let Some(app) = args.app.as_deref() else {
        return live_batch(&config, &args.common);
    };
    let space = match config.space_names.as_slice() {
        [space] => space.clone(),
        [] => String::new(),
        _ => return Err(anyhow!("--app needs exactly one --space")),
    };
    validate_live_request(&config, &space, app)?;

    let client = connect(&config)?;
    let raw = manifest_for_app(&client, config.platform, &space, app)?;
    if let Some(path) = args.manifest_out.as_deref() {
        let text = render(&raw, OutputFormat::Yaml)?;
        fs::write(path, text).with_context(|| format!("write manifest {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote assembled manifest");
    }
    let version = config.version.as_deref().unwrap_or_default();
    let result = discover_manifest(&raw, version, &space, config.redact)
        .with_context(|| format!("discover {space}/{app}"))?;
    write_output(&result, args.common.out.as_deref(), args.common.format)
}

fn live_batch(config: &DiscoveryConfig, common: &CommonArgs) -> Result<()> {
    if config.space_names.is_empty() {
        return Err(anyhow!("no space provided for live discovery"));
    }
    validate_live_target(config)?;
    let client = connect(config)?;
    let options = options(config, None);

    let outcomes = discover_spaces(&client, config.platform, &config.space_names, &options);
    write_output(&outcomes, common.out.as_deref(), common.format)?;

    let failed = outcomes.iter().filter(|outcome| outcome.error.is_some()).count();
    if failed > 0 {
        return Err(anyhow!(
            "{failed} of {} discovery entries failed",
            outcomes.len()
        ));
    }
    Ok(())
}

fn cmd_list(args: ListArgs) -> Result<()> {
    let mut config = base_config(&args.common)?;
    apply_connection(&mut config, &args.connection);
    let from_manifest = args.path.is_some();
    if let Some(path) = args.path {
        config.manifest_path = Some(path);
    }
    if !args.space.is_empty() {
        config.space_names = args.space;
    }
    validate_config(&config)?;

    if from_manifest || config.space_names.is_empty() {
        let path = config
            .manifest_path
            .as_deref()
            .ok_or_else(|| anyhow!("nothing to list: pass --path or --space"))?;
        let names = list_manifest_apps(path)?;
        return write_output(&names, args.common.out.as_deref(), args.common.format);
    }

    validate_live_target(&config)?;
    let client = connect(&config)?;
    let mut listing = BTreeMap::new();
    for space in &config.space_names {
        let resolved = resolve_space(&client, space)?;
        let names: Vec<String> = client
            .list_apps(&resolved.guid)
            .with_context(|| format!("list applications in space {space:?}"))?
            .into_iter()
            .map(|app| app.name)
            .collect();
        listing.insert(space.clone(), names);
    }
    write_output(&listing, args.common.out.as_deref(), args.common.format)
}
