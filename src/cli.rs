//! CLI argument parsing.
//!
//! Flags only override values from `--config`; resolution happens in
//! `main` so the library never sees clap types.
use cf_discover::config::Platform;
use cf_discover::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "cf-discover",
    version,
    about = "Discover Cloud Foundry applications into a canonical model",
    after_help = "Examples:\n  cf-discover manifest --path manifest.yml\n  cf-discover manifest --path manifest.yml --app backend --format yaml\n  cf-discover live --space dev --app orders\n  cf-discover live --space dev --platform korifi --api https://localhost --korifi-user kind-korifi\n  cf-discover list --path ./manifests",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Manifest(ManifestArgs),
    Live(LiveArgs),
    List(ListArgs),
}

/// Flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Discovery config file (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep secrets in the output instead of replacing them with placeholders
    #[arg(long)]
    pub no_redact: bool,

    /// Write the result to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Output encoding
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Log debug details to stderr
    #[arg(long)]
    pub verbose: bool,
}

/// Control-plane connection flags.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Control-plane flavor
    #[arg(long, value_enum)]
    pub platform: Option<Platform>,

    /// v3 API endpoint (classic CF defaults to the CF CLI target)
    #[arg(long = "api", value_name = "URL")]
    pub api_endpoint: Option<String>,

    /// Directory holding .cf/config.json
    #[arg(long, value_name = "DIR")]
    pub cf_home: Option<PathBuf>,

    /// Kubeconfig with the Korifi user's client certificate
    #[arg(long, value_name = "FILE")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig user to authenticate to Korifi as
    #[arg(long = "korifi-user", value_name = "NAME")]
    pub korifi_username: Option<String>,

    /// Accept any TLS certificate from the API
    #[arg(long)]
    pub skip_ssl_validation: bool,
}

/// Discover one application from a manifest file.
#[derive(Parser, Debug)]
#[command(about = "Discover an application from a manifest file")]
pub struct ManifestArgs {
    /// Manifest file
    #[arg(long, value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Application to pick from a multi-application manifest
    #[arg(long, value_name = "NAME")]
    pub app: Option<String>,

    /// Space recorded in the application metadata
    #[arg(long, value_name = "SPACE")]
    pub space: Option<String>,

    /// Metadata version when the manifest declares none
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Discover applications from a live control plane.
#[derive(Parser, Debug)]
#[command(about = "Discover applications from a live CF or Korifi API")]
pub struct LiveArgs {
    /// Space to read; repeat to discover several spaces when --app is omitted
    #[arg(long, value_name = "SPACE")]
    pub space: Vec<String>,

    /// Application to discover; omit to discover every application in the spaces
    #[arg(long, value_name = "NAME")]
    pub app: Option<String>,

    /// Metadata version applied to discovered applications
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Also write the assembled raw manifest (YAML) for a single application
    #[arg(long, value_name = "PATH", requires = "app")]
    pub manifest_out: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// List discoverable application names.
#[derive(Parser, Debug)]
#[command(about = "List application names in manifests or spaces")]
pub struct ListArgs {
    /// Manifest file or directory of manifests
    #[arg(long, value_name = "PATH", conflicts_with = "space")]
    pub path: Option<PathBuf>,

    /// Space to list; may be repeated
    #[arg(long, value_name = "SPACE")]
    pub space: Vec<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub common: CommonArgs,
}
