//! Result serialization for the CLI.
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(value).context("serialize JSON output")?;
            text.push('\n');
            Ok(text)
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("serialize YAML output"),
    }
}

/// Write `value` to `out`, creating parent directories, or to stdout.
pub fn write_output<T: Serialize>(value: &T, out: Option<&Path>, format: OutputFormat) -> Result<()> {
    let text = render(value, format)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
            }
            fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("write output to stdout")?;
        }
    }
    Ok(())
}
