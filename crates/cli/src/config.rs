use anyhow::{Context, Result};
use clap::Args;
use flagrefs_coderefs::ScanOptions;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the scanned directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILE: &str = ".flagrefs.toml";

/// Command-line overrides for values in the config file
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct OptionOverrides {
    /// Project key attached to every hunk
    #[arg(long)]
    pub(crate) project_key: Option<String>,

    /// Flag key to search for (repeatable; replaces keys from the config file)
    #[arg(long = "flag")]
    pub(crate) flags: Vec<String>,

    /// File with one flag key per line
    #[arg(long)]
    pub(crate) flags_file: Option<PathBuf>,

    /// Context lines around each match (negative: do not upload source text)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) context_lines: Option<i64>,

    /// Regular expression of paths to skip
    #[arg(long)]
    pub(crate) exclude: Option<String>,

    /// Characters accepted as flag key delimiters
    #[arg(long)]
    pub(crate) delimiters: Option<String>,

    /// Search binary (ripgrep compatible)
    #[arg(long)]
    pub(crate) search_tool: Option<String>,
}

/// Load scan options from TOML (if any) and apply command-line overrides.
pub(crate) fn load_options(
    dir: &Path,
    config_path: Option<&Path>,
    overrides: &OptionOverrides,
) -> Result<ScanOptions> {
    let mut options = match config_path {
        Some(path) => read_config(path)?,
        None => {
            let default_path = dir.join(DEFAULT_CONFIG_FILE);
            if default_path.is_file() {
                read_config(&default_path)?
            } else {
                ScanOptions::default()
            }
        }
    };

    if let Some(key) = &overrides.project_key {
        options.project_key = key.clone();
    }
    let mut flags = overrides.flags.clone();
    if let Some(path) = &overrides.flags_file {
        flags.extend(read_flags_file(path)?);
    }
    if !flags.is_empty() {
        options.flags = flags;
    }
    if let Some(context_lines) = overrides.context_lines {
        options.context_lines = context_lines;
    }
    if let Some(exclude) = &overrides.exclude {
        options.exclude = Some(exclude.clone());
    }
    if let Some(delimiters) = &overrides.delimiters {
        options.delimiters = delimiters.clone();
    }
    if let Some(tool) = &overrides.search_tool {
        options.search_tool = tool.clone();
    }

    Ok(options)
}

fn read_config(path: &Path) -> Result<ScanOptions> {
    log::debug!("Loading config from {}", path.display());
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config {}", path.display()))
}

fn read_flags_file(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read flags file {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
