use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_rows() -> u32 {
    10
}

fn default_cols() -> u32 {
    10
}

/// Partial settings, either from CLI flags or from a YAML config file.
/// Unset fields fall through: flags beat the file, the file beats defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub optimiser_url: Option<String>,
    pub rows: Option<u32>,
    pub cols: Option<u32>,
    pub map: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    /// None means the bundled optimiser on this server's own address.
    pub optimiser_url: Option<String>,
    pub rows: u32,
    pub cols: u32,
    pub map: Option<PathBuf>,
}

impl ServeConfig {
    pub fn resolve(flags: ServeOverrides, file: Option<ServeOverrides>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let rows = flags.rows.or(file.rows).unwrap_or_else(default_rows);
        let cols = flags.cols.or(file.cols).unwrap_or_else(default_cols);
        if rows == 0 || cols == 0 {
            bail!("rows and cols must be positive");
        }
        Ok(Self {
            host: flags.host.or(file.host).unwrap_or_else(default_host),
            port: flags.port.or(file.port).unwrap_or_else(default_port),
            optimiser_url: flags.optimiser_url.or(file.optimiser_url),
            rows,
            cols,
            map: flags.map.or(file.map),
        })
    }
}

pub fn load_file(path: impl AsRef<Path>) -> Result<ServeOverrides> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let overrides = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(overrides)
}
