/*!
Configuration file + settings resolution.

File format (YAML, or JSON when the path ends in `.json`):

  plugin_dir: ./plugins
  bundled_plugins: true
  prompt: "Enter command: "
  color: true

Precedence for every setting: CLI flag > environment > file > default.
Environment:
  PLUGCALC_PLUGIN_DIR   plugin directory
  PLUGCALC_CONFIG       config file path (when --config is absent)
  NO_COLOR              disables color
*/

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const ENV_PLUGIN_DIR: &str = "PLUGCALC_PLUGIN_DIR";
pub const ENV_CONFIG: &str = "PLUGCALC_CONFIG";
pub const DEFAULT_PLUGIN_DIR: &str = "plugins";
pub const DEFAULT_PROMPT: &str = "Enter command: ";

/// Contents of a config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub plugin_dir: Option<PathBuf>,
    pub bundled_plugins: Option<bool>,
    pub prompt: Option<String>,
    pub color: Option<bool>,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub plugin_dir: Option<PathBuf>,
    pub no_bundled: bool,
    pub no_color: bool,
}

/// Effective settings after merging every layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub plugin_dir: PathBuf,
    pub bundled_plugins: bool,
    pub prompt: String,
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            plugin_dir: PathBuf::from(DEFAULT_PLUGIN_DIR),
            bundled_plugins: true,
            prompt: DEFAULT_PROMPT.to_string(),
            color: true,
        }
    }
}

/// Parse a config file, picking the format from its extension.
pub fn load(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse(&raw, path)
}

fn parse(raw: &str, path: &Path) -> Result<FileConfig> {
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(raw)
            .with_context(|| format!("Invalid JSON config '{}'", path.display()))
    } else {
        serde_yaml::from_str(raw)
            .with_context(|| format!("Invalid YAML config '{}'", path.display()))
    }
}

/// Config file to read, if any: `--config`, else `PLUGCALC_CONFIG`.
pub fn config_path(
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    overrides
        .config
        .clone()
        .or_else(|| non_blank(env(ENV_CONFIG)).map(PathBuf::from))
}

impl Settings {
    /// Merge CLI overrides, environment (via `env`) and the file layer.
    pub fn resolve(
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
        file: &FileConfig,
    ) -> Settings {
        let defaults = Settings::default();

        let plugin_dir = overrides
            .plugin_dir
            .clone()
            .or_else(|| non_blank(env(ENV_PLUGIN_DIR)).map(PathBuf::from))
            .or_else(|| file.plugin_dir.clone())
            .unwrap_or(defaults.plugin_dir);

        let bundled_plugins = !overrides.no_bundled
            && file.bundled_plugins.unwrap_or(defaults.bundled_plugins);

        let color = !overrides.no_color
            && env("NO_COLOR").is_none()
            && file.color.unwrap_or(defaults.color);

        Settings {
            plugin_dir,
            bundled_plugins,
            prompt: file.prompt.clone().unwrap_or(defaults.prompt),
            color,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
