use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::query::DEFAULT_PAGE_SIZE;

/// Project settings from `.gymdesk/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Fixed UTC offset for calendar periods, e.g. `"+01:00"`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    /// Period applied when a command names none.
    #[serde(default = "default_period")]
    pub default_period: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            utc_offset: default_utc_offset(),
            default_period: default_period(),
        }
    }
}

impl QueryConfig {
    /// Parse `utc_offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the offset is not `±HH:MM`.
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset
            .trim()
            .parse::<FixedOffset>()
            .map_err(|err| {
                anyhow::Error::new(LoadError::config(format!(
                    "invalid utc_offset '{}': {err}",
                    self.utc_offset
                )))
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Dataset file, relative to the project root. Absent means the
    /// embedded seed.
    #[serde(default)]
    pub dataset: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".gymdesk/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| LoadError::config(format!("Failed to read {}", path.display())))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| LoadError::config(format!("Failed to parse {}", path.display())))
}

/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("gymdesk/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| LoadError::config(format!("Failed to read {}", path.display())))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| LoadError::config(format!("Failed to parse {}", path.display())))
}

/// Load both config layers and settle the output mode.
///
/// # Errors
///
/// Propagates config load failures and rejects an unknown `--format`.
pub fn resolve_config(
    project_root: &Path,
    cli_format: Option<&str>,
    cli_json: bool,
) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_format, cli_json, user.output.clone(), env_format)?;

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn resolve_output(
    cli_format: Option<&str>,
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> Result<String> {
    if let Some(raw) = cli_format {
        return normalize_output_mode(raw)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("unknown output format '{raw}': expected pretty, text or json"));
    }

    if cli_json {
        return Ok("json".to_string());
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if std::io::stdout().is_terminal() {
        Ok("pretty".to_string())
    } else {
        Ok("text".to_string())
    }
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_period() -> String {
    "all".to_string()
}
