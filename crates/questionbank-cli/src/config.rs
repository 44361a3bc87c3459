//! CLI configuration: where the catalog and program live, and output defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level questionbank configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBankConfig {
    /// Question catalog file.
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,
    /// Program file edited by the block commands.
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Default output format: text, json or markdown.
    #[serde(default = "default_format")]
    pub format: String,
    /// Where `report` writes JSON reports.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

fn default_catalog() -> PathBuf {
    PathBuf::from("questions.toml")
}
fn default_program() -> PathBuf {
    PathBuf::from("program.toml")
}
fn default_format() -> String {
    "text".to_string()
}
fn default_reports_dir() -> PathBuf {
    PathBuf::from("./questionbank-reports")
}

impl Default for QuestionBankConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            program: default_program(),
            format: default_format(),
            reports_dir: default_reports_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted as-is and never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `questionbank.toml` in the current directory
/// 2. `~/.config/questionbank/config.toml`
///
/// Environment variable overrides: `QUESTIONBANK_CATALOG`, `QUESTIONBANK_PROGRAM`.
pub fn load_config_from(path: Option<&Path>) -> Result<QuestionBankConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("questionbank.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuestionBankConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuestionBankConfig::default(),
    };
    if let Some(path) = &config_path {
        tracing::debug!("loaded config from {}", path.display());
    }

    // Apply env var overrides
    if let Ok(catalog) = std::env::var("QUESTIONBANK_CATALOG") {
        config.catalog = PathBuf::from(catalog);
    }
    if let Ok(program) = std::env::var("QUESTIONBANK_PROGRAM") {
        config.program = PathBuf::from(program);
    }

    config.catalog = resolve_path(&config.catalog);
    config.program = resolve_path(&config.program);
    config.reports_dir = resolve_path(&config.reports_dir);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("questionbank"))
}
