//! Configuration for polycms.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (POLYCMS_HOME, POLYCMS_DATABASE)
//! 2. Config file (.polycms/config.yaml)
//! 3. Defaults (~/.polycms, ~/.polycms/content.db)
//!
//! Config file discovery:
//! - Searches current directory and parents for .polycms/config.yaml
//! - `paths.home` is relative to the .polycms/ directory
//! - `paths.database` is relative to the resolved home

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::ContentShape;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_DATABASE: &str = "content.db";
const DEFAULT_LOG_FILTER: &str = "info";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
    /// Extra categories, registered after the standard ones
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .polycms/)
    pub home: Option<String>,
    /// Database file (relative to home)
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing EnvFilter directive, used when RUST_LOG is unset
    pub filter: Option<String>,
}

/// A category declared in configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryConfig {
    pub id: String,
    pub display_name: String,
    pub shape: ContentShape,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// Default log filter
    pub log_filter: String,
    /// Categories declared in the config file
    pub categories: Vec<CategoryConfig>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".polycms").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to a base directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Combine a parsed config file (if any) with environment overrides
fn resolve(
    file: Option<(PathBuf, ConfigFile)>,
    env_home: Option<String>,
    env_database: Option<String>,
) -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".polycms");

    let (config_file, config) = match file {
        Some((path, config)) => (Some(path), Some(config)),
        None => (None, None),
    };

    let home = if let Some(env_home) = env_home {
        PathBuf::from(env_home)
    } else if let (Some(path), Some(home)) = (
        config_file.as_ref(),
        config.as_ref().and_then(|c| c.paths.home.as_ref()),
    ) {
        let config_dir = path.parent().unwrap_or(Path::new("."));
        resolve_path(config_dir, home)
    } else {
        default_home
    };

    let database = if let Some(env_db) = env_database {
        PathBuf::from(env_db)
    } else if let Some(db) = config.as_ref().and_then(|c| c.paths.database.as_ref()) {
        resolve_path(&home, db)
    } else {
        home.join(DEFAULT_DATABASE)
    };

    let log_filter = config
        .as_ref()
        .and_then(|c| c.logging.as_ref())
        .and_then(|l| l.filter.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let categories = config.map(|c| c.categories).unwrap_or_default();

    Ok(ResolvedConfig {
        home,
        database,
        log_filter,
        categories,
        config_file,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let file = match find_config_file() {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    resolve(
        file,
        std::env::var("POLYCMS_HOME").ok(),
        std::env::var("POLYCMS_DATABASE").ok(),
    )
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
