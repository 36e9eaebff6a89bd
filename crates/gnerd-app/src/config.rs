// Configuration loading and parsing (watchability.toml, credentials.toml).

use gnerd_core::config::ScoringConfig;
use gnerd_llm::LlmSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Most games a single run may send to the description generator.
pub const MAX_DESCRIPTION_LIMIT: usize = 30;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub scoring: ScoringConfig,
    pub descriptions: DescriptionSettings,
    pub output: OutputSettings,
    pub llm: LlmSettings,
    pub credentials: CredentialsConfig,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// watchability.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire watchability.toml file.
#[derive(Debug, Clone, Deserialize)]
struct WatchabilityFile {
    #[serde(default)]
    scoring: ScoringConfig,
    #[serde(default)]
    descriptions: DescriptionSettings,
    #[serde(default)]
    output: OutputSettings,
    #[serde(default)]
    llm: LlmSettings,
    data_paths: DataPaths,
}

/// How descriptions are attached to the top of the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionMode {
    /// No descriptions at all.
    None,
    /// Fixed text, no generator calls.
    Placeholder,
    /// Claude-generated text with web sources.
    Llm,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DescriptionSettings {
    pub mode: DescriptionMode,
    /// Number of top-ranked games to describe.
    pub limit: usize,
    pub placeholder: String,
}

impl Default for DescriptionSettings {
    fn default() -> Self {
        Self {
            mode: DescriptionMode::Placeholder,
            limit: 1,
            placeholder: "A placeholder description for a game worth watching.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub pitchers: String,
    pub teams: String,
    pub schedule: String,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub anthropic_api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/watchability.toml` and
/// (optionally) `config/credentials.toml`, relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- watchability.toml (required) ---
    let main_path = config_dir.join("watchability.toml");
    let main_text = read_file(&main_path)?;
    let file: WatchabilityFile =
        toml::from_str(&main_text).map_err(|e| ConfigError::ParseError {
            path: main_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        scoring: file.scoring,
        descriptions: file.descriptions,
        output: file.output,
        llm: file.llm,
        credentials,
        data_paths: file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the gnerd-app directory or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

impl DataPaths {
    /// Resolve each path against `base_dir` unless already absolute.
    pub fn resolve(&self, base_dir: &Path) -> ResolvedPaths {
        ResolvedPaths {
            pitchers: base_dir.join(&self.pitchers),
            teams: base_dir.join(&self.teams),
            schedule: base_dir.join(&self.schedule),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaths {
    pub pitchers: PathBuf,
    pub teams: PathBuf,
    pub schedule: PathBuf,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    config
        .scoring
        .validate()
        .map_err(|e| ConfigError::ValidationError {
            field: e.field,
            message: e.message,
        })?;

    let limit = config.descriptions.limit;
    if limit > MAX_DESCRIPTION_LIMIT {
        return Err(ConfigError::ValidationError {
            field: "descriptions.limit".into(),
            message: format!("must be at most {MAX_DESCRIPTION_LIMIT}, got {limit}"),
        });
    }

    if config.llm.max_tokens == 0 {
        return Err(ConfigError::ValidationError {
            field: "llm.max_tokens".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.descriptions.mode == DescriptionMode::Llm && config.llm.model.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "llm.model".into(),
            message: "must be set when descriptions.mode = \"llm\"".into(),
        });
    }

    let paths: &[(&str, &str)] = &[
        ("data_paths.pitchers", config.data_paths.pitchers.as_str()),
        ("data_paths.teams", config.data_paths.teams.as_str()),
        ("data_paths.schedule", config.data_paths.schedule.as_str()),
    ];
    for (name, val) in paths {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
