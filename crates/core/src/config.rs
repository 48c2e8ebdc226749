use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ranking::DEFAULT_LIMIT;

/// Upper bound for `ranking.default_limit`; widgets never render more.
pub const MAX_DEFAULT_LIMIT: usize = 1000;

const CONFIG_CANDIDATES: [&str; 2] = ["rankly.toml", "config/rankly.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub ranking: RankingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct RankingConfig {
    /// Products returned when a caller does not pass a limit. 0 means all.
    pub default_limit: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Programmatic values applied after file and environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub default_limit: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://rankly.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            ranking: RankingConfig { default_limit: DEFAULT_LIMIT },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file, then `RANKLY_*` variables, then `overrides`.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match find_config_file(options.config_path.as_deref()) {
            Some(path) => config.merge_file(read_file(&path)?),
            None if options.require_file => {
                let expected =
                    options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_CANDIDATES[0]));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => {}
        }

        config.merge_env()?;
        config.merge_overrides(options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn merge_file(&mut self, file: FileConfig) {
        let database = file.database.unwrap_or_default();
        set_if_some(&mut self.database.url, database.url);
        set_if_some(&mut self.database.max_connections, database.max_connections);
        set_if_some(&mut self.database.timeout_secs, database.timeout_secs);

        let ranking = file.ranking.unwrap_or_default();
        set_if_some(&mut self.ranking.default_limit, ranking.default_limit);

        let logging = file.logging.unwrap_or_default();
        set_if_some(&mut self.logging.level, logging.level);
        set_if_some(&mut self.logging.format, logging.format);
    }

    fn merge_env(&mut self) -> Result<(), ConfigError> {
        set_if_some(&mut self.database.url, env_value(&["RANKLY_DATABASE_URL"]));
        set_if_some(
            &mut self.database.max_connections,
            parse_env("RANKLY_DATABASE_MAX_CONNECTIONS")?,
        );
        set_if_some(&mut self.database.timeout_secs, parse_env("RANKLY_DATABASE_TIMEOUT_SECS")?);
        set_if_some(&mut self.ranking.default_limit, parse_env("RANKLY_RANKING_DEFAULT_LIMIT")?);
        set_if_some(
            &mut self.logging.level,
            env_value(&["RANKLY_LOGGING_LEVEL", "RANKLY_LOG_LEVEL"]),
        );
        if let Some(format) = env_value(&["RANKLY_LOGGING_FORMAT", "RANKLY_LOG_FORMAT"]) {
            self.logging.format = format.parse()?;
        }
        Ok(())
    }

    fn merge_overrides(&mut self, overrides: ConfigOverrides) {
        set_if_some(&mut self.database.url, overrides.database_url);
        set_if_some(&mut self.ranking.default_limit, overrides.default_limit);
        set_if_some(&mut self.logging.level, overrides.log_level);
        set_if_some(&mut self.logging.format, overrides.log_format);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.ranking.validate()?;
        self.logging.validate()
    }
}

impl DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        if !(url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:") {
            return Err(ConfigError::Validation(
                "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                    .to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        if !(1..=300).contains(&self.timeout_secs) {
            return Err(ConfigError::Validation(
                "database.timeout_secs must be in range 1..=300".to_string(),
            ));
        }
        Ok(())
    }
}

impl RankingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_limit > MAX_DEFAULT_LIMIT {
            return Err(ConfigError::Validation(format!(
                "ranking.default_limit must be at most {MAX_DEFAULT_LIMIT} (0 returns every product)"
            )));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Validation(
                "logging.level must be one of trace|debug|info|warn|error".to_string(),
            )),
        }
    }
}

fn set_if_some<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn find_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    match explicit_path {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => CONFIG_CANDIDATES.iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&interpolate_env_vars(&raw)?)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces every `${VAR}` with the value of the environment variable `VAR`.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let expression = &rest[start + 2..];
        let end = expression.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &expression[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &expression[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

/// First non-blank value among `keys`, so canonical names win over aliases.
fn env_value(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| env::var(key).ok().filter(|value| !value.trim().is_empty()))
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    env_value(&[key])
        .map(|value| {
            value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
                key: key.to_string(),
                value,
            })
        })
        .transpose()
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database: Option<DatabaseSection>,
    ranking: Option<RankingSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseSection {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RankingSection {
    default_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    format: Option<LogFormat>,
}
