//! Application configuration
//!
//! Settings come from an optional JSON5 file and are then overridden by
//! environment variables. Every field has a default, so no file is needed.
//!
//! ```json5
//! {
//!   answerMap: "answerMap.json",
//!   maxDelayMinutes: 60,
//!   ignoreBots: true,
//!   botUserId: "123456",
//!   excludedSenders: ["987654"],
//!   logging: { level: "info", format: "text" },
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::autoreply::{DelayMode, SenderFilter, DEFAULT_MAX_DELAY_MINUTES};
use crate::logging::LoggingConfig;

pub const ENV_ANSWER_MAP: &str = "FEUR_ANSWER_MAP";
pub const ENV_MAX_DELAY_MINUTES: &str = "FEUR_MAX_DELAY_MINUTES";
pub const ENV_BOT_USER_ID: &str = "FEUR_BOT_USER_ID";
pub const ENV_CONFIG: &str = "FEUR_CONFIG";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeurConfig {
    /// Path of the answer map JSON file
    pub answer_map: PathBuf,
    /// Upper bound of the random reply delay
    pub max_delay_minutes: u64,
    /// Reply without delay
    pub test_mode: bool,
    /// Never answer bot accounts
    pub ignore_bots: bool,
    /// The bot's own account id
    pub bot_user_id: Option<String>,
    /// Account ids that never get a reply
    pub excluded_senders: Vec<String>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for FeurConfig {
    fn default() -> Self {
        Self {
            answer_map: PathBuf::from("answerMap.json"),
            max_delay_minutes: DEFAULT_MAX_DELAY_MINUTES,
            test_mode: false,
            ignore_bots: true,
            bot_user_id: None,
            excluded_senders: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FeurConfig {
    /// Parse a JSON5 config document.
    pub fn from_json5(raw: &str, path: &Path) -> Result<Self, ConfigFileError> {
        json5::from_str(raw).map_err(|e| ConfigFileError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigFileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_ANSWER_MAP) {
            self.answer_map = PathBuf::from(path);
        }

        if let Some(value) = lookup(ENV_MAX_DELAY_MINUTES) {
            self.max_delay_minutes =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigFileError::InvalidEnv {
                        key: ENV_MAX_DELAY_MINUTES.to_string(),
                        value,
                    })?;
        }

        if let Some(id) = lookup(ENV_BOT_USER_ID) {
            self.bot_user_id = Some(id);
        }

        Ok(())
    }

    /// Delay mode, honouring `FEUR_ENV=test`
    pub fn delay_mode(&self) -> DelayMode {
        DelayMode::detect(self.test_mode)
    }

    pub fn sender_filter(&self) -> SenderFilter {
        SenderFilter {
            ignore_bots: self.ignore_bots,
            self_id: self.bot_user_id.clone(),
            excluded: self.excluded_senders.clone(),
        }
    }
}

/// Default config file location: `~/.config/feur/config.json5`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("feur")
        .join("config.json5")
}

/// Resolve which config file to read.
///
/// An explicit path (flag or `FEUR_CONFIG`) must exist; the default location
/// is only used when present.
fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return Some(PathBuf::from(path));
    }
    let default = default_config_path();
    default.exists().then_some(default)
}

/// Load the configuration file (if any) and apply environment overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<FeurConfig, ConfigFileError> {
    let mut config = match resolve_config_path(explicit) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigFileError::Read {
                path: path.display().to_string(),
                source,
            })?;
            FeurConfig::from_json5(&raw, &path)?
        }
        None => FeurConfig::default(),
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FeurConfig::default();
        assert_eq!(config.answer_map, PathBuf::from("answerMap.json"));
        assert_eq!(config.max_delay_minutes, 60);
        assert!(config.ignore_bots);
        assert!(!config.test_mode);
    }

    #[test]
    fn test_parse_json5_with_partial_fields() {
        let config = FeurConfig::from_json5(
            r#"{
                // comments and trailing commas are fine
                answerMap: "/etc/feur/answers.json",
                maxDelayMinutes: 5,
                excludedSenders: ["987"],
                logging: { format: "json" },
            }"#,
            Path::new("config.json5"),
        )
        .unwrap();

        assert_eq!(config.answer_map, PathBuf::from("/etc/feur/answers.json"));
        assert_eq!(config.max_delay_minutes, 5);
        assert_eq!(config.excluded_senders, vec!["987"]);
        assert_eq!(config.logging.level, "info");
        assert!(config.ignore_bots);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = FeurConfig::from_json5("{ answerMap: ", Path::new("bad.json5")).unwrap_err();
        assert!(err.to_string().contains("bad.json5"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = FeurConfig::default();
        config
            .apply_env(env(&[
                (ENV_ANSWER_MAP, "other.json"),
                (ENV_MAX_DELAY_MINUTES, " 2 "),
                (ENV_BOT_USER_ID, "555"),
            ]))
            .unwrap();

        assert_eq!(config.answer_map, PathBuf::from("other.json"));
        assert_eq!(config.max_delay_minutes, 2);
        assert_eq!(config.bot_user_id.as_deref(), Some("555"));
    }

    #[test]
    fn test_env_invalid_number() {
        let mut config = FeurConfig::default();
        let err = config
            .apply_env(env(&[(ENV_MAX_DELAY_MINUTES, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidEnv { .. }));
    }

    #[test]
    fn test_sender_filter_from_config() {
        let config = FeurConfig {
            bot_user_id: Some("me".to_string()),
            excluded_senders: vec!["x".to_string()],
            ..FeurConfig::default()
        };
        let filter = config.sender_filter();
        assert!(filter.ignore_bots);
        assert_eq!(filter.self_id.as_deref(), Some("me"));
        assert_eq!(filter.excluded, vec!["x"]);
    }

    #[test]
    fn test_test_mode_forces_immediate() {
        let config = FeurConfig {
            test_mode: true,
            ..FeurConfig::default()
        };
        assert_eq!(config.delay_mode(), DelayMode::Immediate);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ maxDelayMinutes: 1, testMode: true }}").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.max_delay_minutes, 1);
        assert!(config.test_mode);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("nope.json5"))).unwrap_err();
        assert!(matches!(err, ConfigFileError::Read { .. }));
    }
}
