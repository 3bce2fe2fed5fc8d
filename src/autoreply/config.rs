//! Answer map configuration
//!
//! The answer map is a JSON object from trigger word to trigger settings:
//!
//! ```json
//! {
//!   "quoi": { "answer": "feur", "on": "endsWith" },
//!   "salut": { "answer": ["coucou", "hello"] },
//!   "bonjour": { "answer": [{ "bonjour madame": 0.4 }, { "bonsoir": 0.3 }],
//!                "secondaryMatches": ["bjr", "bonjoir"] }
//! }
//! ```
//!
//! Answers are decoded once into [`AnswerSpec`] at load time. Key order is
//! preserved and only used as the tie-break when two replies share a position.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

/// Errors raised while decoding or resolving the answer map
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("empty answer list")]
    EmptyAnswerList,

    #[error("malformed answer: {0}")]
    MalformedAnswer(String),

    #[error("probability {probability} for \"{response}\" is outside [0, 1]")]
    InvalidProbability { response: String, probability: f64 },

    #[error("failed to read answer map {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse answer map: {0}")]
    Parse(String),
}

/// How a trigger is compared against a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Trigger appears anywhere in the message as a whole word
    #[default]
    Contains,
    /// Trigger is the first word of the message
    StartsWith,
    /// Trigger is the last word of the message
    EndsWith,
}

impl MatchMode {
    /// Parse the `on` value of an answer map entry.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "always" | "contains" => Some(Self::Contains),
            "startsWith" => Some(Self::StartsWith),
            "endsWith" => Some(Self::EndsWith),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "always",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a weighted answer list
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedAnswer {
    pub response: String,
    pub probability: f64,
}

/// The configured response shape for a trigger
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerSpec {
    /// Always this response
    Literal(String),
    /// One of these, picked uniformly
    Uniform(Vec<String>),
    /// Walked by cumulative probability; the remainder up to 1 means no reply
    Weighted(Vec<WeightedAnswer>),
}

impl AnswerSpec {
    pub fn literal(response: impl Into<String>) -> Self {
        Self::Literal(response.into())
    }

    pub fn uniform<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Uniform(responses.into_iter().map(Into::into).collect())
    }

    pub fn weighted<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self::Weighted(
            entries
                .into_iter()
                .map(|(response, probability)| WeightedAnswer {
                    response: response.into(),
                    probability,
                })
                .collect(),
        )
    }

    /// Decode the `answer` field of an answer map entry.
    ///
    /// An empty list decodes to an empty uniform list; the selector reports it
    /// when the trigger actually fires.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::String(text) => Ok(Self::Literal(text.clone())),
            Value::Array(items) if items.is_empty() => Ok(Self::Uniform(Vec::new())),
            Value::Array(items) if items.iter().all(Value::is_string) => Ok(Self::Uniform(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            )),
            Value::Array(items) if items.iter().all(Value::is_object) => {
                let entries = items
                    .iter()
                    .map(decode_weighted)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Weighted(entries))
            }
            Value::Array(_) => Err(ConfigError::MalformedAnswer(
                "answer list mixes strings and probability objects".to_string(),
            )),
            other => Err(ConfigError::MalformedAnswer(format!(
                "expected a string or a list, got {}",
                other
            ))),
        }
    }
}

fn decode_weighted(item: &Value) -> Result<WeightedAnswer, ConfigError> {
    let object = item
        .as_object()
        .ok_or_else(|| ConfigError::MalformedAnswer(format!("expected an object, got {}", item)))?;

    let mut fields = object.iter();
    let (response, probability) = match (fields.next(), fields.next()) {
        (Some(field), None) => field,
        _ => {
            return Err(ConfigError::MalformedAnswer(format!(
                "probability entry must have exactly one key, got {}",
                object.len()
            )))
        }
    };

    let probability = probability.as_f64().ok_or_else(|| {
        ConfigError::MalformedAnswer(format!("probability for \"{}\" is not a number", response))
    })?;

    if !(0.0..=1.0).contains(&probability) {
        return Err(ConfigError::InvalidProbability {
            response: response.clone(),
            probability,
        });
    }

    Ok(WeightedAnswer {
        response: response.clone(),
        probability,
    })
}

/// Settings for one trigger
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    /// What to answer
    pub answer: AnswerSpec,
    /// How the trigger (and its secondary matches) is compared
    pub mode: MatchMode,
    /// Alternate words tried in order when the trigger itself does not match
    pub secondary_matches: Vec<String>,
}

impl TriggerConfig {
    pub fn new(answer: AnswerSpec) -> Self {
        Self {
            answer,
            mode: MatchMode::Contains,
            secondary_matches: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_secondary_matches<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_matches = words.into_iter().map(Into::into).collect();
        self
    }

    /// Decode one answer map entry.
    pub fn from_value(trigger: &str, value: &Value) -> Result<Self, ConfigError> {
        let raw: RawTrigger = serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::MalformedAnswer(e.to_string()))?;

        let answer = AnswerSpec::from_value(&raw.answer)?;

        let mode = match raw.on.as_deref() {
            None => MatchMode::Contains,
            Some(on) => MatchMode::parse(on).unwrap_or_else(|| {
                warn!(trigger, on, "unknown match mode, using \"always\"");
                MatchMode::Contains
            }),
        };

        Ok(Self {
            answer,
            mode,
            secondary_matches: raw.secondary_matches,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrigger {
    answer: Value,
    #[serde(default)]
    on: Option<String>,
    #[serde(default)]
    secondary_matches: Vec<String>,
}

/// A trigger and its settings
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEntry {
    pub trigger: String,
    pub config: TriggerConfig,
}

/// All configured triggers, in answer map order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerTable {
    entries: Vec<TriggerEntry>,
}

impl TriggerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trigger, replacing any existing entry with the same key in place.
    pub fn insert(&mut self, trigger: impl Into<String>, config: TriggerConfig) {
        let trigger = trigger.into();
        match self.entries.iter_mut().find(|e| e.trigger == trigger) {
            Some(existing) => existing.config = config,
            None => self.entries.push(TriggerEntry { trigger, config }),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_trigger(mut self, trigger: impl Into<String>, config: TriggerConfig) -> Self {
        self.insert(trigger, config);
        self
    }

    pub fn get(&self, trigger: &str) -> Option<&TriggerConfig> {
        self.entries
            .iter()
            .find(|e| e.trigger == trigger)
            .map(|e| &e.config)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TriggerEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode a parsed answer map.
    ///
    /// Entries that fail to decode are skipped with a warning so one bad
    /// trigger does not take the rest of the map down with it.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let object = value.as_object().ok_or_else(|| {
            ConfigError::Parse(format!("answer map must be an object, got {}", value))
        })?;

        let mut table = Self::new();
        for (trigger, raw) in object {
            match TriggerConfig::from_value(trigger, raw) {
                Ok(config) => table.insert(trigger.clone(), config),
                Err(e) => warn!(trigger = %trigger, error = %e, "skipping invalid trigger"),
            }
        }
        Ok(table)
    }

    /// Decode an answer map from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Read and decode an answer map file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Load the answer map, falling back to an empty table on any failure.
    pub fn load(path: &Path) -> Self {
        match Self::from_path(path) {
            Ok(table) => {
                info!(path = %path.display(), "Answer map loaded successfully!");
                info!("Loaded {} response triggers.", table.len());
                table
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load answer map");
                warn!("Using empty answer map instead.");
                Self::new()
            }
        }
    }
}
