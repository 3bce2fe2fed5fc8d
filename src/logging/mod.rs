//! Logging
//!
//! Structured logging on top of `tracing`. Output goes to stderr so the
//! console channel can keep stdout for replies.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span, Span};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::channels::IncomingMessage;

/// Logging error types
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Initialization error: {0}")]
    InitError(String),
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `feur=debug`; `RUST_LOG` wins when set
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::Text,
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Initialize the global subscriber
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| LoggingError::InitError(e.to_string()))?;

    match config.format {
        LogFormat::Json => Registry::default()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => Registry::default()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
    .map_err(|e| LoggingError::InitError(e.to_string()))?;

    info!(format = ?config.format, "logging initialized");
    Ok(())
}

/// Span covering the handling of one message
pub fn message_span(message: &IncomingMessage) -> Span {
    info_span!(
        "message",
        id = %message.id,
        channel = %message.channel,
        author = %message.author.id,
        received = %message.timestamp.to_rfc3339(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Author;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Text);
    }

    #[test]
    fn test_logging_config_deserialize() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{"level": "feur=debug", "format": "json"}"#).unwrap();
        assert_eq!(config.level, "feur=debug");
        assert_eq!(config.format, LogFormat::Json);

        let config: LoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_message_span_is_created() {
        let message = IncomingMessage::new("1", "console", Author::user("u", "U#1"), "hi");
        // No subscriber installed: the span is disabled but must not panic
        let _span = message_span(&message);
    }

    #[test]
    fn test_message_span_records_fields() {
        let message = IncomingMessage::new("7", "console", Author::user("u42", "U#42"), "hi");
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let span = message_span(&message);
            let _entered = span.enter();
            info!("handled");
        });

        let out = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert!(out.contains("id=7"), "{}", out);
        assert!(out.contains("author=u42"), "{}", out);
        assert!(
            out.contains(&format!("received={}", message.timestamp.to_rfc3339())),
            "{}",
            out
        );
    }
}
