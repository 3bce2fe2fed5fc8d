//! Channels
//!
//! The boundary between the auto-reply engine and whatever delivers chat
//! messages. A channel turns platform events into [`IncomingMessage`]s and
//! implements [`ReplySink`] to send the composed reply back.

pub mod console;

use async_trait::async_trait;

pub use console::ConsoleChannel;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur in channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Author of an incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Platform account id
    pub id: String,
    /// Display tag, e.g. `User#1234`
    pub tag: String,
    /// Whether the account is a bot
    pub bot: bool,
}

impl Author {
    pub fn user(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            bot: false,
        }
    }

    pub fn bot(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            bot: true,
        }
    }
}

/// File attached to an incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Incoming message from a channel
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Unique message ID (channel-specific)
    pub id: String,
    /// Where the message was posted, e.g. `guild/#channel`
    pub channel: String,
    /// Who posted it
    pub author: Author,
    /// Text content
    pub content: String,
    /// Attached files
    pub attachments: Vec<Attachment>,
    /// When the message was received
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl IncomingMessage {
    pub fn new(
        id: impl Into<String>,
        channel: impl Into<String>,
        author: Author,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel: channel.into(),
            author,
            content: content.into(),
            attachments: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Set attachments
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Sends a reply to the message it answers
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn reply(&self, message: &IncomingMessage, text: &str) -> ChannelResult<()>;
}
