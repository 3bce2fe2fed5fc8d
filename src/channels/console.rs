//! Console channel
//!
//! Reads one message per input line and writes replies as `> reply` lines.
//! Each message is handled on its own task so a reply waiting out its delay
//! does not hold up the messages after it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info};

use super::{Author, ChannelError, ChannelResult, IncomingMessage, ReplySink};
use crate::autoreply::AutoReplyEngine;

/// Channel name reported on console messages
pub const CONSOLE_CHANNEL: &str = "console";

/// Line-oriented channel over any async reader/writer pair
#[derive(Debug)]
pub struct ConsoleChannel<W = tokio::io::Stdout> {
    author: Author,
    out: Mutex<W>,
}

impl ConsoleChannel<tokio::io::Stdout> {
    /// Console channel writing replies to stdout
    pub fn stdout(author: Author) -> Self {
        Self::new(author, tokio::io::stdout())
    }
}

impl<W> ConsoleChannel<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(author: Author, out: W) -> Self {
        Self {
            author,
            out: Mutex::new(out),
        }
    }

    /// Wrap one input line as a message from the console author.
    pub fn message_from_line(&self, seq: u64, line: &str) -> IncomingMessage {
        IncomingMessage::new(seq.to_string(), CONSOLE_CHANNEL, self.author.clone(), line)
    }

    /// Feed every line of `input` through `engine` until end of input.
    ///
    /// Pending replies are awaited before returning. Returns how many replies
    /// were sent.
    pub async fn run<R>(self: Arc<Self>, input: R, engine: Arc<AutoReplyEngine>) -> ChannelResult<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut pending = JoinSet::new();
        let mut seq = 0u64;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ChannelError::ReceiveFailed(e.to_string()))?
        {
            if line.trim().is_empty() {
                continue;
            }
            seq += 1;

            let message = self.message_from_line(seq, &line);
            let channel = Arc::clone(&self);
            let engine = Arc::clone(&engine);
            pending.spawn(async move { engine.handle_message(&message, channel.as_ref()).await });
        }

        let mut replied = 0;
        while let Some(result) = pending.join_next().await {
            match result {
                Ok(Some(_)) => replied += 1,
                Ok(None) => {}
                Err(e) => error!(error = %e, "reply task failed"),
            }
        }

        info!(messages = seq, replied, "console input closed");
        Ok(replied)
    }
}

#[async_trait]
impl<W> ReplySink for ConsoleChannel<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn reply(&self, _message: &IncomingMessage, text: &str) -> ChannelResult<()> {
        let mut out = self.out.lock().await;
        out.write_all(format!("> {}\n", text).as_bytes())
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }
}
