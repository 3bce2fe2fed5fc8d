//! Auto-reply Engine
//!
//! Matches incoming messages against the trigger table and composes the reply.

use std::sync::Arc;

use tracing::{debug, error, info, warn, Instrument};

use super::config::{MatchMode, TriggerTable};
use super::delay::{estimate_delay, DelayMode, DEFAULT_MAX_DELAY_MINUTES};
use super::matcher::WordMatcher;
use super::selector::{resolve, RandomSource, ThreadRandom};
use crate::channels::{Author, IncomingMessage, ReplySink};
use crate::logging::message_span;

/// Separator between the responses of a multi-trigger reply
pub const RESPONSE_SEPARATOR: &str = " + ";

/// Appended when at least [`RATIO_THRESHOLD`] responses are combined
pub const RATIO_SUFFIX: &str = " + ratio";

pub const RATIO_THRESHOLD: usize = 3;

/// A trigger that fired on a message
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Key of the answer map entry
    pub trigger: String,
    /// The word that actually matched (the trigger or one of its secondary matches)
    pub matched_text: String,
    /// Resolved response, `None` when the probability draw said no
    pub response: Option<String>,
    /// Char offset of the match, used to order responses
    pub position: usize,
}

/// Which authors the engine answers
#[derive(Debug, Clone)]
pub struct SenderFilter {
    /// Ignore every bot account
    pub ignore_bots: bool,
    /// The bot's own account id
    pub self_id: Option<String>,
    /// Author ids that never get a reply
    pub excluded: Vec<String>,
}

impl Default for SenderFilter {
    fn default() -> Self {
        Self {
            ignore_bots: true,
            self_id: None,
            excluded: Vec::new(),
        }
    }
}

impl SenderFilter {
    /// Check if the engine may answer this author
    pub fn allows(&self, author: &Author) -> bool {
        if self.ignore_bots && author.bot {
            return false;
        }
        if self.self_id.as_deref() == Some(author.id.as_str()) {
            return false;
        }
        !self.excluded.iter().any(|id| id == &author.id)
    }
}

#[derive(Debug, Clone)]
struct CompiledTrigger {
    primary: WordMatcher,
    secondary: Vec<WordMatcher>,
}

impl CompiledTrigger {
    /// The first of primary, then secondaries, that matches.
    fn locate(&self, text: &str, mode: MatchMode) -> Option<(&WordMatcher, usize)> {
        std::iter::once(&self.primary)
            .chain(self.secondary.iter())
            .find_map(|m| m.locate(text, mode).map(|position| (m, position)))
    }
}

/// Auto-reply engine that processes messages against the trigger table
pub struct AutoReplyEngine {
    table: Arc<TriggerTable>,
    compiled: Vec<CompiledTrigger>,
    random: Arc<dyn RandomSource>,
    max_delay_minutes: u64,
    delay_mode: DelayMode,
    sender_filter: SenderFilter,
}

impl std::fmt::Debug for AutoReplyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoReplyEngine")
            .field("triggers", &self.table.len())
            .field("max_delay_minutes", &self.max_delay_minutes)
            .field("delay_mode", &self.delay_mode)
            .field("sender_filter", &self.sender_filter)
            .finish()
    }
}

impl AutoReplyEngine {
    /// Create an engine with the thread RNG, a 60 minute max delay and the
    /// default sender filter.
    pub fn new(table: Arc<TriggerTable>) -> Self {
        let compiled = table
            .iter()
            .map(|entry| CompiledTrigger {
                primary: WordMatcher::new(entry.trigger.as_str()),
                secondary: entry
                    .config
                    .secondary_matches
                    .iter()
                    .map(|word| WordMatcher::new(word.as_str()))
                    .collect(),
            })
            .collect();

        Self {
            table,
            compiled,
            random: Arc::new(ThreadRandom),
            max_delay_minutes: DEFAULT_MAX_DELAY_MINUTES,
            delay_mode: DelayMode::Random,
            sender_filter: SenderFilter::default(),
        }
    }

    /// Set the random source
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Set the reply delay
    pub fn with_delay(mut self, max_minutes: u64, mode: DelayMode) -> Self {
        self.max_delay_minutes = max_minutes;
        self.delay_mode = mode;
        self
    }

    /// Set the sender filter
    pub fn with_sender_filter(mut self, filter: SenderFilter) -> Self {
        self.sender_filter = filter;
        self
    }

    pub fn table(&self) -> &TriggerTable {
        &self.table
    }

    /// Every trigger that fires on `text`, in table order.
    ///
    /// Probability-suppressed matches are included with `response: None`.
    /// A trigger whose answer cannot be resolved is logged and left out.
    pub fn find_matches(&self, text: &str) -> Vec<MatchResult> {
        let mut results = Vec::new();

        for (entry, compiled) in self.table.iter().zip(&self.compiled) {
            let mode = entry.config.mode;
            let Some((matcher, position)) = compiled.locate(text, mode) else {
                continue;
            };

            let response = match resolve(&entry.config.answer, self.random.as_ref()) {
                Ok(response) => response,
                Err(e) => {
                    warn!(trigger = %entry.trigger, error = %e, "cannot resolve answer, skipping trigger");
                    continue;
                }
            };

            match &response {
                Some(response) => info!(
                    trigger = %entry.trigger,
                    matched = matcher.word(),
                    mode = %mode,
                    "Triggered response for \"{}\": \"{}\"",
                    entry.trigger,
                    response
                ),
                None => debug!(
                    trigger = %entry.trigger,
                    matched = matcher.word(),
                    "No response due to probability check"
                ),
            }

            results.push(MatchResult {
                trigger: entry.trigger.clone(),
                matched_text: matcher.word().to_string(),
                response,
                position,
            });
        }

        results
    }

    /// Compose the reply for `text`, or `None` when nothing should be sent.
    pub fn compose(&self, text: &str) -> Option<String> {
        let mut results: Vec<MatchResult> = self
            .find_matches(text)
            .into_iter()
            .filter(|m| m.response.is_some())
            .collect();

        // stable: equal positions keep table order
        results.sort_by_key(|m| m.position);

        let responses: Vec<String> = results.into_iter().filter_map(|m| m.response).collect();
        join_responses(&responses)
    }

    /// Handle one incoming message end to end.
    ///
    /// Returns the reply that was sent. Send failures are logged and
    /// swallowed: the message simply goes unanswered.
    pub async fn handle_message(
        &self,
        message: &IncomingMessage,
        sink: &dyn ReplySink,
    ) -> Option<String> {
        if !self.sender_filter.allows(&message.author) {
            debug!(author = %message.author.id, "ignoring message from excluded sender");
            return None;
        }

        async {
            info!(
                "[{}] {}: {}",
                message.channel, message.author.tag, message.content
            );
            for attachment in &message.attachments {
                info!("[ATTACHMENT] {}: {}", attachment.name, attachment.url);
            }

            let reply = self.compose(&message.content)?;

            let delay = estimate_delay(self.max_delay_minutes, self.delay_mode, self.random.as_ref());
            if !delay.is_zero() {
                debug!(delay_ms = delay.as_millis() as u64, "waiting before reply");
                tokio::time::sleep(delay).await;
            }

            match sink.reply(message, &reply).await {
                Ok(()) => Some(reply),
                Err(e) => {
                    error!(error = %e, "Error sending reply");
                    None
                }
            }
        }
        .instrument(message_span(message))
        .await
    }
}

/// Join responses with `" + "`, adding `" + ratio"` from three responses on.
pub fn join_responses(responses: &[String]) -> Option<String> {
    if responses.is_empty() {
        return None;
    }

    let mut reply = responses.join(RESPONSE_SEPARATOR);
    if responses.len() >= RATIO_THRESHOLD {
        reply.push_str(RATIO_SUFFIX);
    }
    Some(reply)
}

/// Create a shared auto-reply engine
pub fn create_engine(table: TriggerTable) -> Arc<AutoReplyEngine> {
    Arc::new(AutoReplyEngine::new(Arc::new(table)))
}
