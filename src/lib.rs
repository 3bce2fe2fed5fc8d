//! feur auto-responder library
//!
//! Matches chat messages against a trigger table, picks a response for each
//! trigger that fires, and combines them into one reply. The chat platform
//! side is behind the [`channels::ReplySink`] trait.

pub mod autoreply;
pub mod channels;
pub mod cli;
pub mod config;
pub mod logging;
