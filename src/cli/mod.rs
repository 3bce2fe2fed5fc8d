//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommands:
//! - `run` (default) -- answer messages read line by line from stdin
//! - `reply <text>` -- compose the reply to one message and print it
//! - `check` -- load the answer map and list its triggers
//! - `version` -- print build/version info

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::autoreply::{AnswerSpec, AutoReplyEngine, DelayMode, TriggerTable};
use crate::channels::{Author, ChannelError, ConsoleChannel};
use crate::config::{self, ConfigFileError, FeurConfig};
use crate::logging::{self, LoggingError};

/// Trigger-word auto-responder.
#[derive(Parser, Debug)]
#[command(
    name = "feur",
    version = env!("CARGO_PKG_VERSION"),
    about = "Answers chat messages that contain configured trigger words"
)]
pub struct Cli {
    /// Config file (JSON5). Defaults to ~/.config/feur/config.json5 when present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Answer map file, overriding the config.
    #[arg(short, long, global = true)]
    pub answer_map: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer messages read from stdin, one per line (default).
    Run {
        /// Author tag attached to console messages.
        #[arg(long, default_value = "console#0000")]
        author: String,

        /// Reply immediately instead of waiting a random delay.
        #[arg(long)]
        no_delay: bool,
    },

    /// Print the reply one message would get, without delay.
    Reply {
        /// Message text.
        text: String,
    },

    /// Load the answer map and list its triggers.
    Check,

    /// Print version, build date, and git commit information.
    Version,
}

/// Errors that end the process with a non-zero exit code
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigFileError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse-independent entry point used by `main`.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let command = cli.command.unwrap_or(Command::Run {
        author: "console#0000".to_string(),
        no_delay: false,
    });

    if let Command::Version = command {
        handle_version();
        return Ok(());
    }

    let mut cfg = config::load_config(cli.config.as_deref())?;
    if let Some(path) = cli.answer_map {
        cfg.answer_map = path;
    }
    logging::init_logging(&cfg.logging)?;

    match command {
        Command::Run { author, no_delay } => handle_run(&cfg, &author, no_delay).await,
        Command::Reply { text } => handle_reply(&cfg, &text),
        Command::Check => {
            handle_check(&cfg);
            Ok(())
        }
        Command::Version => Ok(()),
    }
}

/// Build the engine described by `cfg`.
pub fn build_engine(cfg: &FeurConfig, delay_mode: DelayMode) -> Arc<AutoReplyEngine> {
    let table = TriggerTable::load(&cfg.answer_map);
    Arc::new(
        AutoReplyEngine::new(Arc::new(table))
            .with_delay(cfg.max_delay_minutes, delay_mode)
            .with_sender_filter(cfg.sender_filter()),
    )
}

/// Run the `run` subcommand.
pub async fn handle_run(cfg: &FeurConfig, author: &str, no_delay: bool) -> Result<(), CliError> {
    let delay_mode = if no_delay {
        DelayMode::Immediate
    } else {
        cfg.delay_mode()
    };
    let engine = build_engine(cfg, delay_mode);
    info!(
        triggers = engine.table().len(),
        max_delay_minutes = cfg.max_delay_minutes,
        "listening on stdin"
    );

    let channel = Arc::new(ConsoleChannel::stdout(Author::user(author, author)));
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    channel.run(input, engine).await?;
    Ok(())
}

/// Run the `reply <text>` subcommand.
pub fn handle_reply(cfg: &FeurConfig, text: &str) -> Result<(), CliError> {
    let engine = build_engine(cfg, DelayMode::Immediate);
    let reply = engine.compose(text);
    write_reply(
        reply.as_deref(),
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )?;
    Ok(())
}

/// Print a composed reply on `out`. When there is none, stdout stays empty
/// and a notice goes to `err`.
pub fn write_reply<O, E>(reply: Option<&str>, out: &mut O, err: &mut E) -> std::io::Result<()>
where
    O: Write,
    E: Write,
{
    match reply {
        Some(reply) => writeln!(out, "{}", reply),
        None => writeln!(err, "(no reply)"),
    }
}

/// Run the `check` subcommand.
pub fn handle_check(cfg: &FeurConfig) {
    let table = TriggerTable::load(&cfg.answer_map);
    println!("{} ({} triggers)", cfg.answer_map.display(), table.len());
    for line in describe_table(&table) {
        println!("  {}", line);
    }
}

/// One summary line per trigger.
pub fn describe_table(table: &TriggerTable) -> Vec<String> {
    table
        .iter()
        .map(|entry| {
            let answer = match &entry.config.answer {
                AnswerSpec::Literal(text) => format!("\"{}\"", text),
                AnswerSpec::Uniform(options) => format!("one of {} answers", options.len()),
                AnswerSpec::Weighted(entries) => {
                    let total: f64 = entries.iter().map(|e| e.probability).sum();
                    format!("{} weighted answers ({:.0}% reply)", entries.len(), total.min(1.0) * 100.0)
                }
            };
            let mut line = format!("{} [{}] -> {}", entry.trigger, entry.config.mode, answer);
            if !entry.config.secondary_matches.is_empty() {
                line.push_str(&format!(
                    " (also: {})",
                    entry.config.secondary_matches.join(", ")
                ));
            }
            line
        })
        .collect()
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("feur {}", env!("CARGO_PKG_VERSION"));
    println!("  commit: {}", env!("FEUR_GIT_HASH"));
    println!("  built:  {}", env!("FEUR_BUILD_DATE"));
}
