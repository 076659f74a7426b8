//! Entry point for the audiobook client.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Build the async runtime and hand the requested task to the app loop.

mod api;
mod app;
mod audiobook;
mod cache;
mod cancellation;
mod config;
mod loading;
mod output;
mod push;
mod terminal;

use crate::api::models::{CollectionConversionRequest, ConversionRequest, VoiceSettings};
use crate::app::{Message, RunMode, run_app};
use crate::config::{AppConfig, LogLevel, load_config, serialize_config};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

#[derive(Debug, Parser)]
#[command(name = "pagecast", version, about = "Play and convert audiobooks from a book conversion server")]
struct Cli {
    /// Configuration file.
    #[arg(long, default_value = "conf/config.toml")]
    config: PathBuf,
    /// Overrides `server.url` from the configuration.
    #[arg(long, env = "PAGECAST_SERVER_URL")]
    server_url: Option<String>,
    /// Overrides `logging.log_level` from the configuration.
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play an audiobook page by page.
    Play { audiobook_id: String },
    /// Search for a book by title and convert it.
    Convert {
        #[arg(long)]
        title: String,
        /// Language of the book search.
        #[arg(long, default_value = "en")]
        language: String,
        #[arg(long)]
        voice_engine: Option<String>,
        #[arg(long)]
        voice_language: Option<String>,
        /// Use the slower speaking voice.
        #[arg(long)]
        slow: bool,
    },
    /// Re-convert a book that is already in the collection.
    ConvertExisting {
        audiobook_id: String,
        #[arg(long)]
        voice_engine: Option<String>,
        #[arg(long)]
        voice_language: Option<String>,
        #[arg(long)]
        slow: bool,
    },
    /// Follow the progress of a running conversion.
    Watch { conversion_id: String },
    /// Show the summary of a conversion.
    Summary { conversion_id: String },
    /// List the audiobooks on the server.
    Library,
    /// Delete an audiobook from the server.
    Delete { audiobook_id: String },
    /// Save the audio of one page of a finished conversion.
    Download {
        conversion_id: String,
        page: u32,
        /// Output file; defaults to `<conversion-id>-page-<page>.mp3`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show library statistics.
    Stats,
    /// Print the effective configuration.
    ShowConfig,
}

fn main() {
    let reload_handle = init_tracing();
    match run(&reload_handle) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!("{err:?}");
            std::process::exit(1);
        }
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<bool> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config);
    if let Some(server_url) = cli.server_url {
        config.server_url = server_url;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        config = %cli.config.display(),
        server = %config.server_url,
        level = %config.log_level,
        "Starting audiobook client"
    );

    let (mode, initial) = match cli.command {
        Command::Play { audiobook_id } => (RunMode::Player, Message::OpenAudiobook(audiobook_id)),
        Command::Convert {
            title,
            language,
            voice_engine,
            voice_language,
            slow,
        } => {
            let request = ConversionRequest {
                title,
                language,
                voice_engine: voice_engine.unwrap_or_else(|| config.voice_engine.clone()),
                voice_settings: voice_settings(&config, voice_language, slow),
            };
            (RunMode::Conversion, Message::StartConversion(request))
        }
        Command::ConvertExisting {
            audiobook_id,
            voice_engine,
            voice_language,
            slow,
        } => {
            let request = CollectionConversionRequest {
                audiobook_id,
                voice_engine: voice_engine.unwrap_or_else(|| config.voice_engine.clone()),
                voice_settings: voice_settings(&config, voice_language, slow),
            };
            (RunMode::Conversion, Message::ConvertFromCollection(request))
        }
        Command::Watch { conversion_id } => {
            (RunMode::Conversion, Message::WatchConversion(conversion_id))
        }
        Command::Summary { conversion_id } => {
            (RunMode::OneShot, Message::FetchSummary(conversion_id))
        }
        Command::Library => (RunMode::OneShot, Message::ListAudiobooks),
        Command::Delete { audiobook_id } => {
            (RunMode::OneShot, Message::DeleteAudiobook(audiobook_id))
        }
        Command::Download {
            conversion_id,
            page,
            out,
        } => {
            let out =
                out.unwrap_or_else(|| PathBuf::from(format!("{conversion_id}-page-{page}.mp3")));
            (
                RunMode::OneShot,
                Message::DownloadPage {
                    conversion_id,
                    page,
                    out,
                },
            )
        }
        Command::Stats => (RunMode::OneShot, Message::FetchStats),
        Command::ShowConfig => {
            print!("{}", serialize_config(&config)?);
            return Ok(true);
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building async runtime")?;
    runtime.block_on(run_app(config, mode, initial))
}

fn voice_settings(config: &AppConfig, language: Option<String>, slow: bool) -> VoiceSettings {
    VoiceSettings {
        language: language.unwrap_or_else(|| config.voice_language.clone()),
        slow: Some(slow || config.voice_slow),
    }
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
