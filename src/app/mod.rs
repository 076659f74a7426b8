mod messages;
mod notification;
mod state;
mod update;

pub use messages::Message;
pub use notification::{Level, Notification};
pub use state::RunMode;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::output::{AudioOutput, RodioOutput};
use crate::terminal::KeyboardSession;
use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};
use state::App;
use update::{Flow, Runtime};

/// Drive the client until the current task finishes. Returns whether it
/// finished successfully.
pub async fn run_app(config: AppConfig, mode: RunMode, initial: Message) -> Result<bool> {
    let api = ApiClient::new(&config.server_url, config.request_timeout())
        .with_context(|| format!("invalid server url {}", config.server_url))?;
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let output: Option<Box<dyn AudioOutput>> = if mode == RunMode::Player {
        let events = tx.clone();
        let output = RodioOutput::spawn(
            config.request_timeout(),
            Box::new(move |event| {
                let _ = events.send(Message::Output(event));
            }),
        )?;
        Some(Box::new(output))
    } else {
        None
    };

    let push = if mode == RunMode::Conversion {
        let events = tx.clone();
        let handle = crate::push::connect(api.base_url(), move |event| {
            let _ = events.send(Message::Push(event));
        })
        .await
        .context("opening the progress channel")?;
        Some(handle)
    } else {
        None
    };

    let interrupts = tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupts.send(Message::Quit);
    })
    .context("installing Ctrl+C handler")?;

    let _keyboard = if mode == RunMode::Player {
        Some(KeyboardSession::start(tx.clone())?)
    } else {
        None
    };

    info!(?mode, server = %api.base_url(), "Client started");
    let mut app = App::new(config, mode);
    let mut runtime = Runtime::new(api, output, push, tx.clone());
    tx.send(initial).context("queueing the initial request")?;

    while let Some(message) = rx.recv().await {
        for effect in app.reduce(message) {
            if let Flow::Exit { success } = runtime.run_effect(effect) {
                debug!(success, "Event loop finished");
                return Ok(success);
            }
        }
    }
    Ok(false)
}
