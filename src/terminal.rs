//! Terminal surface: raw-mode keyboard input while the player is open and
//! line output for notifications.

use crate::app::{Level, Message, Notification};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

const KEY_POLL_INTERVAL: Duration = Duration::from_millis(100);

static RAW_MODE: AtomicBool = AtomicBool::new(false);

/// Raw-mode keyboard reader. Dropping it restores the terminal.
pub struct KeyboardSession {
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl KeyboardSession {
    pub fn start(tx: UnboundedSender<Message>) -> Result<Self> {
        terminal::enable_raw_mode().context("enabling terminal raw mode")?;
        RAW_MODE.store(true, Ordering::Release);
        let stop = Arc::new(AtomicBool::new(false));
        let reader_stop = stop.clone();
        let reader = thread::Builder::new()
            .name("keyboard".to_string())
            .spawn(move || read_keys(&tx, &reader_stop))
            .context("spawning keyboard reader")?;
        debug!("Keyboard reader started");
        Ok(Self {
            stop,
            reader: Some(reader),
        })
    }
}

impl Drop for KeyboardSession {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        RAW_MODE.store(false, Ordering::Release);
        if let Err(err) = terminal::disable_raw_mode() {
            warn!("Failed to restore terminal mode: {err}");
        }
    }
}

fn read_keys(tx: &UnboundedSender<Message>, stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(KEY_POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(err) => {
                warn!("Keyboard poll failed: {err}");
                return;
            }
        }
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                let message = Message::KeyPressed {
                    code: key.code,
                    modifiers: key.modifiers,
                };
                if tx.send(message).is_err() {
                    return;
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!("Keyboard read failed: {err}");
                return;
            }
        }
    }
}

/// Print one notification on its own line.
pub fn emit(notification: &Notification) {
    let marker = match notification.level() {
        Level::Info => "  ",
        Level::Success => "✓ ",
        Level::Warning => "! ",
        Level::Error => "✗ ",
    };
    let ending = if RAW_MODE.load(Ordering::Acquire) {
        "\r\n"
    } else {
        "\n"
    };
    let line = format!("{marker}{notification}{ending}");
    let written = if notification.level() == Level::Error {
        let mut err = std::io::stderr().lock();
        err.write_all(line.as_bytes()).and_then(|_| err.flush())
    } else {
        let mut out = std::io::stdout().lock();
        out.write_all(line.as_bytes()).and_then(|_| out.flush())
    };
    if let Err(err) = written {
        debug!("Failed to write notification: {err}");
    }
}
