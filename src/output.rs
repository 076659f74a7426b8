//! Audio output for page segments.
//!
//! The player only ever assigns a source, primes a future source, and toggles
//! transport state. Everything that blocks (HTTP transfer, decoding, the audio
//! device) lives on a dedicated worker thread; outcomes come back as
//! `OutputEvent`s tagged with the session generation and page they were issued
//! for.

use anyhow::{Context, Result, anyhow};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const PRIMED_CAPACITY: usize = 4;

/// Identity of a segment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentTag {
    pub generation: u64,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// The assigned source decoded and is attached to the output.
    Ready(SegmentTag),
    Ended(SegmentTag),
    Failed { tag: SegmentTag, error: String },
    Primed { tag: SegmentTag, ok: bool },
}

pub trait AudioOutput {
    fn set_source(&mut self, tag: SegmentTag, url: &str);
    fn prime(&mut self, tag: SegmentTag, url: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
}

pub type EventSink = Box<dyn Fn(OutputEvent) + Send + 'static>;

enum Command {
    SetSource {
        tag: SegmentTag,
        url: String,
    },
    SourceFetched {
        tag: SegmentTag,
        url: String,
        result: Result<Vec<u8>, String>,
    },
    Prime {
        tag: SegmentTag,
        url: String,
    },
    PrimeFetched {
        tag: SegmentTag,
        url: String,
        result: Result<Vec<u8>, String>,
    },
    Play,
    Pause,
    Stop,
    SetVolume(f32),
}

/// Rodio-backed output running on its own thread.
pub struct RodioOutput {
    commands: Sender<Command>,
}

impl RodioOutput {
    pub fn spawn(fetch_timeout: Duration, notify: EventSink) -> Result<Self> {
        let (commands, receiver) = mpsc::channel();
        let loopback = commands.clone();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };
                let http = match reqwest::blocking::Client::builder()
                    .timeout(fetch_timeout)
                    .build()
                {
                    Ok(http) => http,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                let mut worker = Worker {
                    handle,
                    http,
                    loopback,
                    notify,
                    requested: None,
                    current: None,
                    primed: PrimedStore::default(),
                    volume: 1.0,
                    playing: false,
                };
                worker.run(receiver);
            })
            .context("spawning audio output thread")?;

        ready_rx
            .recv()
            .map_err(|_| anyhow!("audio output thread exited during startup"))?
            .map_err(|err| anyhow!("opening audio output: {err}"))?;
        info!("Audio output ready");
        Ok(Self { commands })
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("Audio output thread is gone; dropping command");
        }
    }
}

impl AudioOutput for RodioOutput {
    fn set_source(&mut self, tag: SegmentTag, url: &str) {
        self.send(Command::SetSource {
            tag,
            url: url.to_string(),
        });
    }

    fn prime(&mut self, tag: SegmentTag, url: &str) {
        self.send(Command::Prime {
            tag,
            url: url.to_string(),
        });
    }

    fn play(&mut self) {
        self.send(Command::Play);
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }

    fn stop(&mut self) {
        self.send(Command::Stop);
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(Command::SetVolume(volume));
    }
}

struct Worker {
    handle: OutputStreamHandle,
    http: reqwest::blocking::Client,
    loopback: Sender<Command>,
    notify: EventSink,
    requested: Option<SegmentTag>,
    current: Option<(SegmentTag, Sink)>,
    primed: PrimedStore,
    volume: f32,
    playing: bool,
}

impl Worker {
    fn run(&mut self, receiver: mpsc::Receiver<Command>) {
        loop {
            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(command) => self.handle_command(command),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.check_finished();
        }
        debug!("Audio output thread exiting");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetSource { tag, url } => {
                self.current = None;
                self.requested = Some(tag);
                if let Some(bytes) = self.primed.take(&url) {
                    debug!(page = tag.page, "Using primed segment");
                    self.attach(tag, &url, bytes);
                } else {
                    self.fetch(url, move |url, result| Command::SourceFetched {
                        tag,
                        url,
                        result,
                    });
                }
            }
            Command::SourceFetched { tag, url, result } => {
                if self.requested != Some(tag) {
                    debug!(page = tag.page, "Dropping superseded segment");
                    return;
                }
                match result {
                    Ok(bytes) => self.attach(tag, &url, bytes),
                    Err(error) => (self.notify)(OutputEvent::Failed { tag, error }),
                }
            }
            Command::Prime { tag, url } => {
                if self.primed.contains(&url) {
                    (self.notify)(OutputEvent::Primed { tag, ok: true });
                } else {
                    self.fetch(url, move |url, result| Command::PrimeFetched {
                        tag,
                        url,
                        result,
                    });
                }
            }
            Command::PrimeFetched { tag, url, result } => {
                let ok = match result {
                    Ok(bytes) => {
                        self.primed.insert(url, bytes);
                        true
                    }
                    Err(error) => {
                        debug!(page = tag.page, "Priming failed: {error}");
                        false
                    }
                };
                (self.notify)(OutputEvent::Primed { tag, ok });
            }
            Command::Play => {
                self.playing = true;
                if let Some((_, sink)) = &self.current {
                    sink.play();
                }
            }
            Command::Pause => {
                self.playing = false;
                if let Some((_, sink)) = &self.current {
                    sink.pause();
                }
            }
            Command::Stop => {
                self.playing = false;
                self.requested = None;
                if let Some((_, sink)) = self.current.take() {
                    sink.stop();
                }
            }
            Command::SetVolume(volume) => {
                self.volume = volume.clamp(0.0, 1.0);
                if let Some((_, sink)) = &self.current {
                    sink.set_volume(self.volume);
                }
            }
        }
    }

    fn fetch<F>(&self, url: String, wrap: F)
    where
        F: FnOnce(String, Result<Vec<u8>, String>) -> Command + Send + 'static,
    {
        let http = self.http.clone();
        let loopback = self.loopback.clone();
        thread::spawn(move || {
            let result = http
                .get(&url)
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.bytes())
                .map(|bytes| bytes.to_vec())
                .map_err(|err| err.to_string());
            let _ = loopback.send(wrap(url, result));
        });
    }

    fn attach(&mut self, tag: SegmentTag, url: &str, bytes: Vec<u8>) {
        let decoder = match Decoder::new(Cursor::new(bytes)) {
            Ok(decoder) => decoder,
            Err(err) => {
                (self.notify)(OutputEvent::Failed {
                    tag,
                    error: format!("decoding {url}: {err}"),
                });
                return;
            }
        };
        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(err) => {
                (self.notify)(OutputEvent::Failed {
                    tag,
                    error: format!("creating sink: {err}"),
                });
                return;
            }
        };
        sink.set_volume(self.volume);
        if !self.playing {
            sink.pause();
        }
        sink.append(decoder);
        self.current = Some((tag, sink));
        (self.notify)(OutputEvent::Ready(tag));
    }

    fn check_finished(&mut self) {
        let finished = matches!(&self.current, Some((_, sink)) if sink.empty());
        if finished {
            if let Some((tag, _)) = self.current.take() {
                (self.notify)(OutputEvent::Ended(tag));
            }
        }
    }
}

/// Small FIFO of fetched-but-unused segments keyed by locator.
#[derive(Debug, Default)]
struct PrimedStore {
    entries: VecDeque<(String, Vec<u8>)>,
}

impl PrimedStore {
    fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|(u, _)| u == url)
    }

    fn insert(&mut self, url: String, bytes: Vec<u8>) {
        self.entries.retain(|(u, _)| *u != url);
        self.entries.push_back((url, bytes));
        while self.entries.len() > PRIMED_CAPACITY {
            self.entries.pop_front();
        }
    }

    fn take(&mut self, url: &str) -> Option<Vec<u8>> {
        let idx = self.entries.iter().position(|(u, _)| u == url)?;
        self.entries.remove(idx).map(|(_, bytes)| bytes)
    }
}
