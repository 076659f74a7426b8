use super::super::super::messages::Message;
use super::super::Effect;
use crate::api::ApiClient;
use crate::output::{AudioOutput, SegmentTag};
use crate::push::{PushEvent, PushHandle};
use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Whether the event loop keeps going after an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::app) enum Flow {
    Continue,
    Exit { success: bool },
}

/// Executes effects: output commands inline, network calls and timers as
/// spawned tasks that report back through the message channel.
pub(in crate::app) struct Runtime {
    api: ApiClient,
    output: Option<Box<dyn AudioOutput>>,
    push: Option<PushHandle>,
    tx: UnboundedSender<Message>,
}

impl Runtime {
    pub(in crate::app) fn new(
        api: ApiClient,
        output: Option<Box<dyn AudioOutput>>,
        push: Option<PushHandle>,
        tx: UnboundedSender<Message>,
    ) -> Self {
        Self {
            api,
            output,
            push,
            tx,
        }
    }

    pub(in crate::app) fn run_effect(&mut self, effect: Effect) -> Flow {
        match effect {
            Effect::FetchPages {
                token,
                audiobook_id,
            } => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let generation = token.generation();
                    let result = api
                        .audiobook_pages(&audiobook_id)
                        .await
                        .map_err(|err| err.to_string());
                    if let Err(err) = token.check_cancelled("page metadata") {
                        debug!("Dropping page metadata: {err}");
                        return;
                    }
                    send(
                        &tx,
                        Message::PagesFetched {
                            generation,
                            audiobook_id,
                            result,
                        },
                    );
                });
            }
            Effect::SetSource {
                generation,
                page,
                url,
            } => {
                if let Some(output) = self.output.as_mut() {
                    output.set_source(SegmentTag { generation, page }, &url);
                } else {
                    warn!(page, "No audio output; cannot assign source");
                }
            }
            Effect::Prime {
                generation,
                page,
                url,
            } => {
                if let Some(output) = self.output.as_mut() {
                    output.prime(SegmentTag { generation, page }, &url);
                } else {
                    // Keep the loading set consistent even without a device.
                    send(
                        &self.tx,
                        Message::Output(crate::output::OutputEvent::Primed {
                            tag: SegmentTag { generation, page },
                            ok: false,
                        }),
                    );
                }
            }
            Effect::Play => self.with_output(|output| output.play()),
            Effect::Pause => self.with_output(|output| output.pause()),
            Effect::Stop => self.with_output(|output| output.stop()),
            Effect::SetVolume(volume) => self.with_output(|output| output.set_volume(volume)),
            Effect::ScheduleErrorSkip {
                generation,
                page,
                delay,
            } => {
                debug!(page, delay_ms = delay.as_millis() as u64, "Scheduling skip past failed page");
                self.after(delay, Message::ErrorSkipDue { generation, page });
            }
            Effect::SubmitConversion(request) => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = api
                        .start_conversion(&request)
                        .await
                        .map_err(|err| err.to_string());
                    send(&tx, Message::ConversionStarted(result));
                });
            }
            Effect::SubmitCollectionConversion(request) => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = api
                        .convert_from_collection(&request)
                        .await
                        .map_err(|err| err.to_string());
                    send(&tx, Message::ConversionStarted(result));
                });
            }
            Effect::JoinConversion(conversion_id) => {
                let joined = match self.push.as_ref() {
                    Some(push) => push.join(&conversion_id).map_err(|err| err.to_string()),
                    None => Err("push channel is not connected".to_string()),
                };
                match joined {
                    Ok(()) => info!(%conversion_id, "Joined conversion progress"),
                    Err(reason) => send(&self.tx, Message::Push(PushEvent::Disconnected { reason })),
                }
            }
            Effect::ScheduleResults {
                conversion_id,
                delay,
            } => self.after(delay, Message::ResultsDue { conversion_id }),
            Effect::FetchConversionSummary(conversion_id) => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = api
                        .conversion(&conversion_id)
                        .await
                        .map_err(|err| err.to_string());
                    send(
                        &tx,
                        Message::ConversionSummaryLoaded {
                            conversion_id,
                            result,
                        },
                    );
                });
            }
            Effect::ListAudiobooks => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = api.list_audiobooks().await.map_err(|err| err.to_string());
                    send(&tx, Message::AudiobooksListed(result));
                });
            }
            Effect::DeleteAudiobook(audiobook_id) => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = api
                        .delete_audiobook(&audiobook_id)
                        .await
                        .map_err(|err| err.to_string());
                    send(
                        &tx,
                        Message::AudiobookDeleted {
                            audiobook_id,
                            result,
                        },
                    );
                });
            }
            Effect::FetchStats => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = api.stats().await.map_err(|err| err.to_string());
                    send(&tx, Message::StatsLoaded(result));
                });
            }
            Effect::DownloadPage {
                conversion_id,
                page,
                out,
            } => {
                let api = self.api.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = download_to(&api, &conversion_id, page, out)
                        .await
                        .map_err(|err| format!("{err:#}"));
                    send(
                        &tx,
                        Message::PageDownloaded {
                            conversion_id,
                            page,
                            result,
                        },
                    );
                });
            }
            Effect::Notify(notification) => crate::terminal::emit(&notification),
            Effect::Exit { success } => return Flow::Exit { success },
        }
        Flow::Continue
    }

    fn with_output(&mut self, f: impl FnOnce(&mut dyn AudioOutput)) {
        if let Some(output) = self.output.as_mut() {
            f(output.as_mut());
        }
    }

    fn after(&self, delay: Duration, message: Message) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            send(&tx, message);
        });
    }
}

async fn download_to(
    api: &ApiClient,
    conversion_id: &str,
    page: u32,
    out: PathBuf,
) -> anyhow::Result<(PathBuf, usize)> {
    let audio = api.download_page(conversion_id, page).await?;
    let size = audio.len();
    let target = out.clone();
    tokio::task::spawn_blocking(move || std::fs::write(&target, &audio))
        .await
        .context("joining file writer")?
        .with_context(|| format!("writing {}", out.display()))?;
    Ok((out, size))
}

fn send(tx: &UnboundedSender<Message>, message: Message) {
    if tx.send(message).is_err() {
        debug!("Event loop has stopped; dropping completion");
    }
}
