use super::frame::{self, Frame};
use crate::api::models::ProgressUpdate;
use anyhow::{Context, Result, anyhow};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tracing::{debug, info, trace, warn};
use url::Url;

const PROGRESS_EVENT: &str = "conversion_progress";
const JOINED_EVENT: &str = "joined";
const JOIN_EVENT: &str = "join_conversion";

/// Events surfaced by the push channel, in receipt order.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connected,
    Joined {
        conversion_id: String,
    },
    Progress {
        conversion_id: String,
        update: ProgressUpdate,
    },
    Malformed {
        reason: String,
    },
    Disconnected {
        reason: String,
    },
}

#[derive(Debug)]
enum PushCommand {
    Join(String),
}

/// Handle to a live push connection. Dropping every clone closes the socket.
#[derive(Debug, Clone)]
pub struct PushHandle {
    commands: mpsc::UnboundedSender<PushCommand>,
}

impl PushHandle {
    /// Subscribe to progress events of one conversion. Later events are tagged
    /// with this identifier.
    pub fn join(&self, conversion_id: &str) -> Result<()> {
        self.commands
            .send(PushCommand::Join(conversion_id.to_string()))
            .map_err(|_| anyhow!("push channel is closed"))
    }
}

/// Socket.IO endpoint for a service base URL.
pub fn socket_url(base: &Url) -> Result<Url> {
    let mut url = base.join("socket.io/").context("building socket.io path")?;
    let scheme = match base.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| anyhow!("cannot use scheme {scheme} for {base}"))?;
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

/// Open the push channel and start pumping events into `sink`.
pub async fn connect<F>(base: &Url, sink: F) -> Result<PushHandle>
where
    F: Fn(PushEvent) + Send + Sync + 'static,
{
    let url = socket_url(base)?;
    info!(%url, "Connecting push channel");
    let (stream, _) = connect_async(url.as_str())
        .await
        .with_context(|| format!("connecting to {url}"))?;
    let (commands, command_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        if let Err(err) = pump(stream, command_rx, &sink).await {
            warn!("Push channel stopped: {err:#}");
            sink(PushEvent::Disconnected {
                reason: format!("{err:#}"),
            });
        }
    });
    Ok(PushHandle { commands })
}

async fn pump<S, F>(
    stream: S,
    mut commands: mpsc::UnboundedReceiver<PushCommand>,
    sink: &F,
) -> Result<()>
where
    S: futures::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + futures::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
    F: Fn(PushEvent),
{
    let (mut write, mut read) = stream.split();
    let mut session = ChannelSession::default();

    loop {
        tokio::select! {
            incoming = read.next() => {
                let text = match incoming {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => {
                        sink(PushEvent::Disconnected { reason: "server closed the socket".to_string() });
                        return Ok(());
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => return Err(err).context("reading push frame"),
                };
                trace!(frame = %text.as_str(), "Push frame received");
                let step = session.on_frame(text.as_str());
                for reply in step.replies {
                    write.send(WsMessage::text(reply)).await.context("writing push frame")?;
                }
                for event in step.events {
                    sink(event);
                }
                if step.closed {
                    return Ok(());
                }
            }
            command = commands.recv() => {
                let Some(PushCommand::Join(conversion_id)) = command else {
                    debug!("All push handles dropped; closing socket");
                    let _ = write.close().await;
                    return Ok(());
                };
                if let Some(reply) = session.join(conversion_id) {
                    write.send(WsMessage::text(reply)).await.context("sending join")?;
                }
            }
        }
    }
}

/// Protocol state of one connection, free of I/O so it can be tested.
#[derive(Debug, Default)]
struct ChannelSession {
    connected: bool,
    joined: Option<String>,
    pending_join: Option<String>,
}

#[derive(Debug, Default)]
struct Step {
    replies: Vec<String>,
    events: Vec<PushEvent>,
    closed: bool,
}

impl ChannelSession {
    fn join(&mut self, conversion_id: String) -> Option<String> {
        self.joined = Some(conversion_id.clone());
        if self.connected {
            Some(join_frame(&conversion_id))
        } else {
            self.pending_join = Some(conversion_id);
            None
        }
    }

    fn on_frame(&mut self, text: &str) -> Step {
        let mut step = Step::default();
        let decoded = match frame::decode(text) {
            Ok(decoded) => decoded,
            Err(err) => {
                step.events.push(PushEvent::Malformed {
                    reason: err.to_string(),
                });
                return step;
            }
        };
        match decoded {
            Frame::Open(handshake) => {
                debug!(sid = %handshake.sid, ping_ms = handshake.ping_interval_ms, "Engine.IO session open");
                step.replies.push(frame::CONNECT.to_string());
            }
            Frame::Ping => step.replies.push(frame::PONG.to_string()),
            Frame::Pong | Frame::Noop => {}
            Frame::Connected => {
                self.connected = true;
                step.events.push(PushEvent::Connected);
                if let Some(conversion_id) = self.pending_join.take() {
                    step.replies.push(join_frame(&conversion_id));
                }
            }
            Frame::Event { name, payload } => {
                if let Some(event) = self.on_event(&name, payload) {
                    step.events.push(event);
                }
            }
            Frame::Disconnected | Frame::Close => {
                self.connected = false;
                step.events.push(PushEvent::Disconnected {
                    reason: "server ended the session".to_string(),
                });
                step.closed = true;
            }
            Frame::ConnectError(reason) => {
                step.events.push(PushEvent::Disconnected { reason });
                step.closed = true;
            }
        }
        step
    }

    fn on_event(&self, name: &str, payload: serde_json::Value) -> Option<PushEvent> {
        match name {
            PROGRESS_EVENT => {
                let Some(conversion_id) = self.joined.clone() else {
                    debug!("Progress event before any join; dropping");
                    return None;
                };
                let parsed = serde_json::from_value::<ProgressUpdate>(payload)
                    .map_err(|err| err.to_string())
                    .and_then(|update| update.validate().map_err(|err| err.to_string()));
                Some(match parsed {
                    Ok(update) => PushEvent::Progress {
                        conversion_id,
                        update,
                    },
                    Err(reason) => PushEvent::Malformed { reason },
                })
            }
            JOINED_EVENT => payload
                .get("conversion_id")
                .and_then(|v| v.as_str())
                .map(|id| PushEvent::Joined {
                    conversion_id: id.to_string(),
                }),
            other => {
                trace!(event = other, "Ignoring push event");
                None
            }
        }
    }
}

fn join_frame(conversion_id: &str) -> String {
    frame::encode_event(JOIN_EVENT, &json!({ "conversion_id": conversion_id }))
}

#[cfg(test)]
mod tests {
    use super::{ChannelSession, PushEvent, socket_url};
    use url::Url;

    #[test]
    fn socket_url_switches_scheme_and_adds_transport() {
        let http = Url::parse("http://books.local:5000/").unwrap();
        assert_eq!(
            socket_url(&http).unwrap().as_str(),
            "ws://books.local:5000/socket.io/?EIO=4&transport=websocket"
        );
        let https = Url::parse("https://books.example/").unwrap();
        assert!(socket_url(&https).unwrap().as_str().starts_with("wss://"));
    }

    #[test]
    fn handshake_connect_and_heartbeat() {
        let mut session = ChannelSession::default();
        let step = session.on_frame(r#"0{"sid":"s","pingInterval":25000,"pingTimeout":5000}"#);
        assert_eq!(step.replies, vec!["40".to_string()]);
        let step = session.on_frame("2");
        assert_eq!(step.replies, vec!["3".to_string()]);
    }

    #[test]
    fn join_before_connect_is_sent_once_connected() {
        let mut session = ChannelSession::default();
        assert!(session.join("c-1".to_string()).is_none());
        let step = session.on_frame("40");
        assert_eq!(step.events, vec![PushEvent::Connected]);
        assert_eq!(
            step.replies,
            vec![r#"42["join_conversion",{"conversion_id":"c-1"}]"#.to_string()]
        );
        assert!(session.join("c-2".to_string()).is_some());
    }

    #[test]
    fn progress_events_are_tagged_with_joined_conversion() {
        let mut session = ChannelSession::default();
        session.on_frame("40");
        let dropped = session.on_frame(r#"42["conversion_progress",{"status":"searching"}]"#);
        assert!(dropped.events.is_empty());

        session.join("c-7".to_string());
        let step = session.on_frame(
            r#"42["conversion_progress",{"status":"converting","progress":50,"message":"half"}]"#,
        );
        let [PushEvent::Progress { conversion_id, update }] = step.events.as_slice() else {
            panic!("expected one progress event, got {:?}", step.events);
        };
        assert_eq!(conversion_id, "c-7");
        assert_eq!(update.progress, Some(50.0));
    }

    #[test]
    fn bad_progress_payload_is_reported_as_malformed() {
        let mut session = ChannelSession::default();
        session.on_frame("40");
        session.join("c-7".to_string());
        let step = session.on_frame(r#"42["conversion_progress",{"progress":"lots"}]"#);
        assert!(matches!(step.events.as_slice(), [PushEvent::Malformed { .. }]));
    }

    #[test]
    fn connect_error_closes_channel() {
        let mut session = ChannelSession::default();
        let step = session.on_frame(r#"44{"message":"nope"}"#);
        assert!(step.closed);
        assert_eq!(
            step.events,
            vec![PushEvent::Disconnected {
                reason: "nope".to_string()
            }]
        );
    }
}
