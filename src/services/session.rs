use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::services::hub::{HubFrame, SnapshotFanout, Subscription};

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_IDLE_HEARTBEATS: u32 = 4;

#[derive(Debug, Clone, Copy)]
pub struct KeepaliveConfig {
    pub heartbeat_interval: Duration,
    /// Unanswered heartbeats tolerated before the session is reaped; 0 keeps
    /// silent connections open until a send fails.
    pub max_idle_heartbeats: u32,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            max_idle_heartbeats: DEFAULT_MAX_IDLE_HEARTBEATS,
        }
    }
}

/// Outbound traffic to a subscriber. `Ping` is a transport-level ping that
/// clients answer on their own, so listen-only clients still count as live.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Ping,
}

/// Inbound traffic from a subscriber, transport-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Text(String),
    Other,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    ClientClosed,
    SendFailed,
    Evicted,
    IdleTimeout,
}

pub fn is_ping(text: &str) -> bool {
    let text = text.trim();
    if text.eq_ignore_ascii_case("ping") {
        return true;
    }
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(|t| t == "ping"))
        .unwrap_or(false)
}

/// Drives one subscriber: forwards hub frames, answers pings and sends a
/// heartbeat plus a transport ping while the client is quiet. Deregisters the
/// connection on exit.
pub async fn run_session<Tx, Rx>(
    fanout: Arc<dyn SnapshotFanout>,
    classroom_id: String,
    tx: Tx,
    rx: Rx,
    keepalive: KeepaliveConfig,
) -> SessionEnd
where
    Tx: Sink<Outbound>,
    Tx::Error: Display,
    Rx: Stream<Item = Inbound>,
{
    tokio::pin!(tx);
    tokio::pin!(rx);

    let Subscription {
        connection_id,
        mut receiver,
        ..
    } = fanout.connect(&classroom_id);
    info!(
        classroom_id = %classroom_id,
        connection_id = %connection_id,
        "stream session started"
    );

    let interval = keepalive.heartbeat_interval;
    let idle = tokio::time::sleep(interval);
    tokio::pin!(idle);
    let mut unanswered = 0u32;

    let end = loop {
        tokio::select! {
            frame = receiver.recv() => {
                let Some(text) = frame else {
                    break SessionEnd::Evicted;
                };
                if let Err(err) = tx.send(Outbound::Text(text)).await {
                    warn!(classroom_id = %classroom_id, connection_id = %connection_id, error = %err, "stream send failed");
                    break SessionEnd::SendFailed;
                }
            }
            inbound = rx.next() => {
                match inbound {
                    Some(Inbound::Text(text)) => {
                        unanswered = 0;
                        idle.as_mut().reset(Instant::now() + interval);
                        if is_ping(&text) {
                            if let Err(err) = tx.send(Outbound::Text(HubFrame::Pong.to_text())).await {
                                warn!(classroom_id = %classroom_id, connection_id = %connection_id, error = %err, "pong send failed");
                                break SessionEnd::SendFailed;
                            }
                        } else {
                            debug!(connection_id = %connection_id, "ignoring inbound text frame");
                        }
                    }
                    Some(Inbound::Other) => {
                        unanswered = 0;
                        idle.as_mut().reset(Instant::now() + interval);
                    }
                    Some(Inbound::Close) | None => break SessionEnd::ClientClosed,
                }
            }
            () = &mut idle => {
                if keepalive.max_idle_heartbeats > 0 && unanswered >= keepalive.max_idle_heartbeats {
                    break SessionEnd::IdleTimeout;
                }
                unanswered += 1;
                idle.as_mut().reset(Instant::now() + interval);
                let heartbeat = Outbound::Text(HubFrame::heartbeat().to_text());
                if let Err(err) = tx.feed(heartbeat).await {
                    warn!(classroom_id = %classroom_id, connection_id = %connection_id, error = %err, "heartbeat send failed");
                    break SessionEnd::SendFailed;
                }
                if let Err(err) = tx.send(Outbound::Ping).await {
                    warn!(classroom_id = %classroom_id, connection_id = %connection_id, error = %err, "ping send failed");
                    break SessionEnd::SendFailed;
                }
            }
        }
    };

    fanout.disconnect(&classroom_id, connection_id);
    info!(
        classroom_id = %classroom_id,
        connection_id = %connection_id,
        reason = ?end,
        "stream session ended"
    );
    end
}
