use std::future::ready;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};

use crate::services::session::{run_session, Inbound, Outbound};
use crate::state::AppState;

pub(super) async fn subscribe(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(classroom_id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, classroom_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, classroom_id: String) {
    let (sender, receiver) = socket.split();

    let tx = sender.with(|frame: Outbound| {
        ready(Ok::<_, axum::Error>(match frame {
            Outbound::Text(text) => Message::Text(text),
            Outbound::Ping => Message::Ping(Vec::new()),
        }))
    });
    let rx = receiver
        .take_while(|msg| ready(msg.is_ok()))
        .filter_map(|msg| {
            ready(match msg {
                Ok(Message::Text(text)) => Some(Inbound::Text(text)),
                Ok(Message::Close(_)) => Some(Inbound::Close),
                // pongs to our heartbeat pings land here and prove liveness
                Ok(_) => Some(Inbound::Other),
                Err(_) => None,
            })
        });

    run_session(state.hub(), classroom_id, tx, rx, state.keepalive()).await;
}
