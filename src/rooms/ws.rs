use axum::{
    debug_handler,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    lobby::{Lobby, Peer},
    msg::{ClientEvent, ServerEvent},
};

#[debug_handler(state = crate::AppState)]
pub async fn room_ws(State(lobby): State<Lobby>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |stream| serve_peer(stream, lobby))
}

pub(crate) async fn serve_peer(stream: WebSocket, lobby: Lobby) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let mut peer = Peer::new(tx);
    let peer_id = peer.id();
    info!(peer = %peer_id, "peer connected");

    let (mut sender, mut receiver) = stream.split();

    let mut outbound_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!(peer = %peer_id, %err, "could not encode event");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    peer.send(ServerEvent::Rooms(lobby.listing()));

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let msg = match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(msg)) => msg,
                };
                let Ok(event) = serde_json::from_slice::<ClientEvent>(&msg.into_data()) else {
                    debug!(peer = %peer_id, "unreadable frame skipped");
                    continue;
                };
                lobby.dispatch(&mut peer, event);
            }
            _ = &mut outbound_task => break,
        }
    }

    lobby.disconnect(&mut peer);
    outbound_task.abort();
    info!(peer = %peer_id, "peer disconnected");
}
