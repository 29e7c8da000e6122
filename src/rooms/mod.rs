pub mod chat;
pub mod lobby;
pub mod membership;
pub mod msg;
pub mod restart;
pub mod room;
mod ws;

use axum::{Json, Router, debug_handler, extract::State, routing::get};

use crate::AppState;

pub use lobby::{Lobby, Outbox, Peer};
pub use msg::{ClientEvent, RoomSummary, ServerEvent};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::room_ws))
        .route("/rooms", get(list_rooms))
}

#[debug_handler(state = AppState)]
async fn list_rooms(State(lobby): State<Lobby>) -> Json<Vec<RoomSummary>> {
    Json(lobby.listing())
}
