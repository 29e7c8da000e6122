//! Each room sits behind its own mutex. An intent takes that lock, is applied,
//! and its deltas are queued into the recipients' outboxes before the lock is
//! released, so everyone in a room sees the same order. Joins and leaves take
//! the registry lock first and the room lock second.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};

use super::{
    chat::DEFAULT_COOLDOWN,
    membership::{validate_identity, validate_room_name},
    msg::{ClientEvent, Empty, JoinRoomError, RoomSummary, Seat, ServerEvent},
    room::{Delta, Intent, Room},
};

pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug)]
pub struct Peer {
    id: Uuid,
    outbox: Outbox,
    seat: Option<Seat>,
}

impl Peer {
    pub fn new(outbox: Outbox) -> Self {
        Self {
            id: Uuid::now_v7(),
            outbox,
            seat: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn send(&self, event: ServerEvent) {
        if self.outbox.send(event).is_err() {
            debug!(peer = %self.id, "outbox closed");
        }
    }
}

#[derive(Debug)]
struct RoomEntry {
    room: Room,
    outboxes: HashMap<String, Outbox>,
}

impl RoomEntry {
    fn deliver(&self, deltas: Vec<Delta>) {
        for delta in deltas {
            for (identity, outbox) in &self.outboxes {
                if delta.audience.includes(identity) && outbox.send(delta.event.clone()).is_err() {
                    debug!(room = %self.room.name(), identity, "outbox closed");
                }
            }
        }
    }
}

type RoomSlot = Arc<Mutex<RoomEntry>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
pub struct Lobby {
    rooms: Arc<Mutex<HashMap<String, RoomSlot>>>,
    chat_cooldown: Duration,
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl Lobby {
    pub fn new(chat_cooldown: Duration) -> Self {
        Self {
            rooms: Arc::default(),
            chat_cooldown,
        }
    }

    pub fn listing(&self) -> Vec<RoomSummary> {
        let rooms = lock(&self.rooms);
        let mut listing: Vec<_> = rooms.values().map(|slot| lock(slot).room.summary()).collect();
        listing.sort_by(|a, b| a.room.cmp(&b.room));
        listing
    }

    pub fn dispatch(&self, peer: &mut Peer, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom(seat) => self.join(peer, seat),
            ClientEvent::LeaveRoom(seat) => {
                if peer.seat.as_ref() != Some(&seat) {
                    warn!(peer = %peer.id, room = %seat.room, identity = %seat.identity, "leave for a seat not held");
                    return;
                }
                self.leave(peer);
            }
            event => self.forward(peer, event),
        }
    }

    pub fn join(&self, peer: &mut Peer, seat: Seat) {
        if let Err(err) = self.try_join(peer, &seat) {
            info!(peer = %peer.id, room = %seat.room, identity = %seat.identity, %err, "join refused");
            peer.send(ServerEvent::JoinRoomError(JoinRoomError {
                reason: err.to_string(),
            }));
        }
    }

    fn try_join(&self, peer: &mut Peer, seat: &Seat) -> SessionResult<()> {
        if let Some(current) = &peer.seat {
            return Err(SessionError::rejected(format!(
                "already in room {}",
                current.room
            )));
        }
        validate_identity(&seat.identity)?;
        validate_room_name(&seat.room)?;

        let mut rooms = lock(&self.rooms);
        let slot = rooms
            .entry(seat.room.clone())
            .or_insert_with(|| {
                info!(room = %seat.room, "room opened");
                Arc::new(Mutex::new(RoomEntry {
                    room: Room::new(seat.room.clone(), self.chat_cooldown),
                    outboxes: HashMap::new(),
                }))
            })
            .clone();
        let mut entry = lock(&slot);

        match entry.room.join(&seat.identity) {
            Ok(deltas) => {
                entry
                    .outboxes
                    .insert(seat.identity.clone(), peer.outbox.clone());
                entry.deliver(deltas);
                peer.seat = Some(seat.clone());
                Ok(())
            }
            Err(err) => {
                if entry.room.is_empty() {
                    rooms.remove(&seat.room);
                }
                Err(err)
            }
        }
    }

    pub fn leave(&self, peer: &mut Peer) {
        let Some(seat) = peer.seat.take() else {
            return;
        };
        self.vacate(&seat);
        peer.send(ServerEvent::Left(Empty {}));
        peer.send(ServerEvent::Rooms(self.listing()));
    }

    pub fn disconnect(&self, peer: &mut Peer) {
        if let Some(seat) = peer.seat.take() {
            info!(peer = %peer.id, room = %seat.room, identity = %seat.identity, "seated peer disconnected");
            self.vacate(&seat);
        }
    }

    fn vacate(&self, seat: &Seat) {
        let mut rooms = lock(&self.rooms);
        let Some(slot) = rooms.get(&seat.room).cloned() else {
            return;
        };
        let mut entry = lock(&slot);

        entry.outboxes.remove(&seat.identity);
        if let Some(deltas) = entry.room.leave(&seat.identity) {
            entry.deliver(deltas);
        }
        if entry.room.is_empty() {
            info!(room = %seat.room, "room closed");
            rooms.remove(&seat.room);
        }
    }

    fn forward(&self, peer: &Peer, event: ClientEvent) {
        let Some(seat) = &peer.seat else {
            debug!(peer = %peer.id, "event from unseated peer dropped");
            return;
        };
        if event.room() != seat.room || event.identity().is_some_and(|id| id != seat.identity) {
            warn!(peer = %peer.id, identity = %seat.identity, "event names a seat the peer does not hold");
            return;
        }
        let Some(intent) = intent_of(event) else {
            return;
        };

        let Some(slot) = lock(&self.rooms).get(&seat.room).cloned() else {
            return;
        };
        let mut entry = lock(&slot);
        match entry.room.handle(&seat.identity, intent, Instant::now()) {
            Ok(deltas) => entry.deliver(deltas),
            Err(err) => {
                debug!(peer = %peer.id, room = %seat.room, identity = %seat.identity, %err, "intent ignored")
            }
        }
    }
}

fn intent_of(event: ClientEvent) -> Option<Intent> {
    Some(match event {
        ClientEvent::UpdateBoard(update) => Intent::Move(update.board),
        ClientEvent::RestartGameRequest(_) => Intent::RequestRestart,
        ClientEvent::RestartGameAccepted(_) => Intent::AcceptRestart,
        ClientEvent::RestartGameDeclined(_) => Intent::DeclineRestart,
        ClientEvent::SendMessage(message) => Intent::Message {
            message: message.message,
            timestamp: message.timestamp,
        },
        ClientEvent::Typing(_) => Intent::Typing,
        ClientEvent::TypingStop(_) => Intent::TypingStop,
        ClientEvent::JoinRoom(_) | ClientEvent::LeaveRoom(_) => return None,
    })
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::UnboundedReceiver;

    use crate::game::Symbol;
    use crate::rooms::msg::Joined;

    use super::*;

    fn peer() -> (Peer, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Peer::new(tx), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn invalid_identity_never_opens_a_room() {
        let lobby = Lobby::default();
        let (mut alice, mut rx) = peer();
        lobby.join(&mut alice, Seat::new("way too long name", "r1"));
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerEvent::JoinRoomError(_)]
        ));
        assert!(lobby.listing().is_empty());
        assert!(alice.seat.is_none());
    }

    #[test]
    fn join_and_leave_open_and_close_rooms() {
        let lobby = Lobby::default();
        let (mut alice, mut rx) = peer();
        lobby.join(&mut alice, Seat::new("alice", "r1"));
        assert_eq!(
            drain(&mut rx).first(),
            Some(&ServerEvent::Joined(Joined {
                identity: "alice".to_owned(),
                room: "r1".to_owned(),
                symbol: Symbol::X,
            }))
        );
        assert_eq!(lobby.listing()[0].occupant_count, 1);

        lobby.dispatch(&mut alice, ClientEvent::LeaveRoom(Seat::new("alice", "r1")));
        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::Left(Empty {}), ServerEvent::Rooms(Vec::new())]
        );
        assert!(lobby.listing().is_empty());
    }

    #[test]
    fn one_room_per_peer() {
        let lobby = Lobby::default();
        let (mut alice, mut rx) = peer();
        lobby.join(&mut alice, Seat::new("alice", "r1"));
        drain(&mut rx);
        lobby.join(&mut alice, Seat::new("alice", "r2"));
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerEvent::JoinRoomError(_)]
        ));
        assert_eq!(lobby.listing().len(), 1);
    }

    #[test]
    fn spoofed_identity_is_dropped() {
        let lobby = Lobby::default();
        let (mut alice, mut alice_rx) = peer();
        let (mut bob, mut bob_rx) = peer();
        lobby.join(&mut alice, Seat::new("alice", "r1"));
        lobby.join(&mut bob, Seat::new("bob", "r1"));
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        lobby.dispatch(&mut bob, ClientEvent::Typing(Seat::new("alice", "r1")));
        assert!(drain(&mut alice_rx).is_empty());

        lobby.dispatch(&mut bob, ClientEvent::Typing(Seat::new("bob", "r1")));
        assert_eq!(
            drain(&mut alice_rx),
            vec![ServerEvent::Typing(Seat::new("bob", "r1"))]
        );
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[test]
    fn disconnect_frees_the_seat() {
        let lobby = Lobby::default();
        let (mut alice, _alice_rx) = peer();
        let (mut bob, mut bob_rx) = peer();
        lobby.join(&mut alice, Seat::new("alice", "r1"));
        lobby.join(&mut bob, Seat::new("bob", "r1"));
        drain(&mut bob_rx);

        lobby.disconnect(&mut alice);
        let events = drain(&mut bob_rx);
        assert_eq!(events[0], ServerEvent::PlayerLeft("alice".to_owned()));
        assert_eq!(events[1], ServerEvent::EndGame(Empty {}));
        assert_eq!(lobby.listing()[0].occupant_count, 1);
    }
}
