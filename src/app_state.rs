use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::debug;

use crate::connection::ConnectionHandle;
use crate::error::RelayError;
use crate::room::{Fanout, Room};
use crate::signal::ServerMessage;

#[derive(Clone, Default)]
pub struct AppState {
    pub registry: RoomRegistry,
}

impl AppState {
    pub fn new(registry: RoomRegistry) -> Self {
        Self { registry }
    }
}

// Table of rooms shared by every connection. Joins and leaves hold the write
// lock while announcing, fan-outs hold the read lock; outbox sends never await.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(
        &self,
        room: &str,
        client: &str,
        handle: ConnectionHandle,
    ) -> Result<(), RelayError> {
        let mut rooms = self.rooms.write().await;
        Self::insert(&mut rooms, room, client, handle)
    }

    pub async fn leave(&self, room: &str, client: &str) -> Option<ConnectionHandle> {
        let mut rooms = self.rooms.write().await;
        Self::remove(&mut rooms, room, client)
    }

    pub async fn members(&self, room: &str) -> Vec<String> {
        let rooms = self.rooms.read().await;
        rooms.get(room).map(Room::users).unwrap_or_default()
    }

    pub async fn lookup(&self, room: &str, client: &str) -> Option<ConnectionHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(room).and_then(|r| r.get(client)).cloned()
    }

    pub async fn contains_room(&self, room: &str) -> bool {
        self.rooms.read().await.contains_key(room)
    }

    pub async fn join_and_announce(
        &self,
        room: &str,
        client: &str,
        handle: ConnectionHandle,
    ) -> Result<Fanout, RelayError> {
        let mut rooms = self.rooms.write().await;
        Self::insert(&mut rooms, room, client, handle)?;
        match rooms.get(room) {
            Some(r) => Self::announce_in(r),
            None => Ok(Fanout::default()),
        }
    }

    /// `None` if the client was not a member; nothing is announced then.
    pub async fn leave_and_announce(
        &self,
        room: &str,
        client: &str,
    ) -> Result<Option<Fanout>, RelayError> {
        let mut rooms = self.rooms.write().await;
        if Self::remove(&mut rooms, room, client).is_none() {
            return Ok(None);
        }
        match rooms.get(room) {
            Some(r) => Self::announce_in(r).map(Some),
            None => Ok(Some(Fanout::default())),
        }
    }

    pub async fn announce(&self, room: &str) -> Result<Fanout, RelayError> {
        let rooms = self.rooms.read().await;
        match rooms.get(room) {
            Some(r) => Self::announce_in(r),
            None => Ok(Fanout::default()),
        }
    }

    pub async fn broadcast(&self, room: &str, text: &str) -> Fanout {
        let rooms = self.rooms.read().await;
        rooms
            .get(room)
            .map(|r| r.broadcast(text))
            .unwrap_or_default()
    }

    pub async fn send_to(&self, room: &str, client: &str, text: &str) -> Result<(), RelayError> {
        let rooms = self.rooms.read().await;
        match rooms.get(room).and_then(|r| r.get(client)) {
            Some(handle) => handle.send(text),
            None => Err(RelayError::RecipientUnavailable {
                client: client.to_string(),
            }),
        }
    }

    fn insert(
        rooms: &mut HashMap<String, Room>,
        room: &str,
        client: &str,
        handle: ConnectionHandle,
    ) -> Result<(), RelayError> {
        let entry = rooms
            .entry(room.to_string())
            .or_insert_with(|| Room::new(room));
        if entry.insert(client.to_string(), handle) {
            debug!(room, client, members = entry.len(), "client joined");
            return Ok(());
        }
        Err(RelayError::AlreadyPresent {
            room: room.to_string(),
            client: client.to_string(),
        })
    }

    fn remove(
        rooms: &mut HashMap<String, Room>,
        room: &str,
        client: &str,
    ) -> Option<ConnectionHandle> {
        let entry = rooms.get_mut(room)?;
        let handle = entry.remove(client)?;
        debug!(room, client, members = entry.len(), "client left");
        // empty rooms are never kept
        if entry.is_empty() {
            rooms.remove(room);
            debug!(room, "room closed");
        }
        Some(handle)
    }

    fn announce_in(room: &Room) -> Result<Fanout, RelayError> {
        let frame = ServerMessage::UsersInRoom {
            users: room.users(),
        }
        .encode()?;
        Ok(room.broadcast(&frame))
    }
}
