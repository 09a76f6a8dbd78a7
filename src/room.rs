use indexmap::IndexMap;
use tracing::warn;

use crate::connection::ConnectionHandle;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Fanout {
    pub delivered: usize,
    pub failed: Vec<String>,
}

// Room: client id -> handle, in join order
pub struct Room {
    id: String,
    clients: IndexMap<String, ConnectionHandle>,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Room {
            id: id.into(),
            clients: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn get(&self, client: &str) -> Option<&ConnectionHandle> {
        self.clients.get(client)
    }

    pub fn insert(&mut self, client: String, handle: ConnectionHandle) -> bool {
        if self.clients.contains_key(&client) {
            return false;
        }
        self.clients.insert(client, handle);
        true
    }

    pub fn remove(&mut self, client: &str) -> Option<ConnectionHandle> {
        // shift_remove keeps the remaining members in join order
        self.clients.shift_remove(client)
    }

    pub fn users(&self) -> Vec<String> {
        self.clients.keys().cloned().collect()
    }

    // Sender included. A closed outbox is logged and skipped.
    pub fn broadcast(&self, text: &str) -> Fanout {
        let mut fanout = Fanout::default();
        for (client, handle) in &self.clients {
            match handle.send(text) {
                Ok(()) => fanout.delivered += 1,
                Err(e) => {
                    warn!(room = %self.id, client = %client, error = %e, "broadcast send failed");
                    fanout.failed.push(client.clone());
                }
            }
        }
        fanout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_join_order_across_removals() {
        let mut room = Room::new("r");
        let mut outboxes = Vec::new();
        for id in ["a", "b", "c", "d"] {
            let (handle, rx) = ConnectionHandle::new(id);
            assert!(room.insert(id.to_string(), handle));
            outboxes.push(rx);
        }

        assert!(room.remove("b").is_some());
        assert_eq!(room.users(), vec!["a", "c", "d"]);
        assert_eq!(room.len(), 3);
    }

    #[test]
    fn refuses_a_taken_client_id() {
        let mut room = Room::new("r");
        let (first, mut first_rx) = ConnectionHandle::new("a");
        let (second, _second_rx) = ConnectionHandle::new("a");

        assert!(room.insert("a".into(), first));
        assert!(!room.insert("a".into(), second));

        room.get("a").unwrap().send("hi").unwrap();
        assert_eq!(first_rx.try_recv().unwrap(), "hi");
    }

    #[test]
    fn broadcast_skips_closed_outboxes() {
        let mut room = Room::new("r");
        let (a, mut a_rx) = ConnectionHandle::new("a");
        let (b, b_rx) = ConnectionHandle::new("b");
        let (c, mut c_rx) = ConnectionHandle::new("c");
        room.insert("a".into(), a);
        room.insert("b".into(), b);
        room.insert("c".into(), c);
        drop(b_rx);

        let fanout = room.broadcast("ping");

        assert_eq!(fanout.delivered, 2);
        assert_eq!(fanout.failed, vec!["b".to_string()]);
        assert_eq!(a_rx.try_recv().unwrap(), "ping");
        assert_eq!(c_rx.try_recv().unwrap(), "ping");
    }
}
