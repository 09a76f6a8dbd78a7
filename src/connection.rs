use tokio::sync::mpsc;

use crate::error::RelayError;

// Outbox of one client; the socket writer task owns the receiving end
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    client: String,
    tx: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    pub fn new(client: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            client: client.into(),
            tx,
        };
        (handle, rx)
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn send(&self, text: impl Into<String>) -> Result<(), RelayError> {
        self.tx
            .send(text.into())
            .map_err(|_| RelayError::RecipientUnavailable {
                client: self.client.clone(),
            })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn closed(&self) {
        self.tx.closed().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_arrive_in_send_order() {
        let (handle, mut rx) = ConnectionHandle::new("a");
        handle.send("one").unwrap();
        handle.send(String::from("two")).unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("one"));
        assert_eq!(rx.recv().await.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn send_fails_once_writer_is_gone() {
        let (handle, rx) = ConnectionHandle::new("a");
        assert!(!handle.is_closed());
        drop(rx);

        handle.closed().await;
        assert!(handle.is_closed());
        match handle.send("late") {
            Err(RelayError::RecipientUnavailable { client }) => assert_eq!(client, "a"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
