use tracing::debug;

use crate::app_state::RoomRegistry;
use crate::error::RelayError;
use crate::room::Fanout;
use crate::signal::{MessageKind, ServerMessage, SignalMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Broadcast(Fanout),
    Unicast { to: String },
    Dropped,
}

#[derive(Clone)]
pub struct SignalRouter {
    registry: RoomRegistry,
}

impl SignalRouter {
    pub fn new(registry: RoomRegistry) -> Self {
        Self { registry }
    }

    pub async fn route(
        &self,
        room: &str,
        sender: &str,
        raw: &str,
        message: &SignalMessage,
    ) -> Result<Routed, RelayError> {
        let kind = message.kind();
        let routed = match kind {
            MessageKind::Join => Routed::Broadcast(self.registry.announce(room).await?),
            kind if kind.is_relayed() => self.relay(room, raw, message).await,
            MessageKind::End => {
                let frame = ServerMessage::End {
                    ended_by: sender.to_string(),
                }
                .encode()?;
                Routed::Broadcast(self.registry.broadcast(room, &frame).await)
            }
            MessageKind::Status => {
                let frame = message.status_update(sender).encode()?;
                Routed::Broadcast(self.registry.broadcast(room, &frame).await)
            }
            _ => Routed::Dropped,
        };
        debug!(room, sender, kind = %message.kind, ?routed, "routed frame");
        Ok(routed)
    }

    async fn relay(&self, room: &str, raw: &str, message: &SignalMessage) -> Routed {
        let Some(to) = message.recipient() else {
            return Routed::Dropped;
        };
        match self.registry.send_to(room, to, raw).await {
            Ok(()) => Routed::Unicast { to: to.to_string() },
            Err(e) => {
                debug!(room, to, error = %e, "recipient unavailable");
                Routed::Dropped
            }
        }
    }
}
