//! WebSocket signaling relay for WebRTC rooms.

#![forbid(unsafe_code)]

pub mod app_state;
pub mod config;
pub mod connection;
pub mod error;
pub mod room;
pub mod router;
pub mod server;
pub mod session;
pub mod signal;

pub use app_state::{AppState, RoomRegistry};
pub use config::Config;
pub use connection::ConnectionHandle;
pub use error::{ConfigError, RelayError};
pub use router::{Routed, SignalRouter};
pub use server::{app, serve};
pub use signal::{MessageKind, ServerMessage, SignalMessage};
