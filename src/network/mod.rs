//! Network Layer
//!
//! WebSocket transport and the session coordinator that owns all mutable
//! session state.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, MapSnapshot, PositionUpdate, ClientReport, Frame};
pub use session::{SessionCoordinator, SessionHandle, SessionConfig, SessionCommand, SessionError};
pub use server::{GameServer, ServerConfig, GameServerError};
