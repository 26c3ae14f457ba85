//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a JSON text message `{"event": <name>, "data": <payload>}`.

use std::collections::BTreeMap;
use std::sync::Arc;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::position::{GridPoint, Position};
use crate::game::maze::Maze;
use crate::game::state::{ClientId, ClientState, SessionState};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Position report.
    Update(PositionUpdate),

    /// Ask for the current maze snapshot.
    #[serde(rename = "map")]
    MapRequest,
}

/// Position report from a client.
///
/// Missing or malformed fields decode as `None` rather than rejecting the
/// whole message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionUpdate {
    /// Client timestamp.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    /// Client position.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub p: Option<Position>,
}

/// Decode a field, falling back to `None` when its value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Identity assigned to the receiving client.
    Id(ClientId),

    /// Maze snapshot.
    Map(MapSnapshot),

    /// Every client's last report.
    Clients(BTreeMap<ClientId, ClientReport>),

    /// Win counts.
    Scoreboard(BTreeMap<ClientId, u32>),

    /// A client reached the exit.
    Winner(ClientId),

    /// A client left.
    RemoveClient(ClientId),
}

/// Full maze snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSnapshot {
    /// Rows of 0 (open) / 1 (wall).
    pub map: Vec<Vec<u8>>,
    /// Every open cell, row-major.
    pub walkable_positions: Vec<GridPoint>,
    /// Entrance cell.
    pub entrance: GridPoint,
    /// Exit cell.
    pub exit: GridPoint,
    /// Column count.
    pub width: usize,
    /// Row count.
    pub height: usize,
}

impl MapSnapshot {
    /// Snapshot a maze.
    pub fn from_maze(maze: &Maze) -> Self {
        Self {
            map: maze.matrix(),
            walkable_positions: maze.walkable_positions(),
            entrance: maze.entrance(),
            exit: maze.exit(),
            width: maze.width(),
            height: maze.height(),
        }
    }
}

/// One client's entry in a `clients` broadcast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientReport {
    /// Last client timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    /// Last position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<Position>,
}

impl From<&ClientState> for ClientReport {
    fn from(state: &ClientState) -> Self {
        Self {
            t: state.last_timestamp,
            p: state.position,
        }
    }
}

impl ServerMessage {
    /// Current maze.
    pub fn map(state: &SessionState) -> Self {
        ServerMessage::Map(MapSnapshot::from_maze(state.maze()))
    }

    /// Every client's last report.
    pub fn clients(state: &SessionState) -> Self {
        ServerMessage::Clients(
            state
                .clients()
                .iter()
                .map(|(id, c)| (id.clone(), ClientReport::from(c)))
                .collect(),
        )
    }

    /// Current scoreboard.
    pub fn scoreboard(state: &SessionState) -> Self {
        ServerMessage::Scoreboard(state.scoreboard().clone())
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// An encoded server message, ready to write as a text frame.
///
/// Broadcasts encode once and hand every outbox a clone of the same
/// allocation.
pub type Frame = Arc<str>;

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to a shareable frame.
    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        self.to_json().map(Frame::from)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
