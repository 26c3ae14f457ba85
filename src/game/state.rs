//! Session State
//!
//! The maze, the connected clients and the scoreboard. Uses BTreeMap so
//! every scan (broadcast order, win-check precedence) is stable.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::position::Position;
use crate::core::rng::DeterministicRng;
use crate::game::events::SessionEvent;
use crate::game::maze::{Maze, MazeDimensions};

// =============================================================================
// CLIENT ID
// =============================================================================

/// Opaque client identity assigned by the transport.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wrap an identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identity (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// =============================================================================
// CLIENT STATE
// =============================================================================

/// Last report received from a client.
///
/// Both fields are `None` until the first update, and are overwritten
/// verbatim by each later one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientState {
    /// Client-side timestamp of the last update.
    pub last_timestamp: Option<f64>,
    /// Last reported position.
    pub position: Option<Position>,
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Everything a running session owns.
#[derive(Debug)]
pub struct SessionState {
    maze: Maze,
    clients: BTreeMap<ClientId, ClientState>,
    scoreboard: BTreeMap<ClientId, u32>,
    rng: DeterministicRng,
}

impl SessionState {
    /// Create a session with a freshly carved maze.
    ///
    /// `dims` must already be odd and at least 3.
    pub fn new(dims: MazeDimensions, mut rng: DeterministicRng) -> Self {
        let maze = Maze::generate(dims, &mut rng);
        Self {
            maze,
            clients: BTreeMap::new(),
            scoreboard: BTreeMap::new(),
            rng,
        }
    }

    /// Register a client with no position and a score of 0.
    ///
    /// A repeated connect for a live identity resets its report but keeps
    /// its score.
    pub fn connect(&mut self, client_id: ClientId) -> Vec<SessionEvent> {
        self.clients.insert(client_id.clone(), ClientState::default());
        self.scoreboard.entry(client_id.clone()).or_insert(0);

        vec![
            SessionEvent::ClientJoined { client_id },
            SessionEvent::ScoreboardChanged,
        ]
    }

    /// Overwrite a client's timestamp and position.
    ///
    /// Returns `false` (and changes nothing) for unknown clients.
    pub fn update_position(
        &mut self,
        client_id: &ClientId,
        timestamp: Option<f64>,
        position: Option<Position>,
    ) -> bool {
        match self.clients.get_mut(client_id) {
            Some(client) => {
                client.last_timestamp = timestamp;
                client.position = position;
                true
            }
            None => false,
        }
    }

    /// Remove a client and its score.
    ///
    /// Removing an unknown client is a no-op and yields no events.
    pub fn disconnect(&mut self, client_id: &ClientId) -> Vec<SessionEvent> {
        let had_client = self.clients.remove(client_id).is_some();
        let had_score = self.scoreboard.remove(client_id).is_some();

        if had_client || had_score {
            vec![
                SessionEvent::ClientRemoved { client_id: client_id.clone() },
                SessionEvent::ScoreboardChanged,
            ]
        } else {
            Vec::new()
        }
    }

    /// Add one win to a client's score. Returns the new score.
    pub fn award_win(&mut self, client_id: &ClientId) -> Option<u32> {
        self.scoreboard.get_mut(client_id).map(|score| {
            *score = score.saturating_add(1);
            *score
        })
    }

    /// Size of the next maze: grows with the connected-client count and
    /// never drops below `min`. Draws jitter from the session's random source.
    pub fn scaled_dimensions(&mut self, min: MazeDimensions) -> MazeDimensions {
        MazeDimensions::scaled(self.clients.len(), min, &mut self.rng)
    }

    /// Discard the current maze and carve a new one.
    pub fn regenerate_maze(&mut self, dims: MazeDimensions) {
        self.maze = Maze::generate(dims, &mut self.rng);
    }

    /// Current maze.
    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    /// Connected clients in id order.
    pub fn clients(&self) -> &BTreeMap<ClientId, ClientState> {
        &self.clients
    }

    /// Get a client.
    pub fn client(&self, client_id: &ClientId) -> Option<&ClientState> {
        self.clients.get(client_id)
    }

    /// Is this client connected?
    pub fn is_connected(&self, client_id: &ClientId) -> bool {
        self.clients.contains_key(client_id)
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Win counts in id order.
    pub fn scoreboard(&self) -> &BTreeMap<ClientId, u32> {
        &self.scoreboard
    }

    /// A client's win count.
    pub fn score(&self, client_id: &ClientId) -> Option<u32> {
        self.scoreboard.get(client_id).copied()
    }
}
