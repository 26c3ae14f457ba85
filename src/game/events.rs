//! Session Events
//!
//! Observable changes produced by the session state machine. The network
//! layer turns each one into outbound messages, reading the state *after*
//! the mutation that produced it.

use crate::game::state::ClientId;

/// Something connected clients need to hear about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A client joined and must receive the current maze and its identity.
    ClientJoined {
        /// The new client.
        client_id: ClientId,
    },

    /// A client left; everyone drops it.
    ClientRemoved {
        /// The departed client.
        client_id: ClientId,
    },

    /// A client reached the exit.
    Winner {
        /// The winning client.
        client_id: ClientId,
    },

    /// The maze was replaced.
    MazeRegenerated {
        /// New row count.
        rows: usize,
        /// New column count.
        cols: usize,
    },

    /// Scores or the set of scored clients changed.
    ScoreboardChanged,
}
