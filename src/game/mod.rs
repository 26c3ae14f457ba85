//! Game Logic Module
//!
//! Maze generation and the session state machine. Nothing in here touches
//! the network or the clock.
//!
//! ## Module Structure
//!
//! - `maze`: Randomized depth-first carving
//! - `state`: Clients, scoreboard and current maze
//! - `tick`: Exit detection and maze regeneration
//! - `events`: Changes the network layer must broadcast

pub mod events;
pub mod maze;
pub mod state;
pub mod tick;

// Re-export key types
pub use events::SessionEvent;
pub use maze::{Cell, CellIndex, Maze, MazeDimensions, DEFAULT_MAZE_SIZE};
pub use state::{ClientId, ClientState, SessionState};
pub use tick::{win_check, TickResult};
