//! # Maze Race Server
//!
//! Real-time multiplayer maze race: players run the same maze, the first to
//! stand on the exit scores a point, and a new, larger maze replaces it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MAZE RACE SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Shared primitives                         │
//! │  ├── rng.rs      - Seedable Xorshift128+ PRNG                │
//! │  └── position.rs - Grid points and reported positions        │
//! │                                                              │
//! │  game/           - Session logic (no I/O)                    │
//! │  ├── maze.rs     - Randomized depth-first maze carving       │
//! │  ├── state.rs    - Clients, scoreboard, current maze         │
//! │  ├── tick.rs     - Exit detection and regeneration           │
//! │  └── events.rs   - Changes to broadcast                      │
//! │                                                              │
//! │  network/        - Transport                                 │
//! │  ├── session.rs  - Coordinator task owning session state     │
//! │  ├── server.rs   - WebSocket server                          │
//! │  └── protocol.rs - Message types                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! One coordinator task owns the maze, the clients and the scoreboard.
//! Connection tasks only send it commands, and it runs the three periodic
//! jobs (positions, win check, scoreboard) between commands, so no lock
//! ever guards session state.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use crate::core::position::{GridPoint, Position};
pub use game::maze::{Maze, MazeDimensions};
pub use game::state::{ClientId, SessionState};
pub use network::{GameServer, ServerConfig, SessionConfig, SessionCoordinator, SessionHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Period of the `clients` broadcast (ms).
pub const POSITION_BROADCAST_MS: u64 = 50;

/// Period of exit detection (ms).
pub const WIN_CHECK_MS: u64 = 100;

/// Period of the `scoreboard` broadcast (ms).
pub const SCOREBOARD_BROADCAST_MS: u64 = 1000;
