//! Core primitives.
//!
//! Seedable randomness and the coordinate types shared by the maze,
//! the session state and the wire protocol.

pub mod position;
pub mod rng;

// Re-export core types
pub use position::{GridPoint, Position};
pub use rng::DeterministicRng;
