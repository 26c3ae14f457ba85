//! Win Check
//!
//! One pass of exit detection. At most one winner per pass; ties go to the
//! client that sorts first.

use crate::game::events::SessionEvent;
use crate::game::maze::MazeDimensions;
use crate::game::state::{ClientId, SessionState};

/// Result of a win-check pass.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this pass
    pub events: Vec<SessionEvent>,
    /// Winner, if anyone reached the exit
    pub winner: Option<ClientId>,
}

/// Find the first client standing on the exit and start the next round.
///
/// On a win: the winner is announced, scored, and the maze is replaced
/// with one sized from the current client count (never smaller than
/// `min_dims`). Clients with no reported position are skipped.
pub fn win_check(state: &mut SessionState, min_dims: MazeDimensions) -> TickResult {
    let mut result = TickResult::default();
    let exit = state.maze().exit();

    let winner = state
        .clients()
        .iter()
        .find(|(_, client)| {
            client
                .position
                .and_then(|p| p.rounded())
                .is_some_and(|cell| cell == exit)
        })
        .map(|(id, _)| id.clone());

    let Some(winner) = winner else {
        return result;
    };

    result.events.push(SessionEvent::Winner { client_id: winner.clone() });
    state.award_win(&winner);

    let dims = state.scaled_dimensions(min_dims);
    state.regenerate_maze(dims);

    result.events.push(SessionEvent::MazeRegenerated {
        rows: dims.rows,
        cols: dims.cols,
    });
    result.events.push(SessionEvent::ScoreboardChanged);
    result.winner = Some(winner);
    result
}
