//! Error types for the rules engine, players and search

use thiserror::Error;

/// Errors surfaced by the engine entry points.
///
/// Input errors (`InvalidId`, `InvalidState`, `IllegalMove`) leave the game
/// untouched. `Internal` means the engine could not trust its own state and
/// the match has been reset.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("node id {0} is outside the board")]
    InvalidId(usize),

    #[error("action not allowed in the current game state")]
    InvalidState,

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("internal error: {0}")]
    Internal(#[from] SnapshotError),
}

/// Player construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("player name must not be empty")]
    EmptyName,
}

/// A move could not be resolved against a cloned board.
///
/// Moves are generated from the board they are applied to, so any of these
/// indicates a bug rather than bad input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("failed to get target node {0}")]
    FailedToGetTargetNode(usize),

    #[error("failed to get destination node {0}")]
    FailedToGetDestinationNode(usize),

    #[error("failed to get node to take {0}")]
    FailedToGetNodeToTake(usize),

    #[error("search found no move for a player still in the game")]
    NoMoveFound,
}
