//! Moves

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveType {
    PlacePiece,
    MovePiece,
    TakePiece,
}

/// A legal action for the player to move.
///
/// Place and movement moves that close a mill carry the opponent piece they
/// take, so a capture is part of the same move rather than an extra turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Place { to: NodeId, take: Option<NodeId> },
    /// Adjacent move or fly, depending on the player's phase
    Movement { from: NodeId, to: NodeId, take: Option<NodeId> },
    /// A capture on its own, used while a player is choosing which piece to take
    Take { node: NodeId },
}

impl Move {
    pub fn place(to: NodeId) -> Self {
        Move::Place { to, take: None }
    }

    pub fn movement(from: NodeId, to: NodeId) -> Self {
        Move::Movement { from, to, take: None }
    }

    pub fn move_type(&self) -> MoveType {
        match self {
            Move::Place { .. } => MoveType::PlacePiece,
            Move::Movement { .. } => MoveType::MovePiece,
            Move::Take { .. } => MoveType::TakePiece,
        }
    }

    /// Node a piece is placed on, moved from or taken from
    pub fn target(&self) -> NodeId {
        match *self {
            Move::Place { to, .. } => to,
            Move::Movement { from, .. } => from,
            Move::Take { node } => node,
        }
    }

    pub fn destination(&self) -> Option<NodeId> {
        match *self {
            Move::Movement { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Opponent piece taken by this move
    pub fn node_to_take(&self) -> Option<NodeId> {
        match *self {
            Move::Place { take, .. } | Move::Movement { take, .. } => take,
            Move::Take { node } => Some(node),
        }
    }

    /// True for place/movement moves that close a mill
    pub fn forms_mill(&self) -> bool {
        matches!(
            self,
            Move::Place { take: Some(_), .. } | Move::Movement { take: Some(_), .. }
        )
    }

    /// Same move, taking `node` after it closes a mill
    pub fn with_take(self, node: NodeId) -> Self {
        match self {
            Move::Place { to, .. } => Move::Place { to, take: Some(node) },
            Move::Movement { from, to, .. } => Move::Movement {
                from,
                to,
                take: Some(node),
            },
            Move::Take { .. } => Move::Take { node },
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Move::Place { to, take } => {
                write!(f, "place {}", to)?;
                if let Some(node) = take {
                    write!(f, " x{}", node)?;
                }
                Ok(())
            }
            Move::Movement { from, to, take } => {
                write!(f, "move {}->{}", from, to)?;
                if let Some(node) = take {
                    write!(f, " x{}", node)?;
                }
                Ok(())
            }
            Move::Take { node } => write!(f, "take {}", node),
        }
    }
}
