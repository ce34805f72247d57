//! Morris Core - Nine Men's Morris rules engine and AI
//!
//! This crate provides the core game logic:
//! - Board topology (24 nodes, 16 mills) and mill tracking
//! - Player piece inventory and phase (placing, moving, flying)
//! - Game snapshots and legal move generation
//! - Phase-weighted position evaluation
//! - NegaMax AI with alpha-beta pruning
//! - Turn sequencing for a live game with view callbacks

pub mod board;
pub mod player;
pub mod moves;
pub mod snapshot;
pub mod eval;
pub mod ai;
pub mod engine;
pub mod delegate;
pub mod config;
pub mod error;

// Re-exports for convenient access
pub use board::{Board, BoardEvent, Interaction, MillId, NodeId, PieceColour, NUM_NODES, NUM_MILLS};
pub use player::{Phase, Player, PlayerColour, PlayerKind, PlayerNumber};
pub use moves::{Move, MoveType};
pub use snapshot::GameSnapshot;
pub use eval::{evaluate, negate, HeuristicWeights, Score, LOSS_SCORE, WIN_SCORE};
pub use ai::{
    negamax, negamax_with_pruning, AiStatus, Difficulty, NegaMaxAI, ScoredMove, SearchStats,
};
pub use engine::{Engine, EngineState, GameType};
pub use delegate::{EngineDelegate, NullDelegate};
pub use config::{AiConfig, EngineConfig};
pub use error::{EngineError, PlayerError, SnapshotError};
