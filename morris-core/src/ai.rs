//! NegaMax search and the AI player

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::board::{Board, PieceColour, INTERSECTIONS};
use crate::config::AiConfig;
use crate::error::SnapshotError;
use crate::eval::{negate, HeuristicWeights, Score, LOSS_SCORE, WIN_SCORE};
use crate::moves::Move;
use crate::player::{Player, PlayerColour};
use crate::snapshot::GameSnapshot;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Chance that the opening placement goes on a free intersection
const OPENING_INTERSECTION_BIAS: f64 = 0.8;

// ============================================================================
// TYPES
// ============================================================================

/// Search depth presets
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy = 1,
    #[default]
    Normal = 2,
    Hard = 3,
    Harder = 4,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Harder,
    ];

    pub fn depth(self) -> u32 {
        self as u32
    }

    pub fn from_depth(depth: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.depth() == depth as u32)
    }
}

/// What an AI player is doing, for the view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiStatus {
    Waiting,
    Thinking,
    Placing,
    Moving,
    TakingPiece,
}

/// Result of a search, from the point of view of the side to move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoredMove {
    /// `None` at the root only when there was nothing to search
    pub mv: Option<Move>,
    pub score: Score,
}

/// Node counters filled in by a search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub nodes_visited: u64,
    pub cutoffs: u64,
}

// ============================================================================
// NEGAMAX
// ============================================================================

/// Convert a green-positive score to `colour`'s point of view
fn signed(score: Score, colour: PlayerColour) -> Score {
    match colour {
        PlayerColour::Green => score,
        PlayerColour::Red => negate(score),
    }
}

/// Mill-forming moves first
fn move_score(mv: &Move) -> i32 {
    if mv.forms_mill() {
        1
    } else {
        0
    }
}

fn leaf(snapshot: &GameSnapshot, colour: PlayerColour) -> ScoredMove {
    ScoredMove {
        mv: snapshot.last_move(),
        score: signed(snapshot.heuristic_score(), colour),
    }
}

/// Full-width NegaMax. `colour` is the side to move in `snapshot`.
pub fn negamax(
    snapshot: &GameSnapshot,
    depth: u32,
    colour: PlayerColour,
    stats: &mut SearchStats,
) -> Result<ScoredMove, SnapshotError> {
    stats.nodes_visited += 1;

    if depth == 0 || snapshot.is_in_end_state() {
        return Ok(leaf(snapshot, colour));
    }

    let moves = snapshot.possible_moves();
    if moves.is_empty() {
        return Ok(leaf(snapshot, colour));
    }

    let mut best = ScoredMove {
        mv: None,
        score: LOSS_SCORE,
    };

    for mv in moves {
        let child = snapshot.new_snapshot_from(mv)?;
        let score = negate(negamax(&child, depth - 1, colour.opponent(), stats)?.score);

        if best.mv.is_none() || score > best.score {
            best = ScoredMove {
                mv: Some(mv),
                score,
            };
        }
    }

    Ok(best)
}

/// NegaMax with alpha-beta pruning. Returns the same score as [`negamax`]
/// for a window of `(LOSS_SCORE, WIN_SCORE)`.
pub fn negamax_with_pruning(
    snapshot: &GameSnapshot,
    depth: u32,
    colour: PlayerColour,
    mut alpha: Score,
    beta: Score,
    stats: &mut SearchStats,
) -> Result<ScoredMove, SnapshotError> {
    stats.nodes_visited += 1;

    if depth == 0 || snapshot.is_in_end_state() {
        return Ok(leaf(snapshot, colour));
    }

    let mut moves = snapshot.possible_moves();
    if moves.is_empty() {
        return Ok(leaf(snapshot, colour));
    }

    moves.sort_by(|a, b| move_score(b).cmp(&move_score(a)));

    let mut best = ScoredMove {
        mv: None,
        score: LOSS_SCORE,
    };

    for (index, mv) in moves.iter().enumerate() {
        let child = snapshot.new_snapshot_from(*mv)?;
        let reply = negamax_with_pruning(
            &child,
            depth - 1,
            colour.opponent(),
            negate(beta),
            negate(alpha),
            stats,
        )?;
        let score = negate(reply.score);

        if best.mv.is_none() || score > best.score {
            best = ScoredMove {
                mv: Some(*mv),
                score,
            };
        }

        alpha = alpha.max(score);
        if alpha >= beta {
            stats.cutoffs += 1;
            trace!(depth, pruned = moves.len() - index - 1, "beta cutoff");
            break;
        }
    }

    Ok(best)
}

// ============================================================================
// AI PLAYER
// ============================================================================

/// Computer opponent searching with [`negamax_with_pruning`]
pub struct NegaMaxAI {
    pub difficulty: Difficulty,
    pub weights: HeuristicWeights,
    rng: ChaCha8Rng,
    last_stats: SearchStats,
}

impl NegaMaxAI {
    pub fn new(difficulty: Difficulty, weights: HeuristicWeights) -> Self {
        Self {
            difficulty,
            weights,
            rng: ChaCha8Rng::from_entropy(),
            last_stats: SearchStats::default(),
        }
    }

    pub fn with_seed(difficulty: Difficulty, weights: HeuristicWeights, seed: u64) -> Self {
        Self {
            difficulty,
            weights,
            rng: ChaCha8Rng::seed_from_u64(seed),
            last_stats: SearchStats::default(),
        }
    }

    pub fn from_config(config: &AiConfig) -> Self {
        match config.seed {
            Some(seed) => Self::with_seed(config.difficulty, config.weights, seed),
            None => Self::new(config.difficulty, config.weights),
        }
    }

    /// Counters from the most recent search
    pub fn last_stats(&self) -> SearchStats {
        self.last_stats
    }

    /// Best move for `me` on the live board.
    ///
    /// The search runs on private copies, so node ids in the returned move
    /// refer directly to `board`.
    pub fn best_move(
        &mut self,
        board: &Board,
        me: &Player,
        opponent: &Player,
    ) -> Result<Option<Move>, SnapshotError> {
        self.last_stats = SearchStats::default();

        if me.has_played_no_pieces() {
            let mv = self.opening_move(board);
            debug!(player = me.name(), mv = ?mv, "opening placement");
            return Ok(mv);
        }

        let snapshot = GameSnapshot::from_live(board, me, opponent).with_weights(self.weights);
        let mut stats = SearchStats::default();
        let result = negamax_with_pruning(
            &snapshot,
            self.difficulty.depth(),
            me.colour(),
            LOSS_SCORE,
            WIN_SCORE,
            &mut stats,
        )?;
        self.last_stats = stats;

        debug!(
            player = me.name(),
            depth = self.difficulty.depth(),
            mv = ?result.mv,
            score = result.score,
            nodes = stats.nodes_visited,
            cutoffs = stats.cutoffs,
            "search finished"
        );

        Ok(result.mv)
    }

    /// Random placement, usually on one of the better-connected nodes
    fn opening_move(&mut self, board: &Board) -> Option<Move> {
        let free_intersections: Vec<_> = INTERSECTIONS
            .iter()
            .copied()
            .filter(|&node| board.colour_of(node) == PieceColour::None)
            .collect();

        if !free_intersections.is_empty() && self.rng.gen_bool(OPENING_INTERSECTION_BIAS) {
            return free_intersections.choose(&mut self.rng).copied().map(Move::place);
        }

        board
            .nodes_with_colour(PieceColour::None)
            .choose(&mut self.rng)
            .copied()
            .map(Move::place)
    }
}

// ============================================================================
// TESTS
// ============================================================================
