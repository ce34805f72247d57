//! Position evaluation
//!
//! Weights are roughly based on the coefficient sets of the best estimators
//! in Petcu & Holban, "Nine Men's Morris" (DAS 2008). Winning has no weight:
//! a won or lost position scores the extreme value instead.
//!
//! Scores are zero-sum from green's point of view.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::player::{Phase, Player, PlayerColour};

// ============================================================================
// SCORES
// ============================================================================

/// Heuristic score. Positive favours green.
pub type Score = i64;

/// Red has lost
pub const WIN_SCORE: Score = Score::MAX;

/// Green has lost
pub const LOSS_SCORE: Score = Score::MIN;

/// Flip a score to the other player's point of view.
///
/// `LOSS_SCORE` has no positive counterpart and maps to `WIN_SCORE`.
pub fn negate(score: Score) -> Score {
    score.saturating_neg()
}

// ============================================================================
// WEIGHTS
// ============================================================================

/// Weights while placing pieces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementWeights {
    pub closed_mill: Score,
    pub mills: Score,
    pub blocked_opponent_pieces: Score,
    pub pieces_in_play: Score,
    /// Mill can be closed in one way
    pub two_piece_configurations: Score,
    /// Mill can be closed in two ways
    pub three_piece_configurations: Score,
}

impl Default for PlacementWeights {
    fn default() -> Self {
        Self {
            closed_mill: 17,
            mills: 29,
            blocked_opponent_pieces: 2,
            pieces_in_play: 8,
            two_piece_configurations: 16,
            three_piece_configurations: 6,
        }
    }
}

/// Weights while moving pieces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementWeights {
    pub closed_mill: Score,
    pub mills: Score,
    pub blocked_opponent_pieces: Score,
    pub pieces_in_play: Score,
    pub opened_mill: Score,
    pub double_mill: Score,
}

impl Default for MovementWeights {
    fn default() -> Self {
        Self {
            closed_mill: 22,
            mills: 39,
            blocked_opponent_pieces: 12,
            pieces_in_play: 6,
            opened_mill: 21,
            double_mill: 36,
        }
    }
}

/// Weights once a player is down to three pieces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyingWeights {
    pub two_piece_configurations: Score,
    pub three_piece_configurations: Score,
    pub closed_mill: Score,
}

impl Default for FlyingWeights {
    fn default() -> Self {
        Self {
            two_piece_configurations: 12,
            three_piece_configurations: 13,
            closed_mill: 16,
        }
    }
}

/// Complete weight table, one set per phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    pub placement: PlacementWeights,
    pub movement: MovementWeights,
    pub flying: FlyingWeights,
}

// ============================================================================
// EVALUATION
// ============================================================================

fn count(n: usize) -> Score {
    n as Score
}

/// Score a position from green's point of view.
///
/// `mill_closed_by` is the player whose move produced this position, if that
/// move closed a mill.
pub fn evaluate(
    board: &Board,
    green: &Player,
    red: &Player,
    mill_closed_by: Option<PlayerColour>,
    weights: &HeuristicWeights,
) -> Score {
    if red.has_lost(board) {
        return WIN_SCORE;
    }
    if green.has_lost(board) {
        return LOSS_SCORE;
    }

    let green_score = player_score(
        board,
        green,
        red,
        mill_closed_by == Some(PlayerColour::Green),
        weights,
    );
    let red_score = player_score(
        board,
        red,
        green,
        mill_closed_by == Some(PlayerColour::Red),
        weights,
    );

    green_score - red_score
}

/// Weighted features of one player's position in its current phase
pub fn player_score(
    board: &Board,
    player: &Player,
    opponent: &Player,
    closed_mill: bool,
    weights: &HeuristicWeights,
) -> Score {
    match player.phase(board) {
        Phase::Placing => placement_score(board, player, opponent, closed_mill, &weights.placement),
        Phase::Moving => movement_score(board, player, opponent, closed_mill, &weights.movement),
        Phase::Flying => flying_score(board, player, closed_mill, &weights.flying),
        Phase::GameOver => 0,
    }
}

fn placement_score(
    board: &Board,
    player: &Player,
    opponent: &Player,
    closed_mill: bool,
    w: &PlacementWeights,
) -> Score {
    let colour = player.piece_colour();
    let configurations = board.num_of_two_and_three_piece_configurations(colour);

    let mut score = count(board.num_of_mills(colour)) * w.mills
        + count(opponent.num_of_blocked_nodes(board)) * w.blocked_opponent_pieces
        + count(player.pieces_on_board().len()) * w.pieces_in_play
        + count(configurations.two_piece) * w.two_piece_configurations
        + count(configurations.three_piece) * w.three_piece_configurations;

    if closed_mill {
        score += w.closed_mill;
    }
    score
}

fn movement_score(
    board: &Board,
    player: &Player,
    opponent: &Player,
    closed_mill: bool,
    w: &MovementWeights,
) -> Score {
    let colour = player.piece_colour();

    let mut score = count(board.num_of_mills(colour)) * w.mills
        + count(opponent.num_of_blocked_nodes(board)) * w.blocked_opponent_pieces
        + count(player.pieces_on_board().len()) * w.pieces_in_play
        + count(board.num_of_open_mills(colour)) * w.opened_mill
        + count(board.num_of_double_mills(colour)) * w.double_mill;

    if closed_mill {
        score += w.closed_mill;
    }
    score
}

fn flying_score(board: &Board, player: &Player, closed_mill: bool, w: &FlyingWeights) -> Score {
    let configurations = board.num_of_two_and_three_piece_configurations(player.piece_colour());

    let mut score = count(configurations.two_piece) * w.two_piece_configurations
        + count(configurations.three_piece) * w.three_piece_configurations;

    if closed_mill {
        score += w.closed_mill;
    }
    score
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::NodeId;
    use crate::player::{PlayerKind, PlayerNumber};

    fn players() -> (Player, Player) {
        let green = Player::new(
            "Green",
            PlayerColour::Green,
            PlayerKind::HumanLocal,
            PlayerNumber::P1,
            true,
        )
        .unwrap();
        let red =
            Player::new("Red", PlayerColour::Red, PlayerKind::Ai, PlayerNumber::P2, false).unwrap();
        (green, red)
    }

    fn play_all(player: &mut Player, board: &mut Board, nodes: &[NodeId]) {
        for &node in nodes {
            player.play_piece(board, node);
        }
    }

    #[test]
    fn test_negate_saturates() {
        assert_eq!(negate(5), -5);
        assert_eq!(negate(LOSS_SCORE), WIN_SCORE);
        assert_eq!(negate(WIN_SCORE), -WIN_SCORE);
    }

    #[test]
    fn test_default_weights() {
        let w = HeuristicWeights::default();
        assert_eq!(w.placement.mills, 29);
        assert_eq!(w.movement.double_mill, 36);
        assert_eq!(w.flying.closed_mill, 16);
    }

    #[test]
    fn test_weights_partial_json() {
        let w: HeuristicWeights = serde_json::from_str(r#"{"movement": {"mills": 100}}"#).unwrap();
        assert_eq!(w.movement.mills, 100);
        assert_eq!(w.movement.opened_mill, 21);
        assert_eq!(w.placement, PlacementWeights::default());
    }

    #[test]
    fn test_empty_board_scores_zero() {
        let board = Board::new();
        let (green, red) = players();
        assert_eq!(evaluate(&board, &green, &red, None, &HeuristicWeights::default()), 0);
    }

    #[test]
    fn test_placement_features() {
        let mut board = Board::new();
        let (mut green, mut red) = players();
        play_all(&mut green, &mut board, &[0, 1, 2]);
        play_all(&mut red, &mut board, &[9]);

        let w = HeuristicWeights::default();
        // Mill 0, three pieces, red piece at 9 is not blocked
        let expected = 29 + 3 * 8;
        assert_eq!(player_score(&board, &green, &red, false, &w), expected);
        assert_eq!(player_score(&board, &green, &red, true, &w), expected + 17);
    }

    #[test]
    fn test_closed_mill_bonus_goes_to_mover() {
        let mut board = Board::new();
        let (mut green, mut red) = players();
        play_all(&mut green, &mut board, &[0, 1, 2]);
        play_all(&mut red, &mut board, &[21, 22, 23]);

        let w = HeuristicWeights::default();
        assert_eq!(evaluate(&board, &green, &red, None, &w), 0);
        assert_eq!(evaluate(&board, &green, &red, Some(PlayerColour::Green), &w), 17);
        assert_eq!(evaluate(&board, &green, &red, Some(PlayerColour::Red), &w), -17);
    }

    #[test]
    fn test_flying_ignores_piece_count() {
        let mut board = Board::new();
        let (mut green, _) = players();
        play_all(&mut green, &mut board, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        for node in [0, 2, 3, 5, 6, 8] {
            green.lose_piece(&mut board, node);
        }
        let (_, red) = players();

        // 1, 4, 7 form a mill, which flying does not reward
        assert_eq!(green.phase(&board), Phase::Flying);
        assert_eq!(player_score(&board, &green, &red, false, &HeuristicWeights::default()), 0);
    }

    #[test]
    fn test_sentinels() {
        let mut board = Board::new();
        let (mut green, mut red) = players();
        play_all(&mut green, &mut board, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        play_all(&mut red, &mut board, &[9, 10, 11, 12, 13, 14, 15, 16, 17]);

        let w = HeuristicWeights::default();
        for node in [9, 10, 11, 12, 13, 14, 15] {
            red.lose_piece(&mut board, node);
        }
        assert_eq!(evaluate(&board, &green, &red, None, &w), WIN_SCORE);

        let mut board = Board::new();
        let (mut green, mut red) = players();
        play_all(&mut green, &mut board, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        play_all(&mut red, &mut board, &[9, 10, 11, 12, 13, 14, 15, 16, 17]);
        for node in [0, 1, 2, 3, 4, 5, 6] {
            green.lose_piece(&mut board, node);
        }
        assert_eq!(evaluate(&board, &green, &red, None, &w), LOSS_SCORE);
    }
}
