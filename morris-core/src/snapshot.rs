//! Game snapshots
//!
//! A snapshot owns a private copy of the board and both players. Search
//! walks the game tree by deriving child snapshots, so the live game is
//! never touched.

use std::cell::OnceCell;

use crate::board::{Board, NodeId, PieceColour};
use crate::error::SnapshotError;
use crate::eval::{evaluate, HeuristicWeights, Score};
use crate::moves::Move;
use crate::player::{Phase, Player, PlayerColour};

/// Board and players at one ply, plus the move that led here
#[derive(Clone, Debug)]
pub struct GameSnapshot {
    board: Board,
    current_player: Player,
    opponent: Player,
    last_move: Option<Move>,
    /// The move that led here closed a mill, with or without a capture
    closed_mill: bool,
    weights: HeuristicWeights,
    score: OnceCell<Score>,
}

impl GameSnapshot {
    /// Snapshot with `current_player` to move. The players must already be
    /// bound to `board`.
    pub fn new(board: Board, current_player: Player, opponent: Player) -> Self {
        Self {
            board,
            current_player,
            opponent,
            last_move: None,
            closed_mill: false,
            weights: HeuristicWeights::default(),
            score: OnceCell::new(),
        }
    }

    /// Private copy of a live position
    pub fn from_live(board: &Board, current_player: &Player, opponent: &Player) -> Self {
        let board = board.clone();
        let current_player = current_player.clone_to(&board);
        let opponent = opponent.clone_to(&board);
        Self::new(board, current_player, opponent)
    }

    pub fn with_weights(mut self, weights: HeuristicWeights) -> Self {
        self.weights = weights;
        self.score = OnceCell::new();
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> &Player {
        &self.current_player
    }

    pub fn opponent(&self) -> &Player {
        &self.opponent
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// All legal moves for the current player.
    ///
    /// A move that closes a mill is replaced by one variant per takeable
    /// opponent piece. It stays bare only if the opponent has nothing to take.
    pub fn possible_moves(&self) -> Vec<Move> {
        let colour = self.current_player.piece_colour();
        let mut base = Vec::new();

        match self.current_player.phase(&self.board) {
            Phase::Placing => {
                for to in self.board.nodes_with_colour(PieceColour::None) {
                    base.push((Move::place(to), self.board.closes_mill(to, colour, None)));
                }
            }
            Phase::Moving => {
                for from in self.current_player.movable_nodes(&self.board) {
                    for to in self.board.empty_neighbours(from) {
                        let closes = self.board.closes_mill(to, colour, Some(from));
                        base.push((Move::movement(from, to), closes));
                    }
                }
            }
            Phase::Flying => {
                let empty = self.board.nodes_with_colour(PieceColour::None);
                for &from in self.current_player.pieces_on_board() {
                    for &to in &empty {
                        let closes = self.board.closes_mill(to, colour, Some(from));
                        base.push((Move::movement(from, to), closes));
                    }
                }
            }
            Phase::GameOver => return Vec::new(),
        }

        let takeable = self.opponent.takeable_nodes(&self.board);
        let mut moves = Vec::with_capacity(base.len() + takeable.len());

        for (mv, closes_mill) in base {
            if closes_mill && !takeable.is_empty() {
                moves.extend(takeable.iter().map(|&node| mv.with_take(node)));
            } else {
                moves.push(mv);
            }
        }

        moves
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Apply `mv` to a copy of this position. The turn always passes.
    pub fn new_snapshot_from(&self, mv: Move) -> Result<GameSnapshot, SnapshotError> {
        let mut board = self.board.clone();
        let mut player = self.current_player.clone_to(&board);
        let mut opponent = self.opponent.clone_to(&board);
        let own = player.piece_colour();

        let closed_mill = match mv {
            Move::Place { to, .. } => {
                if !is_colour(&board, to, PieceColour::None) {
                    return Err(SnapshotError::FailedToGetTargetNode(to));
                }
                player.play_piece(&mut board, to)
            }
            Move::Movement { from, to, .. } => {
                if !is_colour(&board, from, own) {
                    return Err(SnapshotError::FailedToGetTargetNode(from));
                }
                if !is_colour(&board, to, PieceColour::None) {
                    return Err(SnapshotError::FailedToGetDestinationNode(to));
                }
                player.move_piece(&mut board, from, to)
            }
            Move::Take { .. } => false,
        };

        if let Some(node) = mv.node_to_take() {
            if !is_colour(&board, node, opponent.piece_colour()) {
                return Err(SnapshotError::FailedToGetNodeToTake(node));
            }
            opponent.lose_piece(&mut board, node);
        }

        Ok(GameSnapshot {
            board,
            current_player: opponent,
            opponent: player,
            last_move: Some(mv),
            closed_mill,
            weights: self.weights,
            score: OnceCell::new(),
        })
    }

    // ========================================================================
    // EVALUATION
    // ========================================================================

    /// Score from green's point of view, computed once per snapshot
    pub fn heuristic_score(&self) -> Score {
        *self.score.get_or_init(|| {
            let (green, red) = match self.current_player.colour() {
                PlayerColour::Green => (&self.current_player, &self.opponent),
                PlayerColour::Red => (&self.opponent, &self.current_player),
            };

            // The player who just moved is now the opponent
            let mill_closed_by = self.closed_mill.then(|| self.opponent.colour());

            evaluate(&self.board, green, red, mill_closed_by, &self.weights)
        })
    }

    pub fn is_in_end_state(&self) -> bool {
        self.current_player.has_lost(&self.board) || self.opponent.has_lost(&self.board)
    }
}

fn is_colour(board: &Board, node: NodeId, colour: PieceColour) -> bool {
    board
        .get_node(node)
        .map(|n| n.colour() == colour)
        .unwrap_or(false)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{LOSS_SCORE, WIN_SCORE};
    use crate::moves::MoveType;
    use crate::player::{PlayerKind, PlayerNumber};

    fn green() -> Player {
        Player::new("Green", PlayerColour::Green, PlayerKind::HumanLocal, PlayerNumber::P1, true)
            .unwrap()
    }

    fn red() -> Player {
        Player::new("Red", PlayerColour::Red, PlayerKind::Ai, PlayerNumber::P2, false).unwrap()
    }

    fn play_all(player: &mut Player, board: &mut Board, nodes: &[NodeId]) {
        for &node in nodes {
            player.play_piece(board, node);
        }
    }

    fn lose_all(player: &mut Player, board: &mut Board, nodes: &[NodeId]) {
        for &node in nodes {
            player.lose_piece(board, node);
        }
    }

    /// Green to move with the given pieces placed
    fn position(green_nodes: &[NodeId], red_nodes: &[NodeId]) -> GameSnapshot {
        let mut board = Board::new();
        let (mut g, mut r) = (green(), red());
        play_all(&mut g, &mut board, green_nodes);
        play_all(&mut r, &mut board, red_nodes);
        GameSnapshot::new(board, g, r)
    }

    #[test]
    fn test_placement_moves() {
        let snapshot = position(&[0, 1, 9], &[23, 12, 2]);
        let moves = snapshot.possible_moves();

        // 18 empty nodes, placing on 21 closes a mill with 3 red pieces to take
        assert_eq!(moves.len(), 20);
        assert!(moves.iter().all(|m| m.move_type() == MoveType::PlacePiece));
        assert!(!moves.contains(&Move::place(21)));
        assert_eq!(moves.iter().filter(|m| m.forms_mill()).count(), 3);
    }

    #[test]
    fn test_movement_moves() {
        let snapshot = position(&[0, 1, 2, 3, 4, 5, 6, 7, 8], &[]);
        let moves = snapshot.possible_moves();

        assert_eq!(snapshot.current_player().phase(snapshot.board()), Phase::Moving);
        assert_eq!(moves.len(), 6);
        // 1, 4 and 7 are boxed in
        assert!(moves.iter().all(|m| ![1, 4, 7].contains(&m.target())));
    }

    #[test]
    fn test_flying_moves() {
        let mut board = Board::new();
        let (mut g, mut r) = (green(), red());
        play_all(&mut g, &mut board, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        lose_all(&mut g, &mut board, &[0, 1, 2, 3, 4, 5]);
        play_all(&mut r, &mut board, &[15, 16, 17, 18, 19, 20, 21, 22, 23]);

        let snapshot = GameSnapshot::new(board, g, r);
        assert_eq!(snapshot.current_player().phase(snapshot.board()), Phase::Flying);
        // 3 pieces to any of 12 empty nodes
        assert_eq!(snapshot.possible_moves().len(), 36);
    }

    #[test]
    fn test_place_forming_mill_expands_captures() {
        let snapshot = position(&[0, 1], &[15, 16]);
        let moves = snapshot.possible_moves();

        assert_eq!(moves.len(), 21);
        let mut captures: Vec<NodeId> = moves
            .iter()
            .filter(|m| m.forms_mill())
            .filter_map(|m| m.node_to_take())
            .collect();
        captures.sort();
        assert_eq!(captures, vec![15, 16]);
        assert!(!moves.contains(&Move::place(2)));
    }

    #[test]
    fn test_protected_pieces_not_captured() {
        let snapshot = position(&[0, 1], &[15, 16, 17, 23]);
        let moves = snapshot.possible_moves();

        let captures: Vec<Move> = moves.into_iter().filter(|m| m.forms_mill()).collect();
        assert_eq!(captures, vec![Move::place(2).with_take(23)]);
    }

    #[test]
    fn test_mill_without_takeable_pieces_stays_bare() {
        let snapshot = position(&[0, 1], &[]);
        let moves = snapshot.possible_moves();

        assert_eq!(moves.len(), 22);
        assert!(moves.contains(&Move::place(2)));
        assert!(moves.iter().all(|m| !m.forms_mill()));
    }

    #[test]
    fn test_turn_passes() {
        let snapshot = GameSnapshot::new(Board::new(), green(), red());
        assert_eq!(snapshot.possible_moves().len(), 24);

        let after_green = snapshot.new_snapshot_from(Move::place(1)).unwrap();
        assert_eq!(after_green.current_player().colour(), PlayerColour::Red);
        assert_eq!(after_green.possible_moves().len(), 23);
        assert_eq!(after_green.last_move(), Some(Move::place(1)));

        let after_red = after_green.new_snapshot_from(Move::place(0)).unwrap();
        assert_eq!(after_red.current_player().colour(), PlayerColour::Green);
        assert_eq!(after_red.possible_moves().len(), 22);
        assert_eq!(after_red.current_player().pieces_left_to_play(), 8);
        assert_eq!(after_red.opponent().pieces_left_to_play(), 8);
    }

    #[test]
    fn test_snapshot_does_not_touch_parent() {
        let snapshot = position(&[0, 1], &[15, 16]);
        let child = snapshot.new_snapshot_from(Move::place(2).with_take(15)).unwrap();

        assert_eq!(snapshot.board().colour_of(2), PieceColour::None);
        assert_eq!(snapshot.board().colour_of(15), PieceColour::Red);
        assert_eq!(child.board().colour_of(2), PieceColour::Green);
        assert_eq!(child.board().colour_of(15), PieceColour::None);
        assert_eq!(child.current_player().pieces_on_board(), &[16]);
        assert_eq!(child.board().num_of_mills(PieceColour::Green), 1);
    }

    #[test]
    fn test_movement_capture() {
        let mut board = Board::new();
        let (mut g, mut r) = (green(), red());
        play_all(&mut g, &mut board, &[0, 1, 14, 3, 5, 6, 8, 11, 12]);
        play_all(&mut r, &mut board, &[9, 10, 21, 22, 23, 18, 19, 20, 15]);
        let snapshot = GameSnapshot::new(board, g, r);

        let mv = Move::movement(14, 2);
        let moves = snapshot.possible_moves();
        assert!(!moves.contains(&mv));
        assert!(moves.contains(&mv.with_take(9)));

        let child = snapshot.new_snapshot_from(mv.with_take(9)).unwrap();
        assert_eq!(child.board().colour_of(14), PieceColour::None);
        assert_eq!(child.board().colour_of(9), PieceColour::None);
        assert_eq!(child.current_player().pieces_on_board().len(), 8);
        assert_eq!(child.opponent().pieces_on_board().len(), 9);
    }

    #[test]
    fn test_unresolvable_moves() {
        let snapshot = position(&[0, 1], &[15, 16]);

        assert_eq!(
            snapshot.new_snapshot_from(Move::place(30)).unwrap_err(),
            SnapshotError::FailedToGetTargetNode(30)
        );
        assert_eq!(
            snapshot.new_snapshot_from(Move::place(15)).unwrap_err(),
            SnapshotError::FailedToGetTargetNode(15)
        );
        assert_eq!(
            snapshot.new_snapshot_from(Move::movement(0, 1)).unwrap_err(),
            SnapshotError::FailedToGetDestinationNode(1)
        );
        assert_eq!(
            snapshot.new_snapshot_from(Move::place(2).with_take(0)).unwrap_err(),
            SnapshotError::FailedToGetNodeToTake(0)
        );
    }

    #[test]
    fn test_symmetric_position_scores_zero() {
        let snapshot = position(&[0, 1, 2], &[21, 22, 23]);
        assert_eq!(snapshot.heuristic_score(), 0);
    }

    #[test]
    fn test_closing_move_earns_bonus() {
        let snapshot = position(&[0, 1, 21, 22, 23], &[3, 5]);
        let red_to_move = snapshot.new_snapshot_from(Move::place(2).with_take(3)).unwrap();
        let bare = position(&[0, 1, 2, 21, 22, 23], &[5]);

        let w = HeuristicWeights::default();
        assert_eq!(
            red_to_move.heuristic_score() - bare.heuristic_score(),
            w.placement.closed_mill
        );
    }

    #[test]
    fn test_closing_move_without_capture_earns_bonus() {
        let snapshot = position(&[0, 1, 21, 22, 23], &[]);
        let closed = snapshot.new_snapshot_from(Move::place(2)).unwrap();
        let bare = position(&[0, 1, 2, 21, 22, 23], &[]);

        assert_eq!(closed.last_move(), Some(Move::place(2)));
        assert_eq!(
            closed.heuristic_score() - bare.heuristic_score(),
            HeuristicWeights::default().placement.closed_mill
        );

        let quiet = snapshot.new_snapshot_from(Move::place(4)).unwrap();
        let quiet_bare = position(&[0, 1, 4, 21, 22, 23], &[]);
        assert_eq!(quiet.heuristic_score(), quiet_bare.heuristic_score());
    }

    #[test]
    fn test_placing_scores() {
        let green_ahead = position(&[0, 1, 2, 3, 4], &[10, 18, 19]);
        assert!(green_ahead.heuristic_score() > 0);

        let red_ahead = position(&[23, 22, 12, 5, 18], &[0, 1, 9, 4, 10]);
        assert!(red_ahead.heuristic_score() < 0);
    }

    fn movement_position(winner_is_green: bool) -> GameSnapshot {
        let mut board = Board::new();
        let (mut g, mut r) = (green(), red());
        let (ahead, behind) = if winner_is_green {
            (&mut g, &mut r)
        } else {
            (&mut r, &mut g)
        };
        play_all(ahead, &mut board, &[0, 1, 2, 19, 22, 8, 12, 17, 3]);
        lose_all(ahead, &mut board, &[0, 1, 2, 3]);
        play_all(behind, &mut board, &[0, 1, 2, 3, 9, 21, 23, 13, 14]);
        lose_all(behind, &mut board, &[0, 1, 2, 9, 23]);
        GameSnapshot::new(board, g, r)
    }

    #[test]
    fn test_movement_scores() {
        let green_ahead = movement_position(true);
        assert_eq!(green_ahead.current_player().phase(green_ahead.board()), Phase::Moving);
        assert_eq!(green_ahead.opponent().phase(green_ahead.board()), Phase::Moving);
        assert!(green_ahead.heuristic_score() > 0);

        let red_ahead = movement_position(false);
        assert!(red_ahead.heuristic_score() < 0);
    }

    #[test]
    fn test_flying_scores() {
        let mut board = Board::new();
        let (mut g, mut r) = (green(), red());
        play_all(&mut g, &mut board, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        lose_all(&mut g, &mut board, &[0, 2, 3, 5, 6, 7]);
        play_all(&mut r, &mut board, &[9, 10, 11, 12, 13, 14, 21, 22, 23]);
        lose_all(&mut r, &mut board, &[9, 10, 11, 12, 13, 14]);

        let snapshot = GameSnapshot::new(board, g, r);
        assert_eq!(snapshot.current_player().phase(snapshot.board()), Phase::Flying);
        assert_eq!(snapshot.opponent().phase(snapshot.board()), Phase::Flying);
        // Green can still close 1-4-7, red's only mill is already closed
        assert_eq!(snapshot.heuristic_score(), 12);
    }

    #[test]
    fn test_end_state_sentinels() {
        let mut board = Board::new();
        let (mut g, mut r) = (green(), red());
        play_all(&mut g, &mut board, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        play_all(&mut r, &mut board, &[9, 10, 11, 12, 13, 14, 15, 16, 17]);
        lose_all(&mut r, &mut board, &[9, 10, 11, 12, 13, 14, 15]);

        let red_lost = GameSnapshot::new(board.clone(), r.clone_to(&board), g.clone_to(&board));
        assert!(red_lost.is_in_end_state());
        assert!(red_lost.possible_moves().is_empty());
        assert_eq!(red_lost.heuristic_score(), WIN_SCORE);

        let mut board = Board::new();
        let (mut g, mut r) = (green(), red());
        play_all(&mut g, &mut board, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        play_all(&mut r, &mut board, &[9, 10, 11, 12, 13, 14, 15, 16, 17]);
        lose_all(&mut g, &mut board, &[0, 1, 2, 3, 4, 5, 6]);

        let green_lost = GameSnapshot::new(board, g, r);
        assert!(green_lost.is_in_end_state());
        assert_eq!(green_lost.heuristic_score(), LOSS_SCORE);
    }

    #[test]
    fn test_with_weights_changes_score() {
        let snapshot = position(&[0, 1, 2], &[]);
        let base = snapshot.heuristic_score();

        let mut weights = HeuristicWeights::default();
        weights.placement.mills += 100;
        let reweighted = snapshot.clone().with_weights(weights);
        assert_eq!(reweighted.heuristic_score(), base + 100);
    }
}
