//! Players, piece inventory and game phase

use serde::{Deserialize, Serialize};

use crate::board::{Board, NodeId, PieceColour};
use crate::error::PlayerError;

/// Pieces each player starts with in hand
pub const STARTING_PIECES: u8 = 9;

/// On-board count at which a player may fly
pub const FLYING_THRESHOLD: usize = 3;

/// On-board count at or below which a player has lost
pub const LOSE_THRESHOLD: usize = 2;

/// Player colour
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColour {
    Green,
    Red,
}

impl PlayerColour {
    pub fn opponent(self) -> Self {
        match self {
            PlayerColour::Green => PlayerColour::Red,
            PlayerColour::Red => PlayerColour::Green,
        }
    }

    pub fn piece_colour(self) -> PieceColour {
        match self {
            PlayerColour::Green => PieceColour::Green,
            PlayerColour::Red => PieceColour::Red,
        }
    }
}

/// Seat number, only used for display
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerNumber {
    P1,
    P2,
}

impl PlayerNumber {
    pub fn initial(self) -> &'static str {
        match self {
            PlayerNumber::P1 => "1",
            PlayerNumber::P2 => "2",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerKind {
    HumanLocal,
    Ai,
}

/// Where a player is in the piece lifecycle. Derived from piece counts on every query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Placing,
    Moving,
    Flying,
    GameOver,
}

/// A player and the pieces it owns on a board.
///
/// Pieces are stored as node ids, so the same player value can be checked
/// against any board with the same layout.
#[derive(Clone, Debug)]
pub struct Player {
    name: String,
    colour: PlayerColour,
    kind: PlayerKind,
    number: PlayerNumber,
    is_starting_player: bool,
    pieces_left_to_play: u8,
    pieces_on_board: Vec<NodeId>,
}

impl Player {
    pub fn new(
        name: impl Into<String>,
        colour: PlayerColour,
        kind: PlayerKind,
        number: PlayerNumber,
        is_starting_player: bool,
    ) -> Result<Self, PlayerError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PlayerError::EmptyName);
        }

        Ok(Self {
            name,
            colour,
            kind,
            number,
            is_starting_player,
            pieces_left_to_play: STARTING_PIECES,
            pieces_on_board: Vec::with_capacity(STARTING_PIECES as usize),
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn colour(&self) -> PlayerColour {
        self.colour
    }

    pub fn piece_colour(&self) -> PieceColour {
        self.colour.piece_colour()
    }

    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    pub fn is_ai(&self) -> bool {
        self.kind == PlayerKind::Ai
    }

    pub fn number(&self) -> PlayerNumber {
        self.number
    }

    pub fn is_starting_player(&self) -> bool {
        self.is_starting_player
    }

    pub fn pieces_left_to_play(&self) -> u8 {
        self.pieces_left_to_play
    }

    pub fn has_played_no_pieces(&self) -> bool {
        self.pieces_left_to_play == STARTING_PIECES
    }

    pub fn pieces_on_board(&self) -> &[NodeId] {
        &self.pieces_on_board
    }

    pub fn owns(&self, node: NodeId) -> bool {
        self.pieces_on_board.contains(&node)
    }

    // ========================================================================
    // PHASE
    // ========================================================================

    pub fn phase(&self, board: &Board) -> Phase {
        if self.can_place_piece() {
            Phase::Placing
        } else if self.can_move(board) {
            Phase::Moving
        } else if self.can_fly() {
            Phase::Flying
        } else {
            Phase::GameOver
        }
    }

    pub fn has_lost(&self, board: &Board) -> bool {
        self.phase(board) == Phase::GameOver
    }

    fn can_place_piece(&self) -> bool {
        self.pieces_left_to_play > 0
    }

    fn can_move(&self, board: &Board) -> bool {
        let count = self.pieces_on_board.len();
        self.pieces_left_to_play == 0
            && count > LOSE_THRESHOLD
            && count > FLYING_THRESHOLD
            && !self.movable_nodes(board).is_empty()
    }

    fn can_fly(&self) -> bool {
        self.pieces_left_to_play == 0 && self.pieces_on_board.len() == FLYING_THRESHOLD
    }

    // ========================================================================
    // NODE QUERIES
    // ========================================================================

    /// Pieces that can move this turn: all of them when flying, otherwise
    /// those with an empty neighbour
    pub fn movable_nodes(&self, board: &Board) -> Vec<NodeId> {
        if self.can_fly() {
            return self.pieces_on_board.clone();
        }

        self.pieces_on_board
            .iter()
            .copied()
            .filter(|&node| board.has_empty_neighbours(node))
            .collect()
    }

    /// Pieces an opponent may take. Pieces in a closed mill are protected
    /// unless every piece is in one.
    pub fn takeable_nodes(&self, board: &Board) -> Vec<NodeId> {
        let unprotected: Vec<NodeId> = self
            .pieces_on_board
            .iter()
            .copied()
            .filter(|&node| !board.nodes()[node].in_active_mill())
            .collect();

        if unprotected.is_empty() {
            self.pieces_on_board.clone()
        } else {
            unprotected
        }
    }

    pub fn has_takeable_nodes(&self, board: &Board) -> bool {
        !self.takeable_nodes(board).is_empty()
    }

    /// Pieces with no empty neighbour
    pub fn num_of_blocked_nodes(&self, board: &Board) -> usize {
        self.pieces_on_board
            .iter()
            .filter(|&&node| !board.has_empty_neighbours(node))
            .count()
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    /// Place a piece from hand. Returns true if a mill was formed.
    pub fn play_piece(&mut self, board: &mut Board, node: NodeId) -> bool {
        self.pieces_left_to_play = self.pieces_left_to_play.saturating_sub(1);
        self.pieces_on_board.push(node);
        board.set_colour(node, self.piece_colour())
    }

    /// Move or fly a piece. Returns true if a mill was formed.
    pub fn move_piece(&mut self, board: &mut Board, from: NodeId, to: NodeId) -> bool {
        self.lose_piece(board, from);
        self.pieces_on_board.push(to);
        board.set_colour(to, self.piece_colour())
    }

    /// Remove a piece from the board. Never forms a mill.
    pub fn lose_piece(&mut self, board: &mut Board, node: NodeId) {
        if let Some(index) = self.pieces_on_board.iter().position(|&n| n == node) {
            self.pieces_on_board.remove(index);
        }
        board.set_colour(node, PieceColour::None);
    }

    pub fn reset(&mut self) {
        self.pieces_left_to_play = STARTING_PIECES;
        self.pieces_on_board.clear();
    }

    /// Copy of this player whose pieces are the nodes of its colour on `board`
    pub fn clone_to(&self, board: &Board) -> Player {
        let pieces_on_board = self
            .pieces_on_board
            .iter()
            .copied()
            .filter(|&node| board.colour_of(node) == self.piece_colour())
            .collect();

        Player {
            pieces_on_board,
            ..self.clone()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn green() -> Player {
        Player::new("Player 1", PlayerColour::Green, PlayerKind::HumanLocal, PlayerNumber::P1, true)
            .unwrap()
    }

    fn red() -> Player {
        Player::new("Player 2", PlayerColour::Red, PlayerKind::HumanLocal, PlayerNumber::P2, false)
            .unwrap()
    }

    fn play_all(player: &mut Player, board: &mut Board, nodes: &[NodeId]) {
        for &node in nodes {
            player.play_piece(board, node);
        }
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = Player::new("", PlayerColour::Green, PlayerKind::Ai, PlayerNumber::P1, true);
        assert_eq!(result.unwrap_err(), PlayerError::EmptyName);
    }

    #[test]
    fn test_blocked_nodes() {
        let mut board = Board::new();
        let mut p1 = green();

        play_all(&mut p1, &mut board, &[0, 9, 21]);
        assert_eq!(p1.num_of_blocked_nodes(&board), 0);

        let mut board = Board::new();
        let mut p1 = green();
        play_all(&mut p1, &mut board, &[0, 1, 9]);
        assert_eq!(p1.num_of_blocked_nodes(&board), 1);

        play_all(&mut p1, &mut board, &[2, 14]);
        assert_eq!(p1.num_of_blocked_nodes(&board), 2);
    }

    #[test]
    fn test_clones_are_independent() {
        let mut board = Board::new();
        let mut p1 = green();
        play_all(&mut p1, &mut board, &[0, 1, 9]);

        let mut new_board = board.clone();
        let mut cloned = p1.clone_to(&new_board);
        cloned.play_piece(&mut new_board, 14);

        assert_eq!(p1.takeable_nodes(&board).len(), 3);
        assert_eq!(cloned.takeable_nodes(&new_board).len(), 4);
        assert_eq!(p1.pieces_left_to_play(), 6);
        assert_eq!(cloned.pieces_left_to_play(), 5);
    }

    #[test]
    fn test_phase_transitions() {
        let mut board = Board::new();
        let mut p1 = green();
        assert_eq!(p1.phase(&board), Phase::Placing);

        play_all(&mut p1, &mut board, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(p1.pieces_left_to_play(), 0);
        assert_eq!(p1.phase(&board), Phase::Moving);

        for node in [0, 1, 2, 3, 4, 5] {
            p1.lose_piece(&mut board, node);
        }
        assert_eq!(p1.phase(&board), Phase::Flying);

        p1.lose_piece(&mut board, 6);
        assert_eq!(p1.phase(&board), Phase::GameOver);
        assert!(p1.has_lost(&board));
    }

    #[test]
    fn test_fully_blocked_player_has_lost() {
        let mut board = Board::new();
        let mut p1 = green();
        let mut p2 = red();

        // Green fills the outer square, red fills every gap next to it
        play_all(&mut p1, &mut board, &[0, 1, 2, 9, 14, 21, 22, 23, 3]);
        play_all(&mut p2, &mut board, &[4, 10, 13, 19, 5, 18, 20]);
        p1.lose_piece(&mut board, 3);

        assert_eq!(p1.pieces_on_board().len(), 8);
        assert!(p1.movable_nodes(&board).is_empty());
        assert_eq!(p1.phase(&board), Phase::GameOver);
    }

    #[test]
    fn test_placing_ignores_blocked_pieces() {
        let mut board = Board::new();
        let mut p1 = green();
        let mut p2 = red();
        play_all(&mut p1, &mut board, &[0]);
        play_all(&mut p2, &mut board, &[1, 9]);

        assert_eq!(p1.num_of_blocked_nodes(&board), 1);
        assert_eq!(p1.phase(&board), Phase::Placing);
    }

    #[test]
    fn test_flying_moves_any_piece() {
        let mut board = Board::new();
        let mut p1 = green();
        let mut p2 = red();
        play_all(&mut p1, &mut board, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        for node in [3, 4, 5, 6, 7, 8] {
            p1.lose_piece(&mut board, node);
        }
        play_all(&mut p2, &mut board, &[9, 4, 14]);

        // Every green piece is boxed in, but flying ignores adjacency
        assert_eq!(p1.num_of_blocked_nodes(&board), 3);
        assert_eq!(p1.phase(&board), Phase::Flying);
        assert_eq!(p1.movable_nodes(&board).len(), 3);
    }

    #[test]
    fn test_takeable_nodes_prefer_unprotected() {
        let mut board = Board::new();
        let mut p2 = red();
        play_all(&mut p2, &mut board, &[15, 16, 17, 23]);

        assert_eq!(p2.takeable_nodes(&board), vec![23]);

        p2.lose_piece(&mut board, 23);
        let mut takeable = p2.takeable_nodes(&board);
        takeable.sort();
        assert_eq!(takeable, vec![15, 16, 17]);
    }

    #[test]
    fn test_move_piece_forms_mill() {
        let mut board = Board::new();
        let mut p1 = green();
        play_all(&mut p1, &mut board, &[0, 1, 14]);

        assert!(p1.move_piece(&mut board, 14, 2));
        assert_eq!(p1.pieces_left_to_play(), 6);
        assert!(p1.owns(2));
        assert!(!p1.owns(14));
        assert_eq!(board.colour_of(14), PieceColour::None);
    }

    #[test]
    fn test_two_pieces_left_is_game_over() {
        let mut board = Board::new();
        let mut p1 = green();
        play_all(&mut p1, &mut board, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        for node in [0, 1, 2, 3, 4, 5, 6] {
            p1.lose_piece(&mut board, node);
        }

        assert_eq!(p1.pieces_on_board().len(), 2);
        assert_eq!(p1.phase(&board), Phase::GameOver);
    }
}
