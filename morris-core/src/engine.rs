//! Turn sequencing for a live game
//!
//! The engine owns the one board the view is bound to. Human input arrives
//! as taps and drags, AI turns are computed on snapshot copies and then
//! applied here. Every visible change is forwarded to the delegate before an
//! entry point returns.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::ai::{AiStatus, NegaMaxAI};
use crate::board::{Board, NodeId, PieceColour};
use crate::config::EngineConfig;
use crate::delegate::{EngineDelegate, NullDelegate};
use crate::error::{EngineError, PlayerError, SnapshotError};
use crate::moves::Move;
use crate::player::{Phase, Player, PlayerColour, PlayerKind, PlayerNumber};
use crate::snapshot::GameSnapshot;

// ============================================================================
// TYPES
// ============================================================================

/// What the engine is waiting for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineState {
    PlacingPieces,
    MovingPieces,
    FlyingPieces,
    /// The current player closed a mill and must pick a piece to take
    TakingPiece,
    GameOver,
}

impl EngineState {
    fn from_phase(phase: Phase) -> Self {
        match phase {
            Phase::Placing => EngineState::PlacingPieces,
            Phase::Moving => EngineState::MovingPieces,
            Phase::Flying => EngineState::FlyingPieces,
            Phase::GameOver => EngineState::GameOver,
        }
    }

    fn is_moving(self) -> bool {
        matches!(self, EngineState::MovingPieces | EngineState::FlyingPieces)
    }
}

/// Who controls each colour
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameType {
    /// Human green against computer red
    #[default]
    PlayerVsAi,
    PlayerVsPlayer,
    AiVsAi,
}

impl GameType {
    /// Kinds of the green and red players
    pub fn player_kinds(self) -> (PlayerKind, PlayerKind) {
        match self {
            GameType::PlayerVsAi => (PlayerKind::HumanLocal, PlayerKind::Ai),
            GameType::PlayerVsPlayer => (PlayerKind::HumanLocal, PlayerKind::HumanLocal),
            GameType::AiVsAi => (PlayerKind::Ai, PlayerKind::Ai),
        }
    }
}

fn default_name(kind: PlayerKind, number: PlayerNumber) -> String {
    match kind {
        PlayerKind::HumanLocal => format!("Player {}", number.initial()),
        PlayerKind::Ai => format!("Computer {}", number.initial()),
    }
}

fn player_of<'a>(green: &'a Player, red: &'a Player, colour: PlayerColour) -> &'a Player {
    match colour {
        PlayerColour::Green => green,
        PlayerColour::Red => red,
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// A match between two players on a live board
pub struct Engine<D: EngineDelegate = NullDelegate> {
    config: EngineConfig,
    board: Board,
    green: Player,
    red: Player,
    starting: PlayerColour,
    current: PlayerColour,
    state: EngineState,
    winner: Option<PlayerColour>,
    plies: u32,
    green_ai: Option<NegaMaxAI>,
    red_ai: Option<NegaMaxAI>,
    delegate: D,
}

impl Engine<NullDelegate> {
    /// Engine with no view attached
    pub fn headless(config: EngineConfig) -> Result<Self, PlayerError> {
        Self::new(config, NullDelegate)
    }
}

impl<D: EngineDelegate> Engine<D> {
    /// New match with default player names. Green starts.
    pub fn new(config: EngineConfig, delegate: D) -> Result<Self, PlayerError> {
        let (green_kind, red_kind) = config.game_type.player_kinds();
        let green = Player::new(
            default_name(green_kind, PlayerNumber::P1),
            PlayerColour::Green,
            green_kind,
            PlayerNumber::P1,
            true,
        )?;
        let red = Player::new(
            default_name(red_kind, PlayerNumber::P2),
            PlayerColour::Red,
            red_kind,
            PlayerNumber::P2,
            false,
        )?;

        Ok(Self::with_players(config, green, red, delegate))
    }

    /// New match with caller-built players. Their pieces are cleared and an
    /// AI is attached to each player of kind `Ai`.
    pub fn with_players(
        config: EngineConfig,
        mut green: Player,
        mut red: Player,
        delegate: D,
    ) -> Self {
        green.reset();
        red.reset();

        let starting = if red.is_starting_player() && !green.is_starting_player() {
            PlayerColour::Red
        } else {
            PlayerColour::Green
        };
        let green_ai = green.is_ai().then(|| NegaMaxAI::from_config(&config.green_ai));
        let red_ai = red.is_ai().then(|| NegaMaxAI::from_config(&config.red_ai));

        let mut engine = Self {
            config,
            board: Board::with_events(),
            green,
            red,
            starting,
            current: starting,
            state: EngineState::PlacingPieces,
            winner: None,
            plies: 0,
            green_ai,
            red_ai,
            delegate,
        };

        info!(
            green = engine.green.name(),
            red = engine.red.name(),
            game_type = ?engine.config.game_type,
            "new game"
        );
        engine.start_turn();
        engine.flush_events();
        engine
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn game_type(&self) -> GameType {
        self.config.game_type
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn player(&self, colour: PlayerColour) -> &Player {
        player_of(&self.green, &self.red, colour)
    }

    pub fn current_player(&self) -> &Player {
        self.player(self.current)
    }

    pub fn opponent(&self) -> &Player {
        self.player(self.current.opponent())
    }

    /// Colour of the winner once the game is over
    pub fn winner(&self) -> Option<PlayerColour> {
        self.winner
    }

    /// Completed turns since the game started
    pub fn plies(&self) -> u32 {
        self.plies
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    pub fn is_ai_turn(&self) -> bool {
        self.state != EngineState::GameOver && self.current_player().is_ai()
    }

    /// Pause the caller should show before applying the current AI's move
    pub fn think_time(&self) -> Duration {
        if !self.is_ai_turn() {
            return Duration::ZERO;
        }
        match self.current {
            PlayerColour::Green => self.config.green_ai.think_time(),
            PlayerColour::Red => self.config.red_ai.think_time(),
        }
    }

    // ========================================================================
    // HUMAN INPUT
    // ========================================================================

    /// Place a piece, or take one after closing a mill
    pub fn handle_node_tap(&mut self, id: NodeId) -> Result<(), EngineError> {
        let result = self.tap(id);
        if let Err(err) = &result {
            warn!(node = id, %err, "tap rejected");
        }
        self.flush_events();
        result
    }

    /// Move or fly a piece
    pub fn handle_node_drag(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError> {
        let result = self.drag(from, to);
        if let Err(err) = &result {
            warn!(from, to, %err, "drag rejected");
        }
        self.flush_events();
        result
    }

    /// Nodes the current player's piece on `id` may move to
    pub fn movable_positions_for(&self, id: NodeId) -> Result<Vec<NodeId>, EngineError> {
        self.board.get_node(id)?;
        if !self.state.is_moving() || self.is_ai_turn() {
            return Err(EngineError::InvalidState);
        }
        if !self.current_player().owns(id) {
            return Err(EngineError::IllegalMove(format!(
                "node {} does not hold a piece of {}",
                id,
                self.current_player().name()
            )));
        }

        Ok(match self.state {
            EngineState::FlyingPieces => self.board.nodes_with_colour(PieceColour::None),
            _ => self.board.empty_neighbours(id),
        })
    }

    fn tap(&mut self, id: NodeId) -> Result<(), EngineError> {
        self.board.get_node(id)?;
        if self.is_ai_turn() {
            return Err(EngineError::InvalidState);
        }

        match self.state {
            EngineState::PlacingPieces => {
                if self.board.colour_of(id) != PieceColour::None {
                    return Err(EngineError::IllegalMove(format!("node {} is occupied", id)));
                }
                let formed = self.play_piece(id);
                self.after_move(formed);
                Ok(())
            }
            EngineState::TakingPiece => {
                if !self.opponent().takeable_nodes(&self.board).contains(&id) {
                    return Err(EngineError::IllegalMove(format!("node {} cannot be taken", id)));
                }
                self.take_piece(id);
                self.end_turn();
                Ok(())
            }
            _ => Err(EngineError::InvalidState),
        }
    }

    fn drag(&mut self, from: NodeId, to: NodeId) -> Result<(), EngineError> {
        self.board.get_node(from)?;
        self.board.get_node(to)?;

        let destinations = self.movable_positions_for(from)?;
        if !destinations.contains(&to) {
            return Err(EngineError::IllegalMove(format!("cannot move {} to {}", from, to)));
        }

        let formed = self.move_piece(from, to);
        self.after_move(formed);
        Ok(())
    }

    // ========================================================================
    // AI TURNS
    // ========================================================================

    /// Search for the current AI's move without touching the live game
    pub fn compute_ai_move(&mut self) -> Result<Move, EngineError> {
        if !self.is_ai_turn() {
            return Err(EngineError::InvalidState);
        }
        self.notify_ai_status(AiStatus::Thinking);

        let (ai, me, opponent) = match self.current {
            PlayerColour::Green => (self.green_ai.as_mut(), &self.green, &self.red),
            PlayerColour::Red => (self.red_ai.as_mut(), &self.red, &self.green),
        };
        let Some(ai) = ai else {
            return Err(EngineError::InvalidState);
        };

        match ai.best_move(&self.board, me, opponent) {
            Ok(Some(mv)) => Ok(mv),
            Ok(None) => Err(self.internal_failure(SnapshotError::NoMoveFound)),
            Err(err) => Err(self.internal_failure(err)),
        }
    }

    /// Apply a move produced by [`compute_ai_move`](Self::compute_ai_move)
    pub fn apply_ai_move(&mut self, mv: Move) -> Result<(), EngineError> {
        let result = self.apply_ai(mv);
        if let Err(err) = &result {
            warn!(%mv, %err, "AI move rejected");
        }
        self.flush_events();
        result
    }

    /// Compute and apply the current AI's move, ignoring think time
    pub fn play_ai_turn(&mut self) -> Result<Move, EngineError> {
        let mv = self.compute_ai_move()?;
        self.apply_ai_move(mv)?;
        Ok(mv)
    }

    fn apply_ai(&mut self, mv: Move) -> Result<(), EngineError> {
        if !self.is_ai_turn() {
            return Err(EngineError::InvalidState);
        }

        let legal = GameSnapshot::from_live(&self.board, self.current_player(), self.opponent())
            .possible_moves();
        if !legal.contains(&mv) {
            return Err(EngineError::IllegalMove(mv.to_string()));
        }

        let mover = self.current;
        debug!(player = self.current_player().name(), %mv, "applying AI move");

        let formed = match mv {
            Move::Place { to, .. } => {
                self.notify_ai_status(AiStatus::Placing);
                self.play_piece(to)
            }
            Move::Movement { from, to, .. } => {
                self.notify_ai_status(AiStatus::Moving);
                self.move_piece(from, to)
            }
            Move::Take { .. } => false,
        };

        if formed {
            self.log_mill();
        }
        if let Some(node) = mv.node_to_take() {
            self.notify_ai_status(AiStatus::TakingPiece);
            self.take_piece(node);
        }

        self.end_turn();
        self.delegate
            .ai_status_changed(player_of(&self.green, &self.red, mover), AiStatus::Waiting);
        Ok(())
    }

    // ========================================================================
    // RESET
    // ========================================================================

    /// Clear the board and start again with the starting player
    pub fn reset(&mut self) {
        self.board.reset();
        self.green.reset();
        self.red.reset();
        self.current = self.starting;
        self.winner = None;
        self.plies = 0;

        info!("game reset");
        self.start_turn();
        self.delegate.pieces_left_changed(&self.green);
        self.delegate.pieces_left_changed(&self.red);
        self.flush_events();
    }

    // ========================================================================
    // SEQUENCING
    // ========================================================================

    fn play_piece(&mut self, node: NodeId) -> bool {
        let (board, mover) = match self.current {
            PlayerColour::Green => (&mut self.board, &mut self.green),
            PlayerColour::Red => (&mut self.board, &mut self.red),
        };
        let formed = mover.play_piece(board, node);
        self.delegate.pieces_left_changed(player_of(&self.green, &self.red, self.current));
        formed
    }

    fn move_piece(&mut self, from: NodeId, to: NodeId) -> bool {
        let (board, mover) = match self.current {
            PlayerColour::Green => (&mut self.board, &mut self.green),
            PlayerColour::Red => (&mut self.board, &mut self.red),
        };
        mover.move_piece(board, from, to)
    }

    fn take_piece(&mut self, node: NodeId) {
        let (board, victim) = match self.current {
            PlayerColour::Green => (&mut self.board, &mut self.red),
            PlayerColour::Red => (&mut self.board, &mut self.green),
        };
        victim.lose_piece(board, node);
        info!(
            player = self.current_player().name(),
            node,
            remaining = self.opponent().pieces_on_board().len(),
            "piece taken"
        );
    }

    fn log_mill(&self) {
        info!(player = self.current_player().name(), "mill formed");
    }

    /// After a human place or move: wait for a capture or pass the turn
    fn after_move(&mut self, formed: bool) {
        if formed {
            self.log_mill();
        }

        if formed && self.opponent().has_takeable_nodes(&self.board) {
            self.set_state(EngineState::TakingPiece);
            self.update_interaction();
        } else {
            self.end_turn();
        }
    }

    fn end_turn(&mut self) {
        self.plies += 1;
        self.current = self.current.opponent();

        if self.current_player().has_lost(&self.board) {
            let winner = self.current.opponent();
            self.winner = Some(winner);
            self.set_state(EngineState::GameOver);
            self.board.disable_nodes();

            info!(winner = self.player(winner).name(), plies = self.plies, "game won");
            self.delegate.game_won(player_of(&self.green, &self.red, winner));
            return;
        }

        self.start_turn();
    }

    fn start_turn(&mut self) {
        let state = EngineState::from_phase(self.current_player().phase(&self.board));
        self.set_state(state);
        self.delegate
            .current_player_changed(player_of(&self.green, &self.red, self.current));
        self.update_interaction();
    }

    fn set_state(&mut self, state: EngineState) {
        self.state = state;
        self.delegate.state_changed(state);
    }

    fn notify_ai_status(&mut self, status: AiStatus) {
        self.delegate
            .ai_status_changed(player_of(&self.green, &self.red, self.current), status);
    }

    /// Enable exactly the nodes a human may touch next
    fn update_interaction(&mut self) {
        self.board.disable_nodes();
        if self.is_ai_turn() {
            return;
        }

        match self.state {
            EngineState::PlacingPieces => {
                let empty = self.board.nodes_with_colour(PieceColour::None);
                self.board.set_nodes_tappable(&empty);
            }
            EngineState::MovingPieces | EngineState::FlyingPieces => {
                let movable = self.current_player().movable_nodes(&self.board);
                self.board.set_nodes_draggable(&movable);
            }
            EngineState::TakingPiece => {
                let takeable = self.opponent().takeable_nodes(&self.board);
                self.board.set_nodes_tappable(&takeable);
            }
            EngineState::GameOver => {}
        }
    }

    fn flush_events(&mut self) {
        for event in self.board.take_events() {
            self.delegate.board_event(event);
        }
    }

    /// Report an internal error and restart the match
    fn internal_failure(&mut self, err: SnapshotError) -> EngineError {
        let err = EngineError::Internal(err);
        error!(%err, "internal error, resetting game");
        self.delegate.failure(&err.to_string());
        self.reset();
        err
    }
}

// ============================================================================
// TESTS
// ============================================================================
