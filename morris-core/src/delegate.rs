//! Callbacks from the engine to whatever is showing the game

pub use crate::board::Interaction;

use crate::ai::AiStatus;
use crate::board::{BoardEvent, MillId, NodeId, PieceColour};
use crate::engine::EngineState;
use crate::player::Player;

/// Receives state changes from an [`Engine`](crate::engine::Engine).
///
/// Every method defaults to doing nothing, so a view only implements what it
/// draws. Calls are made synchronously from the engine's entry points.
pub trait EngineDelegate {
    fn node_colour_changed(&mut self, _node: NodeId, _colour: PieceColour) {}

    fn mill_colour_changed(&mut self, _mill: MillId, _colour: PieceColour) {}

    fn mill_reset(&mut self, _mill: MillId) {}

    fn node_interaction_changed(&mut self, _node: NodeId, _interaction: Interaction) {}

    fn game_won(&mut self, _winner: &Player) {}

    /// The match hit an internal error and has been reset
    fn failure(&mut self, _message: &str) {}

    fn state_changed(&mut self, _state: EngineState) {}

    fn current_player_changed(&mut self, _player: &Player) {}

    fn pieces_left_changed(&mut self, _player: &Player) {}

    fn ai_status_changed(&mut self, _player: &Player, _status: AiStatus) {}

    /// Route a recorded board change to the matching callback
    fn board_event(&mut self, event: BoardEvent) {
        match event {
            BoardEvent::NodeColourChanged { node, colour } => {
                self.node_colour_changed(node, colour)
            }
            BoardEvent::MillColourChanged { mill, colour } => {
                self.mill_colour_changed(mill, colour)
            }
            BoardEvent::MillReset { mill } => self.mill_reset(mill),
            BoardEvent::NodeInteraction { node, interaction } => {
                self.node_interaction_changed(node, interaction)
            }
        }
    }
}

/// Delegate for headless games
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDelegate;

impl EngineDelegate for NullDelegate {}
