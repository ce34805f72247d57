//! Terminal rendering of a live game
//!
//! The view mirrors node colours from engine callbacks and buffers its
//! output until [`TerminalView::present`] is called, so the board is drawn
//! once per action rather than once per changed node.

use std::io::{self, Write};

use morris_core::{
    AiStatus, EngineDelegate, EngineState, MillId, NodeId, PieceColour, Player, PlayerColour,
    NUM_NODES,
};

/// Board layout; `@` is replaced by node 0, 1, 2, ... in order
const TEMPLATE: [&str; 13] = [
    "@---------@---------@",
    "|         |         |",
    "|  @------@------@  |",
    "|  |      |      |  |",
    "|  |   @--@--@   |  |",
    "|  |   |     |   |  |",
    "@--@---@     @---@--@",
    "|  |   |     |   |  |",
    "|  |   @--@--@   |  |",
    "|  |      |      |  |",
    "|  @------@------@  |",
    "|         |         |",
    "@---------@---------@",
];

/// Node ids, printed once at the start
pub const ID_GUIDE: &str = "\
0---------1---------2
|         |         |
|  3------4------5  |
|  |      |      |  |
|  |   6--7--8   |  |
|  |   |     |   |  |
9--10--11    12--13-14
|  |   |     |   |  |
|  |   15-16-17  |  |
|  |      |      |  |
|  18-----19-----20 |
|         |         |
21--------22-------23";

/// Draw a board from node colours
pub fn render_board(colours: &[PieceColour; NUM_NODES]) -> String {
    let mut nodes = colours.iter();
    let mut out = String::new();

    for row in TEMPLATE {
        for c in row.chars() {
            if c == '@' {
                out.push(nodes.next().map_or('?', |colour| colour.symbol()));
            } else {
                out.push(c);
            }
        }
        out.push('\n');
    }
    out
}

/// What the human should type next
pub fn help_text(state: EngineState) -> &'static str {
    match state {
        EngineState::PlacingPieces => "Enter an empty node to place a piece.",
        EngineState::MovingPieces => {
            "Enter one of your pieces and an adjacent empty node, e.g. `9 21`."
        }
        EngineState::FlyingPieces => {
            "Three pieces left: enter a piece and any empty node to fly there."
        }
        EngineState::TakingPiece => "Mill! Enter an opponent piece to take.",
        EngineState::GameOver => "Game over.",
    }
}

fn colour_name(colour: PlayerColour) -> &'static str {
    match colour {
        PlayerColour::Green => "green (g)",
        PlayerColour::Red => "red (r)",
    }
}

/// Delegate writing the game to a terminal
pub struct TerminalView<W: Write> {
    out: W,
    colours: [PieceColour; NUM_NODES],
    in_hand: [u8; 2],
    state: EngineState,
    board_changed: bool,
    pending: Vec<String>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            colours: [PieceColour::None; NUM_NODES],
            in_hand: [morris_core::player::STARTING_PIECES; 2],
            state: EngineState::PlacingPieces,
            board_changed: true,
            pending: Vec::new(),
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Queue a line of text
    pub fn say(&mut self, text: impl Into<String>) {
        self.pending.push(text.into());
    }

    /// Write the board if it changed, then any queued lines
    pub fn present(&mut self) -> io::Result<()> {
        if self.board_changed {
            writeln!(self.out)?;
            write!(self.out, "{}", render_board(&self.colours))?;
            writeln!(
                self.out,
                "In hand: green {}, red {}",
                self.in_hand[0], self.in_hand[1]
            )?;
            self.board_changed = false;
        }
        for line in self.pending.drain(..) {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()
    }
}

impl<W: Write> EngineDelegate for TerminalView<W> {
    fn node_colour_changed(&mut self, node: NodeId, colour: PieceColour) {
        if let Some(slot) = self.colours.get_mut(node) {
            *slot = colour;
            self.board_changed = true;
        }
    }

    fn mill_colour_changed(&mut self, mill: MillId, colour: PieceColour) {
        tracing::debug!(mill, ?colour, "mill closed");
    }

    fn game_won(&mut self, winner: &Player) {
        self.say(format!("{} ({}) wins!", winner.name(), colour_name(winner.colour())));
    }

    fn failure(&mut self, message: &str) {
        self.say(format!("Something went wrong ({}). Starting a new game.", message));
    }

    fn state_changed(&mut self, state: EngineState) {
        self.state = state;
        if state == EngineState::TakingPiece {
            self.say(help_text(state));
        }
    }

    fn current_player_changed(&mut self, player: &Player) {
        if !player.is_ai() {
            self.say(format!(
                "{}, you are {}. {}",
                player.name(),
                colour_name(player.colour()),
                help_text(self.state)
            ));
        }
    }

    fn pieces_left_changed(&mut self, player: &Player) {
        let slot = match player.colour() {
            PlayerColour::Green => 0,
            PlayerColour::Red => 1,
        };
        self.in_hand[slot] = player.pieces_left_to_play();
        self.board_changed = true;
    }

    fn ai_status_changed(&mut self, player: &Player, status: AiStatus) {
        match status {
            AiStatus::Thinking => self.say(format!("{} is thinking...", player.name())),
            AiStatus::TakingPiece => {
                self.say(format!("{} closed a mill and takes a piece.", player.name()))
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_board() {
        let board = render_board(&[PieceColour::None; NUM_NODES]);
        let lines: Vec<&str> = board.lines().collect();

        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], "O---------O---------O");
        assert_eq!(lines[6], "O--O---O     O---O--O");
        assert_eq!(board.matches('O').count(), NUM_NODES);
    }

    #[test]
    fn test_render_places_nodes_in_order() {
        let mut colours = [PieceColour::None; NUM_NODES];
        colours[9] = PieceColour::Green;
        colours[14] = PieceColour::Red;
        colours[23] = PieceColour::Red;

        let board = render_board(&colours);
        let lines: Vec<&str> = board.lines().collect();
        assert_eq!(lines[6], "g--O---O     O---O--r");
        assert_eq!(lines[12], "O---------O---------r");
    }

    #[test]
    fn test_present_draws_once() {
        let mut view = TerminalView::new(Vec::new());
        view.node_colour_changed(0, PieceColour::Green);
        view.node_colour_changed(1, PieceColour::Red);
        view.say("hello");
        view.present().unwrap();
        view.present().unwrap();

        let text = String::from_utf8(view.output().clone()).unwrap();
        assert_eq!(text.matches("In hand").count(), 1);
        assert!(text.contains("g---------r---------O"));
        assert!(text.ends_with("hello\n"));
    }

    #[test]
    fn test_ignores_out_of_range_node() {
        let mut view = TerminalView::new(Vec::new());
        view.node_colour_changed(NUM_NODES, PieceColour::Green);
        assert!(view.colours.iter().all(|&c| c == PieceColour::None));
    }
}
