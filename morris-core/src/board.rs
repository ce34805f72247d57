//! Board topology, nodes and mills
//!
//! The board looks like this:
//!
//! ```text
//! 0---------1---------2
//! |         |         |
//! |  3------4------5  |
//! |  |      |      |  |
//! |  |   6--7--8   |  |
//! |  |   |     |   |  |
//! 9--10--11    12--13-14
//! |  |   |     |   |  |
//! |  |   15-16-17  |  |
//! |  |      |      |  |
//! |  18-----19-----20 |
//! |         |         |
//! 21--------22-------23
//! ```
//!
//! Nodes and mills live in flat arrays and refer to each other by index, so
//! cloning a board is a plain copy of its state.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Index of a node, in `0..NUM_NODES`
pub type NodeId = usize;

/// Index of a mill, in `0..NUM_MILLS`
pub type MillId = usize;

pub const NUM_NODES: usize = 24;
pub const NUM_MILLS: usize = 16;

/// Pieces needed to close a mill
pub const PIECES_IN_MILL: u8 = 3;

/// Best-connected nodes, favoured for the opening placement
pub const INTERSECTIONS: [NodeId; 4] = [4, 10, 13, 19];

/// Neighbours of each node
pub const NODE_NEIGHBOURS: [&[NodeId]; NUM_NODES] = [
    &[1, 9],           // 0
    &[0, 2, 4],        // 1
    &[1, 14],          // 2
    &[4, 10],          // 3
    &[1, 3, 5, 7],     // 4
    &[4, 13],          // 5
    &[7, 11],          // 6
    &[4, 6, 8],        // 7
    &[7, 12],          // 8
    &[0, 10, 21],      // 9
    &[3, 9, 11, 18],   // 10
    &[6, 10, 15],      // 11
    &[8, 13, 17],      // 12
    &[5, 12, 14, 20],  // 13
    &[2, 13, 23],      // 14
    &[11, 16],         // 15
    &[15, 17, 19],     // 16
    &[12, 16],         // 17
    &[10, 19],         // 18
    &[16, 18, 20, 22], // 19
    &[13, 19],         // 20
    &[9, 22],          // 21
    &[19, 21, 23],     // 22
    &[14, 22],         // 23
];

/// Member nodes of each mill
pub const MILL_NODES: [[NodeId; 3]; NUM_MILLS] = [
    // Horizontal, top to bottom
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [9, 10, 11],
    [12, 13, 14],
    [15, 16, 17],
    [18, 19, 20],
    [21, 22, 23],
    // Vertical, left to right
    [0, 9, 21],
    [3, 10, 18],
    [6, 11, 15],
    [1, 4, 7],
    [16, 19, 22],
    [8, 12, 17],
    [5, 13, 20],
    [2, 14, 23],
];

/// Check a node id coming from outside the core
pub fn is_valid_id(id: usize) -> bool {
    id < NUM_NODES
}

// ============================================================================
// CORE TYPES
// ============================================================================

/// Colour of a node or mill
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceColour {
    #[default]
    None = 0,
    Green = 1,
    Red = 2,
}

impl PieceColour {
    fn index(self) -> usize {
        self as usize
    }

    /// Single character used when printing boards
    pub fn symbol(self) -> char {
        match self {
            PieceColour::None => 'O',
            PieceColour::Green => 'g',
            PieceColour::Red => 'r',
        }
    }
}

/// How the view may interact with a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interaction {
    Tappable,
    Draggable,
    Disabled,
}

/// State change on a live board, forwarded to the view by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardEvent {
    NodeColourChanged { node: NodeId, colour: PieceColour },
    MillColourChanged { mill: MillId, colour: PieceColour },
    MillReset { mill: MillId },
    NodeInteraction { node: NodeId, interaction: Interaction },
}

/// One position on the board
#[derive(Clone, Debug)]
pub struct Node {
    id: NodeId,
    colour: PieceColour,
    neighbours: &'static [NodeId],
    mills: [MillId; 2],
    /// Number of closed mills this node belongs to
    active_mill_count: u8,
    is_tappable: bool,
    is_draggable: bool,
}

impl Node {
    fn new(id: NodeId, mills: [MillId; 2]) -> Self {
        Self {
            id,
            colour: PieceColour::None,
            neighbours: NODE_NEIGHBOURS[id],
            mills,
            active_mill_count: 0,
            is_tappable: true,
            is_draggable: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn colour(&self) -> PieceColour {
        self.colour
    }

    pub fn is_empty(&self) -> bool {
        self.colour == PieceColour::None
    }

    pub fn neighbours(&self) -> &'static [NodeId] {
        self.neighbours
    }

    pub fn mills(&self) -> [MillId; 2] {
        self.mills
    }

    /// True while the node is part of at least one closed mill
    pub fn in_active_mill(&self) -> bool {
        self.active_mill_count > 0
    }

    pub fn active_mill_count(&self) -> u8 {
        self.active_mill_count
    }

    pub fn is_tappable(&self) -> bool {
        self.is_tappable
    }

    pub fn is_draggable(&self) -> bool {
        self.is_draggable
    }

    fn reset(&mut self) {
        self.colour = PieceColour::None;
        self.active_mill_count = 0;
        self.is_tappable = true;
        self.is_draggable = false;
    }
}

/// Mill colour change caused by a piece count update
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MillTransition {
    Formed(PieceColour),
    Broken,
}

/// A line of three nodes
#[derive(Clone, Debug)]
pub struct Mill {
    id: MillId,
    nodes: [NodeId; 3],
    /// Pieces of each colour in the mill, indexed by `PieceColour`. Always sums to 3.
    piece_counts: [u8; 3],
    colour: PieceColour,
}

impl Mill {
    fn new(id: MillId, nodes: [NodeId; 3]) -> Self {
        Self {
            id,
            nodes,
            piece_counts: [PIECES_IN_MILL, 0, 0],
            colour: PieceColour::None,
        }
    }

    pub fn id(&self) -> MillId {
        self.id
    }

    pub fn nodes(&self) -> [NodeId; 3] {
        self.nodes
    }

    /// Green or red once all three nodes share that colour, otherwise none
    pub fn colour(&self) -> PieceColour {
        self.colour
    }

    pub fn piece_count(&self, colour: PieceColour) -> u8 {
        self.piece_counts[colour.index()]
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Two pieces of `colour` and one empty node
    pub fn is_in_two_piece_configuration(&self, colour: PieceColour) -> bool {
        self.piece_count(PieceColour::None) == 1 && self.piece_count(colour) == 2
    }

    /// True if the two mills share a node
    pub fn intersects(&self, other: &Mill) -> bool {
        self.nodes.iter().any(|node| other.contains(*node))
    }

    fn update_piece_counts(
        &mut self,
        old_colour: PieceColour,
        new_colour: PieceColour,
    ) -> Option<MillTransition> {
        self.piece_counts[old_colour.index()] -= 1;
        self.piece_counts[new_colour.index()] += 1;

        let colour = self.colour_from_piece_counts();
        if colour == self.colour {
            return None;
        }

        self.colour = colour;
        Some(match colour {
            PieceColour::None => MillTransition::Broken,
            formed => MillTransition::Formed(formed),
        })
    }

    fn colour_from_piece_counts(&self) -> PieceColour {
        if self.piece_count(PieceColour::Green) == PIECES_IN_MILL {
            PieceColour::Green
        } else if self.piece_count(PieceColour::Red) == PIECES_IN_MILL {
            PieceColour::Red
        } else {
            PieceColour::None
        }
    }

    fn reset(&mut self) {
        self.piece_counts = [PIECES_IN_MILL, 0, 0];
        self.colour = PieceColour::None;
    }
}

/// Counts used by the placement and flying heuristics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PieceConfigurations {
    /// Mills with two pieces of a colour and one empty node
    pub two_piece: usize,
    /// Pairs of two-piece mills sharing a node
    pub three_piece: usize,
}

// ============================================================================
// BOARD
// ============================================================================

/// All nodes and mills of a game
#[derive(Debug)]
pub struct Board {
    nodes: Vec<Node>,
    mills: Vec<Mill>,
    /// Present only on the live board the view is bound to
    events: Option<Vec<BoardEvent>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones never record events, so search can mutate them freely.
impl Clone for Board {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            mills: self.mills.clone(),
            events: None,
        }
    }
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Empty board that does not record events
    pub fn new() -> Self {
        let mut memberships = [[0; 2]; NUM_NODES];
        let mut membership_count = [0; NUM_NODES];

        for (mill_id, mill_nodes) in MILL_NODES.iter().enumerate() {
            for &node in mill_nodes {
                memberships[node][membership_count[node]] = mill_id;
                membership_count[node] += 1;
            }
        }

        let nodes = (0..NUM_NODES)
            .map(|id| Node::new(id, memberships[id]))
            .collect();
        let mills = MILL_NODES
            .iter()
            .enumerate()
            .map(|(id, nodes)| Mill::new(id, *nodes))
            .collect();

        Self {
            nodes,
            mills,
            events: None,
        }
    }

    /// Empty board that records a `BoardEvent` for every visible change
    pub fn with_events() -> Self {
        Self {
            events: Some(Vec::new()),
            ..Self::new()
        }
    }

    /// Drain recorded events
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        self.events.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn emit(&mut self, event: BoardEvent) {
        if let Some(events) = self.events.as_mut() {
            events.push(event);
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Look up a node, rejecting ids outside the board
    pub fn get_node(&self, id: NodeId) -> Result<&Node, EngineError> {
        self.nodes.get(id).ok_or(EngineError::InvalidId(id))
    }

    pub fn get_mill(&self, id: MillId) -> Option<&Mill> {
        self.mills.get(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn mills(&self) -> &[Mill] {
        &self.mills
    }

    pub fn colour_of(&self, id: NodeId) -> PieceColour {
        self.nodes[id].colour
    }

    /// Ids of all nodes of exactly this colour
    pub fn nodes_with_colour(&self, colour: PieceColour) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| node.colour == colour)
            .map(|node| node.id)
            .collect()
    }

    pub fn empty_neighbours(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id]
            .neighbours
            .iter()
            .copied()
            .filter(|&neighbour| self.nodes[neighbour].is_empty())
            .collect()
    }

    pub fn has_empty_neighbours(&self, id: NodeId) -> bool {
        self.nodes[id]
            .neighbours
            .iter()
            .any(|&neighbour| self.nodes[neighbour].is_empty())
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Recolour a node and update both of its mills.
    ///
    /// Returns true if at least one mill was closed by this change. Players
    /// call this so that their piece lists stay in step with the board.
    pub fn set_colour(&mut self, id: NodeId, colour: PieceColour) -> bool {
        let old_colour = self.nodes[id].colour;
        let mut mill_formed = false;

        for mill_id in self.nodes[id].mills {
            let Some(transition) = self.mills[mill_id].update_piece_counts(old_colour, colour)
            else {
                continue;
            };

            let members = self.mills[mill_id].nodes;
            match transition {
                MillTransition::Formed(mill_colour) => {
                    mill_formed = true;
                    for member in members {
                        self.nodes[member].active_mill_count += 1;
                    }
                    self.emit(BoardEvent::MillColourChanged {
                        mill: mill_id,
                        colour: mill_colour,
                    });
                }
                MillTransition::Broken => {
                    for member in members {
                        self.nodes[member].active_mill_count -= 1;
                    }
                    self.emit(BoardEvent::MillReset { mill: mill_id });
                }
            }
        }

        self.nodes[id].colour = colour;
        self.emit(BoardEvent::NodeColourChanged { node: id, colour });

        mill_formed
    }

    pub fn set_nodes_tappable(&mut self, ids: &[NodeId]) {
        for &id in ids {
            self.nodes[id].is_tappable = true;
            self.nodes[id].is_draggable = false;
            self.emit(BoardEvent::NodeInteraction {
                node: id,
                interaction: Interaction::Tappable,
            });
        }
    }

    pub fn set_nodes_draggable(&mut self, ids: &[NodeId]) {
        for &id in ids {
            self.nodes[id].is_tappable = false;
            self.nodes[id].is_draggable = true;
            self.emit(BoardEvent::NodeInteraction {
                node: id,
                interaction: Interaction::Draggable,
            });
        }
    }

    pub fn disable_nodes(&mut self) {
        for id in 0..NUM_NODES {
            self.nodes[id].is_tappable = false;
            self.nodes[id].is_draggable = false;
            self.emit(BoardEvent::NodeInteraction {
                node: id,
                interaction: Interaction::Disabled,
            });
        }
    }

    /// Clear every node and mill
    pub fn reset(&mut self) {
        for id in 0..NUM_NODES {
            let was_empty = self.nodes[id].is_empty();
            self.nodes[id].reset();
            if !was_empty {
                self.emit(BoardEvent::NodeColourChanged {
                    node: id,
                    colour: PieceColour::None,
                });
            }
            self.emit(BoardEvent::NodeInteraction {
                node: id,
                interaction: Interaction::Tappable,
            });
        }

        for id in 0..NUM_MILLS {
            let was_closed = self.mills[id].colour != PieceColour::None;
            self.mills[id].reset();
            if was_closed {
                self.emit(BoardEvent::MillReset { mill: id });
            }
        }
    }

    // ========================================================================
    // RULE QUERIES
    // ========================================================================

    /// Would putting `colour` on the empty node `to` close a mill?
    ///
    /// `vacated` is the node the piece leaves when moving rather than placing.
    pub fn closes_mill(&self, to: NodeId, colour: PieceColour, vacated: Option<NodeId>) -> bool {
        self.nodes[to].mills.iter().any(|&mill_id| {
            self.mills[mill_id]
                .nodes
                .iter()
                .filter(|&&member| member != to)
                .all(|&member| Some(member) != vacated && self.nodes[member].colour == colour)
        })
    }

    /// The single empty node of a mill in two-piece configuration
    fn empty_node_in(&self, mill: &Mill) -> Option<NodeId> {
        mill.nodes
            .iter()
            .copied()
            .find(|&node| self.nodes[node].is_empty())
    }

    // ========================================================================
    // HEURISTIC QUERIES
    // ========================================================================

    /// Closed mills of this colour
    pub fn num_of_mills(&self, colour: PieceColour) -> usize {
        self.mills.iter().filter(|mill| mill.colour == colour).count()
    }

    /// Two-piece mills that a piece from outside the mill can close by moving
    pub fn num_of_open_mills(&self, colour: PieceColour) -> usize {
        self.mills
            .iter()
            .filter(|mill| self.is_open(mill, colour))
            .count()
    }

    /// Two-piece mills whose gap touches a closed mill of the same colour,
    /// so a piece can swing between the two and close a mill every move
    pub fn num_of_double_mills(&self, colour: PieceColour) -> usize {
        self.mills
            .iter()
            .filter(|mill| self.is_in_double_mill_configuration(mill, colour))
            .count()
    }

    pub fn num_of_two_and_three_piece_configurations(
        &self,
        colour: PieceColour,
    ) -> PieceConfigurations {
        let two_piece_mills: Vec<&Mill> = self
            .mills
            .iter()
            .filter(|mill| mill.is_in_two_piece_configuration(colour))
            .collect();

        let mut three_piece = 0;
        for (i, mill) in two_piece_mills.iter().enumerate() {
            three_piece += two_piece_mills[i + 1..]
                .iter()
                .filter(|other| mill.intersects(other))
                .count();
        }

        PieceConfigurations {
            two_piece: two_piece_mills.len(),
            three_piece,
        }
    }

    pub fn is_open(&self, mill: &Mill, colour: PieceColour) -> bool {
        if !mill.is_in_two_piece_configuration(colour) {
            return false;
        }

        let Some(empty) = self.empty_node_in(mill) else {
            return false;
        };

        self.nodes[empty]
            .neighbours
            .iter()
            .filter(|&&neighbour| !mill.contains(neighbour))
            .any(|&neighbour| self.nodes[neighbour].colour == colour)
    }

    pub fn is_in_double_mill_configuration(&self, mill: &Mill, colour: PieceColour) -> bool {
        if !mill.is_in_two_piece_configuration(colour) {
            return false;
        }

        let Some(empty) = self.empty_node_in(mill) else {
            return false;
        };

        self.nodes[empty].neighbours.iter().any(|&neighbour| {
            let node = &self.nodes[neighbour];
            node.in_active_mill() && node.colour == colour
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
