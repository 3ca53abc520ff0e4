//! Move descriptions and the wire format they travel in.

pub mod notation;

use crate::board::{CellId, MoveOp, PlayerColor};

pub use notation::{parse, serialize, NotationError};

/// One action and its parameters. This is the unit the executor applies,
/// the searchers enumerate, and the wire format transmits.
///
/// Capture metadata is deliberately absent: captures are forced by the
/// rules of the game, recomputed on application and recorded in the
/// `UndoRecord`, so the wire form carries exactly the fields that affect
/// execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MoveSpec {
    /// Pick up the piece on a board cell.
    PickBoard { cell: CellId },
    /// Drop the held piece on a board cell, or place one from the
    /// player's pool in placement games.
    DropBoard { cell: CellId },
    /// Atomic board-to-board move; the form searchers and game logs use.
    Move { from: CellId, to: CellId },
    /// Pick a copy of the indexed rack piece. Racks are infinite
    /// sources, so the rack itself is unchanged.
    PickRack { player: PlayerColor, index: u8 },
    /// Return the held piece toward a rack slot. Racks are infinite
    /// sinks; the piece is discarded.
    DropRack { player: PlayerColor, index: u8 },
    /// Commit the pending move or resignation.
    Done,
    /// A complete no-op move, legal only when no other move exists.
    Pass,
    Resign,
    /// Reset to the free-edit `Puzzle` state.
    Edit,
    /// Leave setup and begin play with the named player to move.
    Start { player: PlayerColor },
}

impl MoveSpec {
    /// The operation class used by the state machine.
    pub fn op(&self) -> MoveOp {
        match self {
            MoveSpec::PickBoard { .. } => MoveOp::PickBoard,
            MoveSpec::DropBoard { .. } => MoveOp::DropBoard,
            MoveSpec::Move { .. } => MoveOp::MoveBoard,
            MoveSpec::PickRack { .. } => MoveOp::PickRack,
            MoveSpec::DropRack { .. } => MoveOp::DropRack,
            MoveSpec::Done => MoveOp::Done,
            MoveSpec::Pass => MoveOp::Pass,
            MoveSpec::Resign => MoveOp::Resign,
            MoveSpec::Edit => MoveOp::Edit,
            MoveSpec::Start { .. } => MoveOp::Start,
        }
    }
}
