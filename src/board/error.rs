use thiserror::Error;

use super::piece::PlayerColor;
use super::state::{ExplicitState, MoveOp};

/// A move rejected by the state machine or the game rules. These are
/// client-reachable and always leave the position untouched; invariant
/// violations panic instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IllegalMove {
    #[error("{op:?} is not legal in the {state:?} state")]
    WrongState { state: ExplicitState, op: MoveOp },
    #[error("cell {cell} is not part of the playing surface")]
    OffBoard { cell: String },
    #[error("nothing to pick up at {cell}")]
    EmptyPick { cell: String },
    #[error("the piece at {cell} belongs to the opponent")]
    NotYourPiece { cell: String },
    #[error("no piece is currently picked up")]
    NothingPicked,
    #[error("a piece is already picked up")]
    AlreadyPicked,
    #[error("destination {cell} is occupied")]
    DestinationOccupied { cell: String },
    #[error("a capture is mandatory and this move declines it")]
    CaptureRequired,
    #[error("the capture chain must continue from {cell}")]
    WrongChainSource { cell: String },
    #[error("not a legal step for that piece")]
    BadStep,
    #[error("rack index {index} is out of range for {player}")]
    BadRackIndex { player: PlayerColor, index: u8 },
    #[error("passing is not allowed while moves remain")]
    PassNotAllowed,
    #[error("the game is already over")]
    GameOver,
}
