//! The explicit-state machine governing which move operations are legal.
//!
//! The transition table is total over the defined (state, op) pairs and is
//! the single source of truth: `allows` answers the reachable question for
//! client input, while `transition` is only called after validation and
//! panics on an undefined pair, which is a programmer error rather than a
//! reachable runtime branch.

/// The finite-state tag carried by every position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExplicitState {
    /// Free-edit setup mode: pieces may be placed and removed arbitrarily.
    Puzzle,
    /// Normal turn-taking: the side to move owes a move.
    Play,
    /// A capture is available and therefore mandatory for the side to move.
    Capture,
    /// A capture chain is in progress; it loops here until no further
    /// capture is available from the chain destination.
    CaptureMore,
    /// A complete move is pending and still reversible; `Done` commits it.
    Confirm,
    /// A resignation is pending; `Done` commits it.
    Resigned,
    /// Terminal. Absorbing except for the explicit reset transitions.
    Gameover,
}

impl ExplicitState {
    /// True in states where the pending action can be committed with `Done`.
    pub fn is_done_state(self) -> bool {
        matches!(self, ExplicitState::Confirm | ExplicitState::Resigned)
    }

    pub fn is_game_over(self) -> bool {
        matches!(self, ExplicitState::Gameover)
    }

    /// True in states where captures are mandatory.
    pub fn is_capture_state(self) -> bool {
        matches!(self, ExplicitState::Capture | ExplicitState::CaptureMore)
    }

    pub fn digest_code(self) -> u64 {
        match self {
            ExplicitState::Puzzle => 1,
            ExplicitState::Play => 2,
            ExplicitState::Capture => 3,
            ExplicitState::CaptureMore => 4,
            ExplicitState::Confirm => 5,
            ExplicitState::Resigned => 6,
            ExplicitState::Gameover => 7,
        }
    }
}

/// The operation class of a move, independent of its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveOp {
    PickBoard,
    DropBoard,
    MoveBoard,
    PickRack,
    DropRack,
    Done,
    Pass,
    Resign,
    Start,
    Edit,
}

/// What a defined transition does to the state tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Stay within the current ply, moving to the named state.
    To(ExplicitState),
    /// A complete move was made; the executor selects `Confirm` or
    /// `CaptureMore` from the move's resolved effects.
    MoveMade,
    /// Commit the ply: the executor advances the turn and computes the
    /// entry state for the player now to move.
    Commit,
}

pub fn try_transition(state: ExplicitState, op: MoveOp) -> Option<Transition> {
    use ExplicitState::*;
    use MoveOp::*;

    let next = match (state, op) {
        (Puzzle, PickBoard) | (Puzzle, DropBoard) => Transition::To(Puzzle),
        (Puzzle, PickRack) | (Puzzle, DropRack) => Transition::To(Puzzle),
        (Puzzle, Edit) => Transition::To(Puzzle),
        (Puzzle, Start) => Transition::Commit,

        (Play, PickBoard) => Transition::To(Play),
        (Play, DropBoard) | (Play, MoveBoard) => Transition::MoveMade,
        (Play, Pass) => Transition::MoveMade,

        (Capture, PickBoard) => Transition::To(Capture),
        (Capture, DropBoard) | (Capture, MoveBoard) => Transition::MoveMade,

        (CaptureMore, PickBoard) => Transition::To(CaptureMore),
        (CaptureMore, DropBoard) | (CaptureMore, MoveBoard) => Transition::MoveMade,

        (Confirm, Done) | (Resigned, Done) => Transition::Commit,

        (Play, Resign)
        | (Capture, Resign)
        | (CaptureMore, Resign)
        | (Confirm, Resign) => Transition::To(Resigned),

        // Reset transitions out of live or terminal states.
        (Play, Edit) | (Capture, Edit) | (CaptureMore, Edit) | (Confirm, Edit)
        | (Resigned, Edit) | (Gameover, Edit) => Transition::To(Puzzle),
        (Gameover, Start) => Transition::Commit,

        _ => return None,
    };
    Some(next)
}

/// Whether the operation is defined at all in this state. This is the
/// check applied to client input; rejections surface as typed errors.
pub fn allows(state: ExplicitState, op: MoveOp) -> bool {
    try_transition(state, op).is_some()
}

/// The transition itself. Reaching an undefined pair here means a caller
/// skipped validation, so it fails fast.
pub fn transition(state: ExplicitState, op: MoveOp) -> Transition {
    match try_transition(state, op) {
        Some(t) => t,
        None => panic!("undefined state transition: {:?} x {:?}", state, op),
    }
}
