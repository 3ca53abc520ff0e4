//! The per-game rules seam.
//!
//! The executor is game-agnostic: it owns mutation, undo records and the
//! state machine, and asks a `GameRules` implementation to validate moves
//! and describe their effects. Rules never mutate a position during play;
//! they only resolve a `MoveSpec` into an `Effects` value (or a typed
//! rejection), which keeps apply all-or-nothing.

pub mod checkers;
pub mod hex;

use smallvec::SmallVec;

use crate::board::geometry::Geometry;
use crate::board::position::Picked;
use crate::board::{CellId, ExplicitState, IllegalMove, Piece, PlayerColor, Position, Variant};
use crate::game_move::MoveSpec;

/// The final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(PlayerColor),
    Draw,
}

/// A validated move, described as the mutations the executor must make.
#[derive(Debug, Clone, Default)]
pub struct Effects {
    /// Take this object into the moving player's hand.
    pub pick: Option<Picked>,
    /// Return the held object to its source (dropping a piece back where
    /// it was picked up).
    pub unpick: bool,
    /// The moving piece leaves this cell (atomic board moves).
    pub remove: Option<CellId>,
    /// The piece that ends up on the board, already promoted if the move
    /// promotes.
    pub place: Option<(CellId, Piece)>,
    /// The placed piece was drawn from an off-board pool or rack rather
    /// than moved across the board.
    pub from_pool: bool,
    /// Cells whose top piece is captured by this move.
    pub captures: SmallVec<[CellId; 4]>,
    /// The capture chain continues from the destination; the ply is not
    /// yet complete.
    pub more_captures: bool,
}

impl Effects {
    pub fn none() -> Self {
        Self::default()
    }
}

pub trait GameRules: Send + Sync {
    fn variant(&self) -> Variant;

    fn geometry(&self) -> &'static Geometry;

    /// Initial placement, racks and absent-cell marking for a fresh game.
    fn setup(&self, pos: &mut Position);

    /// Validate `spec` for the current player and state, and describe its
    /// effects. Must not mutate anything. The executor has already
    /// checked the state machine; this is the game-legality half.
    fn resolve(&self, pos: &Position, spec: &MoveSpec) -> Result<Effects, IllegalMove>;

    /// Complete moves for the side to move. Never empty in a live state:
    /// when nothing else is legal this returns exactly the reserved
    /// `Pass` or `Resign` fallback.
    fn legal_moves(&self, pos: &Position) -> Vec<MoveSpec>;

    /// The state a player enters at the start of their ply: `Play`, or a
    /// mandatory-capture state.
    fn entry_state(&self, pos: &Position) -> ExplicitState;

    /// The game-rule result for the position (side to move has lost, a
    /// chain is connected, ...). Resignation is handled by the executor
    /// and engine, not here.
    fn game_result(&self, pos: &Position) -> Option<Outcome>;

    /// Pure heuristic score of the position from `player`'s point of
    /// view. Terminal detection and the winning sentinel live in the
    /// searchers.
    fn evaluate(&self, pos: &Position, player: PlayerColor) -> i32;

    /// Whether `cell` is currently a legal pick source (empty hand) or
    /// drop target (holding a piece). Drives target highlighting in the
    /// excluded UI layer.
    fn is_legal_target(&self, pos: &Position, cell: CellId) -> bool;
}

static CHECKERS: checkers::CheckersRules = checkers::CheckersRules;
static HEX: hex::HexRules = hex::HexRules;

/// Rules registry: static per variant, shared freely across threads.
pub fn rules_for(variant: Variant) -> &'static dyn GameRules {
    match variant {
        Variant::Checkers => &CHECKERS,
        Variant::Hex => &HEX,
    }
}

/// Builds a position from an ascii grid, top row first. `.` is an empty
/// cell, `-` an absent one, anything else a piece glyph. The position is
/// left in the `Puzzle` state; apply `Start` to begin play. Intended for
/// tests and position setup tooling.
pub fn position_from_ascii(variant: Variant, art: &str) -> Position {
    let rules = rules_for(variant);
    let mut pos = Position::new(variant, 2, 0, 0);
    rules.setup(&mut pos);
    pos.clear_board();

    let geo = rules.geometry();
    let mut chars = art.split_whitespace().flat_map(|tok| tok.chars());
    let mut placed = [0u32; 2];
    for row in (0..geo.rows).rev() {
        for col in 0..geo.cols {
            let cell = geo.cell_at(col, row).expect("cell in range");
            let glyph = chars
                .next()
                .unwrap_or_else(|| panic!("ascii art too short at {}", geo.cell_name(cell)));
            match glyph {
                '.' => {}
                '-' => assert!(
                    pos.contents(cell).is_absent(),
                    "`-` on a playable cell {}",
                    geo.cell_name(cell)
                ),
                g => {
                    let piece = piece_for_glyph(g)
                        .unwrap_or_else(|| panic!("unknown piece glyph {:?}", g));
                    assert!(
                        !pos.contents(cell).is_absent(),
                        "piece on absent cell {}",
                        geo.cell_name(cell)
                    );
                    pos.put(cell, piece);
                    placed[piece.color.index()] += 1;
                }
            }
        }
    }
    assert!(chars.next().is_none(), "ascii art has trailing cells");
    pos.set_placed(placed);
    pos
}

fn piece_for_glyph(glyph: char) -> Option<Piece> {
    crate::board::piece::PIECE_REGISTRY
        .iter()
        .copied()
        .find(|p| p.glyph() == glyph)
}
