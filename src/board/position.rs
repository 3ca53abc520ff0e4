//! Position state representation.
//!
//! A position is a flat value: a vector of cells plus per-player racks,
//! counters, the explicit-state tag and turn bookkeeping. There is no
//! pointer-linked cell graph, so `clone` is a bounded deep copy and a
//! search sandbox can never alias the live game.
//!
//! Positions are mutated exclusively through the executor; the raw
//! mutators here are crate-private.

use super::cell::{CellContents, CellId, PieceStack};
use super::digest::DigestStream;
use super::geometry::{self, Geometry};
use super::piece::{Piece, PlayerColor};
use super::state::ExplicitState;
use super::Variant;
use crate::executor::UndoRecord;

/// An object currently held by the moving player, picked up but not yet
/// dropped. Digested under an identity distinct from its on-board form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picked {
    pub stack: PieceStack,
    pub source: PickedSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickedSource {
    Board(CellId),
    Rack(PlayerColor, u8),
}

impl PickedSource {
    fn digest_code(self) -> u64 {
        match self {
            PickedSource::Board(cell) => 1 + cell.0 as u64 * 4,
            PickedSource::Rack(player, index) => 2 + (player.index() as u64) + index as u64 * 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Position {
    variant: Variant,
    players: u8,
    seed: u64,
    revision: u32,
    geometry: &'static Geometry,
    cells: Vec<CellContents>,
    racks: [Vec<Piece>; 2],
    placed: [u32; 2],
    captured: [u32; 2],
    state: ExplicitState,
    whose_turn: PlayerColor,
    resigned: Option<PlayerColor>,
    ply: u32,
    picked: Option<Picked>,
    chain_dest: Option<CellId>,
    pub(crate) undo_stack: Vec<UndoRecord>,
}

impl Position {
    /// An empty position for the variant, in the `Puzzle` state. Game
    /// rules perform the initial placement; `Start` begins play.
    pub fn new(variant: Variant, players: u8, seed: u64, revision: u32) -> Self {
        let geometry = geometry::for_variant(variant);
        Self {
            variant,
            players,
            seed,
            revision,
            geometry,
            cells: vec![CellContents::Empty; geometry.cell_count()],
            racks: [Vec::new(), Vec::new()],
            placed: [0, 0],
            captured: [0, 0],
            state: ExplicitState::Puzzle,
            whose_turn: PlayerColor::White,
            resigned: None,
            ply: 0,
            picked: None,
            chain_dest: None,
            undo_stack: Vec::new(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn players(&self) -> u8 {
        self.players
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn geometry(&self) -> &'static Geometry {
        self.geometry
    }

    pub fn state(&self) -> ExplicitState {
        self.state
    }

    pub fn whose_turn(&self) -> PlayerColor {
        self.whose_turn
    }

    pub fn resigned(&self) -> Option<PlayerColor> {
        self.resigned
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn picked(&self) -> Option<&Picked> {
        self.picked.as_ref()
    }

    pub fn chain_dest(&self) -> Option<CellId> {
        self.chain_dest
    }

    pub fn contents(&self, cell: CellId) -> &CellContents {
        &self.cells[cell.index()]
    }

    pub fn top(&self, cell: CellId) -> Option<Piece> {
        self.cells[cell.index()].top()
    }

    pub fn rack(&self, player: PlayerColor) -> &[Piece] {
        &self.racks[player.index()]
    }

    pub fn placed_count(&self, player: PlayerColor) -> u32 {
        self.placed[player.index()]
    }

    pub fn captured_count(&self, player: PlayerColor) -> u32 {
        self.captured[player.index()]
    }

    /// Number of pieces each player has on the board. Recomputed fresh:
    /// cell mutation paths stay simple and the scan is cheap at our sizes.
    pub fn on_board_count(&self, player: PlayerColor) -> u32 {
        self.cells
            .iter()
            .map(|c| match c {
                CellContents::Stack(stack) => {
                    stack.iter().filter(|p| p.color == player).count() as u32
                }
                _ => 0,
            })
            .sum()
    }

    pub fn cell_name(&self, cell: CellId) -> String {
        self.geometry.cell_name(cell)
    }

    /// Iterator over cells currently topped by a piece of `player`.
    pub fn occupied_cells(&self, player: PlayerColor) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.top()
                .filter(|p| p.color == player)
                .map(|_| CellId(i as u16))
        })
    }

    // ---- crate-private mutators, used by the executor and game setup ----

    pub(crate) fn set_state(&mut self, state: ExplicitState) {
        self.state = state;
    }

    pub(crate) fn set_whose_turn(&mut self, player: PlayerColor) {
        self.whose_turn = player;
    }

    pub(crate) fn set_resigned(&mut self, player: Option<PlayerColor>) {
        self.resigned = player;
    }

    pub(crate) fn set_ply(&mut self, ply: u32) {
        self.ply = ply;
    }

    pub(crate) fn set_picked(&mut self, picked: Option<Picked>) {
        self.picked = picked;
    }

    pub(crate) fn take_picked(&mut self) -> Option<Picked> {
        self.picked.take()
    }

    pub(crate) fn set_chain_dest(&mut self, cell: Option<CellId>) {
        self.chain_dest = cell;
    }

    pub(crate) fn set_contents(&mut self, cell: CellId, contents: CellContents) {
        self.cells[cell.index()] = contents;
    }

    pub(crate) fn put(&mut self, cell: CellId, piece: Piece) {
        self.cells[cell.index()].push(piece);
    }

    pub(crate) fn take_top(&mut self, cell: CellId) -> Piece {
        self.cells[cell.index()].pop()
    }

    pub(crate) fn set_rack(&mut self, player: PlayerColor, pieces: Vec<Piece>) {
        self.racks[player.index()] = pieces;
    }

    pub(crate) fn add_placed(&mut self, player: PlayerColor, delta: i32) {
        let count = &mut self.placed[player.index()];
        *count = (*count as i64 + delta as i64) as u32;
    }

    pub(crate) fn set_placed(&mut self, placed: [u32; 2]) {
        self.placed = placed;
    }

    pub(crate) fn set_captured(&mut self, captured: [u32; 2]) {
        self.captured = captured;
    }

    pub(crate) fn add_captured(&mut self, player: PlayerColor, delta: i32) {
        let count = &mut self.captured[player.index()];
        *count = (*count as i64 + delta as i64) as u32;
    }

    pub(crate) fn placed_counters(&self) -> [u32; 2] {
        self.placed
    }

    pub(crate) fn captured_counters(&self) -> [u32; 2] {
        self.captured
    }

    pub(crate) fn clear_board(&mut self) {
        for cell in self.cells.iter_mut() {
            if !cell.is_absent() {
                *cell = CellContents::Empty;
            }
        }
        self.placed = [0, 0];
        self.captured = [0, 0];
        self.picked = None;
        self.chain_dest = None;
        self.resigned = None;
    }

    /// The 64-bit digest of this position. Every semantically relevant
    /// field consumes draws from the fixed stream in a fixed order; the
    /// ply counter is deliberately excluded so repeated positions digest
    /// equally for draw-by-repetition detection.
    pub fn digest(&self) -> u64 {
        let mut stream = DigestStream::new();
        let mut v = stream.mix(self.revision as u64);

        for cell in &self.cells {
            v ^= stream.mix(cell.digest_code());
        }

        // The held object draws from its own stream positions, so a piece
        // in hand never digests like the same piece sitting on its source
        // cell.
        match &self.picked {
            Some(picked) => {
                let code = picked
                    .stack
                    .iter()
                    .fold(0u64, |acc, p| acc * 31 + p.registry_index() as u64 + 1);
                v ^= stream.mix(code);
                v ^= stream.mix(picked.source.digest_code());
            }
            None => {
                v ^= stream.mix(0);
                v ^= stream.mix(0);
            }
        }

        for rack in &self.racks {
            let code = rack
                .iter()
                .fold(0u64, |acc, p| acc * 31 + p.registry_index() as u64 + 1);
            v ^= stream.mix(code);
        }

        for &count in self.placed.iter().chain(self.captured.iter()) {
            v ^= stream.mix(count as u64);
        }

        v ^= stream.mix_option(self.chain_dest.map(|c| c.0 as u64));
        v ^= stream.mix_option(self.resigned.map(|p| p.index() as u64));
        v ^= stream.mix(self.state.digest_code());
        v ^= stream.mix(self.whose_turn.index() as u64);

        v
    }

    /// Clone self-check: a sandbox copy must agree with its source under
    /// both structural and digest equality before search trusts it.
    pub fn checked_clone(&self) -> Position {
        let copy = self.clone();
        assert!(copy == *self, "clone is not structurally identical");
        assert_eq!(copy.digest(), self.digest(), "clone digest mismatch");
        copy
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        // Geometry is identified by the variant; the reference itself is
        // process-local and excluded.
        self.variant == other.variant
            && self.players == other.players
            && self.seed == other.seed
            && self.revision == other.revision
            && self.cells == other.cells
            && self.racks == other.racks
            && self.placed == other.placed
            && self.captured == other.captured
            && self.state == other.state
            && self.whose_turn == other.whose_turn
            && self.resigned == other.resigned
            && self.ply == other.ply
            && self.picked == other.picked
            && self.chain_dest == other.chain_dest
            && self.undo_stack == other.undo_stack
    }
}

impl Eq for Position {}
