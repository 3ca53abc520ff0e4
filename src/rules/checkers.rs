//! American checkers on the 8x8 square board.
//!
//! Men step and capture diagonally forward; kings use all four diagonals
//! but move a single square. Captures are mandatory, chains continue
//! until no further jump exists from the landing square, and promotion
//! ends a chain. A player with no pieces or no legal move loses.

use smallvec::{smallvec, SmallVec};

use crate::board::geometry::{self, dir, Geometry};
use crate::board::piece::ALL_COLORS;
use crate::board::position::{Picked, PickedSource};
use crate::board::{
    CellContents, CellId, ExplicitState, IllegalMove, Piece, PieceKind, PlayerColor, Position,
    Variant,
};
use crate::game_move::MoveSpec;

use super::{Effects, GameRules, Outcome};

const MAN_VALUE: i32 = 100;
const KING_VALUE: i32 = 300;
const ADVANCE_BONUS: i32 = 2;

pub struct CheckersRules;

/// A single capturing jump: the cell jumped over and the landing cell.
type Jump = (CellId, CellId);

impl CheckersRules {
    /// Dark squares carry the game; light squares are not part of the
    /// playing surface.
    fn is_dark(col: u8, row: u8) -> bool {
        (col + row) % 2 == 0
    }

    fn move_dirs(piece: Piece) -> &'static [usize] {
        match (piece.color, piece.kind) {
            (_, PieceKind::King) => &dir::SQUARE_DIAGONALS,
            (PlayerColor::White, _) => &[dir::NE, dir::NW],
            (PlayerColor::Black, _) => &[dir::SE, dir::SW],
        }
    }

    fn promotion_row(geo: &Geometry, color: PlayerColor) -> u8 {
        match color {
            PlayerColor::White => geo.rows - 1,
            PlayerColor::Black => 0,
        }
    }

    /// The piece as it lands on `to`: crowned if a man reaches the far row.
    fn landed(geo: &Geometry, piece: Piece, to: CellId) -> Piece {
        let (_, row) = geo.col_row(to);
        if piece.kind == PieceKind::Man && row == Self::promotion_row(geo, piece.color) {
            Piece::new(piece.color, PieceKind::King)
        } else {
            piece
        }
    }

    /// Top piece of `cell`, treating the cells in `cleared` as empty.
    /// `cleared` models the in-flight move (vacated source, captured men)
    /// without mutating the position.
    fn effective_top(pos: &Position, cell: CellId, cleared: &[CellId]) -> Option<Piece> {
        if cleared.contains(&cell) {
            None
        } else {
            pos.top(cell)
        }
    }

    fn is_open(pos: &Position, cell: CellId, cleared: &[CellId]) -> bool {
        !pos.contents(cell).is_absent() && Self::effective_top(pos, cell, cleared).is_none()
    }

    /// All jumps available to `piece` standing (possibly hypothetically)
    /// on `cell`.
    fn jumps_from(
        pos: &Position,
        cell: CellId,
        piece: Piece,
        cleared: &[CellId],
    ) -> SmallVec<[Jump; 4]> {
        let geo = pos.geometry();
        let mut jumps = SmallVec::new();
        for &d in Self::move_dirs(piece) {
            let mid = match geo.neighbor(cell, d) {
                Some(mid) => mid,
                None => continue,
            };
            let to = match geo.neighbor(mid, d) {
                Some(to) => to,
                None => continue,
            };
            match Self::effective_top(pos, mid, cleared) {
                Some(p) if p.color != piece.color => {}
                _ => continue,
            }
            if Self::is_open(pos, to, cleared) {
                jumps.push((mid, to));
            }
        }
        jumps
    }

    fn captures_available(pos: &Position, player: PlayerColor) -> bool {
        pos.occupied_cells(player).any(|cell| match pos.top(cell) {
            Some(piece) => !Self::jumps_from(pos, cell, piece, &[]).is_empty(),
            None => false,
        })
    }

    /// Validate one step for `piece` from `from` to `to` and describe it.
    /// `held` means the piece is in the player's hand (its source cell is
    /// already empty on the board), so the executor drops the hand rather
    /// than vacating a cell.
    fn resolve_step(
        &self,
        pos: &Position,
        from: CellId,
        to: CellId,
        piece: Piece,
        held: bool,
    ) -> Result<Effects, IllegalMove> {
        let geo = pos.geometry();
        if pos.contents(to).is_absent() {
            return Err(IllegalMove::OffBoard {
                cell: geo.cell_name(to),
            });
        }

        let (fc, fr) = geo.col_row(from);
        let (tc, tr) = geo.col_row(to);
        let (dc, dr) = (tc as i16 - fc as i16, tr as i16 - fr as i16);
        if dc.abs() != dr.abs() {
            return Err(IllegalMove::BadStep);
        }

        match dc.abs() {
            1 => {
                if pos.state().is_capture_state() || Self::captures_available(pos, piece.color) {
                    return Err(IllegalMove::CaptureRequired);
                }
                let legal_dir = Self::move_dirs(piece)
                    .iter()
                    .any(|&d| geo.neighbor(from, d) == Some(to));
                if !legal_dir {
                    return Err(IllegalMove::BadStep);
                }
                if pos.top(to).is_some() {
                    return Err(IllegalMove::DestinationOccupied {
                        cell: geo.cell_name(to),
                    });
                }
                Ok(Effects {
                    remove: if held { None } else { Some(from) },
                    place: Some((to, Self::landed(geo, piece, to))),
                    ..Effects::none()
                })
            }
            2 => {
                let step_dir = Self::move_dirs(piece).iter().copied().find(|&d| {
                    geo.neighbor(from, d)
                        .and_then(|mid| geo.neighbor(mid, d))
                        == Some(to)
                });
                let d = step_dir.ok_or(IllegalMove::BadStep)?;
                let mid = geo
                    .neighbor(from, d)
                    .ok_or(IllegalMove::BadStep)?;
                match pos.top(mid) {
                    Some(victim) if victim.color != piece.color => {}
                    _ => return Err(IllegalMove::BadStep),
                }
                if pos.top(to).is_some() {
                    return Err(IllegalMove::DestinationOccupied {
                        cell: geo.cell_name(to),
                    });
                }

                let landed = Self::landed(geo, piece, to);
                let promoted = landed.kind != piece.kind;
                // Promotion ends the chain even when the new king could
                // keep jumping.
                let more = !promoted
                    && !Self::jumps_from(pos, to, landed, &[from, mid]).is_empty();
                Ok(Effects {
                    remove: if held { None } else { Some(from) },
                    place: Some((to, landed)),
                    captures: smallvec![mid],
                    more_captures: more,
                    ..Effects::none()
                })
            }
            _ => Err(IllegalMove::BadStep),
        }
    }

    fn resolve_puzzle(&self, pos: &Position, spec: &MoveSpec) -> Result<Effects, IllegalMove> {
        let geo = pos.geometry();
        match spec {
            MoveSpec::PickBoard { cell } => {
                if pos.picked().is_some() {
                    return Err(IllegalMove::AlreadyPicked);
                }
                if pos.contents(*cell).is_absent() {
                    return Err(IllegalMove::OffBoard {
                        cell: geo.cell_name(*cell),
                    });
                }
                let top = pos.top(*cell).ok_or_else(|| IllegalMove::EmptyPick {
                    cell: geo.cell_name(*cell),
                })?;
                Ok(Effects {
                    pick: Some(Picked {
                        stack: smallvec![top],
                        source: PickedSource::Board(*cell),
                    }),
                    ..Effects::none()
                })
            }
            MoveSpec::DropBoard { cell } => {
                let held = pos.picked().ok_or(IllegalMove::NothingPicked)?;
                if pos.contents(*cell).is_absent() {
                    return Err(IllegalMove::OffBoard {
                        cell: geo.cell_name(*cell),
                    });
                }
                if held.source == PickedSource::Board(*cell) {
                    return Ok(Effects {
                        unpick: true,
                        ..Effects::none()
                    });
                }
                if pos.top(*cell).is_some() {
                    return Err(IllegalMove::DestinationOccupied {
                        cell: geo.cell_name(*cell),
                    });
                }
                let piece = held.stack[held.stack.len() - 1];
                Ok(Effects {
                    place: Some((*cell, piece)),
                    from_pool: matches!(held.source, PickedSource::Rack(..)),
                    ..Effects::none()
                })
            }
            MoveSpec::PickRack { player, index } => {
                if pos.picked().is_some() {
                    return Err(IllegalMove::AlreadyPicked);
                }
                let rack = pos.rack(*player);
                let piece =
                    rack.get(*index as usize)
                        .copied()
                        .ok_or(IllegalMove::BadRackIndex {
                            player: *player,
                            index: *index,
                        })?;
                Ok(Effects {
                    pick: Some(Picked {
                        stack: smallvec![piece],
                        source: PickedSource::Rack(*player, *index),
                    }),
                    ..Effects::none()
                })
            }
            MoveSpec::DropRack { player, index } => {
                if pos.picked().is_none() {
                    return Err(IllegalMove::NothingPicked);
                }
                if (*index as usize) >= pos.rack(*player).len() {
                    return Err(IllegalMove::BadRackIndex {
                        player: *player,
                        index: *index,
                    });
                }
                Ok(Effects::none())
            }
            MoveSpec::Start { .. } | MoveSpec::Edit => Ok(Effects::none()),
            _ => Err(IllegalMove::WrongState {
                state: pos.state(),
                op: spec.op(),
            }),
        }
    }

    fn resolve_live(&self, pos: &Position, spec: &MoveSpec) -> Result<Effects, IllegalMove> {
        let geo = pos.geometry();
        let whose = pos.whose_turn();
        match spec {
            MoveSpec::PickBoard { cell } => {
                if pos.picked().is_some() {
                    return Err(IllegalMove::AlreadyPicked);
                }
                if pos.state() == ExplicitState::CaptureMore && pos.chain_dest() != Some(*cell) {
                    let chain = pos.chain_dest().map(|c| geo.cell_name(c));
                    return Err(IllegalMove::WrongChainSource {
                        cell: chain.unwrap_or_default(),
                    });
                }
                let top = pos.top(*cell).ok_or_else(|| IllegalMove::EmptyPick {
                    cell: geo.cell_name(*cell),
                })?;
                if top.color != whose {
                    return Err(IllegalMove::NotYourPiece {
                        cell: geo.cell_name(*cell),
                    });
                }
                Ok(Effects {
                    pick: Some(Picked {
                        stack: smallvec![top],
                        source: PickedSource::Board(*cell),
                    }),
                    ..Effects::none()
                })
            }
            MoveSpec::DropBoard { cell } => {
                let held = pos.picked().ok_or(IllegalMove::NothingPicked)?;
                let from = match held.source {
                    PickedSource::Board(from) => from,
                    PickedSource::Rack(..) => return Err(IllegalMove::BadStep),
                };
                if from == *cell {
                    return Ok(Effects {
                        unpick: true,
                        ..Effects::none()
                    });
                }
                let piece = held.stack[held.stack.len() - 1];
                self.resolve_step(pos, from, *cell, piece, true)
            }
            MoveSpec::Move { from, to } => {
                if pos.picked().is_some() {
                    return Err(IllegalMove::AlreadyPicked);
                }
                if pos.state() == ExplicitState::CaptureMore && pos.chain_dest() != Some(*from) {
                    let chain = pos.chain_dest().map(|c| geo.cell_name(c));
                    return Err(IllegalMove::WrongChainSource {
                        cell: chain.unwrap_or_default(),
                    });
                }
                let piece = pos.top(*from).ok_or_else(|| IllegalMove::EmptyPick {
                    cell: geo.cell_name(*from),
                })?;
                if piece.color != whose {
                    return Err(IllegalMove::NotYourPiece {
                        cell: geo.cell_name(*from),
                    });
                }
                self.resolve_step(pos, *from, *to, piece, false)
            }
            MoveSpec::Pass => Err(IllegalMove::PassNotAllowed),
            MoveSpec::Resign | MoveSpec::Edit => Ok(Effects::none()),
            _ => Err(IllegalMove::WrongState {
                state: pos.state(),
                op: spec.op(),
            }),
        }
    }

    fn capture_moves(&self, pos: &Position, player: PlayerColor) -> Vec<MoveSpec> {
        let sources: Vec<CellId> = match pos.state() {
            ExplicitState::CaptureMore => pos.chain_dest().into_iter().collect(),
            _ => pos.occupied_cells(player).collect(),
        };
        let mut moves = Vec::new();
        for from in sources {
            if let Some(piece) = pos.top(from) {
                if piece.color != player {
                    continue;
                }
                for (_, to) in Self::jumps_from(pos, from, piece, &[]) {
                    moves.push(MoveSpec::Move { from, to });
                }
            }
        }
        moves
    }

    fn simple_moves(&self, pos: &Position, player: PlayerColor) -> Vec<MoveSpec> {
        let geo = pos.geometry();
        let mut moves = Vec::new();
        for from in pos.occupied_cells(player) {
            if let Some(piece) = pos.top(from) {
                for &d in Self::move_dirs(piece) {
                    if let Some(to) = geo.neighbor(from, d) {
                        if Self::is_open(pos, to, &[]) {
                            moves.push(MoveSpec::Move { from, to });
                        }
                    }
                }
            }
        }
        moves
    }

    fn has_any_move(&self, pos: &Position, player: PlayerColor) -> bool {
        Self::captures_available(pos, player) || !self.simple_moves(pos, player).is_empty()
    }
}

impl GameRules for CheckersRules {
    fn variant(&self) -> Variant {
        Variant::Checkers
    }

    fn geometry(&self) -> &'static Geometry {
        geometry::for_variant(Variant::Checkers)
    }

    fn setup(&self, pos: &mut Position) {
        let geo = self.geometry();
        for row in 0..geo.rows {
            for col in 0..geo.cols {
                let cell = match geo.cell_at(col, row) {
                    Some(cell) => cell,
                    None => continue,
                };
                if !Self::is_dark(col, row) {
                    pos.set_contents(cell, CellContents::Absent);
                } else if row < 3 {
                    pos.put(cell, Piece::new(PlayerColor::White, PieceKind::Man));
                } else if row >= geo.rows - 3 {
                    pos.put(cell, Piece::new(PlayerColor::Black, PieceKind::Man));
                }
            }
        }
        pos.set_placed([12, 12]);
        for &color in &ALL_COLORS {
            pos.set_rack(
                color,
                vec![
                    Piece::new(color, PieceKind::Man),
                    Piece::new(color, PieceKind::King),
                ],
            );
        }
    }

    fn resolve(&self, pos: &Position, spec: &MoveSpec) -> Result<Effects, IllegalMove> {
        match pos.state() {
            ExplicitState::Puzzle => self.resolve_puzzle(pos, spec),
            ExplicitState::Play | ExplicitState::Capture | ExplicitState::CaptureMore => {
                self.resolve_live(pos, spec)
            }
            // Only Done, Resign and Edit reach resolve in these states,
            // and none of them touches the board.
            ExplicitState::Confirm | ExplicitState::Resigned | ExplicitState::Gameover => {
                Ok(Effects::none())
            }
        }
    }

    fn legal_moves(&self, pos: &Position) -> Vec<MoveSpec> {
        let player = pos.whose_turn();
        match pos.state() {
            ExplicitState::Puzzle | ExplicitState::Gameover => Vec::new(),
            ExplicitState::Confirm | ExplicitState::Resigned => vec![MoveSpec::Done],
            ExplicitState::Capture | ExplicitState::CaptureMore => {
                let moves = self.capture_moves(pos, player);
                if moves.is_empty() {
                    vec![MoveSpec::Resign]
                } else {
                    moves
                }
            }
            ExplicitState::Play => {
                let mut moves = if Self::captures_available(pos, player) {
                    self.capture_moves(pos, player)
                } else {
                    self.simple_moves(pos, player)
                };
                if moves.is_empty() {
                    moves.push(MoveSpec::Resign);
                }
                moves
            }
        }
    }

    fn entry_state(&self, pos: &Position) -> ExplicitState {
        if Self::captures_available(pos, pos.whose_turn()) {
            ExplicitState::Capture
        } else {
            ExplicitState::Play
        }
    }

    fn game_result(&self, pos: &Position) -> Option<Outcome> {
        let player = pos.whose_turn();
        if pos.on_board_count(player) == 0 || !self.has_any_move(pos, player) {
            return Some(Outcome::Winner(player.opposite()));
        }
        None
    }

    fn evaluate(&self, pos: &Position, player: PlayerColor) -> i32 {
        let geo = self.geometry();
        let mut score = 0;
        for &color in &ALL_COLORS {
            let sign = if color == player { 1 } else { -1 };
            for cell in pos.occupied_cells(color) {
                if let Some(piece) = pos.top(cell) {
                    let (_, row) = geo.col_row(cell);
                    let advance = match color {
                        PlayerColor::White => row as i32,
                        PlayerColor::Black => (geo.rows - 1 - row) as i32,
                    };
                    let value = match piece.kind {
                        PieceKind::King => KING_VALUE,
                        _ => MAN_VALUE + ADVANCE_BONUS * advance,
                    };
                    score += sign * value;
                }
            }
        }
        score
    }

    fn is_legal_target(&self, pos: &Position, cell: CellId) -> bool {
        if pos.contents(cell).is_absent() {
            return false;
        }
        match pos.picked() {
            Some(held) => match held.source {
                PickedSource::Board(from) => {
                    if from == cell {
                        return true;
                    }
                    let piece = held.stack[held.stack.len() - 1];
                    match pos.state() {
                        ExplicitState::Puzzle => pos.top(cell).is_none(),
                        _ => self.resolve_step(pos, from, cell, piece, true).is_ok(),
                    }
                }
                PickedSource::Rack(..) => {
                    pos.state() == ExplicitState::Puzzle && pos.top(cell).is_none()
                }
            },
            None => match pos.state() {
                ExplicitState::Puzzle => pos.top(cell).is_some(),
                ExplicitState::Play => match pos.top(cell) {
                    Some(piece) => piece.color == pos.whose_turn(),
                    None => false,
                },
                ExplicitState::Capture => match pos.top(cell) {
                    Some(piece) => {
                        piece.color == pos.whose_turn()
                            && !Self::jumps_from(pos, cell, piece, &[]).is_empty()
                    }
                    None => false,
                },
                ExplicitState::CaptureMore => pos.chain_dest() == Some(cell),
                _ => false,
            },
        }
    }
}
