//! Hex on an 11x11 rhombus.
//!
//! Stones are placed from an unlimited pool and never move. White wins by
//! connecting the west and east edges, Black by connecting the south and
//! north edges. There are no draws: a filled board is always connected
//! for exactly one player.

use std::collections::VecDeque;

use smallvec::smallvec;

use crate::board::geometry::{self, Geometry};
use crate::board::piece::ALL_COLORS;
use crate::board::position::{Picked, PickedSource};
use crate::board::{
    CellId, ExplicitState, IllegalMove, Piece, PieceKind, PlayerColor, Position, Variant,
};
use crate::game_move::MoveSpec;

use super::{Effects, GameRules, Outcome};

/// Evaluation weight per point of connection-distance advantage.
const DISTANCE_WEIGHT: i32 = 16;

/// Sentinel for "cannot connect at all".
const UNREACHABLE: u32 = u32::MAX;

pub struct HexRules;

impl HexRules {
    fn stone(color: PlayerColor) -> Piece {
        Piece::new(color, PieceKind::Stone)
    }

    /// Whether `cell` lies on the starting edge for `player`. White runs
    /// west to east, Black south to north.
    fn on_near_edge(geo: &Geometry, cell: CellId, player: PlayerColor) -> bool {
        let (col, row) = geo.col_row(cell);
        match player {
            PlayerColor::White => col == 0,
            PlayerColor::Black => row == 0,
        }
    }

    fn on_far_edge(geo: &Geometry, cell: CellId, player: PlayerColor) -> bool {
        let (col, row) = geo.col_row(cell);
        match player {
            PlayerColor::White => col == geo.cols - 1,
            PlayerColor::Black => row == geo.rows - 1,
        }
    }

    /// Flood fill over `player`'s stones: true when the two edges are
    /// connected through a chain of adjacent stones.
    fn is_connected(pos: &Position, player: PlayerColor) -> bool {
        let geo = pos.geometry();
        let mut seen = vec![false; geo.cell_count()];
        let mut queue = VecDeque::new();

        for cell in pos.occupied_cells(player) {
            if Self::on_near_edge(geo, cell, player) {
                seen[cell.index()] = true;
                queue.push_back(cell);
            }
        }
        while let Some(cell) = queue.pop_front() {
            if Self::on_far_edge(geo, cell, player) {
                return true;
            }
            for next in geo.neighbors(cell) {
                if seen[next.index()] {
                    continue;
                }
                if pos.top(next).map(|p| p.color) == Some(player) {
                    seen[next.index()] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Minimum number of stones `player` still needs to place to connect
    /// their edges: a 0-1 shortest path where own stones cost nothing,
    /// empty cells cost one and opponent stones are impassable.
    fn connection_distance(pos: &Position, player: PlayerColor) -> u32 {
        let geo = pos.geometry();
        let mut dist = vec![UNREACHABLE; geo.cell_count()];
        let mut queue: VecDeque<CellId> = VecDeque::new();

        let entry_cost = |cell: CellId| match pos.top(cell) {
            Some(p) if p.color == player => Some(0),
            Some(_) => None,
            None => {
                if pos.contents(cell).is_absent() {
                    None
                } else {
                    Some(1)
                }
            }
        };

        for idx in 0..geo.cell_count() {
            let cell = CellId(idx as u16);
            if !Self::on_near_edge(geo, cell, player) {
                continue;
            }
            if let Some(cost) = entry_cost(cell) {
                dist[idx] = cost;
                if cost == 0 {
                    queue.push_front(cell);
                } else {
                    queue.push_back(cell);
                }
            }
        }

        let mut best = UNREACHABLE;
        while let Some(cell) = queue.pop_front() {
            let here = dist[cell.index()];
            if here >= best {
                continue;
            }
            if Self::on_far_edge(geo, cell, player) {
                best = here;
                continue;
            }
            for next in geo.neighbors(cell) {
                let step = match entry_cost(next) {
                    Some(step) => step,
                    None => continue,
                };
                let candidate = here + step;
                if candidate < dist[next.index()] {
                    dist[next.index()] = candidate;
                    if step == 0 {
                        queue.push_front(next);
                    } else {
                        queue.push_back(next);
                    }
                }
            }
        }
        best
    }

    fn resolve_puzzle(&self, pos: &Position, spec: &MoveSpec) -> Result<Effects, IllegalMove> {
        let geo = pos.geometry();
        match spec {
            MoveSpec::PickBoard { cell } => {
                if pos.picked().is_some() {
                    return Err(IllegalMove::AlreadyPicked);
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
                let piece =
                    pos.rack(*player)
                        .get(*index as usize)
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
        match spec {
            MoveSpec::DropBoard { cell } => {
                if pos.top(*cell).is_some() {
                    return Err(IllegalMove::DestinationOccupied {
                        cell: geo.cell_name(*cell),
                    });
                }
                Ok(Effects {
                    place: Some((*cell, Self::stone(pos.whose_turn()))),
                    from_pool: true,
                    ..Effects::none()
                })
            }
            // Stones never move once placed.
            MoveSpec::PickBoard { .. } | MoveSpec::Move { .. } => Err(IllegalMove::BadStep),
            MoveSpec::Pass => {
                let geo_cells = geo.cell_count();
                let filled = ALL_COLORS
                    .iter()
                    .map(|&c| pos.on_board_count(c))
                    .sum::<u32>() as usize;
                if filled < geo_cells {
                    return Err(IllegalMove::PassNotAllowed);
                }
                Ok(Effects::none())
            }
            MoveSpec::Resign | MoveSpec::Edit => Ok(Effects::none()),
            _ => Err(IllegalMove::WrongState {
                state: pos.state(),
                op: spec.op(),
            }),
        }
    }
}

impl GameRules for HexRules {
    fn variant(&self) -> Variant {
        Variant::Hex
    }

    fn geometry(&self) -> &'static Geometry {
        geometry::for_variant(Variant::Hex)
    }

    fn setup(&self, pos: &mut Position) {
        for &color in &ALL_COLORS {
            pos.set_rack(color, vec![Self::stone(color)]);
        }
    }

    fn resolve(&self, pos: &Position, spec: &MoveSpec) -> Result<Effects, IllegalMove> {
        match pos.state() {
            ExplicitState::Puzzle => self.resolve_puzzle(pos, spec),
            ExplicitState::Play | ExplicitState::Capture | ExplicitState::CaptureMore => {
                self.resolve_live(pos, spec)
            }
            ExplicitState::Confirm | ExplicitState::Resigned | ExplicitState::Gameover => {
                Ok(Effects::none())
            }
        }
    }

    fn legal_moves(&self, pos: &Position) -> Vec<MoveSpec> {
        match pos.state() {
            ExplicitState::Puzzle | ExplicitState::Gameover => Vec::new(),
            ExplicitState::Confirm | ExplicitState::Resigned => vec![MoveSpec::Done],
            _ => {
                let geo = pos.geometry();
                let mut moves: Vec<MoveSpec> = (0..geo.cell_count())
                    .map(|idx| CellId(idx as u16))
                    .filter(|&cell| pos.top(cell).is_none())
                    .map(|cell| MoveSpec::DropBoard { cell })
                    .collect();
                if moves.is_empty() {
                    moves.push(MoveSpec::Pass);
                }
                moves
            }
        }
    }

    fn entry_state(&self, _pos: &Position) -> ExplicitState {
        ExplicitState::Play
    }

    fn game_result(&self, pos: &Position) -> Option<Outcome> {
        for &color in &ALL_COLORS {
            if Self::is_connected(pos, color) {
                return Some(Outcome::Winner(color));
            }
        }
        None
    }

    fn evaluate(&self, pos: &Position, player: PlayerColor) -> i32 {
        let mine = Self::connection_distance(pos, player);
        let theirs = Self::connection_distance(pos, player.opposite());
        match (mine, theirs) {
            (UNREACHABLE, UNREACHABLE) => 0,
            (UNREACHABLE, _) => -(geometry_span(pos) * DISTANCE_WEIGHT),
            (_, UNREACHABLE) => geometry_span(pos) * DISTANCE_WEIGHT,
            (mine, theirs) => (theirs as i32 - mine as i32) * DISTANCE_WEIGHT,
        }
    }

    fn is_legal_target(&self, pos: &Position, cell: CellId) -> bool {
        match pos.state() {
            ExplicitState::Puzzle => match pos.picked() {
                Some(held) => {
                    pos.top(cell).is_none() || held.source == PickedSource::Board(cell)
                }
                None => pos.top(cell).is_some(),
            },
            ExplicitState::Play => pos.top(cell).is_none(),
            _ => false,
        }
    }
}

fn geometry_span(pos: &Position) -> i32 {
    pos.geometry().cols as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Variant;
    use crate::executor::Executor;
    use crate::rules::rules_for;

    fn started(player: PlayerColor) -> (Position, Executor<'static>) {
        let rules = rules_for(Variant::Hex);
        let mut pos = Position::new(Variant::Hex, 2, 0, 0);
        rules.setup(&mut pos);
        let mut exec = Executor::new(rules);
        exec.apply(&mut pos, &MoveSpec::Start { player }).unwrap();
        (pos, exec)
    }

    fn place(exec: &mut Executor, pos: &mut Position, col: u8, row: u8) {
        let cell = pos.geometry().cell_at(col, row).unwrap();
        exec.apply(pos, &MoveSpec::DropBoard { cell }).unwrap();
        exec.apply(pos, &MoveSpec::Done).unwrap();
    }

    #[test]
    fn test_every_empty_cell_is_a_legal_opening() {
        let (pos, _exec) = started(PlayerColor::White);
        let rules = rules_for(Variant::Hex);
        assert_eq!(rules.legal_moves(&pos).len(), 121);
    }

    #[test]
    fn test_stones_cannot_stack_or_move() {
        let (mut pos, mut exec) = started(PlayerColor::White);
        let cell = pos.geometry().cell_at(5, 5).unwrap();
        exec.apply(&mut pos, &MoveSpec::DropBoard { cell }).unwrap();
        exec.apply(&mut pos, &MoveSpec::Done).unwrap();

        assert!(matches!(
            exec.apply(&mut pos, &MoveSpec::DropBoard { cell }),
            Err(IllegalMove::DestinationOccupied { .. })
        ));
        assert_eq!(
            exec.apply(&mut pos, &MoveSpec::PickBoard { cell })
                .unwrap_err(),
            IllegalMove::BadStep
        );
    }

    #[test]
    fn test_placement_draws_from_pool_and_alternates() {
        let (mut pos, mut exec) = started(PlayerColor::White);
        place(&mut exec, &mut pos, 0, 0);
        assert_eq!(pos.placed_count(PlayerColor::White), 1);
        assert_eq!(pos.whose_turn(), PlayerColor::Black);
        place(&mut exec, &mut pos, 1, 1);
        assert_eq!(pos.placed_count(PlayerColor::Black), 1);
        assert_eq!(pos.whose_turn(), PlayerColor::White);
    }

    #[test]
    fn test_west_east_chain_wins_for_white() {
        let (mut pos, mut exec) = started(PlayerColor::White);
        // White lays a straight path along row 3; Black answers far away
        // on rows 8 and 9 without ever threatening a connection.
        for col in 0..11u8 {
            if pos.state().is_game_over() {
                break;
            }
            place(&mut exec, &mut pos, col, 3);
            if !pos.state().is_game_over() {
                place(&mut exec, &mut pos, col, if col % 2 == 0 { 8 } else { 9 });
            }
        }
        assert_eq!(pos.state(), ExplicitState::Gameover);
        let rules = rules_for(Variant::Hex);
        assert_eq!(
            rules.game_result(&pos),
            Some(Outcome::Winner(PlayerColor::White))
        );
    }

    #[test]
    fn test_diagonal_adjacency_counts_as_connected() {
        // Axial neighbors include (1, -1): a staircase of stones sharing
        // only that link is still one chain.
        let (mut pos, mut exec) = started(PlayerColor::Black);
        let mut row = 0u8;
        let mut col = 5u8;
        loop {
            place(&mut exec, &mut pos, col, row);
            if pos.state().is_game_over() {
                break;
            }
            // White plays along the top edge, never reaching column 0.
            place(&mut exec, &mut pos, row + 1, 10);
            row += 1;
            if row % 2 == 0 && col > 0 {
                col -= 1;
            }
        }
        let rules = rules_for(Variant::Hex);
        assert_eq!(
            rules.game_result(&pos),
            Some(Outcome::Winner(PlayerColor::Black))
        );
    }

    #[test]
    fn test_evaluate_prefers_shorter_connection() {
        let (mut pos, mut exec) = started(PlayerColor::White);
        // White builds half a west-east wall; Black's stones sit on one
        // row and give no vertical progress.
        for col in 0..6u8 {
            place(&mut exec, &mut pos, col, 5);
            place(&mut exec, &mut pos, col + 2, 9);
        }
        let rules = rules_for(Variant::Hex);
        let white_view = rules.evaluate(&pos, PlayerColor::White);
        assert!(white_view > 0, "white should be ahead: {}", white_view);
        assert_eq!(rules.evaluate(&pos, PlayerColor::Black), -white_view);
    }

    #[test]
    fn test_robot_apply_round_trip_restores_position() {
        let rules = rules_for(Variant::Hex);
        let mut pos = Position::new(Variant::Hex, 2, 13, 0);
        rules.setup(&mut pos);
        let mut exec = Executor::new(rules);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: PlayerColor::White,
            },
        )
        .unwrap();

        let rng = fastrand::Rng::with_seed(21);
        for _ in 0..40 {
            if pos.state().is_game_over() {
                break;
            }
            let before = pos.clone();
            let before_digest = pos.digest();
            let moves = rules.legal_moves(&pos);
            let spec = moves[rng.usize(..moves.len())].clone();

            exec.robot_apply(&mut pos, &spec).unwrap();
            exec.robot_undo(&mut pos);
            assert_eq!(pos.digest(), before_digest, "undo failed for {:?}", spec);
            assert_eq!(pos, before, "undo left structural residue for {:?}", spec);

            exec.robot_apply(&mut pos, &spec).unwrap();
        }
    }

    #[test]
    fn test_connection_distance_on_empty_board() {
        let rules = rules_for(Variant::Hex);
        let mut pos = Position::new(Variant::Hex, 2, 0, 0);
        rules.setup(&mut pos);
        // Shortest path across an empty 11x11 board places 11 stones.
        assert_eq!(HexRules::connection_distance(&pos, PlayerColor::White), 11);
        assert_eq!(HexRules::connection_distance(&pos, PlayerColor::Black), 11);
    }
}
