//! Move execution: validate, mutate, and record exactly how to reverse.
//!
//! `apply` is all-or-nothing: the state machine and the game rules both
//! approve the move before the first mutation, so a rejected move leaves
//! the position untouched. Every apply pushes an `UndoRecord` holding a
//! full snapshot of the touched cells and scalar fields; `undo` pops and
//! restores it, so `undo(apply(P, m)) == P` holds bit for bit. Search
//! depends on that exactness.

use log::trace;
use smallvec::SmallVec;

use crate::board::cell::CellContents;
use crate::board::position::{Picked, PickedSource};
use crate::board::state::{self, Transition};
use crate::board::{CellId, ExplicitState, IllegalMove, MoveOp, PlayerColor, Position};
use crate::game_move::MoveSpec;
use crate::rules::{Effects, GameRules};

/// Everything needed to exactly reverse one `apply`. Records are strictly
/// LIFO on the position's undo stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoRecord {
    pub spec: MoveSpec,
    prev_state: ExplicitState,
    prev_whose_turn: PlayerColor,
    prev_ply: u32,
    prev_resigned: Option<PlayerColor>,
    prev_picked: Option<Picked>,
    prev_chain_dest: Option<CellId>,
    prev_placed: [u32; 2],
    prev_captured: [u32; 2],
    cells: SmallVec<[(CellId, CellContents); 6]>,
}

impl UndoRecord {
    fn snapshot(pos: &Position, spec: MoveSpec) -> Self {
        Self {
            spec,
            prev_state: pos.state(),
            prev_whose_turn: pos.whose_turn(),
            prev_ply: pos.ply(),
            prev_resigned: pos.resigned(),
            prev_picked: pos.picked().cloned(),
            prev_chain_dest: pos.chain_dest(),
            prev_placed: pos.placed_counters(),
            prev_captured: pos.captured_counters(),
            cells: SmallVec::new(),
        }
    }

    fn restore(self, pos: &mut Position) {
        for (cell, contents) in self.cells {
            pos.set_contents(cell, contents);
        }
        pos.set_state(self.prev_state);
        pos.set_whose_turn(self.prev_whose_turn);
        pos.set_ply(self.prev_ply);
        pos.set_resigned(self.prev_resigned);
        pos.set_picked(self.prev_picked);
        pos.set_chain_dest(self.prev_chain_dest);
        pos.set_placed(self.prev_placed);
        pos.set_captured(self.prev_captured);
    }
}

/// Applies and reverses moves against a position, delegating legality and
/// effect resolution to the game rules.
pub struct Executor<'a> {
    rules: &'a dyn GameRules,
    events: SmallVec<[CellId; 8]>,
}

impl<'a> Executor<'a> {
    pub fn new(rules: &'a dyn GameRules) -> Self {
        Self {
            rules,
            events: SmallVec::new(),
        }
    }

    /// The cells touched by the most recent apply, in board order. This
    /// is the animation/event side channel for the rendering layer and
    /// carries no semantic weight.
    pub fn last_events(&self) -> &[CellId] {
        &self.events
    }

    /// Validates and applies one move. On rejection the position is
    /// untouched; on success an undo record is pushed.
    pub fn apply(&mut self, pos: &mut Position, spec: &MoveSpec) -> Result<(), IllegalMove> {
        let op = spec.op();
        let current = pos.state();
        let transition = state::try_transition(current, op)
            .ok_or(IllegalMove::WrongState { state: current, op })?;
        let effects = self.rules.resolve(pos, spec)?;

        trace!("apply {:?} in {:?}", spec, current);

        let mut record = UndoRecord::snapshot(pos, spec.clone());
        let touched = self.touched_cells(pos, op, &effects);
        for &cell in &touched {
            record.cells.push((cell, pos.contents(cell).clone()));
        }

        self.mutate(pos, op, &effects);
        self.apply_transition(pos, spec, transition, &effects);

        self.events = touched;
        pos.undo_stack.push(record);

        #[cfg(debug_assertions)]
        self.assert_conservation(pos);

        Ok(())
    }

    /// Reverses the most recent apply. Calling with an empty undo stack
    /// is a programmer error.
    pub fn undo(&mut self, pos: &mut Position) -> MoveSpec {
        let record = pos
            .undo_stack
            .pop()
            .expect("undo called with an empty undo stack");
        let spec = record.spec.clone();
        record.restore(pos);
        spec
    }

    /// Apply for search: performs the terminal confirmation automatically
    /// so one call advances a full ply (or, in a capture chain, one chain
    /// step). Never called with `Done` itself.
    pub fn robot_apply(&mut self, pos: &mut Position, spec: &MoveSpec) -> Result<(), IllegalMove> {
        debug_assert!(
            !matches!(spec, MoveSpec::Done),
            "robot_apply takes complete moves, not Done"
        );
        self.apply(pos, spec)?;
        if pos.state().is_done_state() {
            self.apply(pos, &MoveSpec::Done)
                .expect("Done must be legal in a done state");
        }
        Ok(())
    }

    /// Reverses one `robot_apply`.
    pub fn robot_undo(&mut self, pos: &mut Position) {
        let spec = self.undo(pos);
        if spec == MoveSpec::Done {
            self.undo(pos);
        }
    }

    fn touched_cells(
        &self,
        pos: &Position,
        op: MoveOp,
        effects: &Effects,
    ) -> SmallVec<[CellId; 8]> {
        let mut touched: SmallVec<[CellId; 8]> = SmallVec::new();
        if let Some(picked) = &effects.pick {
            if let PickedSource::Board(cell) = picked.source {
                touched.push(cell);
            }
        }
        if effects.unpick || matches!(op, MoveOp::Edit | MoveOp::Start) {
            if let Some(Picked {
                source: PickedSource::Board(cell),
                ..
            }) = pos.picked()
            {
                touched.push(*cell);
            }
        }
        if let Some(cell) = effects.remove {
            touched.push(cell);
        }
        if let Some((cell, _)) = effects.place {
            touched.push(cell);
        }
        touched.extend(effects.captures.iter().copied());
        touched.sort();
        touched.dedup();
        touched
    }

    fn mutate(&self, pos: &mut Position, op: MoveOp, effects: &Effects) {
        if let Some(picked) = &effects.pick {
            if let PickedSource::Board(cell) = picked.source {
                let top = pos.take_top(cell);
                debug_assert_eq!(Some(top), picked.stack.last().copied());
            }
            pos.set_picked(Some(picked.clone()));
        }

        if effects.unpick {
            self.return_held(pos);
        }

        if matches!(op, MoveOp::DropRack) {
            // Racks are infinite sinks: a board-sourced piece is retired
            // from play, a rack-sourced copy simply evaporates.
            if let Some(held) = pos.take_picked() {
                if let PickedSource::Board(_) = held.source {
                    for piece in &held.stack {
                        pos.add_placed(piece.color, -1);
                    }
                }
            }
        }

        if let Some((dest, piece)) = effects.place {
            if let Some(from) = effects.remove {
                let _mover = pos.take_top(from);
            } else if pos.picked().is_some() {
                pos.take_picked();
            }
            if effects.from_pool {
                pos.add_placed(piece.color, 1);
            }
            pos.put(dest, piece);
        }

        for &cell in &effects.captures {
            let victim = pos.take_top(cell);
            pos.add_captured(victim.color, 1);
        }
    }

    fn apply_transition(
        &self,
        pos: &mut Position,
        spec: &MoveSpec,
        transition: Transition,
        effects: &Effects,
    ) {
        match transition {
            Transition::To(next) => {
                match spec.op() {
                    MoveOp::Resign => pos.set_resigned(Some(pos.whose_turn())),
                    MoveOp::Edit => {
                        self.return_held(pos);
                        pos.set_resigned(None);
                        pos.set_chain_dest(None);
                    }
                    _ => {}
                }
                pos.set_state(next);
            }
            Transition::MoveMade => {
                if effects.unpick {
                    // The held piece went back to its source; the ply is
                    // still open and the state tag does not change.
                } else if effects.more_captures {
                    pos.set_chain_dest(effects.place.map(|(cell, _)| cell));
                    pos.set_state(ExplicitState::CaptureMore);
                } else {
                    pos.set_chain_dest(None);
                    pos.set_state(ExplicitState::Confirm);
                }
            }
            Transition::Commit => self.commit(pos, spec),
        }
    }

    fn commit(&self, pos: &mut Position, spec: &MoveSpec) {
        match spec {
            MoveSpec::Start { player } => {
                self.return_held(pos);
                pos.set_whose_turn(*player);
                pos.set_chain_dest(None);
                pos.set_resigned(None);
                pos.set_ply(0);
            }
            MoveSpec::Done => {
                pos.set_ply(pos.ply() + 1);
                pos.set_chain_dest(None);
                if pos.resigned().is_some() {
                    pos.set_state(ExplicitState::Gameover);
                    return;
                }
                pos.set_whose_turn(pos.whose_turn().opposite());
            }
            other => panic!("commit reached by unexpected op {:?}", other),
        }
        if self.rules.game_result(pos).is_some() {
            pos.set_state(ExplicitState::Gameover);
        } else {
            pos.set_state(self.rules.entry_state(pos));
        }
    }

    fn return_held(&self, pos: &mut Position) {
        if let Some(held) = pos.take_picked() {
            if let PickedSource::Board(cell) = held.source {
                for piece in held.stack {
                    pos.put(cell, piece);
                }
            }
        }
    }

    /// Conservation invariant: every piece a player has committed to the
    /// board is still on it, captured, or in the moving player's hand.
    #[cfg(debug_assertions)]
    fn assert_conservation(&self, pos: &Position) {
        use crate::board::piece::ALL_COLORS;
        for &player in &ALL_COLORS {
            let held = match pos.picked() {
                Some(Picked {
                    source: PickedSource::Board(_),
                    stack,
                }) => stack.iter().filter(|p| p.color == player).count() as u32,
                _ => 0,
            };
            let accounted = pos.on_board_count(player) + pos.captured_count(player) + held;
            assert_eq!(
                pos.placed_count(player),
                accounted,
                "piece-count drift for {}",
                player
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Variant;
    use crate::rules::{position_from_ascii, rules_for};

    #[test]
    fn test_illegal_move_leaves_position_untouched() {
        let rules = rules_for(Variant::Checkers);
        let mut exec = Executor::new(rules);
        let mut pos = Position::new(Variant::Checkers, 2, 7, 0);
        rules.setup(&mut pos);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: PlayerColor::White,
            },
        )
        .unwrap();

        let before = pos.clone();
        let before_digest = pos.digest();

        // Done is not legal in the Play state.
        let err = exec.apply(&mut pos, &MoveSpec::Done).unwrap_err();
        assert!(matches!(err, IllegalMove::WrongState { .. }));
        assert_eq!(pos, before);
        assert_eq!(pos.digest(), before_digest);
    }

    #[test]
    fn test_pick_and_drop_back_is_identity_for_board_state() {
        let rules = rules_for(Variant::Checkers);
        let mut exec = Executor::new(rules);
        let mut pos = position_from_ascii(
            Variant::Checkers,
            "
            - . - . - . - .
            . - . - . - . -
            - . - . - . - .
            . - . - . - . -
            - . - . - . - .
            . - w - . - . -
            - . - . - . - .
            . - . - . - . -
            ",
        );
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: PlayerColor::White,
            },
        )
        .unwrap();

        let geo = pos.geometry();
        let cell = geo.cell_at(2, 2).unwrap();
        assert!(pos.top(cell).is_some());

        exec.apply(&mut pos, &MoveSpec::PickBoard { cell }).unwrap();
        assert!(pos.picked().is_some());
        assert!(pos.contents(cell).is_empty());

        exec.apply(&mut pos, &MoveSpec::DropBoard { cell }).unwrap();
        assert!(pos.picked().is_none());
        assert!(pos.top(cell).is_some());
        assert_eq!(pos.state(), ExplicitState::Play);
    }

    #[test]
    fn test_held_piece_digests_differently_from_placed() {
        let rules = rules_for(Variant::Checkers);
        let mut exec = Executor::new(rules);
        let mut pos = Position::new(Variant::Checkers, 2, 7, 0);
        rules.setup(&mut pos);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: PlayerColor::White,
            },
        )
        .unwrap();

        let placed_digest = pos.digest();
        let cell = pos.occupied_cells(PlayerColor::White).next().unwrap();
        exec.apply(&mut pos, &MoveSpec::PickBoard { cell }).unwrap();
        assert_ne!(pos.digest(), placed_digest);
    }

    #[test]
    #[should_panic(expected = "empty undo stack")]
    fn test_undo_underflow_panics() {
        let rules = rules_for(Variant::Checkers);
        let mut exec = Executor::new(rules);
        let mut pos = Position::new(Variant::Checkers, 2, 7, 0);
        rules.setup(&mut pos);
        exec.undo(&mut pos);
    }
}
