//! Score conventions shared by the searchers.
//!
//! Heuristic scores come from `GameRules::evaluate` and live well inside
//! the winning sentinel. Terminal scores are nudged by their distance
//! from the search root so a forced win prefers the shortest line and a
//! forced loss the longest.

use crate::board::Position;
use crate::rules::{GameRules, Outcome};

/// Sentinel for a won game at the root.
pub const WIN: i32 = 1_000_000;

/// Scores at or above this are treated as forced wins; searchers stop
/// looking for anything better.
pub const WIN_THRESHOLD: i32 = WIN - 1_000;

pub fn win_in(plies_from_root: u32) -> i32 {
    WIN - plies_from_root as i32
}

pub fn loss_in(plies_from_root: u32) -> i32 {
    -win_in(plies_from_root)
}

/// The game-over outcome of a position, folding in resignation, which
/// the rules layer does not see.
pub fn outcome_of(rules: &dyn GameRules, pos: &Position) -> Option<Outcome> {
    if !pos.state().is_game_over() {
        return None;
    }
    if let Some(loser) = pos.resigned() {
        return Some(Outcome::Winner(loser.opposite()));
    }
    rules.game_result(pos)
}

/// Terminal score from `player`'s point of view, or `None` for a live
/// position.
pub fn terminal(
    rules: &dyn GameRules,
    pos: &Position,
    player: crate::board::PlayerColor,
    plies_from_root: u32,
) -> Option<i32> {
    match outcome_of(rules, pos)? {
        Outcome::Winner(winner) if winner == player => Some(win_in(plies_from_root)),
        Outcome::Winner(_) => Some(loss_in(plies_from_root)),
        Outcome::Draw => Some(0),
    }
}
