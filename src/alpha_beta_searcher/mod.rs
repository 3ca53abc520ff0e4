//! Fixed-depth alpha-beta search over the do/undo executor.
//!
//! The searcher works on a sandbox clone of the position and walks the
//! tree by applying and undoing moves in place. Turn order is taken from
//! the position rather than alternated: a capture chain keeps the same
//! player to move across consecutive tree levels, and each node maximizes
//! or minimizes according to whose turn it actually is.

use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::board::{PlayerColor, Position};
use crate::evaluate;
use crate::executor::Executor;
use crate::game_move::MoveSpec;
use crate::rules::GameRules;

type SearchNode = (u64, u8, i32, i32);

#[derive(Debug, Clone)]
pub struct AlphaBetaConfig {
    /// Search depth in robot plies (one chain step counts as a ply).
    pub depth: u8,
    /// Opening variety: among the best moves, up to this many candidates
    /// are considered for a random pick. Treated as at least one.
    pub top_n: usize,
    /// Moves scoring within this margin of the best share the pick.
    pub epsilon: i32,
    /// Randomize only while the game ply is below this bound.
    pub random_plies: u32,
    pub seed: u64,
}

impl Default for AlphaBetaConfig {
    fn default() -> Self {
        Self {
            depth: 5,
            top_n: 3,
            epsilon: 10,
            random_plies: 6,
            seed: 0,
        }
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("no available moves")]
    NoAvailableMoves,
}

pub struct AlphaBetaSearcher<'a> {
    rules: &'a dyn GameRules,
    config: AlphaBetaConfig,
    executor: Executor<'a>,
    search_result_cache: FxHashMap<SearchNode, i32>,
    rng: fastrand::Rng,
    searched_position_count: usize,
    cache_hit_count: usize,
    termination_count: usize,
}

impl<'a> AlphaBetaSearcher<'a> {
    pub fn new(rules: &'a dyn GameRules, config: AlphaBetaConfig) -> Self {
        let rng = fastrand::Rng::with_seed(config.seed);
        Self {
            rules,
            config,
            executor: Executor::new(rules),
            search_result_cache: FxHashMap::default(),
            rng,
            searched_position_count: 0,
            cache_hit_count: 0,
            termination_count: 0,
        }
    }

    pub fn searched_position_count(&self) -> usize {
        self.searched_position_count
    }

    pub fn cache_hit_count(&self) -> usize {
        self.cache_hit_count
    }

    pub fn termination_count(&self) -> usize {
        self.termination_count
    }

    /// Best move for the side to move. `cancel` is polled between root
    /// candidates; on cancellation the best fully-scored candidate so far
    /// is returned.
    pub fn search(
        &mut self,
        pos: &mut Position,
        cancel: &AtomicBool,
    ) -> Result<MoveSpec, SearchError> {
        self.searched_position_count = 0;
        self.cache_hit_count = 0;
        self.termination_count = 0;
        self.search_result_cache.clear();

        // A pending commit has exactly one continuation.
        if pos.state().is_done_state() {
            return Ok(MoveSpec::Done);
        }

        let root_player = pos.whose_turn();
        let candidates = self.rules.legal_moves(pos);
        if candidates.is_empty() {
            return Err(SearchError::NoAvailableMoves);
        }

        let mut scored: Vec<(MoveSpec, i32)> = Vec::with_capacity(candidates.len());
        for spec in candidates {
            let before = pos.digest();
            self.executor
                .robot_apply(pos, &spec)
                .unwrap_or_else(|err| panic!("legal move {:?} rejected: {}", spec, err));
            let score = self.node(self.config.depth, pos, root_player, 1, i32::MIN, i32::MAX);
            self.executor.robot_undo(pos);
            debug_assert_eq!(pos.digest(), before, "undo did not restore the root");

            let forced_win = score >= evaluate::WIN_THRESHOLD;
            scored.push((spec, score));
            if forced_win || cancel.load(Ordering::Relaxed) {
                break;
            }
        }

        debug!(
            "searched {} positions, {} cache hits, {} cutoffs",
            self.searched_position_count, self.cache_hit_count, self.termination_count
        );
        Ok(self.pick(pos, scored))
    }

    /// Among the scored candidates, take the best, or a seeded-random one
    /// of the near-best in the opening plies so repeated games diverge.
    fn pick(&mut self, pos: &Position, mut scored: Vec<(MoveSpec, i32)>) -> MoveSpec {
        scored.sort_by_key(|(_, score)| -*score);
        let best_score = scored[0].1;

        if pos.ply() < self.config.random_plies && best_score < evaluate::WIN_THRESHOLD {
            let near_best = scored
                .iter()
                .take(self.config.top_n.max(1))
                .filter(|(_, score)| best_score - score <= self.config.epsilon)
                .count();
            let choice = self.rng.usize(..near_best);
            return scored.swap_remove(choice).0;
        }
        scored.swap_remove(0).0
    }

    fn node(
        &mut self,
        depth: u8,
        pos: &mut Position,
        root_player: PlayerColor,
        plies_from_root: u32,
        alpha: i32,
        beta: i32,
    ) -> i32 {
        self.searched_position_count += 1;

        if let Some(score) = evaluate::terminal(self.rules, pos, root_player, plies_from_root) {
            return score;
        }
        if depth == 0 {
            return self.rules.evaluate(pos, root_player);
        }

        let node = (pos.digest(), depth, alpha, beta);
        if let Some(&cached) = self.search_result_cache.get(&node) {
            self.cache_hit_count += 1;
            return cached;
        }

        let maximizing = pos.whose_turn() == root_player;
        let score = if maximizing {
            self.max_node(depth, pos, root_player, plies_from_root, alpha, beta)
        } else {
            self.min_node(depth, pos, root_player, plies_from_root, alpha, beta)
        };
        self.search_result_cache.insert(node, score);
        score
    }

    fn max_node(
        &mut self,
        depth: u8,
        pos: &mut Position,
        root_player: PlayerColor,
        plies_from_root: u32,
        mut alpha: i32,
        beta: i32,
    ) -> i32 {
        for spec in self.rules.legal_moves(pos) {
            self.executor
                .robot_apply(pos, &spec)
                .unwrap_or_else(|err| panic!("legal move {:?} rejected: {}", spec, err));
            let score = self.node(depth - 1, pos, root_player, plies_from_root + 1, alpha, beta);
            self.executor.robot_undo(pos);

            if score >= beta {
                self.termination_count += 1;
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }
        alpha
    }

    fn min_node(
        &mut self,
        depth: u8,
        pos: &mut Position,
        root_player: PlayerColor,
        plies_from_root: u32,
        alpha: i32,
        mut beta: i32,
    ) -> i32 {
        for spec in self.rules.legal_moves(pos) {
            self.executor
                .robot_apply(pos, &spec)
                .unwrap_or_else(|err| panic!("legal move {:?} rejected: {}", spec, err));
            let score = self.node(depth - 1, pos, root_player, plies_from_root + 1, alpha, beta);
            self.executor.robot_undo(pos);

            if score <= alpha {
                self.termination_count += 1;
                return alpha;
            }
            if score < beta {
                beta = score;
            }
        }
        beta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{ExplicitState, PieceKind, Variant};
    use crate::rules::{position_from_ascii, rules_for, Outcome};

    fn no_cancel() -> AtomicBool {
        AtomicBool::new(false)
    }

    fn deep(depth: u8) -> AlphaBetaConfig {
        AlphaBetaConfig {
            depth,
            random_plies: 0,
            ..AlphaBetaConfig::default()
        }
    }

    #[test]
    fn test_finds_winning_capture_in_checkers() {
        // White's only black target is at D2; capturing it wins at once.
        let rules = rules_for(Variant::Checkers);
        let mut pos = position_from_ascii(
            Variant::Checkers,
            "
            - . - . - . - .
            . - . - . - . -
            - . - . - . - .
            . - . - . - . -
            - . - . - . - .
            . - . - . - . -
            - . - b - . - .
            . - w - . - w -
            ",
        );
        let mut exec = Executor::new(rules);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: crate::board::PlayerColor::White,
            },
        )
        .unwrap();
        assert_eq!(pos.state(), ExplicitState::Capture);

        let mut searcher = AlphaBetaSearcher::new(rules, deep(3));
        let best = searcher.search(&mut pos, &no_cancel()).unwrap();

        let geo = pos.geometry();
        assert_eq!(
            best,
            MoveSpec::Move {
                from: geo.cell_at(2, 0).unwrap(),
                to: geo.cell_at(4, 2).unwrap()
            }
        );
        exec.robot_apply(&mut pos, &best).unwrap();
        assert_eq!(
            evaluate::outcome_of(rules, &pos),
            Some(Outcome::Winner(crate::board::PlayerColor::White))
        );
    }

    #[test]
    fn test_finds_connecting_stone_in_hex() {
        let rules = rules_for(Variant::Hex);
        let mut pos = Position::new(Variant::Hex, 2, 0, 0);
        rules.setup(&mut pos);
        let mut exec = Executor::new(rules);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: crate::board::PlayerColor::White,
            },
        )
        .unwrap();

        // White has the whole of row 2 except F3; one stone finishes the
        // connection. Played through the executor so counters stay honest.
        let geo = pos.geometry();
        let gap = geo.cell_at(5, 2).unwrap();
        for col in 0..11u8 {
            if col == 5 {
                continue;
            }
            let cell = geo.cell_at(col, 2).unwrap();
            exec.apply(&mut pos, &MoveSpec::DropBoard { cell }).unwrap();
            exec.apply(&mut pos, &MoveSpec::Done).unwrap();
            // Black replies on row 8, far from the action.
            let reply = geo.cell_at(col, 8).unwrap();
            exec.apply(&mut pos, &MoveSpec::DropBoard { cell: reply })
                .unwrap();
            exec.apply(&mut pos, &MoveSpec::Done).unwrap();
        }
        assert_eq!(pos.whose_turn(), crate::board::PlayerColor::White);

        let mut searcher = AlphaBetaSearcher::new(rules, deep(2));
        let best = searcher.search(&mut pos, &no_cancel()).unwrap();
        assert_eq!(best, MoveSpec::DropBoard { cell: gap });
    }

    #[test]
    fn test_chain_capture_scored_as_single_turn() {
        // White to move can double-jump B2 and D4 from A1 and win the
        // second man only because the chain stays within one turn.
        let rules = rules_for(Variant::Checkers);
        let mut pos = position_from_ascii(
            Variant::Checkers,
            "
            - . - . - . - .
            . - . - . - . -
            - . - . - . - .
            . - . - . - . -
            - . - b - . - .
            . - . - . - . -
            - b - . - . - .
            w - . - . - . -
            ",
        );
        let mut exec = Executor::new(rules);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: crate::board::PlayerColor::White,
            },
        )
        .unwrap();

        let mut searcher = AlphaBetaSearcher::new(rules, deep(4));
        let geo = pos.geometry();
        let first = searcher.search(&mut pos, &no_cancel()).unwrap();
        assert_eq!(
            first,
            MoveSpec::Move {
                from: geo.cell_at(0, 0).unwrap(),
                to: geo.cell_at(2, 2).unwrap()
            }
        );
        exec.robot_apply(&mut pos, &first).unwrap();
        // Still White's move: the chain is open.
        assert_eq!(pos.state(), ExplicitState::CaptureMore);

        let second = searcher.search(&mut pos, &no_cancel()).unwrap();
        exec.robot_apply(&mut pos, &second).unwrap();
        assert_eq!(
            evaluate::outcome_of(rules, &pos),
            Some(Outcome::Winner(crate::board::PlayerColor::White))
        );
    }

    #[test]
    fn test_search_is_deterministic_for_a_seed() {
        let rules = rules_for(Variant::Checkers);
        let config = AlphaBetaConfig {
            depth: 3,
            seed: 42,
            ..AlphaBetaConfig::default()
        };

        let mut first_game = Vec::new();
        for run in 0..2 {
            let mut pos = Position::new(Variant::Checkers, 2, 42, 0);
            rules.setup(&mut pos);
            let mut exec = Executor::new(rules);
            exec.apply(
                &mut pos,
                &MoveSpec::Start {
                    player: crate::board::PlayerColor::White,
                },
            )
            .unwrap();

            let mut searcher = AlphaBetaSearcher::new(rules, config.clone());
            let mut moves = Vec::new();
            for _ in 0..6 {
                if pos.state().is_game_over() {
                    break;
                }
                let best = searcher.search(&mut pos, &no_cancel()).unwrap();
                exec.robot_apply(&mut pos, &best).unwrap();
                moves.push(best);
            }
            if run == 0 {
                first_game = moves;
            } else {
                assert_eq!(first_game, moves);
            }
        }
    }

    #[test]
    fn test_returned_move_is_always_legal() {
        let rules = rules_for(Variant::Checkers);
        let mut pos = Position::new(Variant::Checkers, 2, 3, 0);
        rules.setup(&mut pos);
        let mut exec = Executor::new(rules);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: crate::board::PlayerColor::White,
            },
        )
        .unwrap();

        let mut searcher = AlphaBetaSearcher::new(
            rules,
            AlphaBetaConfig {
                depth: 2,
                seed: 7,
                ..AlphaBetaConfig::default()
            },
        );
        for _ in 0..10 {
            if pos.state().is_game_over() {
                break;
            }
            let best = searcher.search(&mut pos, &no_cancel()).unwrap();
            assert!(rules.legal_moves(&pos).contains(&best));
            exec.robot_apply(&mut pos, &best).unwrap();
        }
    }

    #[test]
    fn test_zero_top_n_still_picks_a_move() {
        let rules = rules_for(Variant::Checkers);
        let mut pos = Position::new(Variant::Checkers, 2, 0, 0);
        rules.setup(&mut pos);
        let mut exec = Executor::new(rules);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: crate::board::PlayerColor::White,
            },
        )
        .unwrap();

        // Randomization active (low ply, no forced win) with an empty
        // candidate window still yields the best move.
        let mut searcher = AlphaBetaSearcher::new(
            rules,
            AlphaBetaConfig {
                depth: 2,
                top_n: 0,
                random_plies: 10,
                ..AlphaBetaConfig::default()
            },
        );
        let best = searcher.search(&mut pos, &no_cancel()).unwrap();
        assert!(rules.legal_moves(&pos).contains(&best));
    }

    #[test]
    fn test_cancelled_search_still_returns_a_move() {
        let rules = rules_for(Variant::Checkers);
        let mut pos = Position::new(Variant::Checkers, 2, 0, 0);
        rules.setup(&mut pos);
        let mut exec = Executor::new(rules);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: crate::board::PlayerColor::White,
            },
        )
        .unwrap();

        let cancel = AtomicBool::new(true);
        let mut searcher = AlphaBetaSearcher::new(rules, deep(6));
        let best = searcher.search(&mut pos, &cancel).unwrap();
        assert!(rules.legal_moves(&pos).contains(&best));
    }

    #[test]
    fn test_no_moves_in_terminal_position() {
        let rules = rules_for(Variant::Checkers);
        let mut pos = position_from_ascii(
            Variant::Checkers,
            "
            - . - . - . - .
            . - . - . - . -
            - . - . - . - .
            . - . - . - . -
            - . - . - . - .
            . - . - . - . -
            - . - . - . - .
            w - . - . - . -
            ",
        );
        let mut exec = Executor::new(rules);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: crate::board::PlayerColor::Black,
            },
        )
        .unwrap();
        assert_eq!(pos.state(), ExplicitState::Gameover);

        let mut searcher = AlphaBetaSearcher::new(rules, deep(2));
        assert!(matches!(
            searcher.search(&mut pos, &no_cancel()),
            Err(SearchError::NoAvailableMoves)
        ));
    }

    #[test]
    fn test_promotion_is_worth_reaching() {
        // White can promote next move; make sure search prefers the
        // crowning push over a sideways shuffle.
        let rules = rules_for(Variant::Checkers);
        let mut pos = position_from_ascii(
            Variant::Checkers,
            "
            - . - . - . - .
            . - w - . - . -
            - . - . - . - .
            . - . - . - . -
            - . - . - . - .
            . - w - . - . -
            - . - . - b - .
            . - . - . - . -
            ",
        );
        let mut exec = Executor::new(rules);
        exec.apply(
            &mut pos,
            &MoveSpec::Start {
                player: crate::board::PlayerColor::White,
            },
        )
        .unwrap();

        let mut searcher = AlphaBetaSearcher::new(rules, deep(2));
        let best = searcher.search(&mut pos, &no_cancel()).unwrap();
        exec.robot_apply(&mut pos, &best).unwrap();

        let white_king = pos
            .occupied_cells(crate::board::PlayerColor::White)
            .filter_map(|c| pos.top(c))
            .any(|p| p.kind == PieceKind::King);
        assert!(white_king, "expected {:?} to promote", best);
    }
}
