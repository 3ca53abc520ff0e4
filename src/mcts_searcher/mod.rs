//! Parallel Monte Carlo tree search with UCT selection.
//!
//! Workers share one tree of lock-striped nodes: visit counts are
//! atomics, win totals and child maps sit behind `parking_lot` mutexes.
//! Each simulation clones the root position into a private sandbox and
//! plays it forward with the executor, so the shared tree holds no
//! position state at all.
//!
//! Because a capture chain keeps the same player to move, rewards are
//! credited per edge: every node remembers which player made the move
//! into it and is scored from that player's point of view.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::{ThreadPool, ThreadPoolBuilder};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::board::{PlayerColor, Position};
use crate::evaluate;
use crate::executor::Executor;
use crate::game_move::MoveSpec;
use crate::rules::{GameRules, Outcome};

#[derive(Debug, Clone)]
pub struct UctConfig {
    /// Exploration constant in the UCB1 term.
    pub exploration: f64,
    /// Worker threads; 0 lets rayon decide.
    pub threads: usize,
    /// Number of simulations per search call.
    pub rounds: u32,
    /// Optional wall-clock cap; simulations stop early when it expires.
    pub budget: Option<Duration>,
    /// Playouts longer than this many robot moves score as a draw.
    pub playout_cutoff: u32,
    pub seed: u64,
}

impl Default for UctConfig {
    fn default() -> Self {
        Self {
            exploration: 1.1,
            threads: 0,
            rounds: 10_000,
            budget: None,
            playout_cutoff: 300,
            seed: 0,
        }
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("no available moves")]
    NoAvailableMoves,
}

struct Node {
    /// The player whose move created this node; `None` only at the root.
    mover: Option<PlayerColor>,
    wins: Mutex<f64>,
    visits: AtomicU32,
    children: Mutex<FxHashMap<MoveSpec, Arc<Node>>>,
}

impl Node {
    fn new(mover: Option<PlayerColor>) -> Self {
        Self {
            mover,
            wins: Mutex::new(0.0),
            visits: AtomicU32::new(0),
            children: Mutex::new(FxHashMap::default()),
        }
    }

    fn ucb1(&self, parent_visits: u32, exploration: f64) -> f64 {
        let visits = self.visits.load(Ordering::Relaxed);
        if visits == 0 {
            f64::INFINITY
        } else {
            let wins = *self.wins.lock();
            wins / visits as f64
                + exploration * ((parent_visits.max(1) as f64).ln() / visits as f64).sqrt()
        }
    }
}

pub struct UctSearcher<'a> {
    rules: &'a dyn GameRules,
    config: UctConfig,
    pool: ThreadPool,
}

impl<'a> UctSearcher<'a> {
    pub fn new(
        rules: &'a dyn GameRules,
        config: UctConfig,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let mut builder = ThreadPoolBuilder::new();
        if config.threads > 0 {
            builder = builder.num_threads(config.threads);
        }
        let pool = builder.build()?;
        Ok(Self {
            rules,
            config,
            pool,
        })
    }

    /// Best move for the side to move, by visit count. `cancel` stops the
    /// remaining simulations; whatever the tree holds by then decides.
    pub fn search(
        &self,
        pos: &Position,
        cancel: &AtomicBool,
    ) -> Result<MoveSpec, SearchError> {
        // A pending commit has exactly one continuation.
        if pos.state().is_done_state() {
            return Ok(MoveSpec::Done);
        }

        let candidates = self.rules.legal_moves(pos);
        if candidates.is_empty() {
            return Err(SearchError::NoAvailableMoves);
        }
        let root_player = pos.whose_turn();
        let sandbox = pos.checked_clone();

        // An immediately winning move needs no tree.
        for spec in &candidates {
            let mut probe = sandbox.clone();
            let mut executor = Executor::new(self.rules);
            executor
                .robot_apply(&mut probe, spec)
                .unwrap_or_else(|err| panic!("legal move {:?} rejected: {}", spec, err));
            if evaluate::outcome_of(self.rules, &probe) == Some(Outcome::Winner(root_player)) {
                return Ok(spec.clone());
            }
        }

        let root = Arc::new(Node::new(None));
        let deadline = self.config.budget.map(|budget| Instant::now() + budget);

        self.pool.install(|| {
            use rayon::prelude::*;
            (0..self.config.rounds).into_par_iter().for_each(|round| {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        return;
                    }
                }
                self.run_simulation(&root, &sandbox, round as u64);
            });
        });

        let children = root.children.lock();
        let best = children
            .iter()
            .max_by_key(|(_, node)| node.visits.load(Ordering::Relaxed))
            .map(|(spec, _)| spec.clone());
        // With a zero budget the tree was never expanded; any legal move
        // will do.
        Ok(best.unwrap_or_else(|| candidates[0].clone()))
    }

    fn run_simulation(&self, root: &Arc<Node>, pos: &Position, round: u64) {
        let mut state = pos.clone();
        let mut executor = Executor::new(self.rules);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed.wrapping_add(round));

        let mut path: Vec<Arc<Node>> = vec![root.clone()];
        let mut current = root.clone();

        // Selection: descend by UCB1 until an unexpanded or terminal node.
        loop {
            if state.state().is_game_over() {
                break;
            }
            let parent_visits = current.visits.load(Ordering::Relaxed);
            let mut children = current.children.lock();
            if children.is_empty() {
                // Expansion: create every child at once.
                let mover = state.whose_turn();
                for spec in self.rules.legal_moves(&state) {
                    children.insert(spec, Arc::new(Node::new(Some(mover))));
                }
                break;
            }

            let picked = children
                .iter()
                .max_by(|(_, a), (_, b)| {
                    let a_score = a.ucb1(parent_visits, self.config.exploration);
                    let b_score = b.ucb1(parent_visits, self.config.exploration);
                    a_score
                        .partial_cmp(&b_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(spec, node)| (spec.clone(), node.clone()));
            drop(children);

            let (spec, next) = match picked {
                Some(step) => step,
                None => break,
            };
            executor
                .robot_apply(&mut state, &spec)
                .unwrap_or_else(|err| panic!("tree move {:?} rejected: {}", spec, err));
            path.push(next.clone());
            current = next;
        }

        // Playout: uniform random robot moves to the end or the cutoff.
        let mut outcome = evaluate::outcome_of(self.rules, &state);
        let mut steps = 0;
        while outcome.is_none() && steps < self.config.playout_cutoff {
            let moves = self.rules.legal_moves(&state);
            if moves.is_empty() {
                break;
            }
            let spec = &moves[rng.gen_range(0..moves.len())];
            executor
                .robot_apply(&mut state, spec)
                .unwrap_or_else(|err| panic!("playout move {:?} rejected: {}", spec, err));
            outcome = evaluate::outcome_of(self.rules, &state);
            steps += 1;
        }

        // Backpropagation: each node scores the playout for the player
        // whose move created it. Truncated playouts count as draws.
        for node in path.iter().rev() {
            node.visits.fetch_add(1, Ordering::Relaxed);
            let mover = match node.mover {
                Some(mover) => mover,
                None => continue,
            };
            let reward = match outcome {
                Some(Outcome::Winner(winner)) if winner == mover => 1.0,
                Some(Outcome::Winner(_)) => 0.0,
                Some(Outcome::Draw) | None => 0.5,
            };
            *node.wins.lock() += reward;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{ExplicitState, Variant};
    use crate::rules::{position_from_ascii, rules_for};

    fn no_cancel() -> AtomicBool {
        AtomicBool::new(false)
    }

    fn start_white(pos: &mut Position, rules: &'static dyn GameRules) {
        let mut exec = Executor::new(rules);
        exec.apply(
            pos,
            &MoveSpec::Start {
                player: PlayerColor::White,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_zero_rounds_still_returns_a_legal_move() {
        let rules = rules_for(Variant::Hex);
        let mut pos = Position::new(Variant::Hex, 2, 0, 0);
        rules.setup(&mut pos);
        start_white(&mut pos, rules);

        let searcher = UctSearcher::new(
            rules,
            UctConfig {
                rounds: 0,
                ..UctConfig::default()
            },
        )
        .unwrap();
        let best = searcher.search(&pos, &no_cancel()).unwrap();
        assert!(rules.legal_moves(&pos).contains(&best));
    }

    #[test]
    fn test_immediate_win_found_without_simulation() {
        // White's forced capture removes Black's last man.
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
            . - w - . - . -
            ",
        );
        start_white(&mut pos, rules);
        assert_eq!(pos.state(), ExplicitState::Capture);

        let searcher = UctSearcher::new(
            rules,
            UctConfig {
                rounds: 0,
                ..UctConfig::default()
            },
        )
        .unwrap();
        let best = searcher.search(&pos, &no_cancel()).unwrap();
        let geo = pos.geometry();
        assert_eq!(
            best,
            MoveSpec::Move {
                from: geo.cell_at(2, 0).unwrap(),
                to: geo.cell_at(4, 2).unwrap()
            }
        );
    }

    #[test]
    fn test_avoids_the_immediately_losing_move() {
        // White's man at C3 can advance to B4 or to D4; D4 hands Black a
        // capture that removes White's last piece.
        let rules = rules_for(Variant::Checkers);
        let mut pos = position_from_ascii(
            Variant::Checkers,
            "
            - . - . - . - .
            . - . - . - . -
            - . - . - . - .
            . - . - b - . -
            - . - . - . - .
            . - w - . - . -
            - . - . - . - .
            . - . - . - . -
            ",
        );
        start_white(&mut pos, rules);

        let searcher = UctSearcher::new(
            rules,
            UctConfig {
                rounds: 2_000,
                threads: 1,
                seed: 5,
                ..UctConfig::default()
            },
        )
        .unwrap();
        let best = searcher.search(&pos, &no_cancel()).unwrap();
        let geo = pos.geometry();
        let losing = MoveSpec::Move {
            from: geo.cell_at(2, 2).unwrap(),
            to: geo.cell_at(3, 3).unwrap(),
        };
        assert!(rules.legal_moves(&pos).contains(&best));
        assert_ne!(best, losing);
    }

    #[test]
    fn test_expired_budget_still_returns_a_legal_move() {
        let rules = rules_for(Variant::Hex);
        let mut pos = Position::new(Variant::Hex, 2, 0, 0);
        rules.setup(&mut pos);
        start_white(&mut pos, rules);

        // The deadline is already past when the first simulation starts.
        let searcher = UctSearcher::new(
            rules,
            UctConfig {
                budget: Some(Duration::from_millis(0)),
                ..UctConfig::default()
            },
        )
        .unwrap();
        let best = searcher.search(&pos, &no_cancel()).unwrap();
        assert!(rules.legal_moves(&pos).contains(&best));
    }

    #[test]
    fn test_search_respects_cancellation() {
        let rules = rules_for(Variant::Hex);
        let mut pos = Position::new(Variant::Hex, 2, 0, 0);
        rules.setup(&mut pos);
        start_white(&mut pos, rules);

        let cancel = AtomicBool::new(true);
        let searcher = UctSearcher::new(
            rules,
            UctConfig {
                rounds: 1_000_000,
                ..UctConfig::default()
            },
        )
        .unwrap();
        // Cancelled before any simulation runs; must still answer.
        let best = searcher.search(&pos, &cancel).unwrap();
        assert!(rules.legal_moves(&pos).contains(&best));
    }
}
