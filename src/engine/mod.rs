//! The game engine facade: one live game, its move history, repetition
//! tracking, and background search.
//!
//! The engine owns the authoritative position. Clients speak the wire
//! move grammar (or hand over parsed `MoveSpec`s); searches run on a
//! sandbox clone in a worker thread and report back over a channel, so
//! the live game is never shared with a searcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use log::info;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::alpha_beta_searcher::{AlphaBetaConfig, AlphaBetaSearcher};
use crate::board::{CellId, IllegalMove, PlayerColor, Position, Variant};
use crate::evaluate;
use crate::executor::Executor;
use crate::game_move::{notation, MoveSpec, NotationError};
use crate::mcts_searcher::{UctConfig, UctSearcher};
use crate::rules::{rules_for, GameRules, Outcome};

/// Occurrences of one digest that end the game as a draw.
const REPETITION_LIMIT: u32 = 3;

/// The reproducible identity of a game. Two engines initialized with the
/// same quadruple and fed the same move text produce identical digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameInit {
    pub variant: Variant,
    pub players: u8,
    pub seed: u64,
    pub revision: u32,
}

#[derive(Debug, Clone)]
pub enum SearchStrategy {
    AlphaBeta(AlphaBetaConfig),
    Uct(UctConfig),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unsupported player count {players}")]
    BadPlayerCount { players: u8 },
    #[error(transparent)]
    Illegal(#[from] IllegalMove),
    #[error(transparent)]
    Notation(#[from] NotationError),
    #[error("no moves available to search")]
    NoAvailableMoves,
    #[error("search worker terminated without a result")]
    SearchAborted,
    #[error("could not build the search thread pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

pub struct Engine {
    rules: &'static dyn GameRules,
    position: Position,
    history: Vec<MoveSpec>,
    digest_counts: FxHashMap<u64, u32>,
    repetition_draw: bool,
}

impl Engine {
    /// A fresh game in the `Puzzle` state with the initial placement on
    /// the board; call `start` (or apply a `Start` move) to begin play.
    pub fn new(init: GameInit) -> Result<Self, EngineError> {
        if init.players != 2 {
            return Err(EngineError::BadPlayerCount {
                players: init.players,
            });
        }
        let rules = rules_for(init.variant);
        let mut position = Position::new(init.variant, init.players, init.seed, init.revision);
        rules.setup(&mut position);
        Ok(Self {
            rules,
            position,
            history: Vec::new(),
            digest_counts: FxHashMap::default(),
            repetition_draw: false,
        })
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn history(&self) -> &[MoveSpec] {
        &self.history
    }

    pub fn digest(&self) -> u64 {
        self.position.digest()
    }

    pub fn start(&mut self, player: PlayerColor) -> Result<(), EngineError> {
        self.apply_move(MoveSpec::Start { player })
    }

    /// Applies one move from the wire grammar.
    pub fn apply_move_text(&mut self, text: &str) -> Result<(), EngineError> {
        let spec = notation::parse(text, self.position.geometry())?;
        self.apply_move(spec)
    }

    pub fn apply_move(&mut self, spec: MoveSpec) -> Result<(), EngineError> {
        if self.repetition_draw {
            return Err(EngineError::Illegal(IllegalMove::GameOver));
        }
        let mut executor = Executor::new(self.rules);
        executor.apply(&mut self.position, &spec)?;
        info!(
            "applied {}",
            notation::serialize(&spec, self.position.geometry())
        );

        // Committed positions feed repetition detection; the ply counter
        // is outside the digest, so a revisited position counts up.
        if matches!(spec, MoveSpec::Done | MoveSpec::Start { .. }) {
            let count = self.digest_counts.entry(self.position.digest()).or_insert(0);
            *count += 1;
            if *count >= REPETITION_LIMIT {
                info!("third occurrence of digest {:#018x}, game drawn", self.position.digest());
                self.repetition_draw = true;
            }
        }
        self.history.push(spec);
        Ok(())
    }

    /// Reverses the most recent move. A no-op on an empty history.
    pub fn undo_move(&mut self) {
        let spec = match self.history.pop() {
            Some(spec) => spec,
            None => return,
        };
        if matches!(spec, MoveSpec::Done | MoveSpec::Start { .. }) {
            if let Some(count) = self.digest_counts.get_mut(&self.position.digest()) {
                *count = count.saturating_sub(1);
            }
            self.repetition_draw = false;
        }
        let mut executor = Executor::new(self.rules);
        let undone = executor.undo(&mut self.position);
        debug_assert_eq!(undone, spec);
    }

    /// The final outcome, if the game has ended: by the rules of the
    /// game, by resignation, or by threefold repetition.
    pub fn game_over(&self) -> Option<Outcome> {
        if self.repetition_draw {
            return Some(Outcome::Draw);
        }
        evaluate::outcome_of(self.rules, &self.position)
    }

    pub fn legal_moves(&self) -> Vec<MoveSpec> {
        if self.repetition_draw {
            return Vec::new();
        }
        self.rules.legal_moves(&self.position)
    }

    pub fn is_legal_target(&self, cell: CellId) -> bool {
        !self.repetition_draw && self.rules.is_legal_target(&self.position, cell)
    }

    /// Launches a search on a sandbox clone of the current position and
    /// returns a handle to cancel it or collect the result.
    pub fn spawn_search(&self, strategy: SearchStrategy) -> SearchHandle {
        let variant = self.position.variant();
        let sandbox = self.position.checked_clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = cancel.clone();
        let (tx, rx) = mpsc::channel();

        let thread = thread::spawn(move || {
            let rules = rules_for(variant);
            let result = run_search(rules, sandbox, strategy, &worker_cancel);
            let _ = tx.send(result);
        });

        SearchHandle { rx, cancel, thread }
    }
}

fn run_search(
    rules: &'static dyn GameRules,
    mut sandbox: Position,
    strategy: SearchStrategy,
    cancel: &AtomicBool,
) -> Result<MoveSpec, EngineError> {
    match strategy {
        SearchStrategy::AlphaBeta(config) => {
            let mut searcher = AlphaBetaSearcher::new(rules, config);
            searcher
                .search(&mut sandbox, cancel)
                .map_err(|_| EngineError::NoAvailableMoves)
        }
        SearchStrategy::Uct(config) => {
            let searcher = UctSearcher::new(rules, config)?;
            searcher
                .search(&sandbox, cancel)
                .map_err(|_| EngineError::NoAvailableMoves)
        }
    }
}

/// A running background search.
pub struct SearchHandle {
    rx: mpsc::Receiver<Result<MoveSpec, EngineError>>,
    cancel: Arc<AtomicBool>,
    thread: thread::JoinHandle<()>,
}

impl SearchHandle {
    /// Asks the worker to stop; it will still deliver its best answer so
    /// far through `wait`.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Non-blocking poll for a finished result.
    pub fn try_best(&self) -> Option<Result<MoveSpec, EngineError>> {
        self.rx.try_recv().ok()
    }

    /// Blocks until the search delivers.
    pub fn wait(self) -> Result<MoveSpec, EngineError> {
        let result = self
            .rx
            .recv()
            .map_err(|_| EngineError::SearchAborted)?;
        let _ = self.thread.join();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ExplicitState;

    fn checkers_init() -> GameInit {
        GameInit {
            variant: Variant::Checkers,
            players: 2,
            seed: 100,
            revision: 0,
        }
    }

    #[test]
    fn test_rejects_unsupported_player_count() {
        let result = Engine::new(GameInit {
            players: 3,
            ..checkers_init()
        });
        assert!(matches!(
            result,
            Err(EngineError::BadPlayerCount { players: 3 })
        ));
    }

    #[test]
    fn test_identical_inits_replay_to_identical_digests() {
        let script = ["Start W", "Move C 3 D 4", "Done", "Move F 6 E 5", "Done"];
        let mut digests = Vec::new();
        for _ in 0..2 {
            let mut engine = Engine::new(checkers_init()).unwrap();
            for line in &script {
                engine.apply_move_text(line).unwrap();
            }
            digests.push(engine.digest());
        }
        assert_eq!(digests[0], digests[1]);
    }

    #[test]
    fn test_revision_changes_the_digest() {
        let a = Engine::new(checkers_init()).unwrap();
        let b = Engine::new(GameInit {
            revision: 1,
            ..checkers_init()
        })
        .unwrap();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_wire_errors_leave_the_game_untouched() {
        let mut engine = Engine::new(checkers_init()).unwrap();
        engine.start(PlayerColor::White).unwrap();
        let before = engine.digest();

        assert!(matches!(
            engine.apply_move_text("Levitate C 3"),
            Err(EngineError::Notation(_))
        ));
        assert!(matches!(
            engine.apply_move_text("Done"),
            Err(EngineError::Illegal(IllegalMove::WrongState { .. }))
        ));
        assert_eq!(engine.digest(), before);
        assert!(engine.history().len() == 1);
    }

    #[test]
    fn test_undo_restores_digest_and_history() {
        let mut engine = Engine::new(checkers_init()).unwrap();
        engine.start(PlayerColor::White).unwrap();
        let before = engine.digest();

        engine.apply_move_text("Move C 3 D 4").unwrap();
        engine.apply_move_text("Done").unwrap();
        engine.undo_move();
        engine.undo_move();

        assert_eq!(engine.digest(), before);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_threefold_repetition_draws_the_game() {
        // Two kings shuffle in opposite corners; every four plies the
        // position repeats.
        let mut engine = Engine::new(checkers_init()).unwrap();
        {
            // Rebuild the board through the puzzle state: clear it down
            // to one king each.
            let pos = crate::rules::position_from_ascii(
                Variant::Checkers,
                "
                - . - . - . - .
                . - . - . - B -
                - . - . - . - .
                . - . - . - . -
                - . - . - . - .
                . - . - . - . -
                - W - . - . - .
                . - . - . - . -
                ",
            );
            engine.position = pos;
            engine.digest_counts.clear();
        }
        engine.start(PlayerColor::White).unwrap();

        let cycle = ["Move B 2 A 1", "Done", "Move G 7 H 8", "Done",
                     "Move A 1 B 2", "Done", "Move H 8 G 7", "Done"];
        for line in &cycle {
            engine.apply_move_text(line).unwrap();
        }
        assert_eq!(engine.game_over(), None);
        for line in &cycle {
            engine.apply_move_text(line).unwrap();
        }

        assert_eq!(engine.game_over(), Some(Outcome::Draw));
        assert!(engine.legal_moves().is_empty());
        assert!(matches!(
            engine.apply_move_text("Move B 2 A 1"),
            Err(EngineError::Illegal(IllegalMove::GameOver))
        ));
    }

    #[test]
    fn test_resignation_ends_the_game() {
        let mut engine = Engine::new(checkers_init()).unwrap();
        engine.start(PlayerColor::White).unwrap();
        engine.apply_move_text("Resign").unwrap();
        assert_eq!(engine.position().state(), ExplicitState::Resigned);
        engine.apply_move_text("Done").unwrap();
        assert_eq!(
            engine.game_over(),
            Some(Outcome::Winner(PlayerColor::Black))
        );
    }

    #[test]
    fn test_background_search_returns_a_legal_move() {
        let mut engine = Engine::new(checkers_init()).unwrap();
        engine.start(PlayerColor::White).unwrap();

        let handle = engine.spawn_search(SearchStrategy::AlphaBeta(AlphaBetaConfig {
            depth: 2,
            ..AlphaBetaConfig::default()
        }));
        let best = handle.wait().unwrap();
        assert!(engine.legal_moves().contains(&best));
    }

    #[test]
    fn test_cancelled_background_search_still_answers() {
        let mut engine = Engine::new(checkers_init()).unwrap();
        engine.start(PlayerColor::White).unwrap();

        let handle = engine.spawn_search(SearchStrategy::Uct(UctConfig {
            rounds: 5_000_000,
            ..UctConfig::default()
        }));
        handle.cancel();
        let best = handle.wait().unwrap();
        assert!(engine.legal_moves().contains(&best));
    }
}
