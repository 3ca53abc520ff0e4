//! Shared plumbing for the commands: strategy selection and robot turns.

use std::str::FromStr;

use crate::alpha_beta_searcher::AlphaBetaConfig;
use crate::board::PlayerColor;
use crate::engine::{Engine, EngineError, SearchStrategy};
use crate::mcts_searcher::UctConfig;

#[derive(Debug, Clone, Copy)]
pub enum StrategyArg {
    AlphaBeta,
    Uct,
}

impl FromStr for StrategyArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alpha-beta" => Ok(StrategyArg::AlphaBeta),
            "uct" | "mcts" => Ok(StrategyArg::Uct),
            other => Err(format!(
                "unknown strategy {:?} (expected alpha-beta or uct)",
                other
            )),
        }
    }
}

pub fn build_strategy(arg: StrategyArg, depth: u8, rounds: u32, seed: u64) -> SearchStrategy {
    match arg {
        StrategyArg::AlphaBeta => SearchStrategy::AlphaBeta(AlphaBetaConfig {
            depth,
            seed,
            ..AlphaBetaConfig::default()
        }),
        StrategyArg::Uct => SearchStrategy::Uct(UctConfig {
            rounds,
            seed,
            ..UctConfig::default()
        }),
    }
}

pub fn parse_color(s: &str) -> Result<PlayerColor, String> {
    match s {
        "W" | "w" | "white" => Ok(PlayerColor::White),
        "B" | "b" | "black" => Ok(PlayerColor::Black),
        other => Err(format!("unknown color {:?} (expected W or B)", other)),
    }
}

/// Plays out one full robot turn: search, apply, commit, and keep going
/// while a capture chain holds the move. Returns the wire text of every
/// move played.
pub fn robot_turn(
    engine: &mut Engine,
    strategy: &SearchStrategy,
) -> Result<Vec<String>, EngineError> {
    let robot = engine.position().whose_turn();
    let mut played = Vec::new();
    while engine.game_over().is_none() && engine.position().whose_turn() == robot {
        let best = engine.spawn_search(strategy.clone()).wait()?;
        played.push(crate::game_move::serialize(
            &best,
            engine.position().geometry(),
        ));
        engine.apply_move(best)?;
        while engine.position().state().is_done_state() {
            engine.apply_move(crate::game_move::MoveSpec::Done)?;
            played.push("Done".to_string());
        }
    }
    Ok(played)
}
