//! Count positions command - walk the robot-move tree to a given depth.

use std::process;
use std::time::Instant;

use structopt::StructOpt;

use crate::board::{PlayerColor, Position, Variant};
use crate::executor::Executor;
use crate::game_move::MoveSpec;
use crate::rules::{rules_for, GameRules};

use super::Command;

#[derive(StructOpt)]
pub struct CountPositionsArgs {
    #[structopt(short, long, default_value = "checkers")]
    pub variant: Variant,
    #[structopt(short, long, default_value = "6")]
    pub depth: u8,
}

impl Command for CountPositionsArgs {
    fn execute(self) {
        let rules = rules_for(self.variant);
        let mut pos = Position::new(self.variant, 2, 0, 0);
        rules.setup(&mut pos);
        let mut executor = Executor::new(rules);
        if let Err(error) = executor.apply(
            &mut pos,
            &MoveSpec::Start {
                player: PlayerColor::White,
            },
        ) {
            eprintln!("failed to start game: {}", error);
            process::exit(1);
        }

        let started_at = Instant::now();
        let total = count(rules, &mut executor, &mut pos, self.depth);
        let elapsed = started_at.elapsed();
        println!(
            "{} positions at depth {} in {:?} ({:.0} positions/sec)",
            total,
            self.depth,
            elapsed,
            total as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        );
    }
}

fn count(rules: &dyn GameRules, executor: &mut Executor, pos: &mut Position, depth: u8) -> u64 {
    if depth == 0 || pos.state().is_game_over() {
        return 1;
    }
    let mut total = 0;
    for spec in rules.legal_moves(pos) {
        let before = pos.digest();
        executor
            .robot_apply(pos, &spec)
            .unwrap_or_else(|error| panic!("legal move {:?} rejected: {}", spec, error));
        total += count(rules, executor, pos, depth - 1);
        executor.robot_undo(pos);
        assert_eq!(pos.digest(), before, "undo did not restore {:?}", spec);
    }
    total
}
