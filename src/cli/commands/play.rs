//! Play command - play a game against the computer.

use std::io;
use std::process;

use structopt::StructOpt;

use crate::board::Variant;
use crate::engine::{Engine, GameInit};

use super::util::{build_strategy, parse_color, robot_turn, StrategyArg};
use super::Command;

#[derive(StructOpt)]
pub struct PlayArgs {
    #[structopt(short, long, default_value = "checkers")]
    pub variant: Variant,
    #[structopt(short = "c", long = "color", default_value = "W", parse(try_from_str = parse_color))]
    pub color: crate::board::PlayerColor,
    #[structopt(short, long, default_value = "alpha-beta")]
    pub strategy: StrategyArg,
    #[structopt(short, long, default_value = "5")]
    pub depth: u8,
    #[structopt(long, default_value = "10000")]
    pub rounds: u32,
    #[structopt(long, default_value = "0")]
    pub seed: u64,
}

impl Command for PlayArgs {
    fn execute(self) {
        let strategy = build_strategy(self.strategy, self.depth, self.rounds, self.seed);
        let mut engine = match Engine::new(GameInit {
            variant: self.variant,
            players: 2,
            seed: self.seed,
            revision: 0,
        }) {
            Ok(engine) => engine,
            Err(error) => {
                eprintln!("failed to initialize game: {}", error);
                process::exit(1);
            }
        };
        if let Err(error) = engine.start(crate::board::PlayerColor::White) {
            eprintln!("failed to start game: {}", error);
            process::exit(1);
        }

        println!("{}", engine.position());
        println!("You are {}. Enter moves like `Move C 3 D 4` then `Done`, or `quit`.", self.color);

        loop {
            if let Some(outcome) = engine.game_over() {
                println!("game over: {:?}", outcome);
                return;
            }

            if engine.position().whose_turn() == self.color {
                let mut input = String::new();
                match io::stdin().read_line(&mut input) {
                    Ok(0) => return,
                    Ok(_) => {}
                    Err(error) => {
                        println!("error: {}", error);
                        continue;
                    }
                }
                let line = input.trim();
                if line == "quit" {
                    return;
                }
                match engine.apply_move_text(line) {
                    Ok(()) => println!("{}", engine.position()),
                    Err(error) => println!("rejected: {}", error),
                }
            } else {
                match robot_turn(&mut engine, &strategy) {
                    Ok(played) => {
                        println!("computer plays {}", played.join(", "));
                        println!("{}", engine.position());
                    }
                    Err(error) => {
                        eprintln!("search failed: {}", error);
                        process::exit(1);
                    }
                }
            }
        }
    }
}
