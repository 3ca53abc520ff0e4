//! Selfplay command - watch the computer play against itself.

use std::process;
use std::time::Duration;

use structopt::StructOpt;

use crate::board::{PlayerColor, Variant};
use crate::engine::{Engine, GameInit};

use super::util::{build_strategy, robot_turn, StrategyArg};
use super::Command;

#[derive(StructOpt)]
pub struct SelfplayArgs {
    #[structopt(short, long, default_value = "checkers")]
    pub variant: Variant,
    #[structopt(long = "white-strategy", default_value = "alpha-beta")]
    pub white_strategy: StrategyArg,
    #[structopt(long = "black-strategy", default_value = "alpha-beta")]
    pub black_strategy: StrategyArg,
    #[structopt(short, long, default_value = "5")]
    pub depth: u8,
    #[structopt(long, default_value = "10000")]
    pub rounds: u32,
    #[structopt(long, default_value = "0")]
    pub seed: u64,
    #[structopt(
        long = "delay",
        default_value = "0",
        help = "Delay between moves in milliseconds"
    )]
    pub delay_ms: u64,
    #[structopt(long = "max-plies", default_value = "400")]
    pub max_plies: u32,
}

impl Command for SelfplayArgs {
    fn execute(self) {
        let white = build_strategy(self.white_strategy, self.depth, self.rounds, self.seed);
        let black = build_strategy(
            self.black_strategy,
            self.depth,
            self.rounds,
            self.seed.wrapping_add(1),
        );

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
        if let Err(error) = engine.start(PlayerColor::White) {
            eprintln!("failed to start game: {}", error);
            process::exit(1);
        }

        while engine.game_over().is_none() && engine.position().ply() < self.max_plies {
            let strategy = match engine.position().whose_turn() {
                PlayerColor::White => &white,
                PlayerColor::Black => &black,
            };
            match robot_turn(&mut engine, strategy) {
                Ok(played) => {
                    println!(
                        "{} {}",
                        engine.position().whose_turn().opposite(),
                        played.join(", ")
                    );
                    println!("{}", engine.position());
                }
                Err(error) => {
                    eprintln!("search failed: {}", error);
                    process::exit(1);
                }
            }
            if self.delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.delay_ms));
            }
        }

        match engine.game_over() {
            Some(outcome) => println!("game over after {} plies: {:?}", engine.position().ply(), outcome),
            None => println!("stopped after {} plies", engine.position().ply()),
        }
    }
}
