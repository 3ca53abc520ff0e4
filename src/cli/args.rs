//! CLI argument parsing using StructOpt.

use structopt::StructOpt;

use crate::cli::commands::{
    count_positions::CountPositionsArgs, play::PlayArgs, selfplay::SelfplayArgs,
};

#[derive(StructOpt)]
#[structopt(name = "tabula", about = "A board game engine for checkers and hex")]
pub enum Tabula {
    #[structopt(
        name = "play",
        about = "Play a game against the computer. Enter moves in wire notation (`Move C 3 D 4`, `Dropb F 6`, `Done`, `Resign`); the robot answers using the selected `--strategy` (default: alpha-beta)."
    )]
    Play(PlayArgs),
    #[structopt(
        name = "selfplay",
        about = "Watch the computer play against itself. Each side uses its own `--white-strategy` / `--black-strategy` (default: alpha-beta for both)."
    )]
    Selfplay(SelfplayArgs),
    #[structopt(
        name = "count-positions",
        about = "Count the reachable positions of the move tree to a given `--depth`, and report how long the traversal took. Positions are verified to restore their digest on undo."
    )]
    CountPositions(CountPositionsArgs),
}

impl crate::cli::commands::Command for Tabula {
    fn execute(self) {
        macro_rules! execute_command {
            ($($variant:ident($cmd:ident)),+ $(,)?) => {
                match self {
                    $(Self::$variant($cmd) => $cmd.execute(),)+
                }
            };
        }

        execute_command! {
            Play(cmd),
            Selfplay(cmd),
            CountPositions(cmd),
        }
    }
}
