use structopt::StructOpt;
use tabula::cli::commands::Command;
use tabula::cli::Tabula;

fn main() {
    env_logger::init();
    Tabula::from_args().execute();
}
