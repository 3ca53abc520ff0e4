pub mod alpha_beta_searcher;
pub mod board;
pub mod cli;
pub mod engine;
pub mod evaluate;
pub mod executor;
pub mod game_move;
pub mod mcts_searcher;
pub mod rules;
