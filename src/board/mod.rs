//! Board state: cells, pieces, geometry, the explicit-state machine and
//! the position digest.

use std::str::FromStr;

use thiserror::Error;

pub mod cell;
pub mod digest;
mod display;
pub mod error;
pub mod geometry;
pub mod piece;
pub mod position;
pub mod state;


pub use cell::{CellContents, CellId};
pub use error::IllegalMove;
pub use piece::{Piece, PieceKind, PlayerColor};
pub use position::{Picked, PickedSource, Position};
pub use state::{ExplicitState, MoveOp, Transition};

/// Identifies a rule set and its geometry. Part of the init quadruple
/// `(variant, players, seed, revision)` that pins down a reproducible game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Checkers,
    Hex,
}

pub const ALL_VARIANTS: [Variant; 2] = [Variant::Checkers, Variant::Hex];

impl Variant {
    pub fn name(self) -> &'static str {
        match self {
            Variant::Checkers => "checkers",
            Variant::Hex => "hex",
        }
    }
}

#[derive(Error, Debug)]
#[error("unknown variant: {name:?}")]
pub struct UnknownVariant {
    name: String,
}

impl FromStr for Variant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkers" => Ok(Variant::Checkers),
            "hex" => Ok(Variant::Hex),
            _ => Err(UnknownVariant {
                name: s.to_string(),
            }),
        }
    }
}
