//! The move wire format: whitespace-delimited tokens, an operation
//! keyword followed by positional parameters. This grammar is both the
//! network protocol between remote players and the persisted game-log
//! form, so `parse(serialize(m)) == m` must hold for every constructible
//! move.
//!
//! Examples: `Pickb C 3`, `Move C 3 E 5`, `Dropr B 0`, `Start W`, `Done`.

use std::str::SplitWhitespace;

use thiserror::Error;

use crate::board::geometry::Geometry;
use crate::board::{CellId, PlayerColor};

use super::MoveSpec;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("empty move string")]
    Empty,
    #[error("unknown move operation {op:?}")]
    UnknownOperation { op: String },
    #[error("missing {what} token")]
    MissingToken { what: &'static str },
    #[error("bad coordinate token {token:?}")]
    BadCoordinate { token: String },
    #[error("coordinate {name} is outside the board")]
    OutOfRange { name: String },
    #[error("bad player token {token:?} (expected W or B)")]
    BadPlayer { token: String },
    #[error("bad rack index token {token:?}")]
    BadIndex { token: String },
    #[error("unexpected trailing tokens {rest:?}")]
    TrailingTokens { rest: String },
}

pub fn parse(text: &str, geometry: &Geometry) -> Result<MoveSpec, NotationError> {
    let mut tokens = text.split_whitespace();
    let op = tokens.next().ok_or(NotationError::Empty)?;

    let spec = match op {
        "Pickb" => MoveSpec::PickBoard {
            cell: parse_cell(&mut tokens, geometry)?,
        },
        "Dropb" => MoveSpec::DropBoard {
            cell: parse_cell(&mut tokens, geometry)?,
        },
        "Move" => {
            let from = parse_cell(&mut tokens, geometry)?;
            let to = parse_cell(&mut tokens, geometry)?;
            MoveSpec::Move { from, to }
        }
        "Pickr" => {
            let player = parse_player(&mut tokens)?;
            let index = parse_index(&mut tokens)?;
            MoveSpec::PickRack { player, index }
        }
        "Dropr" => {
            let player = parse_player(&mut tokens)?;
            let index = parse_index(&mut tokens)?;
            MoveSpec::DropRack { player, index }
        }
        "Done" => MoveSpec::Done,
        "Pass" => MoveSpec::Pass,
        "Resign" => MoveSpec::Resign,
        "Edit" => MoveSpec::Edit,
        "Start" => MoveSpec::Start {
            player: parse_player(&mut tokens)?,
        },
        other => {
            return Err(NotationError::UnknownOperation {
                op: other.to_string(),
            })
        }
    };

    let rest: Vec<&str> = tokens.collect();
    if !rest.is_empty() {
        return Err(NotationError::TrailingTokens {
            rest: rest.join(" "),
        });
    }
    Ok(spec)
}

pub fn serialize(spec: &MoveSpec, geometry: &Geometry) -> String {
    match spec {
        MoveSpec::PickBoard { cell } => format!("Pickb {}", cell_tokens(*cell, geometry)),
        MoveSpec::DropBoard { cell } => format!("Dropb {}", cell_tokens(*cell, geometry)),
        MoveSpec::Move { from, to } => format!(
            "Move {} {}",
            cell_tokens(*from, geometry),
            cell_tokens(*to, geometry)
        ),
        MoveSpec::PickRack { player, index } => {
            format!("Pickr {} {}", player.letter(), index)
        }
        MoveSpec::DropRack { player, index } => {
            format!("Dropr {} {}", player.letter(), index)
        }
        MoveSpec::Done => "Done".to_string(),
        MoveSpec::Pass => "Pass".to_string(),
        MoveSpec::Resign => "Resign".to_string(),
        MoveSpec::Edit => "Edit".to_string(),
        MoveSpec::Start { player } => format!("Start {}", player.letter()),
    }
}

fn cell_tokens(cell: CellId, geometry: &Geometry) -> String {
    let (col, row) = geometry.col_row(cell);
    format!("{} {}", (b'A' + col) as char, row + 1)
}

fn parse_cell(
    tokens: &mut SplitWhitespace,
    geometry: &Geometry,
) -> Result<CellId, NotationError> {
    let col_token = tokens
        .next()
        .ok_or(NotationError::MissingToken { what: "column" })?;
    let row_token = tokens
        .next()
        .ok_or(NotationError::MissingToken { what: "row" })?;

    let col = match col_token.as_bytes() {
        [c @ b'A'..=b'Z'] => c - b'A',
        _ => {
            return Err(NotationError::BadCoordinate {
                token: col_token.to_string(),
            })
        }
    };
    let row: u8 = row_token.parse().map_err(|_| NotationError::BadCoordinate {
        token: row_token.to_string(),
    })?;
    if row == 0 {
        return Err(NotationError::BadCoordinate {
            token: row_token.to_string(),
        });
    }

    geometry
        .cell_at(col, row - 1)
        .ok_or_else(|| NotationError::OutOfRange {
            name: format!("{}{}", col_token, row_token),
        })
}

fn parse_player(tokens: &mut SplitWhitespace) -> Result<PlayerColor, NotationError> {
    let token = tokens
        .next()
        .ok_or(NotationError::MissingToken { what: "player" })?;
    match token {
        "W" => Ok(PlayerColor::White),
        "B" => Ok(PlayerColor::Black),
        _ => Err(NotationError::BadPlayer {
            token: token.to_string(),
        }),
    }
}

fn parse_index(tokens: &mut SplitWhitespace) -> Result<u8, NotationError> {
    let token = tokens
        .next()
        .ok_or(NotationError::MissingToken { what: "rack index" })?;
    token.parse().map_err(|_| NotationError::BadIndex {
        token: token.to_string(),
    })
}
