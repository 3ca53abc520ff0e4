use std::fmt;

use once_cell::sync::Lazy;

/// One of the two sides in a game. Player 0 is White, player 1 is Black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerColor {
    White,
    Black,
}

pub const ALL_COLORS: [PlayerColor; 2] = [PlayerColor::White, PlayerColor::Black];

impl PlayerColor {
    pub fn opposite(self) -> Self {
        match self {
            PlayerColor::White => PlayerColor::Black,
            PlayerColor::Black => PlayerColor::White,
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlayerColor::White => 0,
            PlayerColor::Black => 1,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => PlayerColor::White,
            1 => PlayerColor::Black,
            _ => panic!("player index out of range: {}", index),
        }
    }

    pub fn letter(self) -> char {
        match self {
            PlayerColor::White => 'W',
            PlayerColor::Black => 'B',
        }
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlayerColor::White => write!(f, "white"),
            PlayerColor::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    /// An uncrowned checkers piece.
    Man,
    /// A crowned checkers piece.
    King,
    /// A hex stone.
    Stone,
}

pub const ALL_KINDS: [PieceKind; 3] = [PieceKind::Man, PieceKind::King, PieceKind::Stone];

/// An immutable piece identity: the pair of owner and kind.
///
/// Every piece that can ever appear on a board is listed in the canonical
/// registry, and its registry index is the identity used by the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: PlayerColor,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: PlayerColor, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// Index into the canonical piece registry. Stable for the life of the
    /// process, and identical across processes, so digests are comparable
    /// between independently running games.
    pub fn registry_index(self) -> usize {
        self.color.index() * ALL_KINDS.len() + kind_index(self.kind)
    }

    pub fn glyph(self) -> char {
        match (self.color, self.kind) {
            (PlayerColor::White, PieceKind::Man) => 'w',
            (PlayerColor::White, PieceKind::King) => 'W',
            (PlayerColor::White, PieceKind::Stone) => 'o',
            (PlayerColor::Black, PieceKind::Man) => 'b',
            (PlayerColor::Black, PieceKind::King) => 'B',
            (PlayerColor::Black, PieceKind::Stone) => 'x',
        }
    }
}

fn kind_index(kind: PieceKind) -> usize {
    match kind {
        PieceKind::Man => 0,
        PieceKind::King => 1,
        PieceKind::Stone => 2,
    }
}

/// The process-wide canonical piece registry: built once, read-only
/// thereafter, indexed by `Piece::registry_index`.
pub static PIECE_REGISTRY: Lazy<Vec<Piece>> = Lazy::new(|| {
    let mut pieces = Vec::with_capacity(ALL_COLORS.len() * ALL_KINDS.len());
    for &color in &ALL_COLORS {
        for &kind in &ALL_KINDS {
            pieces.push(Piece::new(color, kind));
        }
    }
    for (i, piece) in pieces.iter().enumerate() {
        assert_eq!(piece.registry_index(), i, "registry index out of order");
    }
    pieces
});
