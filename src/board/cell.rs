use std::fmt;

use smallvec::SmallVec;

use super::piece::Piece;

/// Index of a cell within a position's flat cell vector. The geometry maps
/// (column, row) coordinates to and from these indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u16);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type PieceStack = SmallVec<[Piece; 2]>;

/// What a single board cell holds.
///
/// `Absent` marks coordinates inside the geometry's bounding grid that are
/// not part of the playing surface (the light squares of a checkers board).
/// Occupied cells hold a non-empty stack; the top of the stack is the piece
/// a player interacts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContents {
    Absent,
    Empty,
    Stack(PieceStack),
}

impl CellContents {
    pub fn is_absent(&self) -> bool {
        matches!(self, CellContents::Absent)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellContents::Empty)
    }

    pub fn top(&self) -> Option<Piece> {
        match self {
            CellContents::Stack(stack) => stack.last().copied(),
            _ => None,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            CellContents::Stack(stack) => stack.len(),
            _ => 0,
        }
    }

    /// Pushes a piece onto the cell. Pushing onto an absent cell is a
    /// programmer error: callers validate placement before mutating.
    pub fn push(&mut self, piece: Piece) {
        match self {
            CellContents::Absent => panic!("cannot place a piece on an absent cell"),
            CellContents::Empty => *self = CellContents::Stack(SmallVec::from_elem(piece, 1)),
            CellContents::Stack(stack) => stack.push(piece),
        }
    }

    /// Pops the top piece. Popping an empty or absent cell is a programmer
    /// error for the same reason.
    pub fn pop(&mut self) -> Piece {
        match self {
            CellContents::Stack(stack) => {
                let piece = stack.pop().expect("stack cells are never empty");
                if stack.is_empty() {
                    *self = CellContents::Empty;
                }
                piece
            }
            _ => panic!("cannot pick a piece from an empty cell"),
        }
    }

    /// A small integer encoding of the contents, folded into the digest
    /// draw for this cell. Zero for empty and absent cells, which never
    /// change identity, so the distinction costs nothing.
    pub fn digest_code(&self) -> u64 {
        match self {
            CellContents::Stack(stack) => stack
                .iter()
                .fold(0u64, |acc, p| acc * 31 + p.registry_index() as u64 + 1),
            _ => 0,
        }
    }
}
