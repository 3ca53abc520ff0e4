use std::fmt;

use super::cell::CellContents;
use super::geometry::GeometryKind;
use super::position::Position;

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let geo = self.geometry();
        for row in (0..geo.rows).rev() {
            // Hex rows shear sideways so the rhombus reads correctly.
            if geo.kind == GeometryKind::Hex {
                for _ in 0..row {
                    write!(f, " ")?;
                }
            }
            write!(f, "{:>2} ", row + 1)?;
            for col in 0..geo.cols {
                let cell = geo.cell_at(col, row).expect("cell in range");
                let glyph = match self.contents(cell) {
                    CellContents::Absent => ' ',
                    CellContents::Empty => '.',
                    CellContents::Stack(_) => {
                        self.top(cell).map(|p| p.glyph()).unwrap_or('?')
                    }
                };
                write!(f, "{} ", glyph)?;
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for col in 0..geo.cols {
            write!(f, "{} ", (b'A' + col) as char)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:?}, {} to move, ply {}",
            self.state(),
            self.whose_turn(),
            self.ply()
        )
    }
}
