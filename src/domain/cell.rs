/// Cell contents and per-cell flags.
/// Wall, treasure and cursed are mutually exclusive and share one enum.
/// `pending` marks a treasure with a curse timer in flight.

use super::entity::Position;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CellContent {
    #[default]
    Empty,
    Wall,
    Treasure,
    Cursed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub content: CellContent,
    pub pending: bool,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Cell { row, col, content: CellContent::Empty, pending: false }
    }

    pub fn pos(&self) -> Position {
        Position::new(self.row, self.col)
    }

    pub fn is_wall(&self) -> bool {
        self.content == CellContent::Wall
    }

    pub fn is_treasure(&self) -> bool {
        self.content == CellContent::Treasure
    }

    pub fn is_cursed(&self) -> bool {
        self.content == CellContent::Cursed
    }

    /// Can the player stand here? Everything but walls.
    pub fn is_walkable(&self) -> bool {
        !self.is_wall()
    }
}
