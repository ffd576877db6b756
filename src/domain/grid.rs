/// GridModel: the R×C cell array, stored row-major (`row * cols + col`).
///
/// All mutations go through the `set_*` / `clear_*` methods. Each one keeps
/// the one-content-at-a-time invariant (setting a content replaces whatever
/// was there) and returns `true` only if the cell actually changed, so the
/// caller can forward a "cell changed" notification to the renderer.

use super::cell::{Cell, CellContent};
use super::entity::{Direction, Position};

#[derive(Clone, Debug)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

// ── Queries ──

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell::new(row, col));
            }
        }
        Grid { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Bounds-checked lookup.
    #[inline]
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&Cell> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    #[inline]
    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.cell_at(pos.row, pos.col)
    }

    /// Out-of-bounds counts as wall.
    pub fn is_wall(&self, pos: Position) -> bool {
        self.cell(pos).map_or(true, Cell::is_wall)
    }

    /// In-bounds neighbors in fixed order: up, down, left, right.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = &Cell> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| pos.step(d))
            .filter_map(move |p| self.cell(p))
    }

    /// Neighbors that are not walls, same order as `neighbors`.
    pub fn walkable_neighbors(&self, pos: Position) -> impl Iterator<Item = &Cell> + '_ {
        self.neighbors(pos).filter(|c| c.is_walkable())
    }

    /// All cells in scan order (row by row, column by column).
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    pub fn treasure_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_treasure()).count()
    }

    pub fn wall_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_wall()).count()
    }

    #[cfg(test)]
    pub fn treasure_positions(&self) -> Vec<Position> {
        self.cells.iter().filter(|c| c.is_treasure()).map(Cell::pos).collect()
    }
}

// ── Mutation API ──

impl Grid {
    fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        if self.in_bounds(pos) {
            let idx = pos.row * self.cols + pos.col;
            self.cells.get_mut(idx)
        } else {
            None
        }
    }

    fn set_content(&mut self, pos: Position, content: CellContent) -> bool {
        match self.cell_mut(pos) {
            Some(cell) if cell.content != content => {
                cell.content = content;
                true
            }
            _ => false,
        }
    }

    /// Reset `pos` to empty, but only if it currently holds `expected`.
    fn clear_content(&mut self, pos: Position, expected: CellContent) -> bool {
        match self.cell_mut(pos) {
            Some(cell) if cell.content == expected => {
                cell.content = CellContent::Empty;
                true
            }
            _ => false,
        }
    }

    pub fn set_wall(&mut self, pos: Position) -> bool {
        self.set_content(pos, CellContent::Wall)
    }

    pub fn clear_wall(&mut self, pos: Position) -> bool {
        self.clear_content(pos, CellContent::Wall)
    }

    pub fn set_treasure(&mut self, pos: Position) -> bool {
        self.set_content(pos, CellContent::Treasure)
    }

    pub fn clear_treasure(&mut self, pos: Position) -> bool {
        self.clear_content(pos, CellContent::Treasure)
    }

    pub fn set_cursed(&mut self, pos: Position) -> bool {
        self.set_content(pos, CellContent::Cursed)
    }

    #[allow(dead_code)]
    pub fn clear_cursed(&mut self, pos: Position) -> bool {
        self.clear_content(pos, CellContent::Cursed)
    }

    pub fn set_pending(&mut self, pos: Position, pending: bool) -> bool {
        match self.cell_mut(pos) {
            Some(cell) if cell.pending != pending => {
                cell.pending = pending;
                true
            }
            _ => false,
        }
    }
}

/// Build a grid from a diagram, one string per row.
/// Legend: '#'=wall  '$'=treasure  'x'=cursed  anything else=empty.
#[cfg(test)]
pub fn grid_from(rows: &[&str]) -> Grid {
    let height = rows.len();
    let width = rows[0].len();
    let mut grid = Grid::new(height, width);
    for (r, line) in rows.iter().enumerate() {
        for (c, ch) in line.chars().enumerate() {
            let pos = Position::new(r, c);
            match ch {
                '#' => { grid.set_wall(pos); }
                '$' => { grid.set_treasure(pos); }
                'x' => { grid.set_cursed(pos); }
                _ => {}
            }
        }
    }
    grid
}
