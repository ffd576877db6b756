/// Entities: positions, move directions and the pursuing enemy.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Step one cell in `dir`. Returns None when that would leave the
    /// non-negative quadrant; the upper bounds are the grid's business.
    pub fn step(self, dir: Direction) -> Option<Position> {
        let (dr, dc) = dir.delta();
        let row = self.row as i32 + dr;
        let col = self.col as i32 + dc;
        if row < 0 || col < 0 {
            return None;
        }
        Some(Position::new(row as usize, col as usize))
    }
}

/// Movement direction. Declaration order is the fixed neighbor order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// (row delta, col delta)
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub pos: Position,
    /// Virtual-clock time of the next tick; None once the loop has stopped.
    pub next_tick_ms: Option<u64>,
}

impl Enemy {
    pub fn new(pos: Position) -> Self {
        Enemy { pos, next_tick_ms: Some(0) }
    }

    /// Stop the tick loop for good.
    pub fn halt(&mut self) {
        self.next_tick_ms = None;
    }
}
