/// Grid generation: walls, treasures, then a reachability repair pass.
///
/// Walls use a decreasing-remainder draw per row: with `left` walls still
/// owed and `cols - c` columns to go, column `c` becomes a wall with
/// probability `left / (cols - c)`. Rows land exactly on their target count
/// (unless the protected origin block swallows draws), spread evenly.
///
/// Repair only ever removes walls, so a path that exists for one treasure
/// survives every later repair and a single pass is enough.

use rand::Rng;
use tracing::debug;

use crate::config::GridConfig;
use crate::domain::cell::CellContent;
use crate::domain::entity::Position;
use crate::domain::grid::Grid;
use crate::domain::reach::is_reachable;

pub const ORIGIN: Position = Position::new(0, 0);

/// Build a fresh grid. Never fails: if the board is too crowded the grid
/// simply ends up with fewer treasures than asked for.
pub fn generate<R: Rng + ?Sized>(cfg: &GridConfig, rng: &mut R) -> Grid {
    let mut grid = Grid::new(cfg.rows, cfg.cols);
    place_walls(&mut grid, cfg, rng);

    let mut placed = Vec::with_capacity(cfg.treasures);
    for _ in 0..cfg.treasures {
        match place_treasure(&mut grid, ORIGIN, rng) {
            Some(pos) => placed.push(pos),
            None => {
                debug!(wanted = cfg.treasures, got = placed.len(), "ran out of free cells for treasure");
                break;
            }
        }
    }

    repair_reachability(&mut grid, &placed, rng);

    debug!(
        walls = grid.wall_count(),
        treasures = grid.treasure_count(),
        "grid generated"
    );
    grid
}

/// Is `pos` inside the never-walled square at the origin?
pub fn in_safe_block(pos: Position, safe_block: usize) -> bool {
    pos.row < safe_block && pos.col < safe_block
}

pub(crate) fn place_walls<R: Rng + ?Sized>(grid: &mut Grid, cfg: &GridConfig, rng: &mut R) {
    let per_row = (cfg.cols as f64 * cfg.wall_density).floor() as usize;

    for row in 0..cfg.rows {
        let mut walls = 0usize;
        for col in 0..cfg.cols {
            let left = per_row.saturating_sub(walls);
            let prob = left as f64 / (cfg.cols - col) as f64;
            let pos = Position::new(row, col);
            if rng.random::<f64>() < prob && !in_safe_block(pos, cfg.safe_block) {
                grid.set_wall(pos);
                walls += 1;
            }
        }
    }
}

/// Put one treasure on a uniformly random empty cell other than `avoid`.
/// Returns where it went, or None if no cell qualifies.
pub fn place_treasure<R: Rng + ?Sized>(grid: &mut Grid, avoid: Position, rng: &mut R) -> Option<Position> {
    let eligible: Vec<Position> = grid
        .cells()
        .filter(|c| c.content == CellContent::Empty && c.pos() != avoid)
        .map(|c| c.pos())
        .collect();

    if eligible.is_empty() {
        return None;
    }

    let pos = eligible[rng.random_range(0..eligible.len())];
    grid.set_treasure(pos);
    Some(pos)
}

fn repair_reachability<R: Rng + ?Sized>(grid: &mut Grid, placed: &[Position], rng: &mut R) {
    for &treasure in placed {
        if is_reachable(grid, ORIGIN, treasure) {
            continue;
        }

        // Knock out walls in scan order until a path opens up.
        let walls: Vec<Position> = grid.cells().filter(|c| c.is_wall()).map(|c| c.pos()).collect();
        let mut removed = 0;
        for wall in walls {
            grid.clear_wall(wall);
            removed += 1;
            if is_reachable(grid, ORIGIN, treasure) {
                break;
            }
        }
        debug!(row = treasure.row, col = treasure.col, removed, "opened walls toward treasure");

        if !is_reachable(grid, ORIGIN, treasure) {
            grid.clear_treasure(treasure);
            let replacement = place_treasure(grid, ORIGIN, rng);
            debug!(row = treasure.row, col = treasure.col, ?replacement, "abandoned unreachable treasure");
        }
    }
}
