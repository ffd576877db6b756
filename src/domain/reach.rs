/// Reachability: plain BFS over non-wall cells, 4-directional.
///
/// Every step costs the same, so BFS finds the target if any path exists.
/// Only the yes/no answer is needed; the path itself is never built.

use std::collections::VecDeque;

use super::entity::Position;
use super::grid::Grid;

/// Is `target` connected to `origin` through walkable cells?
/// Walls are impassable, including as origin or target.
pub fn is_reachable(grid: &Grid, origin: Position, target: Position) -> bool {
    if grid.is_wall(origin) || grid.is_wall(target) {
        return false;
    }

    let cols = grid.cols();
    let mut visited = vec![false; grid.rows() * cols];
    let mut queue: VecDeque<Position> = VecDeque::with_capacity(64);
    visited[origin.row * cols + origin.col] = true;
    queue.push_back(origin);

    while let Some(cur) = queue.pop_front() {
        if cur == target {
            return true;
        }
        for next in grid.walkable_neighbors(cur) {
            let idx = next.row * cols + next.col;
            if !visited[idx] {
                visited[idx] = true;
                queue.push_back(next.pos());
            }
        }
    }

    false
}
