/// Enemy AI: greedy pursuit, one cell per tick.
///
/// Step along the axis with the larger absolute distance to the player.
/// Ties go to the column (row only wins when strictly larger).
/// Walls are ignored; the enemy drifts straight over them.

use super::entity::Position;

/// Next enemy position when chasing `player`.
/// Stays put when already on the player.
pub fn chase_step(enemy: Position, player: Position) -> Position {
    let d_row = player.row as i32 - enemy.row as i32;
    let d_col = player.col as i32 - enemy.col as i32;

    let (row, col) = if d_row.abs() > d_col.abs() {
        (enemy.row as i32 + d_row.signum(), enemy.col as i32)
    } else {
        (enemy.row as i32, enemy.col as i32 + d_col.signum())
    };

    // Moving toward an in-bounds target never leaves the grid.
    Position::new(row as usize, col as usize)
}
