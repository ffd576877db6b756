/// Events emitted by the controller.
/// The presentation layer consumes these for redraw, HUD, sound and the
/// end screen.

use crate::domain::entity::Position;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LossCause {
    SteppedOnCurse,
    Captured,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    CellChanged { pos: Position },
    PlayerMoved { pos: Position },
    EnemyMoved { pos: Position },
    CountersChanged { moves: u32, treasures: u32 },
    TreasureCollected { pos: Position },
    TreasureCursed { pos: Position },
    /// `to` is None when no free cell was left for the replacement.
    TreasureRelocated { from: Position, to: Option<Position> },
    Won,
    Lost { cause: LossCause },
}
