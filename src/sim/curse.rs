/// Curse timers: treasures next to a passing player decay after a delay.
///
/// Each disturbed treasure gets its own timer, keyed by cell. The cell's
/// `pending` flag is the "timer in flight" marker, so a cell never has two
/// timers at once. Collecting a treasure cancels its timer outright.
/// Resolution is skipped (but still clears `pending`) when
/// the treasure is gone, the player stands on it, or the game is frozen.

use rand::Rng;

use crate::domain::entity::Position;
use crate::domain::grid::Grid;
use super::generate::place_treasure;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingCurse {
    pub pos: Position,
    pub due_ms: u64,
}

#[derive(Clone, Debug, Default)]
pub struct CurseTimers {
    /// Insertion order; equal due times fire first-come first-served.
    pending: Vec<PendingCurse>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurseOutcome {
    /// Nothing to do: treasure already gone, player on it, or frozen.
    Skipped,
    Cursed,
    /// Treasure vanished and reappeared at `to` (None: nowhere to go).
    Relocated { to: Option<Position> },
}

impl CurseTimers {
    pub fn new() -> Self {
        CurseTimers { pending: Vec::new() }
    }

    /// Arm a timer on every treasure neighbor of `center` that has none yet.
    /// Returns the cells that were armed, in neighbor order.
    pub fn disturb(&mut self, grid: &mut Grid, center: Position, now_ms: u64, delay_ms: u64) -> Vec<Position> {
        let targets: Vec<Position> = grid
            .neighbors(center)
            .filter(|c| c.is_treasure() && !c.pending)
            .map(|c| c.pos())
            .collect();

        for &pos in &targets {
            grid.set_pending(pos, true);
            self.pending.push(PendingCurse { pos, due_ms: now_ms + delay_ms });
        }
        targets
    }

    /// Drop the timer on `pos`, if any, and clear the cell's `pending` flag.
    pub fn cancel(&mut self, grid: &mut Grid, pos: Position) -> bool {
        grid.set_pending(pos, false);
        let before = self.pending.len();
        self.pending.retain(|p| p.pos != pos);
        self.pending.len() != before
    }

    /// Earliest due time among armed timers.
    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.due_ms).min()
    }

    /// Remove and return the earliest timer due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<PendingCurse> {
        let due = self.next_due().filter(|&t| t <= now_ms)?;
        let idx = self.pending.iter().position(|p| p.due_ms == due)?;
        Some(self.pending.remove(idx))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Settle the timer on `pos`.
pub fn resolve<R: Rng + ?Sized>(
    grid: &mut Grid,
    pos: Position,
    player: Position,
    frozen: bool,
    probability: f64,
    rng: &mut R,
) -> CurseOutcome {
    grid.set_pending(pos, false);

    let still_treasure = grid.cell(pos).map_or(false, |c| c.is_treasure());
    if frozen || !still_treasure || pos == player {
        return CurseOutcome::Skipped;
    }

    if rng.random::<f64>() < probability {
        grid.set_cursed(pos);
        CurseOutcome::Cursed
    } else {
        grid.clear_treasure(pos);
        let to = place_treasure(grid, player, rng);
        CurseOutcome::Relocated { to }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::domain::grid::grid_from;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[test]
    fn disturb_arms_each_treasure_neighbor_once() {
        let mut g = grid_from(&[
            ".$.",
            "$.$",
            ".x.",
        ]);
        let mut timers = CurseTimers::new();
        let center = Position::new(1, 1);
        let armed = timers.disturb(&mut g, center, 100, 800);
        assert_eq!(armed, vec![Position::new(0, 1), Position::new(1, 0), Position::new(1, 2)]);
        assert!(g.cell_at(0, 1).unwrap().pending);
        assert_eq!(timers.len(), 3);
        assert_eq!(timers.next_due(), Some(900));

        // Second pass over the same cells: already pending, nothing new.
        assert!(timers.disturb(&mut g, center, 200, 800).is_empty());
        assert_eq!(timers.len(), 3);
    }

    #[test]
    fn pop_due_respects_clock_and_order() {
        let mut g = grid_from(&[
            "$.$",
        ]);
        let mut timers = CurseTimers::new();
        timers.disturb(&mut g, Position::new(0, 1), 0, 800);
        assert_eq!(timers.pop_due(799), None);
        assert_eq!(timers.pop_due(800).map(|p| p.pos), Some(Position::new(0, 0)));
        assert_eq!(timers.pop_due(800).map(|p| p.pos), Some(Position::new(0, 2)));
        assert_eq!(timers.pop_due(10_000), None);
    }

    #[test]
    fn cancel_drops_only_that_cell() {
        let mut g = grid_from(&[
            "$.$",
        ]);
        let mut timers = CurseTimers::new();
        timers.disturb(&mut g, Position::new(0, 1), 0, 800);
        assert!(timers.cancel(&mut g, Position::new(0, 0)));
        assert!(!g.cell_at(0, 0).unwrap().pending);
        assert!(g.cell_at(0, 2).unwrap().pending);
        assert!(!timers.cancel(&mut g, Position::new(0, 0)));
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.pop_due(800).map(|p| p.pos), Some(Position::new(0, 2)));
    }

    #[test]
    fn certain_curse() {
        let mut g = grid_from(&["$.."]);
        let p = Position::new(0, 0);
        g.set_pending(p, true);
        let out = resolve(&mut g, p, Position::new(0, 1), false, 1.0, &mut rng());
        assert_eq!(out, CurseOutcome::Cursed);
        let c = g.cell(p).unwrap();
        assert!(c.is_cursed());
        assert!(!c.pending);
    }

    #[test]
    fn certain_relocation_avoids_player() {
        let mut g = grid_from(&["$.."]);
        let p = Position::new(0, 0);
        let player = Position::new(0, 1);
        let out = resolve(&mut g, p, player, false, 0.0, &mut rng());
        match out {
            CurseOutcome::Relocated { to: Some(to) } => assert_ne!(to, player),
            other => panic!("expected relocation, got {other:?}"),
        }
        assert_eq!(g.treasure_count(), 1);
        assert!(!g.cell(player).unwrap().is_treasure());
    }

    #[test]
    fn relocation_may_land_on_vacated_cell() {
        let mut g = grid_from(&["$x."]);
        let out = resolve(&mut g, Position::new(0, 0), Position::new(0, 2), false, 0.0, &mut rng());
        // Only the vacated cell is empty and not under the player.
        assert_eq!(out, CurseOutcome::Relocated { to: Some(Position::new(0, 0)) });
        assert!(g.cell_at(0, 0).unwrap().is_treasure());
    }

    #[test]
    fn player_on_cell_never_cursed() {
        let mut g = grid_from(&["$."]);
        let p = Position::new(0, 0);
        g.set_pending(p, true);
        let out = resolve(&mut g, p, p, false, 1.0, &mut rng());
        assert_eq!(out, CurseOutcome::Skipped);
        assert!(g.cell(p).unwrap().is_treasure());
        assert!(!g.cell(p).unwrap().pending);
    }

    #[test]
    fn collected_treasure_skipped() {
        let mut g = grid_from(&["..."]);
        let p = Position::new(0, 2);
        g.set_pending(p, true);
        let out = resolve(&mut g, p, Position::new(0, 0), false, 1.0, &mut rng());
        assert_eq!(out, CurseOutcome::Skipped);
        assert!(!g.cell(p).unwrap().is_cursed());
        assert!(!g.cell(p).unwrap().pending);
    }

    #[test]
    fn frozen_suppresses_effect() {
        let mut g = grid_from(&["..$"]);
        let p = Position::new(0, 2);
        g.set_pending(p, true);
        let out = resolve(&mut g, p, Position::new(0, 0), true, 1.0, &mut rng());
        assert_eq!(out, CurseOutcome::Skipped);
        assert!(g.cell(p).unwrap().is_treasure());
        assert!(!g.cell(p).unwrap().pending);
    }
}
