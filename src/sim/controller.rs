/// GameController: owns the grid and game state, applies player moves and
/// runs the two timer-driven activities (enemy ticks, curse timers) off a
/// virtual millisecond clock.
///
/// Everything is single-threaded. The frame loop feeds moves through
/// `attempt_move` and wall-clock progress through `advance`; both return
/// the events the presentation layer should react to.
///
/// Guards that keep the timers and the player from trampling each other:
///   1. `frozen` is checked at the start of every move and timer callback.
///   2. A cell's `pending` flag allows one curse timer per cell.
///   3. A curse never lands on the cell the player is standing on.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::{GameConfig, RulesConfig, TimingConfig, WinPolicy};
use crate::domain::ai;
use crate::domain::entity::{Direction, Position};
use crate::domain::grid::Grid;
use super::curse::{self, CurseOutcome, CurseTimers};
use super::event::{GameEvent, LossCause};
use super::generate::{self, ORIGIN};
use super::world::{GameState, Outcome};

pub struct GameController {
    grid: Grid,
    state: GameState,
    curses: CurseTimers,
    rules: RulesConfig,
    timing: TimingConfig,
    now_ms: u64,
    rng: StdRng,
}

// ══════════════════════════════════════════════════════════════
// Construction
// ══════════════════════════════════════════════════════════════

impl GameController {
    /// Generate a fresh board and start a new game.
    pub fn new(cfg: &GameConfig) -> Self {
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let grid = generate::generate(&cfg.grid, &mut rng);
        GameController::from_parts(grid, cfg, rng)
    }

    /// Start a game on an existing board. Player at the origin, enemy in
    /// the opposite corner.
    pub fn from_parts(grid: Grid, cfg: &GameConfig, rng: StdRng) -> Self {
        let enemy = Position::new(grid.rows() - 1, grid.cols() - 1);
        let goal = grid.treasure_count() as u32;
        info!(
            rows = grid.rows(),
            cols = grid.cols(),
            treasures = goal,
            walls = grid.wall_count(),
            policy = ?cfg.rules.win_policy,
            "new game"
        );
        let mut game = GameController {
            grid,
            state: GameState::new(ORIGIN, enemy, goal),
            curses: CurseTimers::new(),
            rules: cfg.rules.clone(),
            timing: cfg.timing.clone(),
            now_ms: 0,
            rng,
        };
        // A board with nothing to find is already cleared.
        if goal == 0 {
            game.check_win(&mut Vec::new());
        }
        game
    }
}

// ══════════════════════════════════════════════════════════════
// Read-only views
// ══════════════════════════════════════════════════════════════

impl GameController {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    #[cfg(test)]
    pub fn pending_curses(&self) -> usize {
        self.curses.len()
    }
}

// ══════════════════════════════════════════════════════════════
// Player input
// ══════════════════════════════════════════════════════════════

impl GameController {
    /// Try to step the player one cell. Walls and the grid edge silently
    /// reject the move.
    pub fn attempt_move(&mut self, dir: Direction) -> Vec<GameEvent> {
        if self.state.is_frozen() { return vec![]; }

        let target = match self.state.player.step(dir) {
            Some(p) => p,
            None => return vec![],
        };
        let landed = match self.grid.cell(target) {
            Some(c) if !c.is_wall() => *c,
            _ => return vec![],
        };

        let mut events = Vec::new();
        self.state.player = target;
        self.state.moves_taken += 1;
        events.push(GameEvent::PlayerMoved { pos: target });

        if landed.is_cursed() {
            self.lose(LossCause::SteppedOnCurse, &mut events);
        } else if landed.is_treasure() {
            self.collect(target, &mut events);
        }

        self.disturb_neighbors(&mut events);

        events.push(self.counters());
        events
    }

    fn collect(&mut self, pos: Position, events: &mut Vec<GameEvent>) {
        self.grid.clear_treasure(pos);
        // The timer belonged to this treasure; a later one placed here starts clean.
        self.curses.cancel(&mut self.grid, pos);
        self.state.treasures_collected += 1;
        events.push(GameEvent::CellChanged { pos });
        events.push(GameEvent::TreasureCollected { pos });
        debug!(row = pos.row, col = pos.col, collected = self.state.treasures_collected, "treasure collected");
        self.check_win(events);
    }

    fn disturb_neighbors(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.is_frozen() { return; }
        let armed = self.curses.disturb(
            &mut self.grid,
            self.state.player,
            self.now_ms,
            self.timing.curse_delay_ms,
        );
        for pos in armed {
            events.push(GameEvent::CellChanged { pos });
        }
    }

    fn counters(&self) -> GameEvent {
        GameEvent::CountersChanged {
            moves: self.state.moves_taken,
            treasures: self.state.treasures_collected,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Clock: enemy ticks and curse timers
// ══════════════════════════════════════════════════════════════

impl GameController {
    /// Move the clock forward by `dt_ms`, firing every timer that comes
    /// due in order. Ties: curse timers before the enemy.
    pub fn advance(&mut self, dt_ms: u64) -> Vec<GameEvent> {
        let target = self.now_ms + dt_ms;
        let mut events = Vec::new();

        loop {
            let curse_due = self.curses.next_due().filter(|&t| t <= target);
            let enemy_due = self.state.enemy.next_tick_ms.filter(|&t| t <= target);

            match (curse_due, enemy_due) {
                (Some(c), Some(e)) if c <= e => self.fire_curse(c, &mut events),
                (Some(c), None) => self.fire_curse(c, &mut events),
                (_, Some(e)) => self.fire_enemy(e, &mut events),
                (None, None) => break,
            }
        }

        self.now_ms = target;
        events
    }

    fn fire_enemy(&mut self, at_ms: u64, events: &mut Vec<GameEvent>) {
        self.now_ms = at_ms;
        if self.state.is_frozen() {
            self.state.enemy.halt();
            return;
        }

        let next = ai::chase_step(self.state.enemy.pos, self.state.player);
        self.state.enemy.pos = next;
        events.push(GameEvent::EnemyMoved { pos: next });

        if next == self.state.player {
            self.lose(LossCause::Captured, events);
        } else {
            self.state.enemy.next_tick_ms = Some(at_ms + self.timing.enemy_tick_ms.max(1));
        }
    }

    fn fire_curse(&mut self, at_ms: u64, events: &mut Vec<GameEvent>) {
        self.now_ms = at_ms;
        let timer = match self.curses.pop_due(at_ms) {
            Some(t) => t,
            None => return,
        };

        let outcome = curse::resolve(
            &mut self.grid,
            timer.pos,
            self.state.player,
            self.state.is_frozen(),
            self.rules.curse_probability,
            &mut self.rng,
        );
        events.push(GameEvent::CellChanged { pos: timer.pos });
        debug!(row = timer.pos.row, col = timer.pos.col, ?outcome, "curse timer resolved");

        match outcome {
            CurseOutcome::Skipped => {}
            CurseOutcome::Cursed => {
                self.state.cursed_count += 1;
                events.push(GameEvent::TreasureCursed { pos: timer.pos });
                self.check_win(events);
            }
            CurseOutcome::Relocated { to } => {
                if let Some(to) = to {
                    events.push(GameEvent::CellChanged { pos: to });
                } else {
                    self.state.treasure_goal = self.state.treasure_goal.saturating_sub(1);
                }
                events.push(GameEvent::TreasureRelocated { from: timer.pos, to });
                self.check_win(events);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Win / lose
// ══════════════════════════════════════════════════════════════

impl GameController {
    fn win_reached(&self) -> bool {
        let s = &self.state;
        match self.rules.win_policy {
            WinPolicy::AllCollected => s.treasures_collected >= s.treasure_goal,
            WinPolicy::AllResolved => {
                s.treasures_collected + s.cursed_count >= s.treasure_goal
                    && self.grid.treasure_count() == 0
            }
        }
    }

    fn check_win(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.is_frozen() || !self.win_reached() { return; }
        self.freeze();
        self.state.outcome = Outcome::Won;
        info!(
            moves = self.state.moves_taken,
            collected = self.state.treasures_collected,
            cursed = self.state.cursed_count,
            "game won"
        );
        events.push(GameEvent::Won);
    }

    fn lose(&mut self, cause: LossCause, events: &mut Vec<GameEvent>) {
        if self.state.is_frozen() { return; }
        self.freeze();
        self.state.outcome = Outcome::Lost(cause);
        info!(?cause, moves = self.state.moves_taken, "game lost");
        events.push(GameEvent::Lost { cause });
    }

    /// Enter the terminal state. Idempotent; stops the enemy loop.
    fn freeze(&mut self) {
        self.state.freeze();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::grid_from;

    fn cfg(policy: WinPolicy, curse_probability: f64) -> GameConfig {
        let mut c = GameConfig::default();
        c.rules.win_policy = policy;
        c.rules.curse_probability = curse_probability;
        c
    }

    fn game(rows: &[&str], policy: WinPolicy, curse_probability: f64) -> GameController {
        GameController::from_parts(grid_from(rows), &cfg(policy, curse_probability), StdRng::seed_from_u64(5))
    }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    const OPEN_8X12: [&str; 8] = [
        ".....$......",
        "............",
        "............",
        "............",
        "............",
        "............",
        "............",
        "............",
    ];

    #[test]
    fn single_treasure_walk_wins() {
        for policy in [WinPolicy::AllCollected, WinPolicy::AllResolved] {
            let mut g = game(&OPEN_8X12, policy, 1.0);
            let mut events = Vec::new();
            for _ in 0..5 {
                events.extend(g.attempt_move(Direction::Right));
            }
            let s = g.state();
            assert_eq!(s.moves_taken, 5);
            assert_eq!(s.treasures_collected, 1);
            assert_eq!(s.outcome, Outcome::Won);
            assert!(s.is_frozen());
            assert_eq!(count(&events, |e| *e == GameEvent::Won), 1);
            assert_eq!(count(&events, |e| matches!(e, GameEvent::Lost { .. })), 0);
        }
    }

    #[test]
    fn collecting_several_wins_once() {
        let mut g = game(&[
            ".$$",
            "$..",
        ], WinPolicy::AllCollected, 1.0);
        g.state.enemy.halt();
        let mut events = Vec::new();
        for dir in [Direction::Right, Direction::Right, Direction::Down, Direction::Left, Direction::Left] {
            events.extend(g.attempt_move(dir));
        }
        assert_eq!(g.state().treasures_collected, 3);
        assert_eq!(g.state().outcome, Outcome::Won);
        assert_eq!(count(&events, |e| *e == GameEvent::Won), 1);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Lost { .. })), 0);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::TreasureCollected { .. })), 3);
        assert!(g.attempt_move(Direction::Up).is_empty());
    }

    #[test]
    fn wall_and_edge_moves_rejected() {
        let mut g = game(&[
            ".#",
            "..",
        ], WinPolicy::AllResolved, 0.8);
        assert!(g.attempt_move(Direction::Up).is_empty());
        assert!(g.attempt_move(Direction::Left).is_empty());
        assert!(g.attempt_move(Direction::Right).is_empty());
        assert_eq!(g.state().player, ORIGIN);
        assert_eq!(g.state().moves_taken, 0);

        g.attempt_move(Direction::Down);
        assert!(g.attempt_move(Direction::Down).is_empty());
        assert_eq!(g.state().player, Position::new(1, 0));
        assert_eq!(g.state().moves_taken, 1);
    }

    #[test]
    fn move_reports_counters() {
        let mut g = game(&["..$."], WinPolicy::AllResolved, 0.8);
        let events = g.attempt_move(Direction::Right);
        assert_eq!(events.first(), Some(&GameEvent::PlayerMoved { pos: Position::new(0, 1) }));
        assert_eq!(events.last(), Some(&GameEvent::CountersChanged { moves: 1, treasures: 0 }));
    }

    #[test]
    fn cursed_cell_loses_even_when_win_would_hold() {
        // Goal is 0 here, so any collection check would already be satisfied.
        let mut g = game(&[".x.."], WinPolicy::AllCollected, 0.8);
        let events = g.attempt_move(Direction::Right);
        assert_eq!(g.state().outcome, Outcome::Lost(LossCause::SteppedOnCurse));
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Lost { .. })), 1);
        assert_eq!(count(&events, |e| *e == GameEvent::Won), 0);
    }

    #[test]
    fn frozen_ignores_moves_and_ticks() {
        let mut g = game(&[".x.."], WinPolicy::AllResolved, 0.8);
        g.attempt_move(Direction::Right);
        assert!(g.state().is_frozen());
        assert!(g.attempt_move(Direction::Right).is_empty());
        assert!(g.advance(10_000).is_empty());
        assert_eq!(g.state().moves_taken, 1);
    }

    #[test]
    fn enemy_first_tick_at_zero_then_cadence() {
        let mut g = game(&OPEN_8X12, WinPolicy::AllResolved, 0.8);
        let events = g.advance(0);
        assert_eq!(events, vec![GameEvent::EnemyMoved { pos: Position::new(7, 10) }]);
        assert!(g.advance(349).is_empty());
        assert_eq!(g.advance(1), vec![GameEvent::EnemyMoved { pos: Position::new(7, 9) }]);
        // Two ticks fit in one long advance.
        let events = g.advance(700);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::EnemyMoved { .. })), 2);
    }

    #[test]
    fn enemy_capture_loses_and_halts() {
        let mut g = game(&[
            "...",
            "...",
        ], WinPolicy::AllResolved, 0.8);
        // Enemy starts at (1,2); player at (0,0). Three steps to reach.
        let events = g.advance(10_000);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::EnemyMoved { .. })), 3);
        assert_eq!(g.state().enemy.pos, ORIGIN);
        assert_eq!(g.state().outcome, Outcome::Lost(LossCause::Captured));
        assert_eq!(g.state().enemy.next_tick_ms, None);
        assert!(g.advance(10_000).is_empty());
    }

    #[test]
    fn enemy_walks_through_walls() {
        let mut g = game(&[
            "..#",
            "..#",
        ], WinPolicy::AllResolved, 0.8);
        g.advance(0);
        // (1,2) → (1,1): column move, ignoring the walls it starts on.
        assert_eq!(g.state().enemy.pos, Position::new(1, 1));
    }

    #[test]
    fn passing_treasure_gets_cursed() {
        let mut g = game(&[
            "....",
            "..$.",
            "....",
            "....",
        ], WinPolicy::AllResolved, 1.0);
        g.state.enemy.halt();
        g.attempt_move(Direction::Right); // (0,1): not adjacent to (1,2)
        assert_eq!(g.pending_curses(), 0);
        g.attempt_move(Direction::Right); // (0,2): (1,2) is below
        assert_eq!(g.pending_curses(), 1);
        assert!(g.grid().cell_at(1, 2).unwrap().pending);

        assert!(g.advance(799).is_empty());
        let events = g.advance(1);
        assert!(events.contains(&GameEvent::TreasureCursed { pos: Position::new(1, 2) }));
        let c = g.grid().cell_at(1, 2).unwrap();
        assert!(c.is_cursed() && !c.pending);
        assert_eq!(g.state().cursed_count, 1);
        // Every treasure is accounted for: the resolved policy calls it a win.
        assert_eq!(g.state().outcome, Outcome::Won);
    }

    #[test]
    fn collecting_before_timer_beats_curse() {
        let mut g = game(&[
            "..$$",
            "....",
        ], WinPolicy::AllResolved, 1.0);
        g.state.enemy.halt();
        g.attempt_move(Direction::Right); // (0,1): arms (0,2)
        g.advance(100);
        g.attempt_move(Direction::Right); // collect (0,2), arms (0,3)
        assert_eq!(g.state().treasures_collected, 1);
        g.advance(700); // first timer: treasure already gone, skipped
        assert!(!g.grid().cell_at(0, 2).unwrap().is_cursed());
        assert!(!g.grid().cell_at(0, 2).unwrap().pending);

        g.attempt_move(Direction::Right); // collect (0,3) before its timer
        assert_eq!(g.state().outcome, Outcome::Won);
        assert_eq!(g.state().treasures_collected, 2);
        g.advance(1_000);
        assert!(!g.grid().cell_at(0, 3).unwrap().is_cursed());
    }

    #[test]
    fn collecting_cancels_its_timer() {
        let mut g = game(&[
            "..$",
            ".$#",
        ], WinPolicy::AllResolved, 0.0);
        g.state.enemy.halt();
        g.attempt_move(Direction::Right); // (0,1): arms (1,1) and (0,2)
        assert_eq!(g.pending_curses(), 2);
        g.attempt_move(Direction::Right); // collect (0,2)
        assert_eq!(g.pending_curses(), 1);
        assert!(!g.grid().cell_at(0, 2).unwrap().pending);
    }

    #[test]
    fn relocated_treasure_not_hit_by_stale_timer() {
        let cfg = cfg(WinPolicy::AllResolved, 0.0);
        for seed in 0..64 {
            let mut g = GameController::from_parts(
                grid_from(&[
                    "..$",
                    ".$#",
                ]),
                &cfg,
                StdRng::seed_from_u64(seed),
            );
            g.state.enemy.halt();
            g.attempt_move(Direction::Down); // (1,0): arms (1,1), due 800
            g.advance(100);
            g.attempt_move(Direction::Up); // (0,0)
            g.attempt_move(Direction::Right); // (0,1): arms (0,2), due 900
            g.attempt_move(Direction::Right); // collect (0,2)
            g.attempt_move(Direction::Left); // (0,1)

            g.advance(700); // (1,1) relocates, possibly onto (0,2)
            assert_eq!(g.pending_curses(), 0, "seed {seed}");
            let events = g.advance(100);
            assert!(
                !events.iter().any(|e| matches!(e, GameEvent::TreasureRelocated { .. })),
                "seed {seed}: treasure resolved without being disturbed"
            );
            assert_eq!(g.grid().treasure_count(), 1, "seed {seed}");
        }
    }

    #[test]
    fn empty_board_counts_as_cleared() {
        let mut c = GameConfig::default();
        c.grid.wall_density = 1.0;
        c.grid.safe_block = 1;
        c.seed = Some(3);
        let mut g = GameController::new(&c);
        assert_eq!(g.grid().treasure_count(), 0);
        assert_eq!(g.state().treasure_goal, 0);
        assert_eq!(g.state().outcome, Outcome::Won);
        assert!(g.state().is_frozen());
        assert!(g.advance(60_000).is_empty());
    }

    #[test]
    fn relocation_keeps_treasure_count() {
        let mut g = game(&[
            ".$..",
            "....",
        ], WinPolicy::AllCollected, 0.0);
        g.state.enemy.halt();
        g.attempt_move(Direction::Down); // (1,0): nothing nearby
        g.attempt_move(Direction::Right); // (1,1): arms (0,1)
        let events = g.advance(800);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::TreasureRelocated { from, to: Some(_) } if *from == Position::new(0, 1)
        )));
        assert_eq!(g.grid().treasure_count(), 1);
        assert!(!g.grid().cell(g.state().player).unwrap().is_treasure());
        assert_eq!(g.state().outcome, Outcome::Playing);
    }

    #[test]
    fn all_collected_ignores_cursed_losses() {
        let mut g = game(&[
            "...$",
            "$...",
            "....",
        ], WinPolicy::AllCollected, 1.0);
        g.state.enemy.halt();
        g.attempt_move(Direction::Right); // (0,1)
        g.attempt_move(Direction::Right); // (0,2): arms (0,3)
        g.advance(800);
        assert!(g.grid().cell_at(0, 3).unwrap().is_cursed());
        // Collect the other one: 1 of 2 collected, never a win under this policy.
        g.attempt_move(Direction::Left);
        g.attempt_move(Direction::Left);
        g.attempt_move(Direction::Down);
        assert_eq!(g.state().treasures_collected, 1);
        assert_eq!(g.state().outcome, Outcome::Playing);
    }

    #[test]
    fn all_resolved_counts_cursed_losses() {
        let mut g = game(&[
            "...$",
            "$...",
            "....",
        ], WinPolicy::AllResolved, 1.0);
        g.state.enemy.halt();
        g.attempt_move(Direction::Right);
        g.attempt_move(Direction::Right);
        g.advance(800);
        assert_eq!(g.state().outcome, Outcome::Playing);
        g.attempt_move(Direction::Left);
        g.attempt_move(Direction::Left);
        let events = g.attempt_move(Direction::Down);
        assert_eq!(g.state().outcome, Outcome::Won);
        assert_eq!(count(&events, |e| *e == GameEvent::Won), 1);
    }

    #[test]
    fn frozen_suppresses_pending_curses() {
        let mut g = game(&[
            ".x$",
            "...",
        ], WinPolicy::AllResolved, 1.0);
        g.state.enemy.halt();
        g.attempt_move(Direction::Down); // (1,0)
        g.attempt_move(Direction::Right); // (1,1): cursed neighbor is not armed
        g.attempt_move(Direction::Right); // (1,2): arms (0,2)
        assert_eq!(g.pending_curses(), 1);
        g.attempt_move(Direction::Left);
        g.attempt_move(Direction::Left);
        g.attempt_move(Direction::Up); // (0,0)
        g.attempt_move(Direction::Right); // (0,1) cursed → lose
        assert!(g.state().is_frozen());
        g.advance(1_000);
        let c = g.grid().cell_at(0, 2).unwrap();
        assert!(c.is_treasure() && !c.pending);
        assert_eq!(g.state().cursed_count, 0);
    }

    #[test]
    fn generated_game_starts_clean() {
        let mut c = GameConfig::default();
        c.seed = Some(99);
        let g = GameController::new(&c);
        let s = g.state();
        assert_eq!(s.player, ORIGIN);
        assert_eq!(s.enemy.pos, Position::new(7, 11));
        assert_eq!(s.treasure_goal, 10);
        assert_eq!((s.moves_taken, s.treasures_collected, s.cursed_count), (0, 0, 0));
        assert!(!s.is_frozen());
        assert_eq!(g.now_ms(), 0);
    }
}
