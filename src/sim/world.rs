/// GameState: player, enemy, counters and the terminal flag.
///
/// `frozen` only ever goes false → true. Once set, nothing in the
/// simulation may change the board or the counters again; a new game is a
/// brand new controller, never a partial reset.

use crate::domain::entity::{Enemy, Position};
use super::event::LossCause;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Playing,
    Won,
    Lost(LossCause),
}

#[derive(Clone, Debug)]
pub struct GameState {
    pub player: Position,
    pub enemy: Enemy,
    pub treasures_collected: u32,
    pub cursed_count: u32,
    pub moves_taken: u32,
    /// Treasures that must be accounted for to win. Starts as the number
    /// actually placed on the board, which may be below the configured count.
    pub treasure_goal: u32,
    pub outcome: Outcome,
    frozen: bool,
}

impl GameState {
    pub fn new(player: Position, enemy: Position, treasure_goal: u32) -> Self {
        GameState {
            player,
            enemy: Enemy::new(enemy),
            treasures_collected: 0,
            cursed_count: 0,
            moves_taken: 0,
            treasure_goal,
            outcome: Outcome::Playing,
            frozen: false,
        }
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Idempotent. Also stops the enemy loop.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.enemy.halt();
    }
}
