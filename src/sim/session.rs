/// Session: the game as the frame loop sees it.
///
/// Wraps one `GameController` with the bits that are not game rules:
/// pause, the status message line, and restart. Restart throws the whole
/// controller away and generates a new board.

use crate::config::GameConfig;
use crate::domain::entity::Direction;
use super::controller::GameController;
use super::event::{GameEvent, LossCause};

const MESSAGE_MS: u64 = 1_500;

pub struct Session {
    pub game: GameController,
    pub paused: bool,
    pub message: String,
    message_remaining_ms: u64,
    config: GameConfig,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        let game = GameController::new(&config);
        Session {
            game,
            paused: false,
            message: String::new(),
            message_remaining_ms: 0,
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Full teardown and rebuild. Nothing carries over except settings.
    pub fn restart(&mut self) {
        // A fixed seed would replay the same board forever.
        if let Some(seed) = self.config.seed.as_mut() {
            *seed = seed.wrapping_add(1);
        }
        self.game = GameController::new(&self.config);
        self.paused = false;
        self.set_message("New vault generated", MESSAGE_MS);
    }

    pub fn toggle_pause(&mut self) {
        if self.game.state().is_frozen() { return; }
        self.paused = !self.paused;
        if self.paused {
            self.set_message("PAUSED  [P] Resume", 0);
        } else {
            self.clear_message();
        }
    }

    pub fn handle_move(&mut self, dir: Direction) -> Vec<GameEvent> {
        if self.paused { return vec![]; }
        let events = self.game.attempt_move(dir);
        self.absorb(&events);
        events
    }

    /// Advance game time and the message timer.
    pub fn tick(&mut self, dt_ms: u64) -> Vec<GameEvent> {
        if self.paused { return vec![]; }

        if self.message_remaining_ms > 0 {
            self.message_remaining_ms = self.message_remaining_ms.saturating_sub(dt_ms);
            if self.message_remaining_ms == 0 { self.message.clear(); }
        }

        let events = self.game.advance(dt_ms);
        self.absorb(&events);
        events
    }

    /// `duration_ms == 0` keeps the message until replaced.
    pub fn set_message(&mut self, msg: &str, duration_ms: u64) {
        self.message = msg.to_string();
        self.message_remaining_ms = duration_ms;
    }

    fn clear_message(&mut self) {
        self.message.clear();
        self.message_remaining_ms = 0;
    }

    fn absorb(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::TreasureCollected { .. } => self.set_message("Treasure secured!", MESSAGE_MS),
                GameEvent::TreasureCursed { .. } => self.set_message("A treasure crumbled into a curse", MESSAGE_MS),
                GameEvent::TreasureRelocated { to: Some(_), .. } => self.set_message("A treasure slipped away...", MESSAGE_MS),
                GameEvent::TreasureRelocated { to: None, .. } => self.set_message("A treasure vanished for good", MESSAGE_MS),
                GameEvent::Won => self.set_message("Vault cleared", 0),
                GameEvent::Lost { cause: LossCause::Captured } => self.set_message("The guardian caught you", 0),
                GameEvent::Lost { cause: LossCause::SteppedOnCurse } => self.set_message("You stepped on a cursed tile", 0),
                _ => {}
            }
        }
    }
}
