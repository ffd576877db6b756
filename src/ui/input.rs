/// Keyboard input collector.
///
/// One move per key press. Only Press events count; Repeat and Release are
/// dropped on terminals that report them. Presses are kept in arrival order
/// so a quick "right, right, down" burst inside one frame is not collapsed.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

pub struct InputState {
    /// Key presses drained this frame, oldest first.
    presses: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { presses: Vec::with_capacity(8) }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind == KeyEventKind::Press {
                    self.presses.push(key);
                }
            }
        }
    }

    /// Presses this frame, in order.
    pub fn presses(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.presses.iter().map(|k| k.code)
    }

    /// Was any of these keys pressed this frame?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        self.presses().any(|c| codes.contains(&c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.presses.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
