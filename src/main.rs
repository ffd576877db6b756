/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::info;

use config::GameConfig;
use domain::entity::Direction;
use sim::session::Session;
use sim::world::Outcome;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    let config = GameConfig::load();
    init_logging(&config);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    let mut session = Session::new(config);

    let result = game_loop(&mut session, &mut renderer, sound.as_ref());

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    let st = session.game.state();
    let verdict = match st.outcome {
        Outcome::Won => "Vault cleared",
        Outcome::Lost(_) => "Lost in the vault",
        Outcome::Playing => "Left the vault",
    };
    println!();
    println!("{verdict}. Moves: {}  Treasures: {}/{}  Cursed: {}",
        st.moves_taken, st.treasures_collected, st.treasure_goal, st.cursed_count);
}

/// Logs go to `log_file` only; the terminal belongs to the renderer.
fn init_logging(config: &GameConfig) {
    let Some(path) = &config.log_file else { return };
    match File::create(path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .init();
            info!(seed = ?config.seed, "logging started");
        }
        Err(e) => eprintln!("Warning: cannot open log file {}: {e}", path.display()),
    }
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&session.config().gamepad);
    let frame = Duration::from_millis(session.config().timing.frame_ms);

    let mut last_tick = Instant::now();
    // Sub-millisecond remainder carried into the next frame.
    let mut carry = Duration::ZERO;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed()
            || kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc])
            || gp.cancel_pressed()
        {
            break;
        }

        if kb.any_pressed(&[KeyCode::Char('r'), KeyCode::Char('R')])
            || gp.restart_pressed()
            || gp.confirm_pressed()
        {
            session.restart();
            last_tick = Instant::now();
            carry = Duration::ZERO;
        }
        if kb.any_pressed(&[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::F(1)]) {
            session.toggle_pause();
        }

        let moves: Vec<Direction> = kb.presses().filter_map(key_direction)
            .chain(gp.moves().iter().copied())
            .collect();
        for dir in moves {
            let events = session.handle_move(dir);
            if let Some(sfx) = sound { sfx.react(&events); }
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_tick) + carry;
        last_tick = now;
        let dt_ms = elapsed.as_millis() as u64;
        carry = elapsed - Duration::from_millis(dt_ms);

        let events = session.tick(dt_ms);
        if let Some(sfx) = sound { sfx.react(&events); }

        renderer.render(session)?;
        std::thread::sleep(frame);
    }

    Ok(())
}

fn key_direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::Right),
        _ => None,
    }
}
