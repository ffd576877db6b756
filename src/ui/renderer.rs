/// Terminal renderer: double-buffered, diff-based.
///
/// Each frame is composed into `front`, compared cell by cell against
/// `back` (what is already on screen), and only the differences are queued
/// to the terminal. One flush per frame, then the buffers swap.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::{Cell, CellContent};
use crate::domain::entity::Position;
use crate::sim::event::LossCause;
use crate::sim::session::Session;
use crate::sim::world::Outcome;

// ── Glyph: one terminal column of the frame buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
    /// Occupies two columns; the next glyph is its continuation.
    wide: bool,
    /// Right half of a wide glyph; never printed.
    cont: bool,
}

impl Glyph {
    /// Used for both `Clear` and every blank glyph so the two never disagree.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 28 };

    const BLANK: Glyph = Glyph {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Glyph::BASE_BG,
        wide: false,
        cont: false,
    };

    const CONT: Glyph = Glyph {
        ch: [0; 4],
        ch_len: 0,
        fg: Color::White,
        bg: Glyph::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Never produced by composition, so a back buffer full of these
    /// forces a full repaint.
    const INVALID: Glyph = Glyph {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    fn new(c: char, fg: Color, bg: Color) -> Self {
        let mut g = Self::BLANK;
        g.ch_len = c.encode_utf8(&mut g.ch).len() as u8;
        g.fg = fg;
        g.bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        g
    }

    fn wide(c: char, bg: Color) -> Self {
        let mut g = Self::new(c, Color::Reset, bg);
        g.wide = true;
        g
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    glyphs: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, glyphs: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.glyphs.fill(Glyph::BLANK);
    }

    fn invalidate(&mut self) {
        self.glyphs.fill(Glyph::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }

    /// Two-column board cell holding one wide glyph.
    fn put_wide(&mut self, x: usize, y: usize, c: char, bg: Color) {
        if x + 1 >= self.width { return; }
        self.set(x, y, Glyph::wide(c, bg));
        self.set(x + 1, y, Glyph { bg, ..Glyph::CONT });
    }

    /// Two-column board cell made of two narrow glyphs.
    fn put_pair(&mut self, x: usize, y: usize, s: [char; 2], fg: Color, bg: Color) {
        self.set(x, y, Glyph::new(s[0], fg, bg));
        self.set(x + 1, y, Glyph::new(s[1], fg, bg));
    }
}

// ── Layout ──

/// Terminal columns per board cell.
const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const BOARD_ROW: usize = 2;
const BOARD_COL: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 24, g: 30, b: 70 };
const FLOOR_BG: Color = Color::Rgb { r: 34, g: 34, b: 46 };
const WALL_FG: Color = Color::Rgb { r: 120, g: 110, b: 95 };
const PENDING_BG: Color = Color::Rgb { r: 90, g: 30, b: 30 };
const CURSED_BG: Color = Color::Rgb { r: 60, g: 10, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 170, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Repaint everything when the outcome flips.
    last_outcome: Option<Outcome>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_outcome: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.invalidate();
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
        }

        let outcome = session.game.state().outcome;
        if self.last_outcome != Some(outcome) {
            self.back.invalidate();
            self.last_outcome = Some(outcome);
        }

        self.front.clear();
        self.compose_hud(session);
        self.compose_board(session);
        self.compose_footer(session);
        match outcome {
            Outcome::Playing if session.paused => self.compose_banner(session, "PAUSED", "[P] Resume  [Q] Quit", Color::Rgb { r: 255, g: 220, b: 50 }),
            Outcome::Playing => {}
            Outcome::Won => self.compose_banner(session, "YOU WON!", "[R] Play again  [Q] Quit", Color::Rgb { r: 80, g: 255, b: 120 }),
            Outcome::Lost(_) => self.compose_banner(session, "YOU LOST!", "[R] Play again  [Q] Quit", Color::Rgb { r: 255, g: 70, b: 70 }),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let g = self.front.get(x, y);
                if g.cont {
                    x += 1;
                    continue;
                }
                let cont_changed = g.wide && self.front.get(x + 1, y) != self.back.get(x + 1, y);
                if g == self.back.get(x, y) && !cont_changed {
                    x += 1;
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.as_str()))?;

                x += if g.wide { 2 } else { 1 };
                cursor_at = Some((x, y));
            }
        }
        self.writer.flush()
    }

    // ── Compose ──

    fn compose_hud(&mut self, s: &Session) {
        let st = s.game.state();
        let secs = s.game.now_ms() / 1000;
        let hud = format!(
            " Moves: {}  Treasures: {}/{}  Cursed: {}   {:02}:{:02} ",
            st.moves_taken, st.treasures_collected, st.treasure_goal, st.cursed_count,
            secs / 60, secs % 60,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_board(&mut self, s: &Session) {
        let grid = s.game.grid();
        let st = s.game.state();
        for cell in grid.cells() {
            let x = BOARD_COL + cell.col * CELL_W;
            let y = BOARD_ROW + cell.row;
            if y >= self.front.height || x + 1 >= self.front.width { continue; }
            self.compose_cell(cell, st.player, st.enemy.pos, x, y);
        }
    }

    fn compose_cell(&mut self, cell: &Cell, player: Position, enemy: Position, x: usize, y: usize) {
        let pos = cell.pos();
        let bg = match cell.content {
            CellContent::Cursed => CURSED_BG,
            CellContent::Treasure if cell.pending => PENDING_BG,
            _ => FLOOR_BG,
        };
        // The enemy walks through walls, so it draws over everything.
        if pos == enemy {
            self.front.put_wide(x, y, '👹', bg);
        } else if pos == player {
            self.front.put_wide(x, y, '🧍', bg);
        } else {
            match cell.content {
                CellContent::Wall => self.front.put_pair(x, y, ['█', '█'], WALL_FG, FLOOR_BG),
                CellContent::Treasure => self.front.put_wide(x, y, '💎', bg),
                CellContent::Cursed => self.front.put_wide(x, y, '💀', bg),
                CellContent::Empty => self.front.put_pair(x, y, ['·', ' '], Color::DarkGrey, FLOOR_BG),
            }
        }
    }

    fn compose_footer(&mut self, s: &Session) {
        let rows = s.game.grid().rows();
        let msg_row = BOARD_ROW + rows + 1;
        if msg_row < self.front.height && !s.message.is_empty() {
            let msg = format!(" ◈ {} ", s.message);
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        }
        let help_row = msg_row + 2;
        if help_row < self.front.height {
            let help = " Arrows/WASD: Move  P/F1: Pause  R: New vault  Q/Esc: Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Centered box over the board.
    fn compose_banner(&mut self, s: &Session, title: &str, hint: &str, color: Color) {
        let grid = s.game.grid();
        let board_w = grid.cols() * CELL_W;
        let cause = match s.game.state().outcome {
            Outcome::Lost(LossCause::Captured) => "The guardian caught you",
            Outcome::Lost(LossCause::SteppedOnCurse) => "You stepped on a cursed tile",
            _ => "",
        };
        let inner_w = [title, hint, cause].iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
        let box_x = BOARD_COL + board_w.saturating_sub(inner_w) / 2;
        let box_y = BOARD_ROW + grid.rows().saturating_sub(5) / 2;
        let box_bg = Color::Rgb { r: 30, g: 30, b: 30 };

        for dy in 0..5 {
            for dx in 0..inner_w {
                self.front.set(box_x + dx, box_y + dy, Glyph::new(' ', Color::White, box_bg));
            }
        }
        let center = |line: &str| box_x + (inner_w - line.chars().count()) / 2;
        self.front.put_str(center(title), box_y + 1, title, color, box_bg);
        if !cause.is_empty() {
            self.front.put_str(center(cause), box_y + 2, cause, Color::Rgb { r: 200, g: 200, b: 200 }, box_bg);
        }
        self.front.put_str(center(hint), box_y + 3, hint, Color::Rgb { r: 100, g: 200, b: 255 }, box_bg);
    }
}
