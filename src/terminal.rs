// location-bingo/src/terminal.rs
// This module handles terminal input/output for the bingo card.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use url::Url;

use crate::controller::{BoardController, Host};
use crate::defs::{CELEBRATION_DURATION, CELLCOUNT, FREE_CELL, GRIDCONFIG, SPOTS};
use crate::error::{BingoError, Result};

const CELL_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Move(i8, i8),
    Toggle,
    Reset,
    Share,
    Exit,
}

pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    // Only process key press events, not key release events
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(KeyAction::Move(-1, 0)),
        KeyCode::Down | KeyCode::Char('j') => Some(KeyAction::Move(1, 0)),
        KeyCode::Left | KeyCode::Char('h') => Some(KeyAction::Move(0, -1)),
        KeyCode::Right | KeyCode::Char('l') => Some(KeyAction::Move(0, 1)),
        KeyCode::Enter | KeyCode::Char(' ') => Some(KeyAction::Toggle),
        KeyCode::Char('r') => Some(KeyAction::Reset),
        KeyCode::Char('s') => Some(KeyAction::Share),
        KeyCode::Esc | KeyCode::Char('q') => Some(KeyAction::Exit),
        _ => None,
    }
}

/// Moves the cursor inside the grid, stopping at the edges.
pub fn move_cursor(cursor: usize, drow: i8, dcol: i8) -> usize {
    let row = (cursor / GRIDCONFIG.cols) as i8 + drow;
    let col = (cursor % GRIDCONFIG.cols) as i8 + dcol;
    let row = row.clamp(0, GRIDCONFIG.rows as i8 - 1) as usize;
    let col = col.clamp(0, GRIDCONFIG.cols as i8 - 1) as usize;
    row * GRIDCONFIG.cols + col
}

// Non-ASCII labels are CJK here and take two columns each.
fn display_width(text: &str) -> usize {
    text.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

fn fit_label(label: &str, width: usize) -> String {
    let mut fitted = String::new();
    let mut used = 0;
    for c in label.chars() {
        let w = display_width(c.encode_utf8(&mut [0; 4]));
        if used + w > width {
            break;
        }
        fitted.push(c);
        used += w;
    }
    fitted.push_str(&" ".repeat(width - used));
    fitted
}

/// Whole screen as text lines, without terminal control sequences except colors.
pub fn render_board(
    controller: &BoardController,
    cursor: usize,
    status: Option<&str>,
    celebrating: bool,
) -> Vec<String> {
    let mut lines = Vec::new();
    let count = controller.visited_count();
    let progress = controller.progress_percent();

    lines.push("\x1b[1;34m📍 東京観光ビンゴ\x1b[0m".to_string());
    lines.push(String::new());

    let border = format!("+{}", format!("{}+", "-".repeat(CELL_WIDTH)).repeat(GRIDCONFIG.cols));
    lines.push(border.clone());
    for row in 0..GRIDCONFIG.rows {
        let mut text = String::from("|");
        for col in 0..GRIDCONFIG.cols {
            let index = row * GRIDCONFIG.cols + col;
            let label = if index == FREE_CELL && !controller.state().is_visited(index) {
                fit_label("FREE", CELL_WIDTH)
            } else {
                fit_label(SPOTS[index], CELL_WIDTH)
            };
            let styled = match (index == cursor, controller.state().is_visited(index)) {
                (true, true) => format!("\x1b[7;1;34m{label}\x1b[0m"),
                (true, false) => format!("\x1b[7m{label}\x1b[0m"),
                (false, true) => format!("\x1b[1;34m{label}\x1b[0m"),
                (false, false) => label,
            };
            text.push_str(&styled);
            text.push('|');
        }
        lines.push(text);
        lines.push(border.clone());
    }

    let filled = progress as usize / 4;
    lines.push(String::new());
    lines.push(format!(
        "訪問済み {count}/{CELLCOUNT}  [{}{}] {progress}%",
        "#".repeat(filled),
        ".".repeat(25 - filled)
    ));

    if let Some(code) = controller.reward_code() {
        lines.push(String::new());
        lines.push(format!("🎁 獲得クーポン: \x1b[1;33m{code}\x1b[0m"));
    }
    if celebrating {
        lines.push(String::new());
        lines.push("\x1b[1;33m🎉 ビンゴ達成! クーポンをゲットしました! 🎊\x1b[0m".to_string());
    }
    if let Some(status) = status {
        lines.push(String::new());
        lines.push(status.to_string());
    }

    lines.push(String::new());
    lines.push("Arrows: move  Enter/Space: visit  r: reset  s: share  ESC/q: exit".to_string());
    lines
}

/// Terminal side of [`Host`]: prompts on the keyboard and copies through the
/// OSC 52 clipboard escape sequence.
pub struct TerminalHost<W: Write> {
    out: W,
    status: Option<String>,
}

impl<W: Write> TerminalHost<W> {
    pub fn new(out: W) -> Self {
        TerminalHost { out, status: None }
    }

    pub fn take_status(&mut self) -> Option<String> {
        self.status.take()
    }
}

impl<W: Write> Host for TerminalHost<W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.out, "\r\n{prompt} (y/n)\r\n").and_then(|_| self.out.flush()).is_err() {
            return false;
        }
        loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    break matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
                }
                Ok(_) => continue,
                Err(_) => break false,
            }
        }
    }

    fn copy_text(&mut self, text: &str) -> Result<()> {
        let payload = STANDARD.encode(text);
        write!(self.out, "\x1b]52;c;{payload}\x07")
            .and_then(|_| self.out.flush())
            .map_err(|e| BingoError::Clipboard(e.to_string()))
    }

    fn notify(&mut self, message: &str) {
        self.status = Some(message.to_string());
    }
}

fn draw(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    write!(out, "{}\r\n", lines.join("\r\n"))?;
    out.flush()
}

/// Interactive loop. Returns the controller as it was when the user left.
pub fn run(mut controller: BoardController, base: &Url) -> Result<BoardController> {
    enable_raw_mode()?;
    let result = event_loop(&mut controller, base);
    disable_raw_mode()?;
    print!("\x1Bc"); // Clear the screen
    result.map(|_| controller)
}

fn event_loop(controller: &mut BoardController, base: &Url) -> Result<()> {
    let mut host = TerminalHost::new(io::stdout());
    let mut cursor = 0;
    let mut status: Option<String> = None;
    let mut celebration_until: Option<Instant> = None;

    loop {
        let celebrating = celebration_until.is_some_and(|until| Instant::now() < until);
        if !celebrating {
            celebration_until = None;
        }
        let lines = render_board(controller, cursor, status.as_deref(), celebrating);
        draw(&mut io::stdout(), &lines)?;

        // Redraw when the celebration runs out even without input
        let wait = celebration_until
            .map(|until| until.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::from_secs(3600));
        if !event::poll(wait)? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        let Some(action) = key_action(&key) else {
            continue;
        };
        status = None;

        match action {
            KeyAction::Move(drow, dcol) => cursor = move_cursor(cursor, drow, dcol),
            KeyAction::Toggle => {
                let outcome = controller.toggle_cell(cursor)?;
                if outcome.reward.is_some() {
                    celebration_until = Some(Instant::now() + CELEBRATION_DURATION);
                }
            }
            KeyAction::Reset => {
                controller.reset(&mut host);
                celebration_until = None;
            }
            KeyAction::Share => {
                // A refused clipboard only produces a notice.
                let _ = controller.copy_share_url(&mut host, base);
                let notice = host.take_status().unwrap_or_default();
                status = Some(format!(
                    "{notice}\r\n{}\r\nQR: {}",
                    controller.share_url(base),
                    controller.qr_code_url(base)
                ));
            }
            KeyAction::Exit => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn strip_ansi(line: &str) -> String {
        let mut out = String::new();
        let mut chars = line.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_key_actions() {
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(key_action(&press(KeyCode::Enter)), Some(KeyAction::Toggle));
        assert_eq!(key_action(&press(KeyCode::Char('r'))), Some(KeyAction::Reset));
        assert_eq!(key_action(&press(KeyCode::Left)), Some(KeyAction::Move(0, -1)));
        assert_eq!(key_action(&press(KeyCode::Esc)), Some(KeyAction::Exit));
        assert_eq!(key_action(&press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_cursor_stays_on_grid() {
        assert_eq!(move_cursor(0, -1, 0), 0);
        assert_eq!(move_cursor(0, 0, -1), 0);
        assert_eq!(move_cursor(0, 1, 1), 6);
        assert_eq!(move_cursor(24, 1, 1), 24);
        assert_eq!(move_cursor(4, 0, 1), 4);
    }

    #[test]
    fn test_fit_label() {
        assert_eq!(display_width(&fit_label("渋谷駅", CELL_WIDTH)), CELL_WIDTH);
        assert_eq!(fit_label("スカイツリー", CELL_WIDTH), "スカイツリー");
        assert_eq!(fit_label("FREE", 6), "FREE  ");
    }

    #[test]
    fn test_render_progress_and_reward() {
        let mut controller = BoardController::default();
        let lines: Vec<String> = render_board(&controller, 0, None, false).iter().map(|l| strip_ansi(l)).collect();
        assert!(lines.iter().any(|l| l.contains("1/25") && l.contains("4%")));
        assert!(!lines.iter().any(|l| l.contains("獲得クーポン")));

        for index in [0, 1, 2, 3, 4] {
            controller.toggle_cell(index).unwrap();
        }
        let lines: Vec<String> = render_board(&controller, 0, Some("copied"), true).iter().map(|l| strip_ansi(l)).collect();
        assert!(lines.iter().any(|l| l.contains("6/25") && l.contains("24%")));
        assert!(lines.iter().any(|l| l.contains("獲得クーポン: H-")));
        assert!(lines.iter().any(|l| l.contains("ビンゴ達成")));
        assert!(lines.iter().any(|l| l == "copied"));
    }

    #[test]
    fn test_copy_text_writes_osc52() {
        let mut host = TerminalHost::new(Vec::new());
        host.copy_text("http://x/").unwrap();
        host.notify("done");
        assert_eq!(host.out, b"\x1b]52;c;aHR0cDovL3gv\x07".to_vec());
        assert_eq!(host.take_status().as_deref(), Some("done"));
    }
}
