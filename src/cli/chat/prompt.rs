use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use rustyline::{Config, Editor};

pub const PROMPT: &str = "You: ";

pub fn rl() -> rustyline::Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(false)
        .build();
    Editor::with_config(config)
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Reads a secret from the terminal, echoing `*` per character.
///
/// Esc or Ctrl-C abandons the entry and yields an empty string. When stdin
/// is not a terminal the line is read as-is.
pub fn read_masked(label: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;

    if !io::stdin().is_terminal() {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        return Ok(line.trim_end_matches(['\r', '\n']).to_string());
    }

    let mut value = String::new();
    {
        let _raw_mode = RawModeGuard::enable()?;
        loop {
            let Event::Key(KeyEvent { code, modifiers, kind, .. }) = event::read()? else {
                continue;
            };
            if kind != KeyEventKind::Press {
                continue;
            }
            match code {
                KeyCode::Enter => break,
                KeyCode::Esc => {
                    value.clear();
                    break;
                }
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    value.clear();
                    break;
                }
                KeyCode::Backspace => {
                    if value.pop().is_some() {
                        write!(stdout, "\x08 \x08")?;
                    }
                }
                KeyCode::Char(c) => {
                    value.push(c);
                    write!(stdout, "*")?;
                }
                _ => {}
            }
            stdout.flush()?;
        }
    }

    writeln!(stdout)?;
    Ok(value)
}
