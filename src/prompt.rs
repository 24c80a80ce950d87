use crate::error::{ExportError, ExportResult};
use crossterm::{
    cursor,
    event::{read as ev_read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::Print,
    terminal::{self, ClearType},
    ExecutableCommand,
};
use std::io::{self, stdout, StdoutLock};

/// Runs `f` with the terminal in raw mode, restoring it whatever `f` returns.
pub fn with_raw_mode<T>(f: impl FnOnce(&mut StdoutLock) -> ExportResult<T>) -> ExportResult<T> {
    let mut stdout = stdout().lock();
    terminal::enable_raw_mode()?;
    let result = f(&mut stdout);
    terminal::disable_raw_mode()?;
    result
}

pub fn prompt_password(user: &str) -> ExportResult<String> {
    with_raw_mode(|stdout| {
        stdout.execute(Print(format!("MySQL password for {user}: ")))?;
        read_line(stdout, true)
    })
}

/// Reads one line at the cursor. `obscure` echoes `*` instead of the text.
pub fn read_line(stdout: &mut StdoutLock, obscure: bool) -> ExportResult<String> {
    let (st_col, row) = cursor::position()?;
    let mut buf: Vec<char> = Vec::new();
    let mut idx = 0;
    loop {
        match ev_read()? {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    stdout.execute(cursor::MoveToNextLine(1))?;
                    return Err(ExportError::Io(io::Error::new(
                        io::ErrorKind::Interrupted,
                        "input cancelled",
                    )));
                }
                KeyCode::Char(c) => {
                    buf.insert(idx, c);
                    idx += 1;
                }
                KeyCode::Backspace if idx > 0 => {
                    idx -= 1;
                    buf.remove(idx);
                }
                KeyCode::Left if idx > 0 => idx -= 1,
                KeyCode::Right if idx < buf.len() => idx += 1,
                KeyCode::Enter => break,
                _ => {}
            },
            Event::Paste(text) => {
                for c in text.chars() {
                    buf.insert(idx, c);
                    idx += 1;
                }
            }
            _ => {}
        }

        let shown: String = if obscure {
            "*".repeat(buf.len())
        } else {
            buf.iter().collect()
        };
        stdout
            .execute(cursor::MoveTo(st_col, row))?
            .execute(terminal::Clear(ClearType::UntilNewLine))?
            .execute(Print(shown))?
            .execute(cursor::MoveTo(st_col + idx as u16, row))?;
    }
    stdout.execute(cursor::MoveToNextLine(1))?;
    Ok(buf.into_iter().collect())
}

/// Checkbox list over `names` with an "All" entry on top.
/// Up/Down move, Enter toggles, any other key confirms.
pub fn select_tables(stdout: &mut StdoutLock, names: &[String]) -> ExportResult<Vec<String>> {
    stdout
        .execute(terminal::Clear(ClearType::All))?
        .execute(cursor::MoveTo(0, 0))?
        .execute(Print("Select tables: "))?
        .execute(cursor::MoveToNextLine(1))?;

    let (_, st_row) = cursor::position()?;
    stdout
        .execute(Print("[ ] All"))?
        .execute(cursor::MoveToNextLine(1))?;
    for name in names {
        stdout
            .execute(Print(format!("[ ] {name}")))?
            .execute(cursor::MoveToNextLine(1))?;
    }

    let mut selects = vec![false; names.len() + 1];
    let mut pos = 0;
    draw_mark(stdout, st_row, pos, &selects, pos)?;
    loop {
        let Some(code) = pressed_key(ev_read()?) else {
            continue;
        };
        match code {
            KeyCode::Up | KeyCode::Down => {
                let prev = pos;
                pos = match code {
                    KeyCode::Up => pos.saturating_sub(1),
                    _ => (pos + 1).min(names.len()),
                };
                draw_mark(stdout, st_row, prev, &selects, pos)?;
                draw_mark(stdout, st_row, pos, &selects, pos)?;
            }
            KeyCode::Enter => {
                selects[pos] = !selects[pos];
                draw_mark(stdout, st_row, pos, &selects, pos)?;
            }
            _ => break,
        }
    }
    stdout.execute(cursor::MoveTo(0, st_row + selects.len() as u16))?;
    Ok(chosen(names, &selects))
}

/// Key code of a key press; resizes, focus changes and key releases give `None`.
fn pressed_key(event: Event) -> Option<KeyCode> {
    match event {
        Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) => Some(code),
        _ => None,
    }
}

fn draw_mark(stdout: &mut StdoutLock, st_row: u16, idx: usize, selects: &[bool], pos: usize) -> io::Result<()> {
    let mark = match (selects[idx], idx == pos) {
        (true, _) => 'x',
        (false, true) => '?',
        (false, false) => ' ',
    };
    stdout
        .execute(cursor::MoveTo(1, st_row + idx as u16))?
        .execute(Print(mark))?
        .execute(cursor::MoveLeft(1))?;
    Ok(())
}

/// `selects[0]` is the "All" entry, the rest follow `names`.
fn chosen(names: &[String], selects: &[bool]) -> Vec<String> {
    if selects[0] {
        return names.to_vec();
    }
    names
        .iter()
        .zip(&selects[1..])
        .filter_map(|(name, on)| on.then(|| name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["Account".into(), "EventXtract".into(), "Grades".into()]
    }

    #[test]
    fn all_entry_takes_everything() {
        assert_eq!(chosen(&names(), &[true, false, true, false]), names());
    }

    #[test]
    fn picks_ticked_entries() {
        assert_eq!(
            chosen(&names(), &[false, true, false, true]),
            vec!["Account".to_string(), "Grades".to_string()]
        );
    }

    #[test]
    fn only_key_presses_count() {
        assert_eq!(pressed_key(Event::Resize(80, 24)), None);
        assert_eq!(pressed_key(Event::FocusLost), None);

        let release = KeyEvent::new_with_kind(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(pressed_key(Event::Key(release)), None);

        let press = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(pressed_key(Event::Key(press)), Some(KeyCode::Enter));
    }

    #[test]
    fn nothing_ticked_picks_nothing() {
        assert!(chosen(&names(), &[false; 4]).is_empty());
    }
}
