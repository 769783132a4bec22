//! Terminal line editor with completion, history and a live prompt.

use std::{
    io::{self, Write},
    time::Duration,
};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, ClearType},
};
use hangle_session::{
    Completer, Suggestion,
    completion::{completion_target, current_word},
};

/// How often the prompt is refreshed while idle.
const TICK: Duration = Duration::from_millis(250);

/// Suggestions shown at once.
const MAX_SHOWN: usize = 8;

/// Result of reading one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    /// A submitted line.
    Line(String),
    /// Ctrl-D on an empty line.
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Redraw,
    Submit,
    Eof,
    Complete { forward: bool },
    Ignore,
}

#[derive(Debug)]
struct Menu {
    items: Vec<Suggestion>,
    selected: Option<usize>,
    /// Characters before the cursor that the next applied item replaces.
    replaced: usize,
}

#[derive(Debug, Default)]
struct LineState {
    buffer: Vec<char>,
    cursor: usize,
    history: Vec<String>,
    history_pos: Option<usize>,
    draft: String,
    menu: Option<Menu>,
}

impl LineState {
    fn with_history(history: Vec<String>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    fn text(&self) -> String {
        self.buffer.iter().collect()
    }

    fn before_cursor(&self) -> String {
        self.buffer[..self.cursor].iter().collect()
    }

    fn set_text(&mut self, text: &str) {
        self.buffer = text.chars().collect();
        self.cursor = self.buffer.len();
    }

    fn take_line(&mut self) -> String {
        let line = self.text();
        if !line.trim().is_empty() && self.history.last() != Some(&line) {
            self.history.push(line.clone());
        }
        self.buffer.clear();
        self.cursor = 0;
        self.history_pos = None;
        self.draft.clear();
        self.menu = None;
        line
    }

    fn insert(&mut self, c: char) {
        self.buffer.insert(self.cursor, c);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.buffer.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.buffer.len() {
            self.buffer.remove(self.cursor);
        }
    }

    fn delete_word(&mut self) {
        let before = self.before_cursor();
        let trimmed = before.trim_end();
        let word = current_word(trimmed).chars().count();
        let spaces = before.chars().count() - trimmed.chars().count();
        let n = (word + spaces).max(usize::from(self.cursor > 0));
        self.buffer.drain(self.cursor - n..self.cursor);
        self.cursor -= n;
    }

    fn history_prev(&mut self) {
        let pos = match self.history_pos {
            Some(0) => return,
            Some(pos) => pos - 1,
            None if self.history.is_empty() => return,
            None => {
                self.draft = self.text();
                self.history.len() - 1
            }
        };
        self.history_pos = Some(pos);
        let entry = self.history[pos].clone();
        self.set_text(&entry);
    }

    fn history_next(&mut self) {
        let Some(pos) = self.history_pos else {
            return;
        };
        if pos + 1 < self.history.len() {
            self.history_pos = Some(pos + 1);
            let entry = self.history[pos + 1].clone();
            self.set_text(&entry);
        } else {
            self.history_pos = None;
            let draft = std::mem::take(&mut self.draft);
            self.set_text(&draft);
        }
    }

    /// Replace the `replaced` characters before the cursor with `text`.
    fn replace_before_cursor(&mut self, replaced: usize, text: &str) -> usize {
        let start = self.cursor - replaced.min(self.cursor);
        self.buffer
            .splice(start..self.cursor, text.chars())
            .for_each(drop);
        let inserted = text.chars().count();
        self.cursor = start + inserted;
        inserted
    }

    fn open_menu(&mut self, items: Vec<Suggestion>) {
        let replaced = completion_target(&self.before_cursor()).chars().count();
        match items.len() {
            0 => self.menu = None,
            1 => {
                self.replace_before_cursor(replaced, &items[0].text);
                self.menu = None;
            }
            _ => {
                self.menu = Some(Menu {
                    items,
                    selected: None,
                    replaced,
                });
            }
        }
    }

    fn cycle(&mut self, forward: bool) {
        let Some(mut menu) = self.menu.take() else {
            return;
        };
        let len = menu.items.len();
        let next = match (menu.selected, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        menu.selected = Some(next);
        menu.replaced = self.replace_before_cursor(menu.replaced, &menu.items[next].text);
        self.menu = Some(menu);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind == KeyEventKind::Release {
            return Action::Ignore;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let action = match key.code {
            KeyCode::Char('c') if ctrl => {
                self.buffer.clear();
                self.cursor = 0;
                self.history_pos = None;
                Action::Redraw
            }
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    return Action::Eof;
                }
                self.delete();
                Action::Redraw
            }
            KeyCode::Char('a') if ctrl => {
                self.cursor = 0;
                Action::Redraw
            }
            KeyCode::Char('e') if ctrl => {
                self.cursor = self.buffer.len();
                Action::Redraw
            }
            KeyCode::Char('u') if ctrl => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
                Action::Redraw
            }
            KeyCode::Char('k') if ctrl => {
                self.buffer.truncate(self.cursor);
                Action::Redraw
            }
            KeyCode::Char('w') if ctrl => {
                self.delete_word();
                Action::Redraw
            }
            KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => {
                return Action::Ignore;
            }
            KeyCode::Char(c) => {
                self.insert(c);
                Action::Redraw
            }
            KeyCode::Enter => return Action::Submit,
            KeyCode::Tab => return Action::Complete { forward: true },
            KeyCode::BackTab => return Action::Complete { forward: false },
            KeyCode::Up if self.menu.is_some() => {
                self.cycle(false);
                return Action::Redraw;
            }
            KeyCode::Down if self.menu.is_some() => {
                self.cycle(true);
                return Action::Redraw;
            }
            KeyCode::Up => {
                self.history_prev();
                Action::Redraw
            }
            KeyCode::Down => {
                self.history_next();
                Action::Redraw
            }
            KeyCode::Backspace => {
                self.backspace();
                Action::Redraw
            }
            KeyCode::Delete => {
                self.delete();
                Action::Redraw
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                Action::Redraw
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.buffer.len());
                Action::Redraw
            }
            KeyCode::Home => {
                self.cursor = 0;
                Action::Redraw
            }
            KeyCode::End => {
                self.cursor = self.buffer.len();
                Action::Redraw
            }
            KeyCode::Esc => Action::Redraw,
            _ => return Action::Ignore,
        };
        // Any edit closes the suggestion list.
        self.menu = None;
        action
    }
}

/// Raw mode for the lifetime of the guard.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn next_event() -> io::Result<Option<Event>> {
    if event::poll(TICK)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

/// Line editor over the process terminal.
pub struct LineEditor {
    state: LineState,
}

impl LineEditor {
    /// Create an editor preloaded with history, oldest first.
    #[must_use]
    pub fn new(history: Vec<String>) -> Self {
        Self {
            state: LineState::with_history(history),
        }
    }

    /// Read one line.
    ///
    /// `prefix` is re-evaluated while idle so a live countdown stays
    /// current. Tab asks `completer` for suggestions for the text before
    /// the cursor; further presses cycle through them.
    ///
    /// # Errors
    /// Returns error if the terminal cannot be read or written.
    pub async fn read_line<C, P>(&mut self, completer: &mut C, prefix: P) -> io::Result<ReadLine>
    where
        C: Completer + ?Sized,
        P: Fn() -> String,
    {
        let _raw = RawMode::enable()?;
        let mut out = io::stdout();
        let mut shown = prefix();
        self.render(&mut out, &shown)?;

        loop {
            let event = tokio::task::spawn_blocking(next_event)
                .await
                .map_err(io::Error::other)??;

            let action = match event {
                Some(Event::Key(key)) => self.state.handle_key(key),
                Some(Event::Resize(..)) => Action::Redraw,
                Some(_) => Action::Ignore,
                None if prefix() != shown => Action::Redraw,
                None => Action::Ignore,
            };

            match action {
                Action::Submit => {
                    self.state.menu = None;
                    self.render(&mut out, &shown)?;
                    queue!(out, Print("\r\n"))?;
                    out.flush()?;
                    return Ok(ReadLine::Line(self.state.take_line()));
                }
                Action::Eof => {
                    queue!(out, Print("\r\n"))?;
                    out.flush()?;
                    return Ok(ReadLine::Eof);
                }
                Action::Complete { forward } => {
                    if self.state.menu.is_some() {
                        self.state.cycle(forward);
                    } else {
                        let before = self.state.before_cursor();
                        let items = completer.complete(&before).await;
                        self.state.open_menu(items);
                    }
                }
                Action::Redraw | Action::Ignore => {}
            }

            if action != Action::Ignore {
                shown = prefix();
                self.render(&mut out, &shown)?;
            }
        }
    }

    fn render(&self, out: &mut impl Write, prefix: &str) -> io::Result<()> {
        queue!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::FromCursorDown),
            Print(prefix),
            Print(self.state.text()),
        )?;

        if let Some(menu) = &self.state.menu {
            let width = menu
                .items
                .iter()
                .map(|s| s.text.chars().count())
                .max()
                .unwrap_or(0);
            let start = menu
                .selected
                .map_or(0, |s| s.saturating_sub(MAX_SHOWN - 1));
            let mut lines: u16 = 0;
            for (i, item) in menu.items.iter().enumerate().skip(start).take(MAX_SHOWN) {
                let label = format!("  {:<width$}  {}", item.text, item.description);
                queue!(out, Print("\r\n"))?;
                if menu.selected == Some(i) {
                    queue!(
                        out,
                        SetAttribute(Attribute::Reverse),
                        Print(label),
                        SetAttribute(Attribute::Reset)
                    )?;
                } else {
                    queue!(out, Print(label))?;
                }
                lines += 1;
            }
            if lines > 0 {
                queue!(out, cursor::MoveUp(lines))?;
            }
        }

        let col = prefix.chars().count() + self.state.cursor;
        queue!(
            out,
            cursor::MoveToColumn(u16::try_from(col).unwrap_or(u16::MAX))
        )?;
        out.flush()
    }
}
