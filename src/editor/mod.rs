//! Terminal adapter for the editor session.
//!
//! Renders the session state with ratatui and translates key events into
//! session actions: a filter input, the record list, the key/value text
//! pane, and a modal three-way close prompt. Save jobs returned by the
//! session are dispatched to worker threads; completions come back
//! through a channel drained here, on the UI thread.

mod textarea;

use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::config::Config;
use crate::error::{Result, RipkitError};
use crate::output::{display_path, Printer};
use crate::session::{
    CloseOutcome, CloseRequest, EditorSession, PendingSave, SaveDisposition, SaveOutcome,
};
use crate::tools::lazyripent;

use textarea::TextArea;

const TICK: Duration = Duration::from_millis(50);

/// Open the editor against a map: extract the scratch entity file, run
/// the session, then apply and clean up according to how it closed.
pub fn launch(config: &Config, map: &Path, printer: &Printer) -> Result<()> {
    let exe = config.lazyripent()?;

    if !map
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bsp"))
    {
        return Err(RipkitError::Config {
            message: format!("{} is not a .bsp file", display_path(map)),
            help: Some("The editor works on compiled maps".to_string()),
        });
    }

    printer.status("Opening", &display_path(map));
    let scratch = lazyripent::extract_entities(exe, map, true, printer)?;
    let mut session = EditorSession::open(&scratch, config.template().cloned())?;

    let outcome = run_terminal(&mut session, map)?;

    // The apply step consumes the scratch file; it must precede removal.
    let applied = match outcome {
        Some(CloseOutcome::Apply) => lazyripent::import_entities(exe, map, true, printer),
        _ => Ok(()),
    };
    session.finish();
    applied?;

    printer.success("Closed", &display_path(map));
    Ok(())
}

/// Set up and tear down the terminal around the event loop.
fn run_terminal(session: &mut EditorSession, map: &Path) -> Result<Option<CloseOutcome>> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, session, map);

    let _ = terminal.backend_mut().execute(LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Text,
    Filter,
}

struct Ui {
    title: String,
    focus: Focus,
    textarea: TextArea,
    list_state: ListState,
    status: String,
    prompt_open: bool,
    outcome: Option<CloseOutcome>,
    done: bool,
    completions: Receiver<SaveOutcome>,
    worker: Sender<SaveOutcome>,
}

impl Ui {
    fn new(session: &EditorSession, map: &Path) -> Self {
        let (worker, completions) = mpsc::channel();
        let mut list_state = ListState::default();
        list_state.select(session.selected());
        Self {
            title: map
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| display_path(map)),
            focus: Focus::List,
            textarea: TextArea::from_text(session.buffer()),
            list_state,
            status: String::new(),
            prompt_open: false,
            outcome: None,
            done: false,
            completions,
            worker,
        }
    }

    /// Push the pane text into the session buffer. Called before any
    /// session action that may commit the buffer.
    fn sync_buffer(&self, session: &mut EditorSession) {
        session.set_buffer(self.textarea.text());
    }

    /// Pull session state back after an action changed the selection.
    fn reload(&mut self, session: &EditorSession) {
        self.textarea = TextArea::from_text(session.buffer());
        self.list_state.select(session.selected());
    }

    fn dispatch(&self, pending: PendingSave) {
        pending.dispatch(self.worker.clone());
    }
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut EditorSession,
    map: &Path,
) -> Result<Option<CloseOutcome>> {
    let mut ui = Ui::new(session, map);

    loop {
        terminal.draw(|frame| draw(frame, session, &mut ui))?;

        // Drain save completions posted by worker threads.
        while let Ok(outcome) = ui.completions.try_recv() {
            if session.complete_save(outcome) == SaveDisposition::Close {
                ui.outcome = Some(CloseOutcome::Apply);
                ui.done = true;
            }
        }
        if let Some(message) = session.take_status() {
            ui.status = message;
        }
        if ui.done {
            return Ok(ui.outcome);
        }

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                handle_key(key, session, &mut ui);
            }
        }
    }
}

fn handle_key(key: KeyEvent, session: &mut EditorSession, ui: &mut Ui) {
    if ui.prompt_open {
        handle_prompt_key(key, session, ui);
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('s') => {
                ui.sync_buffer(session);
                ui.dispatch(session.save());
                ui.status = "saving...".to_string();
            }
            KeyCode::Char('n') => {
                ui.sync_buffer(session);
                let pending = session.create();
                ui.dispatch(pending);
                ui.reload(session);
            }
            KeyCode::Char('k') => {
                ui.sync_buffer(session);
                if let Some(pending) = session.clone_selected() {
                    ui.dispatch(pending);
                    ui.reload(session);
                }
            }
            KeyCode::Char('d') => {
                if let Some(pending) = session.delete_selected() {
                    ui.dispatch(pending);
                    ui.reload(session);
                }
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Tab => {
            ui.focus = match ui.focus {
                Focus::List => Focus::Text,
                Focus::Text => Focus::Filter,
                Focus::Filter => Focus::List,
            };
        }
        KeyCode::Esc => {
            if ui.focus == Focus::Text {
                ui.focus = Focus::List;
            } else if session.request_close() == CloseRequest::Prompt {
                ui.prompt_open = true;
            }
        }
        _ => match ui.focus {
            Focus::List => handle_list_key(key, session, ui),
            Focus::Filter => handle_filter_key(key, session, ui),
            Focus::Text => handle_text_key(key, ui),
        },
    }
}

fn handle_prompt_key(key: KeyEvent, session: &mut EditorSession, ui: &mut Ui) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            ui.sync_buffer(session);
            match session.confirm_close(true) {
                Ok(outcome) => {
                    ui.outcome = Some(outcome);
                    ui.done = true;
                }
                Err(e) => {
                    ui.status = e.to_string();
                    session.cancel_close();
                    ui.prompt_open = false;
                }
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') => {
            if let Ok(outcome) = session.confirm_close(false) {
                ui.outcome = Some(outcome);
                ui.done = true;
            }
        }
        KeyCode::Esc => {
            session.cancel_close();
            ui.prompt_open = false;
        }
        _ => {}
    }
}

fn handle_list_key(key: KeyEvent, session: &mut EditorSession, ui: &mut Ui) {
    let count = session.entries().len();
    match key.code {
        KeyCode::Up | KeyCode::Down => {
            if count == 0 {
                return;
            }
            let current = session.selected().unwrap_or(0);
            let next = match key.code {
                KeyCode::Up => current.saturating_sub(1),
                _ => (current + 1).min(count - 1),
            };
            ui.sync_buffer(session);
            session.select(next);
            ui.reload(session);
        }
        KeyCode::Enter => ui.focus = Focus::Text,
        _ => {}
    }
}

fn handle_filter_key(key: KeyEvent, session: &mut EditorSession, ui: &mut Ui) {
    let mut needle = session.filter_text().to_string();
    match key.code {
        KeyCode::Char(c) => needle.push(c),
        KeyCode::Backspace => {
            needle.pop();
        }
        _ => return,
    }
    ui.sync_buffer(session);
    session.set_filter(&needle);
    ui.reload(session);
}

fn handle_text_key(key: KeyEvent, ui: &mut Ui) {
    match key.code {
        KeyCode::Char(c) => ui.textarea.insert_char(c),
        KeyCode::Enter => ui.textarea.insert_newline(),
        KeyCode::Backspace => ui.textarea.backspace(),
        KeyCode::Left => ui.textarea.move_left(),
        KeyCode::Right => ui.textarea.move_right(),
        KeyCode::Up => ui.textarea.move_up(),
        KeyCode::Down => ui.textarea.move_down(),
        KeyCode::Home => ui.textarea.move_home(),
        KeyCode::End => ui.textarea.move_end(),
        _ => {}
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw(frame: &mut Frame, session: &EditorSession, ui: &mut Ui) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(20)])
        .split(rows[1]);

    // Filter input
    let filter = Paragraph::new(session.filter_text()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Filter")
            .border_style(focus_style(ui.focus == Focus::Filter)),
    );
    frame.render_widget(filter, rows[0]);

    // Record list
    let items: Vec<ListItem> = session
        .entries()
        .into_iter()
        .map(ListItem::new)
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Entities ({})", session.entries().len()))
                .border_style(focus_style(ui.focus == Focus::List)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    ui.list_state.select(session.selected());
    frame.render_stateful_widget(list, columns[0], &mut ui.list_state);

    // Key/value pane
    let (cursor_row, cursor_col) = ui.textarea.cursor();
    let inner_height = columns[1].height.saturating_sub(2) as usize;
    // Keep the cursor row inside the visible window.
    let scroll = if inner_height > 0 && cursor_row >= inner_height {
        cursor_row + 1 - inner_height
    } else {
        0
    };
    let text = Paragraph::new(ui.textarea.lines().join("\n"))
        .scroll((scroll as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(ui.title.clone())
                .border_style(focus_style(ui.focus == Focus::Text)),
        );
    frame.render_widget(text, columns[1]);

    if ui.focus == Focus::Text && !ui.prompt_open {
        let inner_width = columns[1].width.saturating_sub(2) as usize;
        let col = cursor_col.min(inner_width.saturating_sub(1));
        frame.set_cursor(
            columns[1].x + 1 + col as u16,
            columns[1].y + 1 + (cursor_row - scroll) as u16,
        );
    }

    // Status / key hints
    let hints = "Tab focus | Ctrl+S save | Ctrl+N new | Ctrl+K clone | Ctrl+D delete | Esc close";
    let line = if ui.status.is_empty() {
        hints.to_string()
    } else {
        format!("{} | {}", ui.status, hints)
    };
    frame.render_widget(
        Paragraph::new(line).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );

    if ui.prompt_open {
        let area = centered(50, 5, frame.size());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new(format!(
            "Apply changes to {}?\n\n[Y] apply   [N] discard   [Esc] keep editing",
            ui.title
        ))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm Apply")
                .border_style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(prompt, area);
    }
}

fn centered(width: u16, height: u16, container: Rect) -> Rect {
    let width = width.min(container.width);
    let height = height.min(container.height);
    Rect {
        x: container.x + (container.width - width) / 2,
        y: container.y + (container.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_container() {
        let container = Rect::new(0, 0, 80, 24);
        let area = centered(50, 5, container);
        assert_eq!(area.width, 50);
        assert_eq!(area.height, 5);
        assert_eq!(area.x, 15);
        assert_eq!(area.y, 9);
    }

    #[test]
    fn test_centered_rect_clamps_to_small_container() {
        let container = Rect::new(0, 0, 20, 4);
        let area = centered(50, 5, container);
        assert!(area.width <= 20);
        assert!(area.height <= 4);
    }
}
