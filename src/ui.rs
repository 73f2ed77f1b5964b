use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;
use tracing::{error, warn};
use uuid::Uuid;

use crate::storage::Storage;
use crate::store::{Mode, StoreError, TaskStore};
use crate::task::{Filter, Task};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Text,
    Date,
}

pub struct App {
    store: TaskStore,
    storage: Storage,
    filter: Filter,
    focus: Focus,
    selected: usize,
    date_input: String,
}

impl App {
    pub fn new(store: TaskStore, storage: Storage) -> Self {
        Self {
            store,
            storage,
            filter: Filter::default(),
            focus: Focus::List,
            selected: 0,
            date_input: String::new(),
        }
    }

    fn visible(&self) -> Vec<&Task> {
        self.store.filtered(self.filter)
    }

    fn selected_id(&self) -> Option<Uuid> {
        self.visible().get(self.selected).map(|t| t.id)
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Full-collection write after a mutation. A failure keeps the
    /// in-memory state authoritative for the rest of the session.
    fn persist(&self) {
        if let Err(err) = self.storage.save(self.store.tasks()) {
            error!(%err, path = %self.storage.path().display(), "failed to save tasks");
        }
    }

    fn begin_edit_selected(&mut self) {
        let Some(id) = self.selected_id() else { return };
        if self.store.begin_edit(id).is_ok() {
            self.date_input = self
                .store
                .draft()
                .due_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default();
            self.focus = Focus::Text;
        }
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else { return };
        match self.store.toggle_completed(id) {
            Ok(_) => {
                self.persist();
                self.clamp_selection();
            }
            Err(err) => warn!(%err, "toggle failed"),
        }
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_id() else { return };
        self.store.remove(id);
        self.persist();
        self.clamp_selection();
    }

    /// Parses the date buffer into the draft. An empty buffer clears the
    /// due date; garbage leaves the draft date alone and keeps the focus
    /// here so the user can fix it.
    fn commit_date(&mut self) -> bool {
        if self.date_input.trim().is_empty() {
            self.store.draft_mut().due_date = None;
            return true;
        }
        match NaiveDate::parse_from_str(self.date_input.trim(), DATE_FORMAT) {
            Ok(date) => {
                self.store.draft_mut().due_date = Some(date);
                true
            }
            Err(err) => {
                warn!(%err, input = %self.date_input, "not a valid due date");
                false
            }
        }
    }

    fn submit(&mut self) {
        match self.store.submit() {
            Ok(_) => {
                self.persist();
                self.date_input.clear();
                self.focus = Focus::List;
                self.clamp_selection();
            }
            // empty draft: keep the input as typed for correction
            Err(StoreError::EmptyText) => {}
            Err(err) => {
                warn!(%err, "submit failed");
                self.date_input.clear();
                self.focus = Focus::List;
            }
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('a') | KeyCode::Char('i') => self.focus = Focus::Text,
            KeyCode::Char('e') => self.begin_edit_selected(),
            KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Tab | KeyCode::Char('f') => {
                self.filter = self.filter.next();
                self.clamp_selection();
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                let len = self.visible().len();
                if self.selected + 1 < len {
                    self.selected += 1;
                }
            }
            _ => {}
        }
        false
    }

    fn handle_text_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => {
                self.store.cancel_edit();
                self.date_input.clear();
                self.focus = Focus::List;
            }
            KeyCode::Tab => self.focus = Focus::Date,
            KeyCode::Backspace => {
                self.store.draft_mut().text.pop();
            }
            KeyCode::Char(c) => self.store.draft_mut().text.push(c),
            _ => {}
        }
    }

    fn handle_date_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => {
                if self.commit_date() {
                    self.submit();
                }
            }
            KeyCode::Esc | KeyCode::Tab => {
                self.commit_date();
                self.focus = Focus::Text;
            }
            KeyCode::Backspace => {
                self.date_input.pop();
            }
            KeyCode::Char(c) => self.date_input.push(c),
            _ => {}
        }
    }
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let quit = match app.focus {
                Focus::List => app.handle_list_key(key.code),
                Focus::Text => {
                    app.handle_text_key(key.code);
                    false
                }
                Focus::Date => {
                    app.handle_date_key(key.code);
                    false
                }
            };
            if quit {
                return Ok(());
            }
        }
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = Paragraph::new("Todo List")
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    draw_input_row(f, app, chunks[1]);
    draw_filter_tabs(f, app, chunks[2]);
    draw_task_list(f, app, chunks[3]);
    draw_help(f, app, chunks[4]);
}

fn focus_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw_input_row(f: &mut Frame, app: &App, area: Rect) {
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Min(20), Constraint::Length(18)])
        .split(area);

    let action = match app.store.mode() {
        Mode::Composing => "Add",
        Mode::Editing(_) => "Save",
    };
    let mut text = app.store.draft().text.clone();
    if app.focus == Focus::Text {
        text.push('_');
    }
    let input = Paragraph::new(text).block(
        Block::default()
            .title(action)
            .borders(Borders::ALL)
            .border_style(focus_border(app.focus == Focus::Text)),
    );
    f.render_widget(input, row[0]);

    let date = if app.focus == Focus::Date {
        format!("{}_", app.date_input)
    } else {
        app.store
            .draft()
            .due_date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    };
    let date_field = Paragraph::new(date).block(
        Block::default()
            .title("Due")
            .borders(Borders::ALL)
            .border_style(focus_border(app.focus == Focus::Date)),
    );
    f.render_widget(date_field, row[1]);
}

fn draw_filter_tabs(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    for filter in Filter::TABS {
        let style = if filter == app.filter {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {} ", filter.label()), style));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn draw_task_list(f: &mut Frame, app: &App, area: Rect) {
    let visible = app.store.filtered(app.filter);

    let items: Vec<ListItem> = if visible.is_empty() {
        vec![ListItem::new(Span::styled(
            "Nothing here. Press 'a' to add a task.",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))]
    } else {
        visible
            .iter()
            .map(|t| {
                let mark = if t.completed { "[x] " } else { "[ ] " };
                let text_style = if t.completed {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default().fg(Color::White)
                };
                let mut spans = vec![Span::raw(mark), Span::styled(&t.text, text_style)];
                if let Some(due) = t.due_date {
                    spans.push(Span::styled(
                        format!(" (Due: {})", due.format(DATE_FORMAT)),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("{} ({})", app.filter.label(), visible.len()))
                .borders(Borders::ALL)
                .border_style(focus_border(app.focus == Focus::List)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if app.focus == Focus::List && !visible.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_help(f: &mut Frame, app: &App, area: Rect) {
    let help = match app.focus {
        Focus::List => "a add  e edit  space toggle  d delete  tab filter  q quit",
        Focus::Text => "enter save  tab due date  esc cancel",
        Focus::Date => "YYYY-MM-DD  enter save  tab back  esc back",
    };
    f.render_widget(
        Paragraph::new(Span::styled(help, Style::default().fg(Color::DarkGray))),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_in(dir: &std::path::Path) -> App {
        let storage = Storage::new(dir.join("tasks.json"));
        App::new(TaskStore::new(), storage)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_text_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_and_enter_creates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());

        app.handle_list_key(KeyCode::Char('a'));
        type_text(&mut app, "Buy milk");
        app.handle_text_key(KeyCode::Enter);

        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.tasks()[0].text, "Buy milk");
        assert_eq!(app.focus, Focus::List);

        let reloaded = app.storage.load();
        assert_eq!(reloaded, app.store.tasks());
    }

    #[test]
    fn enter_on_empty_draft_keeps_typing_focus() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());

        app.handle_list_key(KeyCode::Char('a'));
        app.handle_text_key(KeyCode::Enter);

        assert!(app.store.is_empty());
        assert_eq!(app.focus, Focus::Text);
    }

    #[test]
    fn date_field_feeds_the_draft() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());

        app.handle_list_key(KeyCode::Char('a'));
        type_text(&mut app, "Buy milk");
        app.handle_text_key(KeyCode::Tab);
        for c in "2024-01-01".chars() {
            app.handle_date_key(KeyCode::Char(c));
        }
        app.handle_date_key(KeyCode::Enter);

        assert_eq!(app.store.len(), 1);
        assert_eq!(
            app.store.tasks()[0].due_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }

    #[test]
    fn invalid_date_keeps_focus_for_correction() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());

        app.handle_list_key(KeyCode::Char('a'));
        type_text(&mut app, "Buy milk");
        app.handle_text_key(KeyCode::Tab);
        for c in "next tuesday".chars() {
            app.handle_date_key(KeyCode::Char(c));
        }
        app.handle_date_key(KeyCode::Enter);

        assert!(app.store.is_empty());
        assert_eq!(app.focus, Focus::Date);
    }

    #[test]
    fn edit_round_trip_rewrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        let id = app.store.create("Buy milk", None).unwrap().id;

        app.handle_list_key(KeyCode::Char('e'));
        assert_eq!(app.store.mode(), Mode::Editing(id));
        assert_eq!(app.store.draft().text, "Buy milk");

        for _ in 0.."milk".len() {
            app.handle_text_key(KeyCode::Backspace);
        }
        type_text(&mut app, "oat milk");
        app.handle_text_key(KeyCode::Enter);

        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.tasks()[0].id, id);
        assert_eq!(app.store.tasks()[0].text, "Buy oat milk");
    }

    #[test]
    fn esc_cancels_an_edit_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.store.create("untouched", None).unwrap();

        app.handle_list_key(KeyCode::Char('e'));
        type_text(&mut app, " scrapped");
        app.handle_text_key(KeyCode::Esc);

        assert_eq!(app.store.mode(), Mode::Composing);
        assert_eq!(app.store.tasks()[0].text, "untouched");
        assert_eq!(app.focus, Focus::List);
    }

    #[test]
    fn space_toggles_and_delete_clamps_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.store.create("a", None).unwrap();
        app.store.create("b", None).unwrap();

        app.handle_list_key(KeyCode::Down);
        app.handle_list_key(KeyCode::Char(' '));
        assert!(app.store.tasks()[1].completed);

        app.handle_list_key(KeyCode::Char('d'));
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn tab_cycles_the_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        assert_eq!(app.filter, Filter::All);
        app.handle_list_key(KeyCode::Tab);
        assert_eq!(app.filter, Filter::Done);
        app.handle_list_key(KeyCode::Tab);
        assert_eq!(app.filter, Filter::Todo);
        app.handle_list_key(KeyCode::Tab);
        assert_eq!(app.filter, Filter::All);
    }
}
