//! Terminal front end: a login screen and the three-column board.
//!
//! Key handling lives on [`App`] and never touches the terminal, so it can be
//! driven directly from tests; [`draw`] only reads the app state.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{debug, warn};

use crate::auth::{Credential, CredentialStore};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::kanban_board::{DragDrop, KanbanBoard, TaskFilter};
use crate::route::{Navigator, Route};
use crate::storage::KeyValueStore;
use crate::task::{self, Priority, Status, TaskEdit, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            focus: LoginField::Email,
        }
    }
}

impl LoginForm {
    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    New,
    Edit(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Priority,
    Due,
    Description,
}

impl FormField {
    const ORDER: [FormField; 4] = [
        FormField::Title,
        FormField::Priority,
        FormField::Due,
        FormField::Description,
    ];

    fn step(self, by: isize) -> FormField {
        let len = Self::ORDER.len() as isize;
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(idx + by).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    pub target: FormTarget,
    pub title: String,
    pub priority: Priority,
    pub due: String,
    pub description: String,
    pub focus: FormField,
    pub error: Option<String>,
}

impl TaskForm {
    fn new(priority: Priority) -> Self {
        Self {
            target: FormTarget::New,
            title: String::new(),
            priority,
            due: String::new(),
            description: String::new(),
            focus: FormField::Title,
            error: None,
        }
    }

    fn for_edit(id: TaskId, edit: TaskEdit) -> Self {
        Self {
            target: FormTarget::Edit(id),
            title: edit.title,
            priority: edit.priority,
            due: edit.due_date.map(|d| d.to_string()).unwrap_or_default(),
            description: edit.description.unwrap_or_default(),
            focus: FormField::Title,
            error: None,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Title => Some(&mut self.title),
            FormField::Due => Some(&mut self.due),
            FormField::Description => Some(&mut self.description),
            FormField::Priority => None,
        }
    }

    fn shift_priority(&mut self, by: isize) {
        let idx = Priority::ALL.iter().position(|p| *p == self.priority).unwrap_or(0) as isize;
        self.priority = Priority::ALL[(idx + by).rem_euclid(3) as usize];
    }

    fn to_edit(&self) -> Result<TaskEdit> {
        Ok(TaskEdit {
            title: self.title.clone(),
            description: Some(self.description.clone()).filter(|d| !d.trim().is_empty()),
            priority: self.priority,
            due_date: task::parse_date(&self.due)?,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Mode {
    Normal,
    Form(TaskForm),
    /// Blocking notice; any key dismisses it.
    Alert(String),
}

pub struct App<S> {
    auth: CredentialStore<S>,
    board: KanbanBoard<S>,
    config: Config,
    pub route: Route,
    pub login: LoginForm,
    pub mode: Mode,
    pub selected_status: usize,
    pub selected_task: usize,
    pub message: Option<String>,
    pub should_quit: bool,
}

impl<S: KeyValueStore + Clone> App<S> {
    pub fn new(storage: S, config: Config) -> Result<Self> {
        let auth = CredentialStore::new(storage.clone());
        let mut board = KanbanBoard::open(storage)?;
        board.set_sort(config.default_sort);
        let route = auth.guard_dashboard()?;
        Ok(Self {
            auth,
            board,
            config,
            route,
            login: LoginForm::default(),
            mode: Mode::Normal,
            selected_status: 0,
            selected_task: 0,
            message: None,
            should_quit: false,
        })
    }

    pub fn board(&self) -> &KanbanBoard<S> {
        &self.board
    }

    fn selected_column(&self) -> Status {
        Status::ALL[self.selected_status]
    }

    fn selected_id(&self) -> Option<TaskId> {
        self.board
            .partition(self.selected_column())
            .get(self.selected_task)
            .map(|t| t.id)
    }

    fn clamp_selection(&mut self) {
        let len = self.board.partition(self.selected_column()).len();
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Alert(_) => Ok(()),
            Mode::Form(form) => self.handle_form_key(form, key),
            Mode::Normal => match self.route {
                Route::Login => self.handle_login_key(key),
                Route::Dashboard => self.handle_board_key(key),
            },
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.login.toggle_focus()
            }
            KeyCode::Backspace => {
                self.login.focused_mut().pop();
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.login.email.trim().is_empty() {
                    self.message = Some("Enter an email to register".to_string());
                } else {
                    let record = Credential::new(self.login.email.clone(), self.login.password.clone());
                    self.auth.register(record)?;
                    self.message = Some(format!("Registered {}", self.login.email));
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.login.focused_mut().push(c);
            }
            KeyCode::Enter => match self.auth.submit_login(&self.login.email, &self.login.password) {
                Ok(route) => {
                    self.login.password.clear();
                    self.message = None;
                    self.navigate(route);
                }
                Err(Error::InvalidCredentials) => {
                    self.mode = Mode::Alert(Error::InvalidCredentials.to_string());
                }
                Err(err) => return Err(err),
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> Result<()> {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left | KeyCode::Right if shift => {
                let by = if key.code == KeyCode::Left { -1 } else { 1 };
                self.transfer_selected(by)?;
            }
            KeyCode::Up | KeyCode::Down if shift => {
                let by = if key.code == KeyCode::Up { -1 } else { 1 };
                self.reorder_selected(by)?;
            }
            KeyCode::Left => {
                self.selected_status = self.selected_status.saturating_sub(1);
                self.clamp_selection();
            }
            KeyCode::Right => {
                if self.selected_status < Status::ALL.len() - 1 {
                    self.selected_status += 1;
                }
                self.clamp_selection();
            }
            KeyCode::Up => self.selected_task = self.selected_task.saturating_sub(1),
            KeyCode::Down => {
                self.selected_task += 1;
                self.clamp_selection();
            }
            KeyCode::Char('a') => {
                self.mode = Mode::Form(TaskForm::new(self.config.default_priority));
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    if let Some(edit) = self.board.edit_task(id) {
                        self.mode = Mode::Form(TaskForm::for_edit(id, edit));
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    self.board.delete_task(id)?;
                    self.message = Some("Task deleted".to_string());
                    self.clamp_selection();
                }
            }
            KeyCode::Char('s') => {
                if let Some(id) = self.selected_id() {
                    let next = self.selected_column().cycled();
                    self.board.change_status(id, next)?;
                    self.message = Some(format!("Moved to {}", next.label()));
                    self.clamp_selection();
                }
            }
            KeyCode::Char('f') => {
                let mut filter = self.board.filter();
                filter.priority = match filter.priority {
                    None => Some(Priority::Low),
                    Some(Priority::Low) => Some(Priority::Medium),
                    Some(Priority::Medium) => Some(Priority::High),
                    Some(Priority::High) => None,
                };
                self.board.set_filter(filter);
                self.clamp_selection();
            }
            KeyCode::Char('o') => {
                self.board.set_sort(self.board.sort().cycled());
                self.clamp_selection();
            }
            KeyCode::Char('c') => {
                self.board.set_filter(TaskFilter::default());
                self.clamp_selection();
            }
            KeyCode::Char('L') => {
                let route = self.auth.logout()?;
                self.navigate(route);
            }
            _ => {}
        }
        Ok(())
    }

    /// Point the cursor at `id` wherever the columns now show it.
    fn select_task(&mut self, id: TaskId) {
        for status in Status::ALL {
            if let Some(pos) = self.board.partition(status).iter().position(|t| t.id == id) {
                self.selected_status = status.index();
                self.selected_task = pos;
                return;
            }
        }
        self.clamp_selection();
    }

    fn transfer_selected(&mut self, by: isize) -> Result<()> {
        let from = self.selected_column();
        let to = from.shifted(by);
        let Some(id) = self.selected_id() else {
            return Ok(());
        };
        if from == to {
            return Ok(());
        }
        let event = DragDrop {
            from,
            from_index: self.selected_task,
            to,
            to_index: self.selected_task,
        };
        if self.board.drop_task(event)? {
            self.select_task(id);
        }
        Ok(())
    }

    fn reorder_selected(&mut self, by: isize) -> Result<()> {
        let column = self.selected_column();
        let len = self.board.partition(column).len();
        let Some(id) = self.selected_id() else {
            return Ok(());
        };
        let target = (self.selected_task as isize + by).clamp(0, len as isize - 1) as usize;
        if target == self.selected_task {
            return Ok(());
        }
        let event = DragDrop {
            from: column,
            from_index: self.selected_task,
            to: column,
            to_index: target,
        };
        if self.board.drop_task(event)? {
            self.select_task(id);
        }
        Ok(())
    }

    fn handle_form_key(&mut self, mut form: TaskForm, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                if let FormTarget::Edit(id) = form.target {
                    self.board.cancel_edit(id)?;
                }
                return Ok(());
            }
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.step(1),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.step(-1),
            KeyCode::Left if form.focus == FormField::Priority => form.shift_priority(-1),
            KeyCode::Right if form.focus == FormField::Priority => form.shift_priority(1),
            KeyCode::Backspace => {
                if let Some(text) = form.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = form.text_mut() {
                    text.push(c);
                }
            }
            KeyCode::Enter => return self.submit_form(form),
            _ => {}
        }
        self.mode = Mode::Form(form);
        Ok(())
    }

    fn submit_form(&mut self, mut form: TaskForm) -> Result<()> {
        let edit = match form.to_edit() {
            Ok(edit) => edit,
            Err(Error::InvalidArgument(msg)) => {
                form.error = Some(msg);
                self.mode = Mode::Form(form);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        match form.target {
            FormTarget::New => {
                if let Some(id) = self.board.add_task(
                    &edit.title,
                    edit.priority,
                    edit.due_date,
                    edit.description,
                )? {
                    debug!(%id, "added from form");
                    self.message = Some("Task added".to_string());
                }
            }
            FormTarget::Edit(id) => {
                if !self.board.save_edit(id, edit)? {
                    form.error = Some("Title cannot be empty".to_string());
                    self.mode = Mode::Form(form);
                    return Ok(());
                }
                self.message = Some("Task saved".to_string());
            }
        }
        self.clamp_selection();
        Ok(())
    }

    fn status_line(&self) -> String {
        let filter = self.board.filter();
        let mut parts = vec![
            format!(
                "filter: {}",
                filter.priority.map_or("all", |p| p.as_str())
            ),
            format!("sort: {}", self.board.sort()),
        ];
        if let Ok(Some(user)) = self.auth.current_user() {
            parts.push(user.email);
        }
        if let Some(msg) = &self.message {
            parts.push(msg.clone());
        }
        parts.join(" | ")
    }
}

impl<S: KeyValueStore + Clone> Navigator for App<S> {
    fn navigate(&mut self, route: Route) {
        debug!(?route, "navigate");
        if route == Route::Dashboard {
            if let Err(err) = self.board.reload() {
                warn!(%err, "cannot load tasks, staying on login");
                self.mode = Mode::Alert(err.to_string());
                return;
            }
            self.selected_status = 0;
            self.selected_task = 0;
        }
        self.route = route;
    }
}

pub fn draw<S: KeyValueStore + Clone>(f: &mut Frame, app: &App<S>) {
    match app.route {
        Route::Login => draw_login(f, app),
        Route::Dashboard => draw_board(f, app),
    }

    match &app.mode {
        Mode::Normal => {}
        Mode::Form(form) => draw_form(f, form),
        Mode::Alert(msg) => {
            let area = centered(f.area(), 40, 5);
            f.render_widget(Clear, area);
            f.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled(msg.as_str(), Style::default().fg(Color::Red))),
                    Line::from(""),
                    Line::from("Press any key"),
                ])
                .block(Block::default().title("Alert").borders(Borders::ALL)),
                area,
            );
        }
    }
}

fn draw_login<S: KeyValueStore + Clone>(f: &mut Frame, app: &App<S>) {
    let area = centered(f.area(), 50, 8);
    let field_style = |field: LoginField| {
        if app.login.focus == field {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        }
    };
    let masked = "*".repeat(app.login.password.chars().count());
    let lines = vec![
        Line::from(vec![
            Span::styled("Email:    ", field_style(LoginField::Email)),
            Span::raw(app.login.email.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Password: ", field_style(LoginField::Password)),
            Span::raw(masked),
        ]),
        Line::from(""),
        Line::from("Enter: log in  Ctrl-R: register  Esc: quit"),
        Line::from(app.message.clone().unwrap_or_default()),
    ];
    f.render_widget(
        Paragraph::new(lines).block(Block::default().title("Log in").borders(Borders::ALL)),
        area,
    );
}

fn draw_board<S: KeyValueStore + Clone>(f: &mut Frame, app: &App<S>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(rows[0]);

    for (i, status) in Status::ALL.iter().enumerate() {
        let tasks = app.board.partition(*status);
        let items: Vec<ListItem> = tasks
            .iter()
            .map(|t| {
                let mut lines = vec![Line::from(vec![
                    Span::styled(format!("[{}] ", t.priority), priority_style(t.priority)),
                    Span::styled(t.title.as_str(), Style::default().fg(Color::White)),
                    Span::raw(
                        t.due_date
                            .map(|d| format!(" (Due: {d})"))
                            .unwrap_or_default(),
                    ),
                ])];
                if app.config.ui.show_descriptions {
                    if let Some(first) = t.description.as_deref().and_then(|d| d.lines().next()) {
                        lines.push(Line::from(Span::styled(
                            format!("  {first}"),
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                }
                ListItem::new(lines)
            })
            .collect();

        let selected = app.selected_status == i;
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("{} ({})", status.label(), tasks.len()))
                    .borders(Borders::ALL)
                    .border_style(if selected {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    }),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

        let mut state = ListState::default();
        if selected && !tasks.is_empty() {
            state.select(Some(app.selected_task));
        }
        f.render_stateful_widget(list, chunks[i], &mut state);
    }

    f.render_widget(
        Paragraph::new(app.status_line()).style(Style::default().fg(Color::DarkGray)),
        rows[1],
    );
}

fn draw_form(f: &mut Frame, form: &TaskForm) {
    let area = centered(f.area(), 60, 9);
    let label = |field: FormField, name: &'static str| {
        if form.focus == field {
            Span::styled(name, Style::default().fg(Color::Cyan))
        } else {
            Span::raw(name)
        }
    };
    let mut lines = vec![
        Line::from(vec![label(FormField::Title, "Title:       "), Span::raw(form.title.as_str())]),
        Line::from(vec![
            label(FormField::Priority, "Priority:    "),
            Span::styled(format!("< {} >", form.priority), priority_style(form.priority)),
        ]),
        Line::from(vec![label(FormField::Due, "Due:         "), Span::raw(form.due.as_str())]),
        Line::from(vec![
            label(FormField::Description, "Description: "),
            Span::raw(form.description.as_str()),
        ]),
    ];
    if let Some(err) = &form.error {
        lines.push(Line::from(Span::styled(err.as_str(), Style::default().fg(Color::Red))));
    }
    let title = match form.target {
        FormTarget::New => "New task",
        FormTarget::Edit(_) => "Edit task",
    };
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::Low => Style::default().fg(Color::Green),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::High => Style::default().fg(Color::Red),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn run_app<B: Backend, S: KeyValueStore + Clone>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> Result<()> {
    let tick = Duration::from_millis(app.config.ui.tick_ms);
    while !app.should_quit {
        terminal.draw(|f| draw(f, app))?;

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key)?;
            }
        }
    }
    Ok(())
}

/// Take over the terminal, run the app, and restore the terminal even if
/// the app fails.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

pub fn run<S: KeyValueStore + Clone>(app: &mut App<S>) -> Result<()> {
    let mut terminal = match setup_terminal() {
        Ok(terminal) => terminal,
        Err(err) => {
            // Leave the shell usable even if setup stopped halfway.
            let _ = restore_terminal();
            return Err(err.into());
        }
    };

    let result = run_app(&mut terminal, app);

    restore_terminal()?;
    terminal.show_cursor()?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kanban_board::SortOption;
    use crate::storage::{self, MemoryStore, TASKS_KEY};
    use crate::task::Task;
    use chrono::{TimeZone, Utc};
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn shift(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::SHIFT)
    }

    fn type_text<S: KeyValueStore + Clone>(app: &mut App<S>, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn logged_in(store: &MemoryStore) -> App<&MemoryStore> {
        let auth = CredentialStore::new(store);
        auth.register(Credential::new("a@x.com", "p")).unwrap();
        auth.login("a@x.com", "p").unwrap();
        App::new(store, Config::default()).unwrap()
    }

    fn add(app: &mut App<&MemoryStore>, title: &str) {
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(app, title);
        app.handle_key(key(KeyCode::Enter)).unwrap();
    }

    fn selected_title(app: &App<&MemoryStore>) -> String {
        let column = app.board().partition(Status::ALL[app.selected_status]);
        column[app.selected_task].title.clone()
    }

    fn render(app: &App<&MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn starts_on_login_without_session() {
        let store = MemoryStore::new();
        let app = App::new(&store, Config::default()).unwrap();
        assert_eq!(app.route, Route::Login);
        assert!(render(&app).contains("Log in"));
    }

    #[test]
    fn bad_login_raises_blocking_alert() {
        let store = MemoryStore::new();
        let mut app = App::new(&store, Config::default()).unwrap();
        type_text(&mut app, "who@x.com");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert!(matches!(&app.mode, Mode::Alert(msg) if msg == "Invalid credentials"));
        assert!(render(&app).contains("Invalid credentials"));

        // the alert swallows the next key
        app.handle_key(key(KeyCode::Char('x'))).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.login.email, "who@x.com");
        assert_eq!(app.route, Route::Login);
    }

    #[test]
    fn register_then_login_opens_dashboard() {
        let store = MemoryStore::new();
        let mut app = App::new(&store, Config::default()).unwrap();
        type_text(&mut app, "a@x.com");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "secret");
        app.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL))
            .unwrap();
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.route, Route::Dashboard);
        assert!(app.login.password.is_empty());
        assert!(render(&app).contains("TODO (0)"));
    }

    #[test]
    fn add_move_and_logout() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store);

        add(&mut app, "Buy milk");
        assert_eq!(app.board().partition(Status::Todo).len(), 1);
        assert!(render(&app).contains("Buy milk"));

        app.handle_key(shift(KeyCode::Right)).unwrap();
        assert_eq!(app.selected_status, 1);
        let doing = app.board().partition(Status::InProgress);
        assert_eq!(doing.len(), 1);
        assert_eq!(doing[0].status, Status::InProgress);

        app.handle_key(key(KeyCode::Char('L'))).unwrap();
        assert_eq!(app.route, Route::Login);
    }

    #[test]
    fn blank_title_form_adds_nothing() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store);
        add(&mut app, "   ");
        assert!(app.board().tasks().is_empty());
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn bad_due_date_keeps_form_open() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store);
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "x");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        app.handle_key(key(KeyCode::Right)).unwrap();
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "tomorrow");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        match &app.mode {
            Mode::Form(form) => {
                assert!(form.error.is_some());
                assert_eq!(form.priority, Priority::Medium);
            }
            other => panic!("expected form, got {other:?}"),
        }
        assert!(app.board().tasks().is_empty());
    }

    #[test]
    fn edit_and_cancel() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store);
        add(&mut app, "draft");

        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        type_text(&mut app, " two");
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.board().partition(Status::Todo)[0].title, "draft two");

        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        type_text(&mut app, " three");
        app.handle_key(key(KeyCode::Esc)).unwrap();
        let task = app.board().partition(Status::Todo)[0];
        assert_eq!(task.title, "draft two");
        assert!(!task.editing);
    }

    #[test]
    fn filter_sort_and_status_keys() {
        let store = MemoryStore::new();
        let mut app = logged_in(&store);
        add(&mut app, "one");
        add(&mut app, "two");

        app.handle_key(key(KeyCode::Char('f'))).unwrap();
        assert_eq!(app.board().filter().priority, Some(Priority::Low));
        app.handle_key(key(KeyCode::Char('f'))).unwrap();
        assert!(app.board().partition(Status::Todo).is_empty());
        app.handle_key(key(KeyCode::Char('c'))).unwrap();
        assert_eq!(app.board().partition(Status::Todo).len(), 2);

        app.handle_key(key(KeyCode::Char('o'))).unwrap();
        assert!(app.status_line().contains("sort: created"));

        app.handle_key(key(KeyCode::Char('s'))).unwrap();
        assert_eq!(app.board().partition(Status::InProgress)[0].title, "one");

        app.handle_key(shift(KeyCode::Down)).unwrap();
        assert_eq!(app.selected_task, 0);
        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.board().tasks().len(), 1);
    }

    #[test]
    fn unreadable_tasks_keep_login_screen() {
        let store = MemoryStore::new();
        CredentialStore::new(&store)
            .register(Credential::new("a@x.com", "p"))
            .unwrap();
        let mut app = App::new(&store, Config::default()).unwrap();
        store.set(TASKS_KEY, "[{\"title\":").unwrap();

        type_text(&mut app, "a@x.com");
        app.handle_key(key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "p");
        app.handle_key(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.route, Route::Login);
        assert!(matches!(app.mode, Mode::Alert(_)));
        assert!(render(&app).contains("Log in"));
    }

    #[test]
    fn selection_follows_moved_task_under_created_sort() {
        let store = MemoryStore::new();
        let mut tasks = Vec::new();
        for (title, day) in [("newer", 5), ("older", 3), ("middle", 4), ("started", 1)] {
            let mut task = Task::new(title, Priority::Low, None, None);
            task.created_at = Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap();
            tasks.push(task);
        }
        tasks[3].status = Status::InProgress;
        storage::write_json(&store, TASKS_KEY, &tasks).unwrap();

        let auth = CredentialStore::new(&store);
        auth.register(Credential::new("a@x.com", "p")).unwrap();
        auth.login("a@x.com", "p").unwrap();
        let config = Config {
            default_sort: SortOption::Created,
            ..Config::default()
        };
        let mut app = App::new(&store, config).unwrap();
        assert_eq!(selected_title(&app), "older");

        // the sort puts it straight back on top
        app.handle_key(shift(KeyCode::Down)).unwrap();
        assert_eq!(selected_title(&app), "older");
        assert_eq!(app.selected_task, 0);

        // lands after "started", which was created earlier
        app.handle_key(shift(KeyCode::Right)).unwrap();
        assert_eq!(app.selected_status, 1);
        assert_eq!(app.selected_task, 1);
        assert_eq!(selected_title(&app), "older");

        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        let titles: Vec<_> = app.board().tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["middle", "newer", "started"]);
    }
}
