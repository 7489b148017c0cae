use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use tracing::{info, warn};

use taskboard::csv_import;
use taskboard::kanban_board::{BoardLayout, CardLayout, ColumnLayout, DropOutcome, KanbanBoard};
use taskboard::storage::Storage;
use taskboard::task::next_sunday;
use taskboard::view::{self, View};
use taskboard::{Result, Status, Task, TaskInput, TaskPatch, TaskStore};

const CARD_HEIGHT: u16 = 4;
const DESCRIPTION_PREVIEW: usize = 50;

/// What the one-line input at the bottom is collecting.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Prompt {
    AddTitle,
    Edit(String, TaskField),
    Comment(String),
    CommentNumber(String),
    EditComment(String, usize),
    ImportPath,
    ConfirmDelete(String),
}

impl Prompt {
    fn label(&self) -> &'static str {
        match self {
            Prompt::AddTitle => "New task title",
            Prompt::Edit(_, field) => field.label(),
            Prompt::Comment(_) => "Comment",
            Prompt::CommentNumber(_) => "Edit comment number",
            Prompt::EditComment(_, _) => "Edit comment",
            Prompt::ImportPath => "CSV file to import",
            Prompt::ConfirmDelete(_) => "Delete this task? (y/n)",
        }
    }
}

/// Steps of the edit form, in the order they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskField {
    Title,
    Description,
    DueDate,
    Estimate,
    Status,
}

impl TaskField {
    fn label(self) -> &'static str {
        match self {
            TaskField::Title => "Title",
            TaskField::Description => "Description (blank clears)",
            TaskField::DueDate => "Due date YYYY-MM-DD (blank clears)",
            TaskField::Estimate => "Estimate in hours (blank clears)",
            TaskField::Status => "Status",
        }
    }

    fn next(self) -> Option<TaskField> {
        match self {
            TaskField::Title => Some(TaskField::Description),
            TaskField::Description => Some(TaskField::DueDate),
            TaskField::DueDate => Some(TaskField::Estimate),
            TaskField::Estimate => Some(TaskField::Status),
            TaskField::Status => None,
        }
    }

    fn current(self, task: &Task) -> String {
        match self {
            TaskField::Title => task.title.clone(),
            TaskField::Description => task.description.clone().unwrap_or_default(),
            TaskField::DueDate => task.due_date.map(|d| d.to_string()).unwrap_or_default(),
            TaskField::Estimate => task.time_estimate.map(|h| h.to_string()).unwrap_or_default(),
            TaskField::Status => task.status.to_string(),
        }
    }

    /// The patch for one answer. Blank keeps the title and status and clears
    /// the optional fields.
    fn patch(self, id: String, value: &str) -> std::result::Result<TaskPatch, String> {
        let patch = TaskPatch::new(id);
        let blank = value.is_empty();
        Ok(match self {
            TaskField::Title if blank => patch,
            TaskField::Title => patch.with_title(value),
            TaskField::Description => patch.with_description(Some(value.to_string())),
            TaskField::DueDate if blank => patch.with_due_date(None),
            TaskField::DueDate => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                Ok(date) => patch.with_due_date(Some(date)),
                Err(_) => return Err(format!("Invalid due date '{value}'")),
            },
            TaskField::Estimate if blank => patch.with_time_estimate(None),
            TaskField::Estimate => match value.parse::<f64>() {
                Ok(hours) if hours.is_finite() && hours >= 0.0 => {
                    patch.with_time_estimate(Some(hours))
                }
                _ => return Err(format!("Invalid estimate '{value}'")),
            },
            TaskField::Status if blank => patch,
            TaskField::Status => match Status::parse(value) {
                Some(status) => patch.with_status(status),
                None => return Err(format!("Unknown status '{value}'")),
            },
        })
    }
}

pub struct App<S: Storage> {
    store: TaskStore<S>,
    view: View,
    board: KanbanBoard,
    layout: BoardLayout,
    list_state: ListState,
    prompt: Option<(Prompt, String)>,
    message: Option<String>,
}

impl<S: Storage> App<S> {
    pub fn new(store: TaskStore<S>) -> Self {
        let view = view::load_active_view(store.storage());
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            store,
            view,
            board: KanbanBoard::new(),
            layout: BoardLayout::default(),
            list_state,
            prompt: None,
            message: None,
        }
    }

    fn switch_view(&mut self) -> Result<()> {
        self.view = self.view.toggled();
        self.board.cancel();
        view::save_active_view(self.store.storage_mut(), self.view)
    }

    /// Task under the cursor in whichever view is showing.
    fn selected_task_id(&self) -> Option<String> {
        match self.view {
            View::TaskList => {
                let index = self.list_state.selected()?;
                self.store.list().into_iter().nth(index).map(|t| t.id)
            }
            View::KanbanBoard => self.board.selected_task_id(&self.store),
        }
    }

    fn select(&mut self, direction: isize) {
        match self.view {
            View::TaskList => {
                let len = self.store.list().len();
                if len == 0 {
                    self.list_state.select(Some(0));
                    return;
                }
                let current = self.list_state.selected().unwrap_or(0) as isize;
                let next = (current + direction).clamp(0, len as isize - 1);
                self.list_state.select(Some(next as usize));
            }
            View::KanbanBoard => {
                let len = self.store.by_status(self.board.selected_column()).len();
                self.board.select_task(direction, len);
            }
        }
    }

    /// Returns `false` when the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.prompt.is_some() {
            self.handle_prompt_key(key)?;
            return Ok(true);
        }

        self.message = None;
        match key.code {
            KeyCode::Char('q') => return Ok(false),
            KeyCode::Tab => self.switch_view()?,
            KeyCode::Esc => self.board.cancel(),
            KeyCode::Char('a') => self.open_prompt(Prompt::AddTitle, String::new()),
            KeyCode::Char('i') => self.open_prompt(Prompt::ImportPath, String::new()),
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_task_id() {
                    self.open_edit(id, TaskField::Title);
                }
            }
            KeyCode::Char('c') => {
                if let Some(id) = self.selected_task_id() {
                    self.open_prompt(Prompt::Comment(id), String::new());
                }
            }
            KeyCode::Char('C') => {
                if let Some(id) = self.selected_task_id() {
                    self.open_comment_edit(id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_task_id() {
                    self.open_prompt(Prompt::ConfirmDelete(id), String::new());
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.select(-1),
            KeyCode::Down | KeyCode::Char('j') => self.select(1),
            KeyCode::Left if self.view == View::KanbanBoard => self.board.select_column(-1),
            KeyCode::Right if self.view == View::KanbanBoard => self.board.select_column(1),
            KeyCode::Char('h') if self.view == View::KanbanBoard => {
                self.board.move_selected(&mut self.store, -1)?;
            }
            KeyCode::Enter | KeyCode::Char('l') if self.view == View::KanbanBoard => {
                self.board.move_selected(&mut self.store, 1)?;
            }
            _ => {}
        }
        Ok(true)
    }

    fn open_prompt(&mut self, prompt: Prompt, initial: String) {
        self.prompt = Some((prompt, initial));
    }

    /// Ask for `field` of task `id`, prefilled with its current value.
    fn open_edit(&mut self, id: String, field: TaskField) {
        if let Some(task) = self.store.get(&id) {
            let current = field.current(&task);
            self.open_prompt(Prompt::Edit(id, field), current);
        }
    }

    fn open_comment_edit(&mut self, id: String) {
        let Some(comments) = self.store.comments(&id) else {
            return;
        };
        match comments.as_slice() {
            [] => self.message = Some("No comments to edit".to_string()),
            [only] => {
                let text = only.text.clone();
                self.open_prompt(Prompt::EditComment(id, 0), text);
            }
            _ => self.open_prompt(Prompt::CommentNumber(id), String::new()),
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some((prompt, buffer)) = self.prompt.as_mut() else {
            return Ok(());
        };

        if let Prompt::ConfirmDelete(id) = prompt {
            let id = id.clone();
            self.prompt = None;
            let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
            if confirmed && self.store.delete(&id)? {
                self.message = Some("Task deleted".to_string());
                self.select(0);
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Enter => {
                if let Some((prompt, buffer)) = self.prompt.take() {
                    self.submit_prompt(prompt, buffer.trim())?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn submit_prompt(&mut self, prompt: Prompt, value: &str) -> Result<()> {
        // Only the edit form gives a blank answer a meaning.
        if value.is_empty() && !matches!(prompt, Prompt::Edit(_, _)) {
            return Ok(());
        }
        match prompt {
            Prompt::AddTitle => {
                let status = match self.view {
                    View::KanbanBoard => self.board.selected_column(),
                    View::TaskList => Status::ToDo,
                };
                let input = TaskInput::new(value)
                    .with_status(status)
                    .with_due_date(next_sunday(Local::now().date_naive()));
                let task = self.store.create(input)?;
                self.message = Some(format!("Added '{}'", task.title));
            }
            Prompt::Edit(id, field) => {
                match field.patch(id.clone(), value) {
                    Ok(patch) if patch.is_empty() => {}
                    Ok(patch) => {
                        self.store.update(patch)?;
                    }
                    Err(problem) => self.message = Some(problem),
                }
                match field.next() {
                    Some(next) => self.open_edit(id, next),
                    None if self.message.is_none() => {
                        self.message = Some("Task updated".to_string());
                    }
                    None => {}
                }
            }
            Prompt::Comment(id) => {
                if self.store.add_comment(&id, value)?.is_some() {
                    self.message = Some("Comment added".to_string());
                }
            }
            Prompt::CommentNumber(id) => {
                let comments = self.store.comments(&id).unwrap_or_default();
                let picked = value
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| comments.get(index).map(|c| (index, c.text.clone())));
                match picked {
                    Some((index, text)) => self.open_prompt(Prompt::EditComment(id, index), text),
                    None => self.message = Some(format!("No comment #{value}")),
                }
            }
            Prompt::EditComment(id, index) => match self.store.edit_comment(&id, index, value) {
                Ok(_) => self.message = Some("Comment updated".to_string()),
                Err(err) if err.is_not_found() => self.message = Some(err.to_string()),
                Err(err) => return Err(err),
            },
            Prompt::ImportPath => {
                let path = PathBuf::from(value);
                match csv_import::import_file(&mut self.store, &path) {
                    Ok(summary) => {
                        info!(path = %path.display(), %summary, "imported csv");
                        self.message = Some(format!("CSV imported successfully! {summary}"));
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "csv import failed");
                        self.message = Some(format!("Import failed: {err}"));
                    }
                }
            }
            Prompt::ConfirmDelete(_) => {}
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if self.view != View::KanbanBoard || self.prompt.is_some() {
            return Ok(());
        }
        let (x, y) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.board.pointer_down(&self.layout, x, y);
            }
            MouseEventKind::Drag(MouseButton::Left) => self.board.pointer_move(&self.layout, x, y),
            MouseEventKind::Up(MouseButton::Left) => {
                let outcome = self.board.pointer_up(&mut self.store, &self.layout, x, y)?;
                if let DropOutcome::Moved { from, to, .. } = outcome {
                    if from != to {
                        self.message = Some(format!("Moved from {from} to {to}"));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

pub fn run_app<B: Backend, S: Storage>(terminal: &mut Terminal<B>, app: &mut App<S>) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if !app.handle_key(key)? {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse)?,
            _ => {}
        }
    }
}

fn draw<S: Storage>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let selected = match app.view {
        View::TaskList => 0,
        View::KanbanBoard => 1,
    };
    let tabs = Tabs::new(vec![View::TaskList.title(), View::KanbanBoard.title()])
        .select(selected)
        .block(Block::default().title("Taskboard").borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    match app.view {
        View::TaskList => draw_list(f, app, chunks[1]),
        View::KanbanBoard => draw_board(f, app, chunks[1]),
    }

    draw_footer(f, app, chunks[2]);
}

fn draw_list<S: Storage>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let tasks = app.store.list();
    if tasks.is_empty() {
        let empty = Paragraph::new("No tasks yet. Add a new task to get started!")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let items: Vec<ListItem> = tasks
        .iter()
        .map(|t| {
            ListItem::new(Line::from(vec![
                Span::styled(t.title.clone(), Style::default().fg(Color::White)),
                Span::raw(format!("  {}", due_label(t))),
                Span::styled(format!("  [{}]", t.status), status_style(t.status)),
                Span::raw(format!("  {}", estimate_label(t, "No estimate"))),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().title("Tasks").borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
    f.render_stateful_widget(list, chunks[0], &mut app.list_state);

    let selected = app
        .list_state
        .selected()
        .and_then(|i| tasks.get(i))
        .or_else(|| tasks.last());
    if let Some(task) = selected {
        f.render_widget(task_details(task), chunks[1]);
    }
}

fn task_details(task: &Task) -> Paragraph<'_> {
    let mut lines = vec![
        Line::from(Span::styled(
            task.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(task.description.as_deref().unwrap_or("")),
        Line::from(""),
        Line::from(format!("Due: {}", due_label(task))),
        Line::from(format!("Estimate: {}", estimate_label(task, "No estimate"))),
        Line::from(format!("Status: {}", task.status)),
        Line::from(""),
        Line::from(Span::styled("Comments", Style::default().add_modifier(Modifier::UNDERLINED))),
    ];
    if task.comments.is_empty() {
        lines.push(Line::from("No comments yet."));
    }
    for (number, comment) in task.comments.iter().enumerate() {
        lines.push(Line::from(Span::styled(
            format!("#{} {}", number + 1, comment.date.format("%Y-%m-%d %H:%M")),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(comment.text.as_str()));
    }
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Details").borders(Borders::ALL))
}

fn draw_board<S: Storage>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let tasks = app.store.list();
    let columns = app.board.preview(&tasks);
    let dragged = app.board.state().task_id().map(str::to_string);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, Status::ALL.len() as u32); Status::ALL.len()])
        .split(area);

    let mut layout = BoardLayout::default();
    for (i, (status, column_tasks)) in columns.iter().enumerate() {
        let column_area = chunks[i];
        let selected_column = app.board.selected_status == i;
        let block = Block::default()
            .title(format!("{} ({})", status, column_tasks.len()))
            .borders(Borders::ALL)
            .border_style(if selected_column {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            });
        let inner = block.inner(column_area);
        f.render_widget(block, column_area);

        let mut cards = Vec::new();
        for (row, task) in column_tasks.iter().enumerate() {
            let top = inner.y + row as u16 * CARD_HEIGHT;
            if top + CARD_HEIGHT > inner.y + inner.height {
                break;
            }
            let card_area = Rect::new(inner.x, top, inner.width, CARD_HEIGHT);
            let highlighted = dragged.as_deref() == Some(task.id.as_str())
                || (dragged.is_none() && selected_column && app.board.selected_task == row);
            f.render_widget(card(task, highlighted), card_area);
            cards.push(CardLayout {
                task_id: task.id.clone(),
                area: card_area,
            });
        }

        layout.columns.push(ColumnLayout {
            status: *status,
            area: column_area,
            cards,
        });
    }
    app.layout = layout;
}

fn card(task: &Task, highlighted: bool) -> Paragraph<'_> {
    let border = if highlighted {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let lines = vec![
        Line::from(truncate(task.description.as_deref().unwrap_or(""), DESCRIPTION_PREVIEW)),
        Line::from(format!("{}  {}", due_label(task), estimate_label(task, "N/A"))),
    ];
    Paragraph::new(lines).block(
        Block::default()
            .title(task.title.as_str())
            .borders(Borders::ALL)
            .border_style(border),
    )
}

fn draw_footer<S: Storage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let line = if let Some((prompt, buffer)) = &app.prompt {
        Line::from(vec![
            Span::styled(format!("{}: ", prompt.label()), Style::default().fg(Color::Cyan)),
            Span::raw(buffer.as_str()),
        ])
    } else if let Some(message) = &app.message {
        Line::from(Span::styled(message.as_str(), Style::default().fg(Color::Green)))
    } else {
        let help = match app.view {
            View::TaskList => {
                "Tab board  a add  e edit  d delete  c comment  C edit comment  i import  q quit"
            }
            View::KanbanBoard => {
                "Tab list  drag cards  \u{2190}\u{2192} column  h/l move  a add  c comment  q quit"
            }
        };
        Line::from(Span::styled(help, Style::default().fg(Color::DarkGray)))
    };
    f.render_widget(Paragraph::new(line), area);
}

fn status_style(status: Status) -> Style {
    let color = match status {
        Status::ToDo => Color::Gray,
        Status::InProgress => Color::Yellow,
        Status::Review => Color::Magenta,
        Status::Done => Color::Green,
    };
    Style::default().fg(color)
}

fn due_label(task: &Task) -> String {
    task.due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "No due date".to_string())
}

fn estimate_label(task: &Task, none: &str) -> String {
    task.time_estimate
        .map(|h| format!("{h}h"))
        .unwrap_or_else(|| none.to_string())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use taskboard::storage::MemoryStorage;

    fn app_with_tasks() -> App<MemoryStorage> {
        let mut store = TaskStore::new(MemoryStorage::new());
        store.create(TaskInput::new("alpha")).unwrap();
        store
            .create(TaskInput::new("beta").with_status(Status::Done))
            .unwrap();
        App::new(store)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 50), "short");
        assert_eq!(truncate(&"x".repeat(60), 50), format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn test_tab_switches_and_persists_view() {
        let mut app = app_with_tasks();
        assert_eq!(app.view, View::TaskList);
        app.handle_key(key(KeyCode::Tab)).unwrap();
        assert_eq!(app.view, View::KanbanBoard);
        assert_eq!(view::load_active_view(app.store.storage()), View::KanbanBoard);
    }

    #[test]
    fn test_add_via_prompt() {
        let mut app = app_with_tasks();
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        for c in "gamma".chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.prompt.is_none());
        assert_eq!(app.store.list().last().unwrap().title, "gamma");
    }

    /// Replace whatever the open prompt holds with `text` and press Enter.
    fn answer(app: &mut App<MemoryStorage>, text: &str) {
        app.prompt.as_mut().expect("prompt open").1 = text.to_string();
        app.handle_key(key(KeyCode::Enter)).unwrap();
    }

    #[test]
    fn test_added_task_defaults_due_to_next_sunday() {
        let mut app = app_with_tasks();
        app.handle_key(key(KeyCode::Char('a'))).unwrap();
        answer(&mut app, "gamma");
        let added = app.store.list().pop().unwrap();
        assert_eq!(added.due_date, Some(next_sunday(Local::now().date_naive())));
    }

    #[test]
    fn test_edit_form_steps_through_every_field() {
        let mut app = app_with_tasks();
        let id = app.store.list()[0].id.clone();

        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        assert_eq!(
            app.prompt,
            Some((Prompt::Edit(id.clone(), TaskField::Title), "alpha".to_string()))
        );
        answer(&mut app, "alpha v2");
        answer(&mut app, "now with words");
        answer(&mut app, "2024-06-01");
        answer(&mut app, "2.5");
        assert_eq!(
            app.prompt,
            Some((Prompt::Edit(id.clone(), TaskField::Status), "To Do".to_string()))
        );
        answer(&mut app, "review");
        assert!(app.prompt.is_none());

        let task = app.store.get(&id).unwrap();
        assert_eq!(task.title, "alpha v2");
        assert_eq!(task.description.as_deref(), Some("now with words"));
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(task.time_estimate, Some(2.5));
        assert_eq!(task.status, Status::Review);
    }

    #[test]
    fn test_edit_form_blank_clears_optional_fields() {
        let mut store = TaskStore::new(MemoryStorage::new());
        let input = TaskInput::new("full")
            .with_description("words")
            .with_due_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .with_time_estimate(4.0)
            .with_status(Status::InProgress);
        let id = store.create(input).unwrap().id;
        let mut app = App::new(store);

        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        for _ in 0..5 {
            answer(&mut app, "");
        }

        let task = app.store.get(&id).unwrap();
        assert_eq!(task.title, "full");
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.time_estimate, None);
        assert_eq!(task.status, Status::InProgress);
    }

    #[test]
    fn test_edit_form_rejects_bad_date_and_keeps_going() {
        let mut app = app_with_tasks();
        let id = app.store.list()[0].id.clone();

        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        answer(&mut app, "alpha");
        answer(&mut app, "");
        answer(&mut app, "next week");
        assert_eq!(
            app.prompt.as_ref().map(|(p, _)| p.clone()),
            Some(Prompt::Edit(id.clone(), TaskField::Estimate))
        );
        app.handle_key(key(KeyCode::Esc)).unwrap();

        assert!(app.message.as_deref().unwrap().contains("next week"));
        assert_eq!(app.store.get(&id).unwrap().due_date, None);
    }

    #[test]
    fn test_edit_single_comment() {
        let mut app = app_with_tasks();
        let id = app.store.list()[0].id.clone();
        app.store.add_comment(&id, "typo").unwrap();

        app.handle_key(key(KeyCode::Char('C'))).unwrap();
        assert_eq!(
            app.prompt,
            Some((Prompt::EditComment(id.clone(), 0), "typo".to_string()))
        );
        answer(&mut app, "fixed");
        assert_eq!(app.store.comments(&id).unwrap()[0].text, "fixed");
    }

    #[test]
    fn test_edit_comment_by_number() {
        let mut app = app_with_tasks();
        let id = app.store.list()[0].id.clone();
        app.store.add_comment(&id, "first").unwrap();
        app.store.add_comment(&id, "second").unwrap();

        app.handle_key(key(KeyCode::Char('C'))).unwrap();
        answer(&mut app, "3");
        assert!(app.prompt.is_none());
        assert_eq!(app.message.as_deref(), Some("No comment #3"));

        app.handle_key(key(KeyCode::Char('C'))).unwrap();
        answer(&mut app, "2");
        assert_eq!(
            app.prompt,
            Some((Prompt::EditComment(id.clone(), 1), "second".to_string()))
        );
        answer(&mut app, "second, revised");

        let texts: Vec<_> = app
            .store
            .comments(&id)
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["first", "second, revised"]);
    }

    #[test]
    fn test_edit_comment_without_comments_says_so() {
        let mut app = app_with_tasks();
        app.handle_key(key(KeyCode::Char('C'))).unwrap();
        assert!(app.prompt.is_none());
        assert_eq!(app.message.as_deref(), Some("No comments to edit"));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = app_with_tasks();
        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        app.handle_key(key(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.store.list().len(), 2);

        app.handle_key(key(KeyCode::Char('d'))).unwrap();
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert_eq!(app.store.list().len(), 1);
    }

    #[test]
    fn test_mouse_drag_moves_card_between_columns() {
        let mut app = app_with_tasks();
        app.handle_key(key(KeyCode::Tab)).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let card = app.layout.columns[0].cards[0].area;
        let done = app.layout.columns[3].area;
        let mouse = |kind, column, row| MouseEvent {
            kind,
            column,
            row,
            modifiers: crossterm::event::KeyModifiers::NONE,
        };

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), card.x + 1, card.y + 1))
            .unwrap();
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), done.x + 2, done.y + 10))
            .unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), done.x + 2, done.y + 10))
            .unwrap();

        assert!(app.store.list().iter().all(|t| t.status == Status::Done));
        assert!(!app.board.is_dragging());
    }
}
