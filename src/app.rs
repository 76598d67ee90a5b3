use std::mem;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{Local, Utc};
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;

use crate::board::filter::{self, FilteredView};
use crate::board::{layout, ActiveView, Board, Task};
use crate::config::Config;
use crate::editor::{self, EditorSession, Reconciliation};
use crate::input::action::Action;
use crate::input::keymap::map_key;
use crate::remote::TaskService;

/// Lines a PageUp/PageDown moves the detail view.
const DETAIL_PAGE: u16 = 10;

/// Reusable text editing buffer with cursor.
///
/// `cursor` is a **char index** (not byte index), always in `0..=char_count`.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    pub input: String,
    pub cursor: usize,
}

impl TextBuffer {
    pub fn empty() -> Self {
        Self {
            input: String::new(),
            cursor: 0,
        }
    }

    /// Convert a char index to a byte index.
    fn byte_offset(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn insert(&mut self, c: char) {
        let byte_idx = self.byte_offset(self.cursor);
        self.input.insert(byte_idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_idx = self.byte_offset(self.cursor - 1);
            self.input.remove(byte_idx);
            self.cursor -= 1;
        }
    }

    pub fn delete_word(&mut self) {
        let byte_pos = self.byte_offset(self.cursor);
        let before = &self.input[..byte_pos];
        let trimmed = before.trim_end();
        let start_byte = trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let start_char = self.input[..start_byte].chars().count();
        self.input.drain(start_byte..byte_pos);
        self.cursor = start_char;
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.input.chars().count();
    }
}

/// Current interaction mode. Exactly one is active; key dispatch and overlay
/// rendering both follow it, so illegal combinations (Detail and Search at
/// once, say) cannot be represented.
#[derive(Debug, Clone)]
pub enum Mode {
    Board,
    Detail { scroll: u16 },
    Search { buf: TextBuffer },
    /// The external editor owns the terminal; no key reaches us.
    EditorSuspended,
}

/// Notification severity for statusbar coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// An active search: the query and the grouped view derived from it.
#[derive(Debug, Clone)]
pub struct Search {
    pub query: String,
    pub view: FilteredView,
}

/// Content shown in the detail overlay, captured when it was opened.
#[derive(Debug, Clone)]
pub struct DetailState {
    pub task: Task,
    pub body: String,
}

/// Global application state.
pub struct AppState {
    pub mode: Mode,
    /// Status label of the selected column; `None` while the active view is
    /// empty (selection suspended).
    pub selected_status: Option<String>,
    pub selected_row: usize,
    /// Index of the leftmost visible status column.
    pub column_offset: usize,
    pub search: Option<Search>,
    pub detail: Option<DetailState>,
    pub notification: Option<String>,
    pub notification_level: NotificationLevel,
    pub notification_expires: Option<Instant>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            mode: Mode::Board,
            selected_status: None,
            selected_row: 0,
            column_offset: 0,
            search: None,
            detail: None,
            notification: None,
            notification_level: NotificationLevel::Info,
            notification_expires: None,
            should_quit: false,
        }
    }

    /// The grouped view selection currently addresses: filtered while a
    /// search is active, canonical otherwise.
    pub fn active_view<'a>(&'a self, board: &'a Board) -> ActiveView<'a> {
        match &self.search {
            Some(search) => ActiveView::Filtered(board, &search.view),
            None => ActiveView::Full(board),
        }
    }

    /// Resolve the current selection to a task in the active view.
    pub fn selected_task<'a>(&'a self, board: &'a Board) -> Option<&'a Task> {
        let status = self.selected_status.as_deref()?;
        self.active_view(board).task(status, self.selected_row)
    }

    /// Show a transient notification.
    pub fn notify(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Info;
        self.notification_expires = Some(Instant::now() + Duration::from_secs(3));
    }

    /// Show a transient error notification (rendered in red).
    pub fn notify_error(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Error;
        self.notification_expires = Some(Instant::now() + Duration::from_secs(3));
    }

    /// Clear expired notifications.
    pub fn tick_notification(&mut self) {
        if let Some(expires) = self.notification_expires {
            if Instant::now() >= expires {
                self.notification = None;
                self.notification_level = NotificationLevel::Info;
                self.notification_expires = None;
            }
        }
    }

    /// Scroll the column window so the column at `idx` is visible.
    fn scroll_into_view(&mut self, idx: usize, max_visible: usize) {
        if idx < self.column_offset {
            self.column_offset = idx;
        } else if idx >= self.column_offset + max_visible {
            self.column_offset = idx - max_visible + 1;
        }
    }

    /// Re-validate selection and scroll offset against the active view.
    ///
    /// Runs after anything that can change the view: a load, a filter edit,
    /// entering or leaving search. An empty view suspends selection; a
    /// vanished status resets to the first column; a shortened column clamps
    /// the row.
    pub fn validate_selection(&mut self, board: &Board) {
        let (statuses, selected_len) = {
            let view = self.active_view(board);
            let statuses: Vec<String> = view.statuses().iter().map(|s| s.to_string()).collect();
            let len = self
                .selected_status
                .as_deref()
                .and_then(|s| view.group_len(s));
            (statuses, len)
        };

        if statuses.is_empty() {
            self.selected_status = None;
            self.selected_row = 0;
            self.column_offset = 0;
            return;
        }

        match selected_len {
            None => {
                self.selected_status = Some(statuses[0].clone());
                self.selected_row = 0;
            }
            Some(len) => {
                if self.selected_row >= len {
                    self.selected_row = len.saturating_sub(1);
                }
            }
        }

        let max_visible = layout::for_status_count(statuses.len()).max_visible;
        self.column_offset = self
            .column_offset
            .min(layout::max_offset(statuses.len(), max_visible));
        if let Some(idx) = self
            .selected_status
            .as_deref()
            .and_then(|s| statuses.iter().position(|x| x == s))
        {
            self.scroll_into_view(idx, max_visible);
        }
    }
}

/// Main TUI application loop.
pub fn run<S: TaskService>(
    terminal: &mut DefaultTerminal,
    service: &S,
    config: &Config,
) -> color_eyre::Result<()> {
    let mut board = Board::default();
    let mut state = AppState::new();

    load_tasks(service, &mut board, &mut state);

    loop {
        state.tick_notification();

        let today = Local::now().date_naive();
        terminal.draw(|f| crate::ui::render(f, &board, &mut state, today))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                let action = map_key(key, &state.mode);
                process_action(
                    &mut board,
                    &mut state,
                    action,
                    terminal,
                    service,
                    &config.editor,
                )?;

                if state.should_quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn process_action<S: TaskService, B: ratatui::backend::Backend>(
    board: &mut Board,
    state: &mut AppState,
    action: Action,
    terminal: &mut ratatui::Terminal<B>,
    service: &S,
    editor_cmd: &str,
) -> color_eyre::Result<()> {
    match action {
        Action::None => {}

        // Navigation
        Action::FocusPrevColumn
        | Action::FocusNextColumn
        | Action::SelectPrevTask
        | Action::SelectNextTask => handle_navigation(board, state, action),

        // Board
        Action::Refresh => load_tasks(service, board, state),
        Action::OpenDetail => open_detail(board, state, service),
        Action::OpenInBrowser => open_in_browser(board, state),
        Action::EditTask => edit_selected_task(board, state, service, terminal, editor_cmd)?,
        Action::StartSearch => {
            state.mode = Mode::Search {
                buf: TextBuffer::empty(),
            };
        }
        Action::ClearFilterOrQuit => {
            if state.search.is_some() {
                state.search = None;
                state.validate_selection(board);
                state.notify("Filter cleared");
            } else {
                state.should_quit = true;
            }
        }
        Action::Quit => state.should_quit = true,

        // Detail panel
        Action::CloseDetail => {
            state.detail = None;
            state.mode = Mode::Board;
        }
        Action::DetailScrollUp
        | Action::DetailScrollDown
        | Action::DetailPageUp
        | Action::DetailPageDown => handle_detail_scroll(state, action),

        // Search input
        Action::InputChar(_)
        | Action::InputBackspace
        | Action::InputLeft
        | Action::InputRight
        | Action::InputHome
        | Action::InputEnd
        | Action::InputDeleteWord
        | Action::InputConfirm
        | Action::InputCancel => handle_search_input(board, state, action),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Handler: Navigation (column focus, row selection)
// ---------------------------------------------------------------------------

fn handle_navigation(board: &Board, state: &mut AppState, action: Action) {
    match action {
        Action::FocusPrevColumn => move_column(board, state, -1),
        Action::FocusNextColumn => move_column(board, state, 1),
        Action::SelectPrevTask => move_row(board, state, -1),
        Action::SelectNextTask => move_row(board, state, 1),
        _ => unreachable!(),
    }
}

/// Step to an adjacent status column, clamped at the edges (no wraparound).
/// A column change resets the row and drags the scroll window along.
fn move_column(board: &Board, state: &mut AppState, dir: i64) {
    let (statuses, max_visible) = {
        let view = state.active_view(board);
        let statuses: Vec<String> = view.statuses().iter().map(|s| s.to_string()).collect();
        let max_visible = layout::for_status_count(statuses.len()).max_visible;
        (statuses, max_visible)
    };
    if statuses.is_empty() {
        return;
    }

    let cur = state
        .selected_status
        .as_deref()
        .and_then(|s| statuses.iter().position(|x| x == s))
        .unwrap_or(0);
    let candidate = if dir < 0 {
        cur.saturating_sub(1)
    } else {
        (cur + 1).min(statuses.len() - 1)
    };

    if state.selected_status.as_deref() != Some(statuses[candidate].as_str()) {
        state.selected_status = Some(statuses[candidate].clone());
        state.selected_row = 0;
    }
    state.scroll_into_view(candidate, max_visible);
}

/// Step up or down within the current column, clamped at the ends.
fn move_row(board: &Board, state: &mut AppState, dir: i64) {
    let Some(status) = state.selected_status.clone() else {
        return;
    };
    let Some(len) = state.active_view(board).group_len(&status) else {
        return;
    };
    if len == 0 {
        return;
    }
    state.selected_row = if dir < 0 {
        state.selected_row.saturating_sub(1)
    } else {
        (state.selected_row + 1).min(len - 1)
    };
}

// ---------------------------------------------------------------------------
// Handler: Search input
// ---------------------------------------------------------------------------

fn handle_search_input(board: &Board, state: &mut AppState, action: Action) {
    match action {
        Action::InputConfirm => {
            // Submitting consumes this keypress; the filter itself is
            // already live from the last edit.
            if let Mode::Search { buf } = &state.mode {
                if buf.input.trim().is_empty() {
                    state.search = None;
                }
            }
            state.mode = Mode::Board;
            state.validate_selection(board);
        }
        Action::InputCancel => {
            let had_filter = state.search.is_some();
            state.search = None;
            state.mode = Mode::Board;
            state.validate_selection(board);
            if had_filter {
                state.notify("Filter cleared");
            }
        }
        _ => {
            if let Mode::Search { buf } = &mut state.mode {
                match action {
                    Action::InputChar(c) => buf.insert(c),
                    Action::InputBackspace => buf.backspace(),
                    Action::InputDeleteWord => buf.delete_word(),
                    Action::InputLeft => buf.move_left(),
                    Action::InputRight => buf.move_right(),
                    Action::InputHome => buf.home(),
                    Action::InputEnd => buf.end(),
                    _ => {}
                }
            }
            sync_search(board, state);
        }
    }
}

/// Derive `search` from the query buffer. A blank query clears the filter
/// rather than matching everything.
fn sync_search(board: &Board, state: &mut AppState) {
    if let Mode::Search { buf } = &state.mode {
        let query = buf.input.clone();
        state.search = if query.trim().is_empty() {
            None
        } else {
            Some(Search {
                view: filter::filter(board, &query),
                query,
            })
        };
    }
    state.validate_selection(board);
}

// ---------------------------------------------------------------------------
// Handler: Remote load
// ---------------------------------------------------------------------------

/// Replace the canonical board with a fresh fetch. On failure the previous
/// board (and selection) stay untouched.
fn load_tasks<S: TaskService>(service: &S, board: &mut Board, state: &mut AppState) {
    match service.fetch_tasks() {
        Ok(tasks) => {
            *board = Board::from_tasks(tasks);
            if let Some(search) = &mut state.search {
                search.view = filter::filter(board, &search.query);
            }
            state.validate_selection(board);
            state.notify(format!(
                "Loaded {} tasks across {} statuses",
                board.total_tasks(),
                board.groups.len()
            ));
        }
        Err(e) => state.notify_error(format!("Could not load tasks: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Handler: Detail view
// ---------------------------------------------------------------------------

/// Fetch the selected task's body and open the detail overlay. The fetch
/// blocks the modal transition, nothing else; on failure the board state is
/// left exactly as it was.
fn open_detail<S: TaskService>(board: &Board, state: &mut AppState, service: &S) {
    let Some(task) = state.selected_task(board).cloned() else {
        return;
    };
    match service.fetch_body(&task.id) {
        Ok(body) => {
            state.notify(format!("Viewing: {}", task.title));
            state.detail = Some(DetailState { task, body });
            state.mode = Mode::Detail { scroll: 0 };
        }
        Err(e) => state.notify_error(format!("Could not fetch task content: {e}")),
    }
}

fn handle_detail_scroll(state: &mut AppState, action: Action) {
    if let Mode::Detail { scroll } = &mut state.mode {
        // The upper bound depends on the rendered height; the renderer
        // clamps on the next draw.
        *scroll = match action {
            Action::DetailScrollUp => scroll.saturating_sub(1),
            Action::DetailScrollDown => scroll.saturating_add(1),
            Action::DetailPageUp => scroll.saturating_sub(DETAIL_PAGE),
            Action::DetailPageDown => scroll.saturating_add(DETAIL_PAGE),
            _ => *scroll,
        };
    }
}

// ---------------------------------------------------------------------------
// Handler: Browser
// ---------------------------------------------------------------------------

fn open_in_browser(board: &Board, state: &mut AppState) {
    let Some((url, title)) = state
        .selected_task(board)
        .map(|t| (t.url.clone(), t.title.clone()))
    else {
        return;
    };
    if url.is_empty() {
        return;
    }
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    match std::process::Command::new(opener)
        .arg(&url)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
    {
        Ok(_) => state.notify(format!("Opened in browser: {title}")),
        Err(e) => state.notify_error(format!("Could not open browser: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Handler: Editor session
// ---------------------------------------------------------------------------

/// Run the full editor handoff for the selected task:
/// fetch body → materialize → suspend terminal → editor → reconcile.
fn edit_selected_task<S: TaskService, B: ratatui::backend::Backend>(
    board: &Board,
    state: &mut AppState,
    service: &S,
    terminal: &mut ratatui::Terminal<B>,
    editor_cmd: &str,
) -> color_eyre::Result<()> {
    let Some(task) = state.selected_task(board).cloned() else {
        return Ok(());
    };

    // Preparing
    let body = match service.fetch_body(&task.id) {
        Ok(body) => body,
        Err(e) => {
            state.notify_error(format!("Could not fetch content for editing: {e}"));
            return Ok(());
        }
    };
    let session = match editor::prepare(&task, &body) {
        Ok(session) => session,
        Err(e) => {
            state.notify_error(format!("Could not write edit file: {e}"));
            return Ok(());
        }
    };

    // Suspended: the child owns the terminal until it exits; the event loop
    // is deliberately blocked the whole time.
    let return_mode = mem::replace(&mut state.mode, Mode::EditorSuspended);
    let status = editor::run_editor(editor_cmd, &session.temp_path);

    // Reconciling: raw mode and the alternate screen are already restored by
    // the suspension guard; repaint whatever the child left behind.
    terminal.clear()?;
    state.mode = return_mode;

    match status {
        Err(e) => {
            editor::cleanup(&session);
            state.notify_error(format!("Could not launch editor '{editor_cmd}': {e}"));
        }
        Ok(status) if !status.success() => {
            editor::cleanup(&session);
            state.notify("Editor closed without saving");
        }
        Ok(_) => {
            match std::fs::read_to_string(&session.temp_path) {
                Ok(edited) => {
                    reconcile_edit(state, service, &session, &edited, Path::new("."));
                }
                Err(e) => {
                    state.notify_error(format!("Could not read edited file: {e}"));
                }
            }
            editor::cleanup(&session);
        }
    }

    Ok(())
}

/// Decide what the finished edit means and push it to the remote if needed.
///
/// Unchanged text never issues an update; changed text issues exactly one.
/// A successful update gets a local backup file and refreshes the detail
/// view when it is open on the same task; a rejected update gets a failure
/// record, so the edit is never silently lost.
fn reconcile_edit<S: TaskService>(
    state: &mut AppState,
    service: &S,
    session: &EditorSession,
    edited: &str,
    backup_dir: &Path,
) {
    match editor::reconcile(edited, &session.snapshot) {
        Reconciliation::Malformed => {
            state.notify("No content section found (missing --- separator); changes discarded");
        }
        Reconciliation::Unchanged => {
            state.notify("No changes detected");
        }
        Reconciliation::Changed(new_body) => match service.update_body(&session.task_id, &new_body)
        {
            Ok(()) => {
                let now = Utc::now();
                match editor::write_backup(backup_dir, session, &new_body, now) {
                    Ok(path) => state.notify(format!(
                        "Content updated. Backup saved: {}",
                        path.display()
                    )),
                    Err(e) => state.notify(format!("Content updated (backup failed: {e})")),
                }
                if let Some(detail) = state.detail.as_mut() {
                    if detail.task.id == session.task_id {
                        // Refresh the open detail view in place; keep the old
                        // body if the re-fetch fails.
                        if let Ok(body) = service.fetch_body(&session.task_id) {
                            detail.body = body;
                        }
                    }
                }
            }
            Err(e) => {
                let now = Utc::now();
                match editor::write_failure_record(backup_dir, session, &new_body, &e.to_string(), now)
                {
                    Ok(path) => state.notify_error(format!(
                        "Update failed: {e}. Edit saved to {}",
                        path.display()
                    )),
                    Err(we) => state.notify_error(format!(
                        "Update failed: {e}; saving the edit locally also failed: {we}"
                    )),
                }
            }
        },
    }
}
