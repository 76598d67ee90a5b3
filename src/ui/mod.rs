pub mod board_view;
pub mod status_bar;
pub mod task_detail;
pub mod theme;

use chrono::NaiveDate;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::board::Board;
use theme::Theme;

const TITLE_HINTS: &str = " nokan — q quit · r refresh · ←→ columns · ↑↓ tasks · Enter details · / search · ^O browser · ^E edit · Esc close ";

/// Create a centered rect within `area` using percentage-based sizing with minimums.
pub fn centered_rect(area: Rect, w_pct: u16, h_pct: u16, min_w: u16, min_h: u16) -> Rect {
    let width = (area.width * w_pct / 100).max(min_w).min(area.width);
    let height = (area.height * h_pct / 100).max(min_h).min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

pub fn render(f: &mut Frame, board: &Board, state: &mut AppState, today: NaiveDate) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(
        Paragraph::new(TITLE_HINTS).style(Theme::title_style()),
        chunks[0],
    );

    board_view::render_board(f, chunks[1], board, state);
    status_bar::render_status_bar(f, chunks[2], state, board);

    // Detail overlay on top of the board. The scroll offset lives in the
    // mode so the clamp against the rendered height can be written back.
    let area = f.area();
    if let Mode::Detail { scroll } = &mut state.mode {
        if let Some(detail) = &state.detail {
            task_detail::render_detail(f, area, &detail.task, &detail.body, scroll, today);
        }
    }
}
