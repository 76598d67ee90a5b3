use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::AppState;
use crate::board::{layout, Board, Task};

pub fn render_board(f: &mut Frame, area: Rect, board: &Board, state: &AppState) {
    let view = state.active_view(board);
    if view.is_empty() {
        let msg = if state.search.is_some() {
            "No tasks match the filter. Esc clears it."
        } else {
            "No tasks found. Press r to refresh."
        };
        f.render_widget(Paragraph::new(msg).style(Theme::dim_style()), area);
        return;
    }

    let statuses = view.statuses();
    let grid = layout::for_status_count(statuses.len());
    let start = state
        .column_offset
        .min(layout::max_offset(statuses.len(), grid.max_visible));
    let end = (start + grid.max_visible).min(statuses.len());
    let visible = &statuses[start..end];
    let widths = grid.visible_widths(visible.len());

    let constraints: Vec<Constraint> = widths
        .iter()
        .map(|&w| Constraint::Ratio(w as u32, layout::GRID_WIDTH as u32))
        .collect();
    let col_areas = Layout::horizontal(constraints).split(area);

    for (i, (&status, &units)) in visible.iter().zip(widths.iter()).enumerate() {
        let tasks = view.group(status);
        let is_focused = state.selected_status.as_deref() == Some(status);
        render_column(
            f,
            col_areas[i],
            status,
            &tasks,
            units,
            is_focused,
            state.selected_row,
        );
    }
}

fn render_column(
    f: &mut Frame,
    area: Rect,
    status: &str,
    tasks: &[&Task],
    units: u16,
    is_focused: bool,
    selected_row: usize,
) {
    let border_color = if is_focused {
        Theme::COLUMN_FOCUSED_BORDER
    } else {
        Theme::COLUMN_BORDER
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {status} ({}) ", tasks.len()));

    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let rows = inner.height as usize;
    // Keep the selected row inside the viewport.
    let scroll = if is_focused && selected_row >= rows {
        selected_row - rows + 1
    } else {
        0
    };

    let budget = layout::char_budget(units);
    let lines: Vec<Line> = tasks
        .iter()
        .enumerate()
        .skip(scroll)
        .take(rows)
        .map(|(row, task)| {
            let mut line = task_line(task, units, budget);
            if is_focused && row == selected_row {
                line = line.style(Theme::selected_style());
            }
            line
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);

    if tasks.len() > rows {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        let mut scrollbar_state = ScrollbarState::new(tasks.len()).position(scroll);
        f.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

/// One board row: optional priority badge plus the hard-truncated title.
pub(crate) fn task_line(task: &Task, units: u16, budget: usize) -> Line<'static> {
    // The badge only appears in columns wide enough to afford its cells.
    let badge = if units >= 2 {
        task.priority.as_deref().and_then(badge_letter)
    } else {
        None
    };

    let reserved = if badge.is_some() {
        layout::BADGE_CELLS
    } else {
        0
    };
    let title = truncate_title(&task.title, budget.saturating_sub(reserved));

    match (badge, task.priority.as_deref()) {
        (Some(letter), Some(priority)) => Line::from(vec![
            Span::styled(
                format!("[{letter}] "),
                Style::default().fg(Theme::priority_color(priority)),
            ),
            Span::raw(title),
        ]),
        _ => Line::from(title),
    }
}

/// First letter of the priority label, uppercased.
pub(crate) fn badge_letter(priority: &str) -> Option<char> {
    priority.chars().next().and_then(|c| c.to_uppercase().next())
}

/// Hard cut at `max_cells` display cells, no ellipsis. A zero budget means
/// the estimate broke down; the title is left alone rather than blanked.
pub(crate) fn truncate_title(title: &str, max_cells: usize) -> String {
    if max_cells == 0 || title.width() <= max_cells {
        return title.to_string();
    }
    title
        .graphemes(true)
        .scan(0usize, |cells, g| {
            *cells += g.width();
            (*cells <= max_cells).then_some(g)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_task;

    #[test]
    fn truncate_cuts_hard_with_no_ellipsis() {
        assert_eq!(truncate_title("abcdefgh", 5), "abcde");
        assert_eq!(truncate_title("abc", 5), "abc");
        assert_eq!(truncate_title("abcde", 5), "abcde");
    }

    #[test]
    fn truncate_zero_budget_leaves_title_alone() {
        assert_eq!(truncate_title("abcdef", 0), "abcdef");
    }

    #[test]
    fn truncate_counts_display_cells_not_bytes() {
        // Each CJK glyph is two cells wide.
        assert_eq!(truncate_title("日本語のタイトル", 6), "日本語");
    }

    #[test]
    fn badge_letter_uppercases_first_char() {
        assert_eq!(badge_letter("high"), Some('H'));
        assert_eq!(badge_letter("Urgent"), Some('U'));
        assert_eq!(badge_letter(""), None);
    }

    #[test]
    fn narrow_columns_drop_the_badge() {
        let mut task = test_task("1", "a title", "Todo");
        task.priority = Some("High".to_string());
        let wide = task_line(&task, 2, 24);
        let narrow = task_line(&task, 1, 11);
        assert!(wide.spans[0].content.starts_with("[H]"));
        assert_eq!(narrow.spans.len(), 1);
        assert_eq!(narrow.spans[0].content, "a title");
    }

    #[test]
    fn badge_reserves_cells_from_the_title_budget() {
        let mut task = test_task("1", "abcdefghij", "Todo");
        task.priority = Some("Low".to_string());
        let line = task_line(&task, 2, 10);
        // 10-cell budget minus 4 reserved for "[L] " leaves 6 title cells.
        assert_eq!(line.spans[1].content, "abcdef");
    }

    #[test]
    fn no_priority_uses_full_budget() {
        let task = test_task("1", "abcdefghij", "Todo");
        let line = task_line(&task, 2, 8);
        assert_eq!(line.spans[0].content, "abcdefgh");
    }
}
