use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::{AppState, Mode, NotificationLevel};
use crate::board::{layout, Board};

pub fn render_status_bar(f: &mut Frame, area: Rect, state: &AppState, board: &Board) {
    // Search takes over the whole bar while the query is being typed.
    if let Mode::Search { buf } = &state.mode {
        let line = Line::from(vec![
            Span::styled(
                " / ",
                Style::default()
                    .fg(Theme::FG)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            ),
            Span::raw(format!(" {}", buf.input)),
            Span::raw("_"),
        ]);
        f.render_widget(Paragraph::new(line), area);
        return;
    }

    let left = build_left_zone(state);
    let right = build_right_zone(state, board);

    let left_width: usize = left.iter().map(|s| s.content.width()).sum();
    let right_width: usize = right.iter().map(|s| s.content.width()).sum();
    let center_avail = (area.width as usize).saturating_sub(left_width + right_width);
    let center = build_center_zone(state, center_avail);

    let mut spans = left;
    spans.extend(center);
    spans.extend(right);
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Left zone: mode badge plus the active filter, if any.
fn build_left_zone(state: &AppState) -> Vec<Span<'_>> {
    let mode_str = match &state.mode {
        Mode::Board => "BOARD",
        Mode::Detail { .. } => "DETAIL",
        Mode::EditorSuspended => "EDITOR",
        Mode::Search { .. } => "",
    };

    let mut spans = vec![
        Span::styled(
            format!(" {mode_str} "),
            Style::default()
                .fg(Theme::FG)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        ),
        Span::raw(" "),
    ];

    if let Some(search) = &state.search {
        spans.push(Span::styled(
            format!("/{} ", search.query),
            Style::default().fg(Theme::FG),
        ));
    }

    spans
}

/// Right zone: selection position and, when columns overflow the grid,
/// the visible column window.
fn build_right_zone<'a>(state: &'a AppState, board: &'a Board) -> Vec<Span<'a>> {
    let mut spans = Vec::new();

    let view = state.active_view(board);
    if let Some(status) = state.selected_status.as_deref() {
        if let Some(len) = view.group_len(status) {
            let pos = if len > 0 {
                format!(" {}/{len}", state.selected_row + 1)
            } else {
                " 0".to_string()
            };
            spans.push(Span::styled(
                format!("{status}[{len}]"),
                Theme::dim_style(),
            ));
            spans.push(Span::styled(pos, Style::default().fg(Theme::FG)));
        }
    }

    let total = view.status_count();
    let grid = layout::for_status_count(total);
    if total > grid.max_visible {
        let start = state
            .column_offset
            .min(layout::max_offset(total, grid.max_visible));
        let end = (start + grid.max_visible).min(total);
        let left_arrow = if start > 0 { "← " } else { "  " };
        let right_arrow = if end < total { " →" } else { "  " };
        spans.push(Span::styled(
            format!(" {left_arrow}cols {}-{end} of {total}{right_arrow}", start + 1),
            Theme::dim_style(),
        ));
    }

    spans.push(Span::raw(" "));
    spans
}

/// Center zone: transient notification, centered in the remaining width.
fn build_center_zone(state: &AppState, avail_width: usize) -> Vec<Span<'_>> {
    let Some(notif) = &state.notification else {
        return vec![Span::raw(" ".repeat(avail_width))];
    };

    let color = match state.notification_level {
        NotificationLevel::Info => Theme::FG,
        NotificationLevel::Error => Theme::STATUS_ERROR,
    };

    let notif_width = notif.width();
    if notif_width >= avail_width {
        let truncated: String = notif.chars().take(avail_width).collect();
        return vec![Span::styled(truncated, Style::default().fg(color))];
    }

    let pad_total = avail_width - notif_width;
    let pad_left = pad_total / 2;
    vec![
        Span::raw(" ".repeat(pad_left)),
        Span::styled(notif.as_str(), Style::default().fg(color)),
        Span::raw(" ".repeat(pad_total - pad_left)),
    ]
}
