use chrono::{Datelike, NaiveDate};
use ratatui::layout::{Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Clear, Padding, Paragraph, Scrollbar, ScrollbarOrientation,
    ScrollbarState, Wrap,
};
use ratatui::Frame;

use super::theme::Theme;
use crate::board::Task;

/// Recognized optional properties, resolved by first-matching alias. New
/// aliases are rows here, not code changes.
const OPTIONAL_FIELDS: &[(&str, &[&str])] = &[
    ("Bug Type", &["Bug Type", "Bug type", "Type"]),
    ("Hours", &["Hours", "# Hours", "Estimated Hours"]),
    ("Reference", &["Reference", "Ref", "Link"]),
    ("Description", &["Description", "Summary"]),
    ("Screenshot", &["Screenshot", "Screenshot URL", "Image"]),
];

/// Properties already rendered as dedicated fields (or an alias of one);
/// excluded from the trailing catch-all section.
const EXCLUDED_PROPS: &[&str] = &[
    "Status",
    "Title",
    "Name",
    "Task",
    "Priority",
    "Assignee",
    "Person",
    "Due Date",
    "Due",
    "Date",
    "Bug Type",
    "Bug type",
    "Type",
    "Hours",
    "# Hours",
    "Estimated Hours",
    "Reference",
    "Ref",
    "Link",
    "Description",
    "Summary",
    "Screenshot",
    "Screenshot URL",
    "Image",
];

pub fn render_detail(
    f: &mut Frame,
    area: Rect,
    task: &Task,
    body: &str,
    scroll: &mut u16,
    today: NaiveDate,
) {
    let panel = super::centered_rect(area, 90, 90, 40, 10);
    f.render_widget(Clear, panel);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(Theme::DETAIL_BORDER))
        .title(Span::styled(
            format!(" {} ", task.title),
            Style::default()
                .fg(Theme::DETAIL_BORDER)
                .add_modifier(Modifier::BOLD),
        ))
        .padding(Padding::new(1, 1, 0, 0));

    let inner = block.inner(panel);
    f.render_widget(block, panel);

    if inner.height == 0 {
        return;
    }

    let lines = detail_lines(task, body, today);

    let max_scroll = (lines.len() as u16).saturating_sub(inner.height);
    *scroll = (*scroll).min(max_scroll);

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((*scroll, 0));
    f.render_widget(paragraph, inner);

    if max_scroll > 0 {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        let mut scrollbar_state =
            ScrollbarState::new(max_scroll as usize + 1).position(*scroll as usize);
        f.render_stateful_widget(
            scrollbar,
            panel.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

/// The detail content in its fixed section order: metadata, recognized
/// optional fields, remaining properties, then the fetched body.
fn detail_lines(task: &Task, body: &str, today: NaiveDate) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    lines.push(section("=== Task Details ==="));
    lines.push(Line::from(""));

    lines.push(field("Title", Span::raw(task.title.clone())));
    lines.push(field("Status", Span::raw(task.status.clone())));

    if let Some(created) = task.created {
        lines.push(field(
            "Created",
            Span::raw(created.format("%b %-d, %Y %H:%M").to_string()),
        ));
    }
    if let Some(updated) = task.updated {
        lines.push(field(
            "Updated",
            Span::raw(updated.format("%b %-d, %Y %H:%M").to_string()),
        ));
    }

    if let Some(priority) = &task.priority {
        lines.push(field(
            "Priority",
            Span::styled(
                priority.clone(),
                Style::default().fg(Theme::priority_color(priority)),
            ),
        ));
    }

    if let Some(assignee) = &task.assignee {
        lines.push(field("Assignee", Span::raw(assignee.clone())));
    }

    if let Some(due) = task.due {
        let (label, color) = due_label(due, today);
        lines.push(field(
            "Due Date",
            Span::styled(format!("{due} {label}"), Style::default().fg(color)),
        ));
    }

    for (label, aliases) in OPTIONAL_FIELDS {
        if let Some(value) = resolve_field(task, aliases) {
            lines.push(field(label, Span::raw(value.to_string())));
        }
    }

    let extras = extra_properties(task);
    if !extras.is_empty() {
        lines.push(Line::from(""));
        lines.push(section("=== Properties ==="));
        lines.push(Line::from(""));
        for (key, value) in extras {
            lines.push(field(&key, Span::raw(value)));
        }
    }

    if !body.is_empty() {
        lines.push(Line::from(""));
        lines.push(section("=== Content ==="));
        lines.push(Line::from(""));
        for body_line in body.lines() {
            lines.push(Line::from(body_line.to_string()));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Esc close · ↑↓/jk scroll · PgUp/PgDn page · ^O browser · ^E edit",
        Theme::dim_style(),
    )));

    lines
}

fn section(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Theme::SECTION)
            .add_modifier(Modifier::BOLD),
    ))
}

fn field(label: &str, value: Span<'static>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Theme::LABEL)),
        value,
    ])
}

/// First alias present on the task wins.
pub(crate) fn resolve_field<'a>(task: &'a Task, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .find_map(|key| task.properties.get(*key))
        .map(String::as_str)
}

/// Properties left over once dedicated fields and their aliases are taken out.
pub(crate) fn extra_properties(task: &Task) -> Vec<(String, String)> {
    task.properties
        .iter()
        .filter(|(key, value)| !value.is_empty() && !EXCLUDED_PROPS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Proximity label and band color for a due date, on calendar days against
/// local midnight (the caller passes today's local date).
pub(crate) fn due_label(due: NaiveDate, today: NaiveDate) -> (String, Color) {
    let days = due.signed_duration_since(today).num_days();
    if days < 0 {
        (format!("({}d overdue)", -days), Theme::DUE_ALERT)
    } else if days == 0 {
        ("(Today)".to_string(), Theme::DUE_WARN)
    } else if days == 1 {
        ("(Tomorrow)".to_string(), Theme::DUE_WARN)
    } else if days <= 7 {
        (format!("({days}d)"), Theme::DUE_INFO)
    } else {
        (format!("({} {})", due.format("%b"), due.day()), Theme::FG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_task;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn due_today_is_warn_band() {
        let today = day(2024, 3, 10);
        assert_eq!(due_label(today, today), ("(Today)".to_string(), Theme::DUE_WARN));
    }

    #[test]
    fn due_yesterday_is_one_day_overdue() {
        let today = day(2024, 3, 10);
        assert_eq!(
            due_label(day(2024, 3, 9), today),
            ("(1d overdue)".to_string(), Theme::DUE_ALERT)
        );
    }

    #[test]
    fn due_tomorrow_is_warn_band() {
        let today = day(2024, 3, 10);
        assert_eq!(
            due_label(day(2024, 3, 11), today),
            ("(Tomorrow)".to_string(), Theme::DUE_WARN)
        );
    }

    #[test]
    fn due_within_a_week_is_info_band() {
        let today = day(2024, 3, 10);
        assert_eq!(
            due_label(day(2024, 3, 13), today),
            ("(3d)".to_string(), Theme::DUE_INFO)
        );
        assert_eq!(
            due_label(day(2024, 3, 17), today),
            ("(7d)".to_string(), Theme::DUE_INFO)
        );
    }

    #[test]
    fn due_far_out_is_neutral_month_day() {
        let today = day(2024, 3, 10);
        assert_eq!(
            due_label(day(2024, 3, 20), today),
            ("(Mar 20)".to_string(), Theme::FG)
        );
    }

    #[test]
    fn first_matching_alias_wins() {
        let mut task = test_task("1", "t", "Todo");
        task.properties.insert("Type".to_string(), "defect".to_string());
        task.properties
            .insert("Bug Type".to_string(), "crash".to_string());
        // "Bug Type" is listed before "Type" in the alias order.
        assert_eq!(
            resolve_field(&task, &["Bug Type", "Bug type", "Type"]),
            Some("crash")
        );
    }

    #[test]
    fn alias_falls_through_to_later_candidates() {
        let mut task = test_task("1", "t", "Todo");
        task.properties.insert("Link".to_string(), "http://x".to_string());
        assert_eq!(
            resolve_field(&task, &["Reference", "Ref", "Link"]),
            Some("http://x")
        );
    }

    #[test]
    fn extra_properties_exclude_dedicated_fields() {
        let mut task = test_task("1", "t", "Todo");
        task.properties.insert("Status".to_string(), "Todo".to_string());
        task.properties.insert("Hours".to_string(), "4".to_string());
        task.properties
            .insert("Sprint".to_string(), "Q3".to_string());
        let extras = extra_properties(&task);
        assert_eq!(extras, vec![("Sprint".to_string(), "Q3".to_string())]);
    }

    #[test]
    fn detail_sections_keep_fixed_order() {
        let mut task = test_task("1", "My task", "Doing");
        task.priority = Some("High".to_string());
        task.properties
            .insert("Sprint".to_string(), "Q3".to_string());
        let lines = detail_lines(&task, "the body", day(2024, 3, 10));
        let flat: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        let pos = |needle: &str| {
            flat.iter()
                .position(|l| l.contains(needle))
                .unwrap_or_else(|| panic!("missing {needle:?}"))
        };
        assert!(pos("=== Task Details ===") < pos("Title: "));
        assert!(pos("Title: ") < pos("Status: "));
        assert!(pos("Status: ") < pos("Priority: "));
        assert!(pos("=== Properties ===") < pos("Sprint: "));
        assert!(pos("Sprint: ") < pos("=== Content ==="));
        assert!(pos("=== Content ===") < pos("the body"));
    }

    #[test]
    fn empty_body_omits_the_content_section() {
        let task = test_task("1", "t", "Todo");
        let lines = detail_lines(&task, "", day(2024, 3, 10));
        assert!(!lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .any(|s| s.content.contains("=== Content ===")));
    }
}
