use ratatui::style::{Color, Modifier, Style};

/// Color theme for nokan.
///
/// Chrome stays close to the terminal defaults; color is reserved for
/// selection, severity, and due-date proximity.
pub struct Theme;

impl Theme {
    pub const FG: Color = Color::Reset;
    pub const DIM: Color = Color::DarkGray;

    // Title bar
    pub const TITLE_BG: Color = Color::Blue;
    pub const TITLE_FG: Color = Color::White;

    // Columns
    pub const COLUMN_BORDER: Color = Color::White;
    pub const COLUMN_FOCUSED_BORDER: Color = Color::Yellow;

    // Selected row
    pub const SELECTED_BG: Color = Color::Blue;
    pub const SELECTED_FG: Color = Color::White;

    // Detail panel
    pub const DETAIL_BORDER: Color = Color::Yellow;
    pub const LABEL: Color = Color::Cyan;
    pub const SECTION: Color = Color::Yellow;

    // Due-date proximity bands
    pub const DUE_ALERT: Color = Color::Red;
    pub const DUE_WARN: Color = Color::Yellow;
    pub const DUE_INFO: Color = Color::Cyan;

    // Status bar
    pub const STATUS_ERROR: Color = Color::Red;

    pub fn dim_style() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Self::TITLE_FG)
            .bg(Self::TITLE_BG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected_style() -> Style {
        Style::default()
            .fg(Self::SELECTED_FG)
            .bg(Self::SELECTED_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Severity color for a free-form priority label.
    pub fn priority_color(priority: &str) -> Color {
        let p = priority.to_lowercase();
        if p.contains("high") || p.contains("urgent") {
            Color::Red
        } else if p.contains("medium") {
            Color::Yellow
        } else if p.contains("low") {
            Color::Green
        } else {
            Self::FG
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_bands_match_on_substring_case_insensitive() {
        assert_eq!(Theme::priority_color("High"), Color::Red);
        assert_eq!(Theme::priority_color("URGENT"), Color::Red);
        assert_eq!(Theme::priority_color("Medium"), Color::Yellow);
        assert_eq!(Theme::priority_color("low-ish"), Color::Green);
        assert_eq!(Theme::priority_color("P2"), Theme::FG);
    }
}
