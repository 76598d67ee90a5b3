use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::action::Action;
use crate::app::Mode;

/// Map a key event to a semantic action based on current mode.
///
/// Dispatch is mode-exclusive: keys that mean something on the board are
/// dead in Detail and Search, and nothing at all is mapped while the
/// external editor owns the terminal.
pub fn map_key(key: KeyEvent, mode: &Mode) -> Action {
    match mode {
        Mode::Board => map_board(key),
        Mode::Detail { .. } => map_detail(key),
        Mode::Search { .. } => map_search(key),
        Mode::EditorSuspended => Action::None,
    }
}

fn map_board(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('o') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Action::OpenInBrowser
        }
        KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::EditTask,
        KeyCode::Char('h') | KeyCode::Left => Action::FocusPrevColumn,
        KeyCode::Char('l') | KeyCode::Right => Action::FocusNextColumn,
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNextTask,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrevTask,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Refresh,
        KeyCode::Char('/') => Action::StartSearch,
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Enter => Action::OpenDetail,
        KeyCode::Esc => Action::ClearFilterOrQuit,
        _ => Action::None,
    }
}

fn map_detail(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('o') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Action::OpenInBrowser
        }
        KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::EditTask,
        KeyCode::Esc | KeyCode::Char('q') => Action::CloseDetail,
        KeyCode::Char('j') | KeyCode::Down => Action::DetailScrollDown,
        KeyCode::Char('k') | KeyCode::Up => Action::DetailScrollUp,
        KeyCode::PageDown => Action::DetailPageDown,
        KeyCode::PageUp => Action::DetailPageUp,
        _ => Action::None,
    }
}

fn map_search(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => Action::InputConfirm,
        KeyCode::Esc => Action::InputCancel,
        KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::InputHome,
        KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::InputEnd,
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Action::InputDeleteWord
        }
        KeyCode::Char(c) => Action::InputChar(c),
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Left => Action::InputLeft,
        KeyCode::Right => Action::InputRight,
        KeyCode::Home => Action::InputHome,
        KeyCode::End => Action::InputEnd,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::TextBuffer;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn board_keys_map_to_navigation() {
        assert_eq!(map_key(key(KeyCode::Left), &Mode::Board), Action::FocusPrevColumn);
        assert_eq!(map_key(key(KeyCode::Char('l')), &Mode::Board), Action::FocusNextColumn);
        assert_eq!(map_key(key(KeyCode::Char('j')), &Mode::Board), Action::SelectNextTask);
        assert_eq!(map_key(key(KeyCode::Up), &Mode::Board), Action::SelectPrevTask);
        assert_eq!(map_key(key(KeyCode::Enter), &Mode::Board), Action::OpenDetail);
        assert_eq!(map_key(ctrl('e'), &Mode::Board), Action::EditTask);
    }

    #[test]
    fn board_navigation_is_dead_in_detail() {
        let mode = Mode::Detail { scroll: 0 };
        assert_eq!(map_key(key(KeyCode::Left), &mode), Action::None);
        assert_eq!(map_key(key(KeyCode::Char('r')), &mode), Action::None);
        assert_eq!(map_key(key(KeyCode::Char('/')), &mode), Action::None);
        assert_eq!(map_key(key(KeyCode::Esc), &mode), Action::CloseDetail);
    }

    #[test]
    fn detail_scrolls_by_line_and_page() {
        let mode = Mode::Detail { scroll: 0 };
        assert_eq!(map_key(key(KeyCode::Char('j')), &mode), Action::DetailScrollDown);
        assert_eq!(map_key(key(KeyCode::PageUp), &mode), Action::DetailPageUp);
    }

    #[test]
    fn search_mode_captures_characters() {
        let mode = Mode::Search { buf: TextBuffer::empty() };
        assert_eq!(map_key(key(KeyCode::Char('q')), &mode), Action::InputChar('q'));
        assert_eq!(map_key(key(KeyCode::Char('r')), &mode), Action::InputChar('r'));
        assert_eq!(map_key(key(KeyCode::Enter), &mode), Action::InputConfirm);
        assert_eq!(map_key(key(KeyCode::Esc), &mode), Action::InputCancel);
    }

    #[test]
    fn nothing_is_mapped_while_editor_owns_the_terminal() {
        assert_eq!(map_key(key(KeyCode::Char('q')), &Mode::EditorSuspended), Action::None);
        assert_eq!(map_key(ctrl('c'), &Mode::EditorSuspended), Action::None);
        assert_eq!(map_key(key(KeyCode::Esc), &Mode::EditorSuspended), Action::None);
    }

    #[test]
    fn board_esc_routes_to_clear_or_quit() {
        assert_eq!(map_key(key(KeyCode::Esc), &Mode::Board), Action::ClearFilterOrQuit);
    }
}
