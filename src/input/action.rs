/// All possible semantic actions in nokan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Navigation
    FocusPrevColumn,
    FocusNextColumn,
    SelectPrevTask,
    SelectNextTask,

    // Board
    Refresh,
    OpenDetail,
    OpenInBrowser,
    EditTask,
    StartSearch,
    /// Esc on the board: clears the filter when one is active, quits otherwise.
    ClearFilterOrQuit,
    Quit,

    // Detail panel
    CloseDetail,
    DetailScrollUp,
    DetailScrollDown,
    DetailPageUp,
    DetailPageDown,

    // Search input
    InputChar(char),
    InputBackspace,
    InputLeft,
    InputRight,
    InputHome,
    InputEnd,
    InputDeleteWord,
    InputConfirm,
    InputCancel,

    // No-op
    None,
}
