pub mod filter;
pub mod layout;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;

use filter::FilteredView;

/// Sentinel status label for tasks whose status property is missing or empty.
pub const NO_STATUS: &str = "No Status";

/// A single work item as loaded from the remote database.
///
/// Immutable once loaded; the free-form body is fetched lazily per task and
/// never stored here.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: String,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub due: Option<NaiveDate>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub url: String,
    /// Remaining named properties, stringified, in the order the remote
    /// returned them.
    pub properties: IndexMap<String, String>,
}

/// The canonical grouped view: status label → tasks, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub groups: IndexMap<String, Vec<Task>>,
}

impl Board {
    /// Group a freshly fetched task set by status label.
    ///
    /// Total replacement semantics: the result stands alone and never merges
    /// with a previous load. Group order is the order statuses are first
    /// seen; an empty status maps to [`NO_STATUS`].
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut groups: IndexMap<String, Vec<Task>> = IndexMap::new();
        for mut task in tasks {
            if task.status.is_empty() {
                task.status = NO_STATUS.to_string();
            }
            groups.entry(task.status.clone()).or_default().push(task);
        }
        Self { groups }
    }

    pub fn total_tasks(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Whichever grouped view (canonical or filtered) selection and navigation
/// currently address.
#[derive(Clone, Copy)]
pub enum ActiveView<'a> {
    Full(&'a Board),
    Filtered(&'a Board, &'a FilteredView),
}

impl<'a> ActiveView<'a> {
    /// Ordered status labels of this view.
    pub fn statuses(&self) -> Vec<&'a str> {
        match self {
            Self::Full(board) => board.groups.keys().map(String::as_str).collect(),
            Self::Filtered(_, view) => view.groups.keys().map(String::as_str).collect(),
        }
    }

    pub fn status_count(&self) -> usize {
        match self {
            Self::Full(board) => board.groups.len(),
            Self::Filtered(_, view) => view.groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status_count() == 0
    }

    /// Number of rows in the given status column, or `None` if the status is
    /// not part of this view.
    pub fn group_len(&self, status: &str) -> Option<usize> {
        match self {
            Self::Full(board) => board.groups.get(status).map(Vec::len),
            Self::Filtered(_, view) => view.groups.get(status).map(Vec::len),
        }
    }

    /// The tasks of one status column, in row order.
    pub fn group(&self, status: &str) -> Vec<&'a Task> {
        match self {
            Self::Full(board) => board
                .groups
                .get(status)
                .map(|tasks| tasks.iter().collect())
                .unwrap_or_default(),
            Self::Filtered(board, view) => {
                let Some(rows) = view.groups.get(status) else {
                    return Vec::new();
                };
                let Some(tasks) = board.groups.get(status) else {
                    return Vec::new();
                };
                rows.iter().filter_map(|&i| tasks.get(i)).collect()
            }
        }
    }

    /// Resolve a (status, row) selection to a task.
    pub fn task(&self, status: &str, row: usize) -> Option<&'a Task> {
        match self {
            Self::Full(board) => board.groups.get(status)?.get(row),
            Self::Filtered(board, view) => {
                let idx = *view.groups.get(status)?.get(row)?;
                board.groups.get(status)?.get(idx)
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_task(id: &str, title: &str, status: &str) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        status: status.to_string(),
        priority: None,
        assignee: None,
        due: None,
        created: None,
        updated: None,
        url: format!("https://example.com/{id}"),
        properties: IndexMap::new(),
    }
}
