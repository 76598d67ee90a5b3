//! Free-text filtering over the canonical board.

use indexmap::IndexMap;

use super::{Board, Task};

/// A grouped view derived from a search query. Rows are indices into the
/// canonical group of the same status, so no task is ever cloned into a
/// filtered view.
#[derive(Debug, Clone, Default)]
pub struct FilteredView {
    pub groups: IndexMap<String, Vec<usize>>,
}

/// Derive the filtered view for `query`.
///
/// Case-insensitive substring match, OR-combined across title, assignee,
/// priority, and every extra property value. Status groups with no match
/// are omitted entirely. A blank query is the caller's business: it means
/// "clear the filter", not "match everything".
pub fn filter(board: &Board, query: &str) -> FilteredView {
    let needle = query.to_lowercase();
    let mut groups = IndexMap::new();
    for (status, tasks) in &board.groups {
        let rows: Vec<usize> = tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task_matches(task, &needle))
            .map(|(i, _)| i)
            .collect();
        if !rows.is_empty() {
            groups.insert(status.clone(), rows);
        }
    }
    FilteredView { groups }
}

fn task_matches(task: &Task, needle: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);
    contains(&task.title)
        || task.assignee.as_deref().is_some_and(contains)
        || task.priority.as_deref().is_some_and(contains)
        || task.properties.values().any(|value| contains(value))
}
