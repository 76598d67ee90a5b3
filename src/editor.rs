//! External editor handoff: materialize a task into a temp file, hand the
//! terminal to `$EDITOR`, and reconcile what comes back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use chrono::{DateTime, Utc};

use crate::board::Task;

/// The line separating the metadata header from the editable body. Text
/// before the first occurrence is never synced back.
pub const BODY_SEPARATOR: &str = "\n---\n";

/// Stands in for the body when a task has no content yet.
pub const EMPTY_BODY_PLACEHOLDER: &str = "(No content available for editing)";

/// Max length of the title slug used in backup file names.
const SLUG_LEN: usize = 30;

/// One in-flight edit: the task being edited, the materialized file, and the
/// body snapshot candidate edits are diffed against.
#[derive(Debug)]
pub struct EditorSession {
    pub task_id: String,
    pub task_title: String,
    pub task_status: String,
    pub temp_path: PathBuf,
    /// The body exactly as written after the separator (placeholder included
    /// when the task had none).
    pub snapshot: String,
}

/// Outcome of comparing the edited file against the session snapshot.
#[derive(Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// The separator is gone; nothing can be attributed to the body.
    Malformed,
    Unchanged,
    Changed(String),
}

/// Materialize the edit file: `# title`, metadata lines, separator, body.
pub fn prepare(task: &Task, body: &str) -> io::Result<EditorSession> {
    let snapshot = if body.is_empty() {
        EMPTY_BODY_PLACEHOLDER.to_string()
    } else {
        body.to_string()
    };

    let mut text = format!("# {}\n\n", task.title);
    text.push_str(&format!("Status: {}\n", task.status));
    if let Some(priority) = &task.priority {
        text.push_str(&format!("Priority: {priority}\n"));
    }
    if let Some(assignee) = &task.assignee {
        text.push_str(&format!("Assignee: {assignee}\n"));
    }
    if let Some(due) = task.due {
        text.push_str(&format!("Due Date: {due}\n"));
    }
    text.push_str("\n---\n\n");
    text.push_str(&snapshot);
    text.push('\n');

    let temp_path = std::env::temp_dir().join(format!("nokan-task-{}.md", task.id.replace('-', "")));
    fs::write(&temp_path, &text)?;

    Ok(EditorSession {
        task_id: task.id.clone(),
        task_title: task.title.clone(),
        task_status: task.status.clone(),
        temp_path,
        snapshot,
    })
}

/// Suspends the interactive terminal while it lives: raw mode off and the
/// alternate screen released on construction, both restored on drop. Drop
/// covers every exit path, editor spawn failure included.
struct TerminalSuspension;

impl TerminalSuspension {
    fn begin() -> io::Result<Self> {
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalSuspension {
    fn drop(&mut self) {
        let _ = crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen);
        let _ = crossterm::terminal::enable_raw_mode();
    }
}

/// Run the editor on the session file with inherited stdio, giving it the
/// terminal for as long as it runs. Only the exit status is consulted.
pub fn run_editor(editor: &str, path: &Path) -> io::Result<ExitStatus> {
    let _suspended = TerminalSuspension::begin()?;
    Command::new(editor).arg(path).status()
}

/// Compare the edited file content against the session snapshot.
///
/// Everything after the first separator, trimmed, is the candidate body.
/// Leading and trailing blank lines around the separator never count as a
/// change.
pub fn reconcile(edited: &str, snapshot: &str) -> Reconciliation {
    match edited.split_once(BODY_SEPARATOR) {
        None => Reconciliation::Malformed,
        Some((_, rest)) => {
            let candidate = rest.trim();
            if candidate == snapshot.trim() {
                Reconciliation::Unchanged
            } else {
                Reconciliation::Changed(candidate.to_string())
            }
        }
    }
}

/// Filesystem-safe slug of a task title: non-alphanumerics stripped, capped,
/// whitespace collapsed to hyphens.
pub fn title_slug(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let capped: String = cleaned.chars().take(SLUG_LEN).collect();
    capped.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Write the success backup after a remote update went through.
/// Timestamp-qualified name, so nothing is ever overwritten.
pub fn write_backup(
    dir: &Path,
    session: &EditorSession,
    body: &str,
    now: DateTime<Utc>,
) -> io::Result<PathBuf> {
    let path = dir.join(format!(
        "nokan-backup-{}-{}.md",
        title_slug(&session.task_title),
        now.timestamp_millis()
    ));
    let content = format!(
        "# {}\n\nTask ID: {}\nStatus: {}\nUpdated: {}\n\n## Updated Content:\n{}\n",
        session.task_title,
        session.task_id,
        session.task_status,
        now.to_rfc3339(),
        body
    );
    fs::write(&path, content)?;
    Ok(path)
}

/// Write the failure record when the remote rejected the update: the error
/// plus the full edited body, so the edit is never lost.
pub fn write_failure_record(
    dir: &Path,
    session: &EditorSession,
    body: &str,
    error: &str,
    now: DateTime<Utc>,
) -> io::Result<PathBuf> {
    let path = dir.join(format!(
        "nokan-edit-failed-{}-{}.md",
        title_slug(&session.task_title),
        now.timestamp_millis()
    ));
    let content = format!(
        "# {}\n\nTask ID: {}\nStatus: {}\nError: {}\n\n## Edited Content:\n{}\n",
        session.task_title, session.task_id, session.task_status, error, body
    );
    fs::write(&path, content)?;
    Ok(path)
}

/// Remove the temp file. Best-effort: a vanished file is not an error.
pub fn cleanup(session: &EditorSession) {
    let _ = fs::remove_file(&session.temp_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::test_task;

    #[test]
    fn reconcile_is_deterministic_around_blank_lines() {
        let edited = "# T\n\nStatus: Todo\n\n---\n\n\nHello\n\n\n";
        assert_eq!(
            reconcile(edited, "original"),
            Reconciliation::Changed("Hello".to_string())
        );
    }

    #[test]
    fn unchanged_body_is_detected_after_trim() {
        let edited = "# T\n\nStatus: Todo\n\n---\n\nHello\n";
        assert_eq!(reconcile(edited, "Hello"), Reconciliation::Unchanged);
        assert_eq!(reconcile(edited, "Hello\n"), Reconciliation::Unchanged);
    }

    #[test]
    fn missing_separator_is_malformed() {
        assert_eq!(
            reconcile("# T\n\nStatus: Todo\n\nHello\n", "Hello"),
            Reconciliation::Malformed
        );
    }

    #[test]
    fn untouched_placeholder_counts_as_unchanged() {
        let task = test_task("abc", "Empty task", "Todo");
        let session = prepare(&task, "").unwrap();
        let edited = fs::read_to_string(&session.temp_path).unwrap();
        assert_eq!(reconcile(&edited, &session.snapshot), Reconciliation::Unchanged);
        cleanup(&session);
    }

    #[test]
    fn body_dividers_survive_reconciliation() {
        // Only the first separator is the sync boundary; later `---` lines
        // belong to the body.
        let edited = "# T\n\n---\n\nbefore\n---\nafter";
        assert_eq!(
            reconcile(edited, ""),
            Reconciliation::Changed("before\n---\nafter".to_string())
        );
    }

    #[test]
    fn prepare_materializes_header_separator_body() {
        let mut task = test_task("abc-def", "My task", "Doing");
        task.priority = Some("High".to_string());
        task.assignee = Some("Alice".to_string());
        let session = prepare(&task, "body text").unwrap();
        let written = fs::read_to_string(&session.temp_path).unwrap();
        assert!(written.starts_with("# My task\n"));
        assert!(written.contains("Status: Doing\n"));
        assert!(written.contains("Priority: High\n"));
        assert!(written.contains("Assignee: Alice\n"));
        assert!(written.contains("\n---\n\nbody text"));
        // Round trip: the file as written reconciles to Unchanged.
        assert_eq!(reconcile(&written, &session.snapshot), Reconciliation::Unchanged);
        cleanup(&session);
    }

    #[test]
    fn temp_file_name_strips_id_dashes() {
        let task = test_task("ab-cd-ef", "T", "Todo");
        let session = prepare(&task, "x").unwrap();
        let name = session.temp_path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, "nokan-task-abcdef.md");
        cleanup(&session);
    }

    #[test]
    fn cleanup_removes_the_temp_file() {
        let task = test_task("cleanup-test", "T", "Todo");
        let session = prepare(&task, "x").unwrap();
        assert!(session.temp_path.exists());
        cleanup(&session);
        assert!(!session.temp_path.exists());
        // Second cleanup is a no-op, not a panic.
        cleanup(&session);
    }

    #[test]
    fn title_slug_strips_caps_and_hyphenates() {
        assert_eq!(title_slug("Fix: the login/flow!"), "Fix-the-loginflow");
        assert_eq!(title_slug("   spaced   out   "), "spaced-out");
        let long = "a".repeat(50);
        assert_eq!(title_slug(&long).len(), SLUG_LEN);
    }

    #[test]
    fn backup_and_failure_files_are_timestamp_qualified() {
        let dir = tempfile::tempdir().unwrap();
        let task = test_task("id-1", "Backup me", "Todo");
        let session = prepare(&task, "x").unwrap();
        let now = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let backup = write_backup(dir.path(), &session, "new body", now).unwrap();
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("nokan-backup-Backup-me-{}.md", now.timestamp_millis()));
        let content = fs::read_to_string(&backup).unwrap();
        assert!(content.contains("Task ID: id-1"));
        assert!(content.contains("## Updated Content:\nnew body"));

        let failure =
            write_failure_record(dir.path(), &session, "new body", "boom", now).unwrap();
        let content = fs::read_to_string(&failure).unwrap();
        assert!(content.contains("Error: boom"));
        assert!(content.contains("## Edited Content:\nnew body"));
        cleanup(&session);
    }
}
