//! Client for the remote task database (Notion v1 API).
//!
//! All wire-protocol knowledge lives here. The board core only sees the
//! [`TaskService`] trait and the [`Task`] values it produces.

pub mod blocks;

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::board::{Task, NO_STATUS};
use crate::config::Config;

const API_BASE: &str = "https://api.notion.com/v1";
const API_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
}

/// The remote content store, as the board sees it: fetch the full task set,
/// fetch one task's body, push one task's body back.
pub trait TaskService {
    fn fetch_tasks(&self) -> Result<Vec<Task>, RemoteError>;
    fn fetch_body(&self, task_id: &str) -> Result<String, RemoteError>;
    fn update_body(&self, task_id: &str, body: &str) -> Result<(), RemoteError>;
}

pub struct Client {
    http: reqwest::blocking::Client,
    token: String,
    database_id: String,
    base_url: String,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self, RemoteError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            token: config.token.clone(),
            database_id: config.database_id.clone(),
            base_url: API_BASE.to_string(),
        })
    }

    fn get(&self, path: &str) -> Result<Value, RemoteError> {
        let response = self
            .http
            .get(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .send()?;
        into_json(response)
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value, RemoteError> {
        let response = self
            .http
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .json(body)
            .send()?;
        into_json(response)
    }

    fn patch(&self, path: &str, body: &Value) -> Result<Value, RemoteError> {
        let response = self
            .http
            .patch(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .json(body)
            .send()?;
        into_json(response)
    }

    fn delete(&self, path: &str) -> Result<Value, RemoteError> {
        let response = self
            .http
            .delete(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .send()?;
        into_json(response)
    }

    fn list_children(&self, task_id: &str) -> Result<Value, RemoteError> {
        self.get(&format!("blocks/{task_id}/children?page_size={PAGE_SIZE}"))
    }
}

impl TaskService for Client {
    /// Query the database, draining cursor pagination so grouping always
    /// sees the complete task set.
    fn fetch_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        let mut tasks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = json!({
                "page_size": PAGE_SIZE,
                "sorts": [{ "property": "Status", "direction": "ascending" }],
            });
            if let Some(ref c) = cursor {
                query["start_cursor"] = json!(c);
            }

            let page = self.post(&format!("databases/{}/query", self.database_id), &query)?;
            if let Some(results) = page["results"].as_array() {
                tasks.extend(results.iter().map(task_from_page));
            }

            if !page["has_more"].as_bool().unwrap_or(false) {
                break;
            }
            cursor = page["next_cursor"].as_str().map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }

        Ok(tasks)
    }

    fn fetch_body(&self, task_id: &str) -> Result<String, RemoteError> {
        let listing = self.list_children(task_id)?;
        let mut lines = Vec::new();
        if let Some(results) = listing["results"].as_array() {
            for block in results {
                if let Some(text) = blocks::block_text(block) {
                    if !text.is_empty() {
                        lines.push(text);
                    }
                }
            }
        }
        Ok(lines.join("\n"))
    }

    /// Replace the task's body: delete the existing blocks, then append the
    /// edited text converted back to blocks.
    fn update_body(&self, task_id: &str, body: &str) -> Result<(), RemoteError> {
        let listing = self.list_children(task_id)?;
        if let Some(results) = listing["results"].as_array() {
            for block in results {
                if block["type"].as_str() == Some("unsupported") {
                    continue;
                }
                if let Some(block_id) = block["id"].as_str() {
                    // Best-effort: a block that refuses deletion should not
                    // abort the whole update.
                    let _ = self.delete(&format!("blocks/{block_id}"));
                }
            }
        }

        let children = blocks::body_to_blocks(body);
        if !children.is_empty() {
            self.patch(
                &format!("blocks/{task_id}/children"),
                &json!({ "children": children }),
            )?;
        }
        Ok(())
    }
}

fn into_json(response: reqwest::blocking::Response) -> Result<Value, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json()?);
    }
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or(body);
    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}

// ---------------------------------------------------------------------------
// Page → Task extraction
// ---------------------------------------------------------------------------

pub(crate) fn task_from_page(page: &Value) -> Task {
    let props = &page["properties"];
    Task {
        id: page["id"].as_str().unwrap_or_default().to_string(),
        title: extract_title(props),
        status: extract_status(props),
        priority: extract_priority(props),
        assignee: extract_assignee(props),
        due: extract_due(props),
        created: parse_timestamp(&page["created_time"]),
        updated: parse_timestamp(&page["last_edited_time"]),
        url: page["url"].as_str().unwrap_or_default().to_string(),
        properties: all_properties(props),
    }
}

fn extract_title(props: &Value) -> String {
    for key in ["Name", "Title", "Task"] {
        if let Some(text) = title_text(&props[key]) {
            return text;
        }
    }
    // Fall back to whichever property carries the title type.
    if let Some(map) = props.as_object() {
        for value in map.values() {
            if value["type"] == "title" {
                if let Some(text) = title_text(value) {
                    return text;
                }
            }
        }
    }
    "Untitled".to_string()
}

fn title_text(prop: &Value) -> Option<String> {
    let runs = prop["title"].as_array()?;
    let text: String = runs
        .iter()
        .filter_map(|run| run["plain_text"].as_str())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn extract_status(props: &Value) -> String {
    let prop = &props["Status"];
    let name = match prop["type"].as_str() {
        Some("select") => prop["select"]["name"].as_str(),
        Some("status") => prop["status"]["name"].as_str(),
        _ => None,
    };
    name.unwrap_or(NO_STATUS).to_string()
}

fn extract_priority(props: &Value) -> Option<String> {
    let prop = &props["Priority"];
    if prop["type"].as_str() == Some("select") {
        prop["select"]["name"].as_str().map(str::to_string)
    } else {
        None
    }
}

fn extract_assignee(props: &Value) -> Option<String> {
    for key in ["Assignee", "Person"] {
        let prop = &props[key];
        if prop["type"].as_str() != Some("people") {
            continue;
        }
        if let Some(person) = prop["people"].as_array().and_then(|p| p.first()) {
            let name = person["name"]
                .as_str()
                .or_else(|| person["person"]["email"].as_str());
            if let Some(name) = name {
                return Some(name.to_string());
            }
        }
    }
    None
}

fn extract_due(props: &Value) -> Option<NaiveDate> {
    for key in ["Due Date", "Due", "Date"] {
        let prop = &props[key];
        if prop["type"].as_str() != Some("date") {
            continue;
        }
        if let Some(start) = prop["date"]["start"].as_str() {
            // Date properties may carry a time part; the calendar day is all
            // the board uses.
            if let Ok(date) = NaiveDate::parse_from_str(&start[..start.len().min(10)], "%Y-%m-%d") {
                return Some(date);
            }
        }
    }
    None
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Stringify every property for display, in the order the remote sent them.
fn all_properties(props: &Value) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(map) = props.as_object() else {
        return out;
    };
    for (key, value) in map {
        if let Some(text) = property_string(value) {
            if !text.is_empty() {
                out.insert(key.clone(), text);
            }
        }
    }
    out
}

fn property_string(prop: &Value) -> Option<String> {
    let joined = |key: &str, field: fn(&Value) -> Option<String>| -> String {
        prop[key]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(field)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    };

    match prop["type"].as_str()? {
        "title" => Some(blocks::plain_text(&json!({ "rich_text": prop["title"] }))),
        "rich_text" => Some(blocks::plain_text(prop)),
        "number" => prop["number"].as_f64().map(format_number),
        "select" => prop["select"]["name"].as_str().map(str::to_string),
        "status" => prop["status"]["name"].as_str().map(str::to_string),
        "multi_select" => Some(joined("multi_select", |s| {
            s["name"].as_str().map(str::to_string)
        })),
        "date" => prop["date"]["start"].as_str().map(str::to_string),
        "people" => Some(joined("people", |p| {
            p["name"]
                .as_str()
                .or_else(|| p["person"]["email"].as_str())
                .map(str::to_string)
        })),
        "checkbox" => Some(if prop["checkbox"].as_bool().unwrap_or(false) {
            "Yes".to_string()
        } else {
            "No".to_string()
        }),
        "url" => prop["url"].as_str().map(str::to_string),
        "email" => prop["email"].as_str().map(str::to_string),
        "phone_number" => prop["phone_number"].as_str().map(str::to_string),
        _ => None,
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> Value {
        json!({
            "id": "abc-123",
            "url": "https://example.com/abc-123",
            "created_time": "2024-03-01T10:30:00.000Z",
            "last_edited_time": "2024-03-02T08:00:00.000Z",
            "properties": {
                "Name": {
                    "type": "title",
                    "title": [{ "plain_text": "Fix the login flow" }]
                },
                "Status": {
                    "type": "status",
                    "status": { "name": "In Progress" }
                },
                "Priority": {
                    "type": "select",
                    "select": { "name": "High" }
                },
                "Assignee": {
                    "type": "people",
                    "people": [{ "name": "Alice" }]
                },
                "Due Date": {
                    "type": "date",
                    "date": { "start": "2024-03-10" }
                },
                "Hours": { "type": "number", "number": 4.0 },
                "Done": { "type": "checkbox", "checkbox": false }
            }
        })
    }

    #[test]
    fn task_from_page_extracts_core_fields() {
        let task = task_from_page(&sample_page());
        assert_eq!(task.id, "abc-123");
        assert_eq!(task.title, "Fix the login flow");
        assert_eq!(task.status, "In Progress");
        assert_eq!(task.priority.as_deref(), Some("High"));
        assert_eq!(task.assignee.as_deref(), Some("Alice"));
        assert_eq!(task.due, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert!(task.created.is_some());
        assert_eq!(task.url, "https://example.com/abc-123");
    }

    #[test]
    fn title_falls_back_to_any_title_property() {
        let page = json!({
            "properties": {
                "Item": { "type": "title", "title": [{ "plain_text": "from fallback" }] }
            }
        });
        assert_eq!(task_from_page(&page).title, "from fallback");
    }

    #[test]
    fn missing_title_is_untitled() {
        let page = json!({ "properties": {} });
        assert_eq!(task_from_page(&page).title, "Untitled");
    }

    #[test]
    fn missing_status_uses_sentinel() {
        let page = json!({ "properties": {} });
        assert_eq!(task_from_page(&page).status, NO_STATUS);
    }

    #[test]
    fn select_status_is_accepted_too() {
        let page = json!({
            "properties": {
                "Status": { "type": "select", "select": { "name": "Todo" } }
            }
        });
        assert_eq!(task_from_page(&page).status, "Todo");
    }

    #[test]
    fn assignee_falls_back_to_person_property_and_email() {
        let page = json!({
            "properties": {
                "Person": {
                    "type": "people",
                    "people": [{ "person": { "email": "bob@example.com" } }]
                }
            }
        });
        assert_eq!(
            task_from_page(&page).assignee.as_deref(),
            Some("bob@example.com")
        );
    }

    #[test]
    fn due_date_aliases_and_datetime_values() {
        let page = json!({
            "properties": {
                "Due": {
                    "type": "date",
                    "date": { "start": "2024-06-01T09:00:00.000Z" }
                }
            }
        });
        assert_eq!(
            task_from_page(&page).due,
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn properties_are_stringified_per_type() {
        let task = task_from_page(&sample_page());
        assert_eq!(task.properties["Hours"], "4");
        assert_eq!(task.properties["Done"], "No");
        assert_eq!(task.properties["Status"], "In Progress");
        assert_eq!(task.properties["Name"], "Fix the login flow");
    }

    #[test]
    fn multi_select_joins_names() {
        let prop = json!({
            "type": "multi_select",
            "multi_select": [{ "name": "ui" }, { "name": "backend" }]
        });
        assert_eq!(property_string(&prop), Some("ui, backend".to_string()));
    }

    #[test]
    fn fractional_numbers_keep_their_fraction() {
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(3.0), "3");
    }

    #[test]
    fn empty_property_values_are_dropped() {
        let page = json!({
            "properties": {
                "Notes": { "type": "rich_text", "rich_text": [] }
            }
        });
        assert!(task_from_page(&page).properties.get("Notes").is_none());
    }
}
