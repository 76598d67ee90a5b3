//! Plain-text extraction from remote content blocks, and the reverse
//! conversion used when pushing an edited body back.

use serde_json::{json, Value};

/// Flatten one block to a display line. Returns `None` for block types we
/// don't render; an empty string means the block was recognized but blank
/// (callers skip those).
pub fn block_text(block: &Value) -> Option<String> {
    let kind = block["type"].as_str()?;
    let data = &block[kind];
    if data.is_null() {
        return None;
    }
    match kind {
        "paragraph" | "heading_1" | "heading_2" | "heading_3" | "quote" | "callout" => {
            Some(plain_text(data))
        }
        "bulleted_list_item" | "numbered_list_item" => Some(format!("• {}", plain_text(data))),
        "to_do" => {
            let mark = if data["checked"].as_bool().unwrap_or(false) {
                "☑"
            } else {
                "☐"
            };
            Some(format!("{mark} {}", plain_text(data)))
        }
        "toggle" => Some(format!("▸ {}", plain_text(data))),
        "code" => {
            let lang = data["language"].as_str().unwrap_or("");
            Some(format!("```{lang}\n{}\n```", plain_text(data)))
        }
        "divider" => Some("---".to_string()),
        _ => None,
    }
}

/// Concatenate the plain-text runs of a block's rich text array.
pub fn plain_text(data: &Value) -> String {
    let runs = data["rich_text"].as_array().or_else(|| data["text"].as_array());
    let Some(runs) = runs else {
        return String::new();
    };
    runs.iter()
        .filter_map(|run| run["plain_text"].as_str())
        .collect()
}

/// Convert an edited body back into content blocks, line by line.
///
/// Recognizes headings, bulleted and numbered items, quotes, fenced code,
/// and dividers; everything else becomes a paragraph. Blank lines are
/// dropped, mirroring how the body was flattened on the way out.
pub fn body_to_blocks(body: &str) -> Vec<Value> {
    let lines: Vec<&str> = body.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            continue;
        }

        if let Some(rest) = line.strip_prefix("# ") {
            blocks.push(text_block("heading_1", rest));
        } else if let Some(rest) = line.strip_prefix("## ") {
            blocks.push(text_block("heading_2", rest));
        } else if let Some(rest) = line.strip_prefix("### ") {
            blocks.push(text_block("heading_3", rest));
        } else if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            blocks.push(text_block("bulleted_list_item", rest));
        } else if let Some(rest) = numbered_item(line) {
            blocks.push(text_block("numbered_list_item", rest));
        } else if let Some(rest) = line.strip_prefix("> ") {
            blocks.push(text_block("quote", rest));
        } else if line.starts_with("```") {
            i += 1;
            let mut code = Vec::new();
            while i < lines.len() && !lines[i].starts_with("```") {
                code.push(lines[i]);
                i += 1;
            }
            let mut block = text_block("code", &code.join("\n"));
            block["code"]["language"] = json!("plain text");
            blocks.push(block);
        } else if line == "---" {
            blocks.push(json!({ "object": "block", "type": "divider", "divider": {} }));
        } else {
            blocks.push(text_block("paragraph", line));
        }

        i += 1;
    }

    blocks
}

/// `"3. buy milk"` → `Some("buy milk")`.
fn numbered_item(line: &str) -> Option<&str> {
    let dot = line.find(". ")?;
    if dot > 0 && line[..dot].bytes().all(|b| b.is_ascii_digit()) {
        Some(&line[dot + 2..])
    } else {
        None
    }
}

fn text_block(kind: &str, content: &str) -> Value {
    json!({
        "object": "block",
        "type": kind,
        kind: {
            "rich_text": [{ "type": "text", "text": { "content": content } }]
        }
    })
}
