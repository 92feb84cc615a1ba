use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of characters kept in a card preview.
pub const DEFAULT_PREVIEW_LENGTH: usize = 80;

/// Marker appended to a truncated preview.
pub const ELLIPSIS: char = '…';

/// Rich-text document as stored in `works.content` and `*.answer`.
///
/// The schema belongs to the editor: a tree of typed nodes where `text`
/// nodes carry the visible characters and container nodes list their
/// children under `content`. The backend never interprets it beyond
/// extracting plain text for previews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct RichTextDocument(pub Value);

impl Default for RichTextDocument {
    fn default() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }
}

impl From<Value> for RichTextDocument {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl RichTextDocument {
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Concatenated text leaves in document order, trimmed and cut to
    /// `max_len` characters followed by [`ELLIPSIS`] when longer.
    pub fn plain_text(&self, max_len: usize) -> String {
        let mut parts = String::new();
        collect_text(&self.0, &mut parts);

        let text = parts.trim();
        if text.chars().count() > max_len {
            let mut truncated: String = text.chars().take(max_len).collect();
            truncated.push(ELLIPSIS);
            truncated
        } else {
            text.to_string()
        }
    }

    pub fn preview(&self) -> String {
        self.plain_text(DEFAULT_PREVIEW_LENGTH)
    }
}

fn collect_text(node: &Value, out: &mut String) {
    let Value::Object(map) = node else {
        return;
    };

    if map.get("type").and_then(Value::as_str) == Some("text") {
        if let Some(text) = map.get("text").and_then(Value::as_str) {
            out.push_str(text);
        }
    }

    if let Some(Value::Array(children)) = map.get("content") {
        for child in children {
            collect_text(child, out);
        }
    }
}
