//! ESTree-compatible output
//!
//! Works on the serialized tree so that it handles any node type, including
//! ones it has never seen, and so that the result shares nothing with the
//! input.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstreeOptions {
    pub include_locations: bool,
    pub include_range: bool,
    pub include_comments: bool,
}

impl Default for EstreeOptions {
    fn default() -> Self {
        Self {
            include_locations: true,
            include_range: true,
            include_comments: true,
        }
    }
}

/// Fields rebuilt or dropped by the conversion rather than copied.
const SKIPPED_FIELDS: [&str; 5] = ["type", "start", "end", "loc", "declaration"];

/// Lookup order for a numeric offset inside a location point.
const OFFSET_KEYS: [&str; 3] = ["index", "offset", "start"];

pub fn convert(value: &Value, options: &EstreeOptions) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|item| convert(item, options)).collect()),
        Value::Object(map) => match map.get("type").and_then(Value::as_str) {
            Some(tag) => convert_node(tag, map, options),
            None => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), convert(value, options)))
                    .collect(),
            ),
        },
        other => other.clone(),
    }
}

fn convert_node(tag: &str, node: &Map<String, Value>, options: &EstreeOptions) -> Value {
    let mut out = Map::new();
    out.insert("type".to_string(), Value::String(rename_type(tag).to_string()));

    for (key, value) in node {
        if SKIPPED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if key == "comments" && !options.include_comments {
            continue;
        }
        out.insert(key.clone(), convert(value, options));
    }

    let start = node.get("start");
    let end = node.get("end");

    if options.include_locations {
        if let (Some(start), Some(end)) = (line_column(start), line_column(end)) {
            out.insert("loc".to_string(), json!({ "start": start, "end": end }));
        }
    }

    if options.include_range {
        if let (Some(start), Some(end)) = (offset(start), offset(end)) {
            out.insert("start".to_string(), json!(start));
            out.insert("end".to_string(), json!(end));
            out.insert("range".to_string(), json!([start, end]));
        }
    }

    Value::Object(out)
}

fn rename_type(tag: &str) -> &str {
    match tag {
        "CommentLine" => "Line",
        "CommentBlock" => "Block",
        "Whitespace" => "Whitespace",
        other => other,
    }
}

fn line_column(point: Option<&Value>) -> Option<Value> {
    let point = point?.as_object()?;
    let line = point.get("line")?.as_u64()?;
    let column = point.get("column").and_then(Value::as_u64).unwrap_or(0);
    Some(json!({ "line": line, "column": column }))
}

fn offset(point: Option<&Value>) -> Option<u64> {
    match point? {
        Value::Number(number) => number.as_u64(),
        Value::Object(fields) => OFFSET_KEYS
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_u64)),
        _ => None,
    }
}
