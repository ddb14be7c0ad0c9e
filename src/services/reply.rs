//! Interpretation of the raw text returned by the generation engine.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    Array(Vec<Value>),
    /// Valid JSON whose top level is not an array.
    NotArray(&'static str),
    Unparseable(String),
}

impl ReplyOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            ReplyOutcome::Array(_) => "array",
            ReplyOutcome::NotArray(_) => "not_array",
            ReplyOutcome::Unparseable(_) => "unparseable",
        }
    }

    /// Collapses every non-array outcome into an empty list, logging which one it was.
    pub fn into_products(self, raw: &str) -> Vec<Value> {
        match self {
            ReplyOutcome::Array(items) => items,
            ReplyOutcome::NotArray(json_type) => {
                tracing::warn!(
                    reply_kind = "not_array",
                    json_type,
                    reply = %preview(raw),
                    "model reply is JSON but not an array"
                );
                Vec::new()
            }
            ReplyOutcome::Unparseable(error) => {
                tracing::warn!(
                    reply_kind = "unparseable",
                    %error,
                    reply = %preview(raw),
                    "model reply is not valid JSON"
                );
                Vec::new()
            }
        }
    }
}

pub fn parse_reply(raw: &str, lenient: bool) -> ReplyOutcome {
    let trimmed = raw.trim();
    let cleaned;
    let candidate = if lenient {
        cleaned = clean_reply(trimmed);
        cleaned.as_str()
    } else {
        trimmed
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Array(items)) => ReplyOutcome::Array(items),
        Ok(other) => ReplyOutcome::NotArray(json_type(&other)),
        Err(err) => ReplyOutcome::Unparseable(err.to_string()),
    }
}

/// Strips the wrapping models tend to add around a JSON array: a BOM, code
/// fences, comments, surrounding prose and `...` elisions.
fn clean_reply(text: &str) -> String {
    let mut text = text.trim_matches('\u{feff}').trim();

    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            text = after[..end].trim();
        }
    }

    let uncommented = strip_comments(text);
    let mut text = uncommented.as_str();
    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if start < end {
            text = &text[start..=end];
        }
    }

    let lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "...")
        .collect::<Vec<_>>()
        .join("\n");
    drop_trailing_elision(&lines)
}

/// Removes `//` and `/* */` comments outside of string literals.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                while chars.next_if(|&ch| ch != '\n').is_some() {}
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for ch in chars.by_ref() {
                    if prev == '*' && ch == '/' {
                        break;
                    }
                    prev = ch;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// `[{..}, ...]` and `[{..}, ]` become `[{..}]`.
fn drop_trailing_elision(text: &str) -> String {
    let Some(body) = text.strip_suffix(']') else {
        return text.to_string();
    };
    let body = body.trim_end();
    let body = body.strip_suffix("...").unwrap_or(body).trim_end();
    let body = body.strip_suffix(',').unwrap_or(body);
    format!("{body}]")
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn preview(raw: &str) -> String {
    const LIMIT: usize = 200;
    match raw.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}
