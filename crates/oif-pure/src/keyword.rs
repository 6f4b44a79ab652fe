//! Translation of OIF user-area lines into typed key/value/comment entries.
//!
//! Each line follows the FITS card convention loosely: an 8-character key
//! field (7 for `HISTORY`/`COMMENT`), a separator column, then a value with
//! an optional ` / comment`.

use crate::value::{infer, Value};

const COMMENTARY_KEYS: [&str; 2] = ["HISTORY", "COMMENT"];

/// One parsed user-area line.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub key: String,
    pub value: Value,
    pub comment: String,
}

impl MetadataEntry {
    /// `HISTORY`, `COMMENT` and blank-key entries carry free text only.
    pub fn is_commentary(&self) -> bool {
        self.key.is_empty() || COMMENTARY_KEYS.contains(&self.key.as_str())
    }

    /// Render this entry as a user-area line that [`parse_line`] maps back to
    /// the same key, value and comment.
    pub fn to_line(&self) -> String {
        if self.is_commentary() {
            let text = match &self.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let width = if self.key.is_empty() { 8 } else { 7 };
            return format!("{:<width$} {}", self.key, text);
        }

        let mut line = format!("{:<8}= {}", self.key, self.value);
        if !self.comment.is_empty() {
            line.push_str(" / ");
            line.push_str(&self.comment);
        }
        line
    }
}

/// Byte offset of the `n`th character of `s`, or `s.len()` past the end.
fn char_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

/// Parse a single user-area line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<MetadataEntry> {
    if line.trim().is_empty() {
        return None;
    }

    let head = &line[..char_offset(line, 7)];
    let commentary = COMMENTARY_KEYS.contains(&head);
    let width = if commentary { 7 } else { 8 };

    let key: String = line[..char_offset(line, width)]
        .trim()
        .chars()
        .filter(|&c| c != '/')
        .collect();
    let rest = &line[char_offset(line, width + 1)..];

    if commentary || key.is_empty() {
        return Some(MetadataEntry {
            key,
            value: Value::String(String::from(rest)),
            comment: String::new(),
        });
    }

    let (value_text, comment) = if rest.matches('\'').count() == 2 {
        let mut parts = rest.splitn(3, '\'');
        let _before = parts.next();
        let inner = parts.next().unwrap_or("");
        let after = parts.next().unwrap_or("");
        let comment = after.split_once('/').map_or("", |(_, c)| c.trim());
        (format!("'{inner}'"), comment)
    } else if let Some((v, c)) = rest.split_once('/') {
        (String::from(v.trim()), c.trim())
    } else {
        (String::from(rest.trim()), "")
    };

    Some(MetadataEntry {
        key,
        value: infer(&value_text),
        comment: String::from(comment),
    })
}

/// Parse every line in order, skipping blank ones.
pub fn translate_lines<S: AsRef<str>>(lines: &[S]) -> Vec<MetadataEntry> {
    lines
        .iter()
        .filter_map(|line| parse_line(line.as_ref()))
        .inspect(|e| log::debug!("k :{}:  v :{:?}:  c :{}:", e.key, e.value, e.comment))
        .collect()
}
