// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-request-renderers.
//
// tracing-request-renderers is free software: you can redistribute it and/or modify it under the
// terms of the GNU General Public License as published by the Free Software Foundation, either
// version 3 of the License, or (at your option) any later version.
//
// tracing-request-renderers is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// tracing-request-renderers.  If not, see <http://www.gnu.org/licenses/>.

//! Value coercion helpers shared by the formatter & the item renderers.

use serde_json::Value;

/// Render `text` as a JSON string literal, quotes included.
pub fn json_string(text: &str) -> String {
    // `Value`'s `Display` cannot fail, unlike `serde_json::to_string`.
    Value::String(text.to_owned()).to_string()
}

/// Look `key` up in `root`.
///
/// When `nested` is set, `key` is a dot-separated path: each segment indexes an object by name, or
/// an array by position. Anything else (a scalar in the middle of the path, an index out of
/// range) yields `None`.
pub fn lookup<'a>(root: &'a Value, key: &str, nested: bool) -> Option<&'a Value> {
    if !nested {
        return root.get(key);
    }
    key.split('.').try_fold(root, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// The text a value contributes to a log line; `None` for null.
///
/// Strings are taken verbatim (no quotes), numbers & booleans as displayed, arrays as their
/// non-null elements joined by commas, and objects as compact JSON.
pub fn to_log_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => Some(value.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(to_log_string)
                .collect::<Vec<String>>()
                .join(","),
        ),
    }
}
