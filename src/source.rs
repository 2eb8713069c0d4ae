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

//! Collections of named values.
//!
//! Cookies, query-string parameters & headers all boil down to the same shape: an ordered
//! collection of entries, each a key carrying one or more values. [`NamedValueSource`] is the
//! read-only view of that shape the [selector](crate::select) works against; [`NamedValues`] is an
//! owned implementation, along with parsers for the two textual encodings we meet most often.
//!
//! # Examples
//!
//! ```rust
//! use tracing_request_renderers::source::{NamedValueSource, NamedValues};
//! let cookies = NamedValues::from_cookie_header("key=TEST&Key1=TEST1; key2=Test");
//! let entry = cookies.entry("key").unwrap();
//! assert!(entry.is_multi_valued());
//! assert_eq!(entry.combined_value(), "TEST&Key1=TEST1");
//! ```

use percent_encoding::percent_decode_str;

/// How keys are compared when looking them up.
///
/// The comparison is a property of the collection, not of the caller: HTTP header names are
/// case-insensitive, query-string parameters as parsed here are not.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum KeyComparison {
    /// Byte-for-byte
    #[default]
    Ordinal,
    /// Unicode case-insensitive
    IgnoreCase,
}

impl KeyComparison {
    pub fn matches(&self, a: &str, b: &str) -> bool {
        match self {
            KeyComparison::Ordinal => a == b,
            KeyComparison::IgnoreCase => {
                if a.is_ascii() && b.is_ascii() {
                    a.eq_ignore_ascii_case(b)
                } else {
                    a.to_lowercase() == b.to_lowercase()
                }
            }
        }
    }
}

/// One of the values carried by an [`Entry`], optionally under a key of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubValue {
    pub key: Option<String>,
    pub value: String,
}

impl SubValue {
    pub fn new(key: Option<String>, value: impl Into<String>) -> SubValue {
        SubValue {
            key,
            value: value.into(),
        }
    }
}

/// A key associated with one or more values.
///
/// `combined` is the single-string form of the entry, used whenever the entry is not expanded.
/// Its shape is up to whoever built the entry: a cookie's raw value, say, or repeated query-string
/// values joined with commas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    key: String,
    values: Vec<SubValue>,
    combined: String,
}

impl Entry {
    /// An entry with exactly one value
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Entry {
        let key = key.into();
        let value = value.into();
        Entry {
            values: vec![SubValue::new(Some(key.clone()), value.clone())],
            key,
            combined: value,
        }
    }
    /// An entry with any number of sub-values & an explicit combined form
    pub fn multi(
        key: impl Into<String>,
        values: Vec<SubValue>,
        combined: impl Into<String>,
    ) -> Entry {
        Entry {
            key: key.into(),
            values,
            combined: combined.into(),
        }
    }
    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn values(&self) -> &[SubValue] {
        &self.values
    }
    pub fn combined_value(&self) -> &str {
        &self.combined
    }
    /// True if this entry carries more than one sub-value
    pub fn is_multi_valued(&self) -> bool {
        self.values.len() > 1
    }
}

/// A read-only, ordered collection of [`Entry`]s.
///
/// Implementations own their data for (at least) the duration of one render. Entries are handed
/// out by value; a render touches a handful of them, and owning them frees adapters over foreign
/// types (like [`http::HeaderMap`]) from having to store [`Entry`] instances.
///
/// [`http::HeaderMap`]: https://docs.rs/http/latest/http/header/struct.HeaderMap.html
pub trait NamedValueSource {
    /// All entries, in the collection's natural order
    fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_>;
    /// The first entry whose key matches `key` under [`NamedValueSource::key_comparison`]
    fn entry(&self, key: &str) -> Option<Entry>;
    fn key_comparison(&self) -> KeyComparison {
        KeyComparison::Ordinal
    }
}

/// An owned, insertion-ordered [`NamedValueSource`].
///
/// Lookups are linear; request collections are small.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamedValues {
    entries: Vec<Entry>,
    comparison: KeyComparison,
}

impl NamedValues {
    pub fn new() -> NamedValues {
        NamedValues::default()
    }
    pub fn with_key_comparison(mut self, comparison: KeyComparison) -> Self {
        self.comparison = comparison;
        self
    }
    /// Append `entry`, even if an entry with the same key is already present
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }
    /// Add `value` under `key`, merging into the existing entry for `key` if there is one
    ///
    /// A merged entry gains `value` as a further sub-value (under `key`), and its combined value
    /// becomes all its values joined by commas.
    pub fn append_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let comparison = self.comparison;
        match self
            .entries
            .iter_mut()
            .find(|e| comparison.matches(&e.key, &key))
        {
            Some(entry) => {
                entry.combined.push(',');
                entry.combined.push_str(&value);
                entry.values.push(SubValue::new(Some(key), value));
            }
            None => self.entries.push(Entry::single(key, value)),
        }
    }
    /// Parse a URL query string (with or without the leading '?')
    ///
    /// `+` is read as a space & percent-escapes are decoded; invalid UTF-8 is replaced rather than
    /// rejected. A parameter without `=` is a key with an empty value.
    pub fn from_query_string(query: &str) -> NamedValues {
        let mut values = NamedValues::new();
        query
            .strip_prefix('?')
            .unwrap_or(query)
            .split('&')
            .filter(|piece| !piece.is_empty())
            .for_each(|piece| {
                let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
                values.append_value(decode_query_component(key), decode_query_component(value));
            });
        values
    }
    /// Parse the value of a `Cookie` request header
    ///
    /// Each cookie's value is further split on `&` into sub-values: `TEST&Key1=TEST1` yields a
    /// sub-value "TEST" with no key of its own, followed by "TEST1" under "Key1". The first piece
    /// is always taken whole, `=` and all (`s=x=1` has the primary value "x=1"). The raw cookie
    /// value is kept as the entry's combined value.
    pub fn from_cookie_header(header: &str) -> NamedValues {
        let mut values = NamedValues::new();
        header
            .split(';')
            .map(str::trim)
            .filter(|cookie| !cookie.is_empty())
            .for_each(|cookie| {
                let (name, raw) = cookie.split_once('=').unwrap_or((cookie, ""));
                let raw = raw.trim();
                let mut pieces = raw.split('&');
                let subs = pieces
                    .next()
                    .map(|primary| SubValue::new(None, primary))
                    .into_iter()
                    .chain(pieces.map(|piece| match piece.split_once('=') {
                        Some((k, v)) => SubValue::new(Some(k.to_string()), v),
                        None => SubValue::new(None, piece),
                    }))
                    .collect();
                values.push(Entry::multi(name.trim(), subs, raw));
            });
        values
    }
    /// Snapshot any [`NamedValueSource`], keeping its key comparison
    pub fn collect_from<S: NamedValueSource + ?Sized>(source: &S) -> NamedValues {
        NamedValues {
            entries: source.entries().collect(),
            comparison: source.key_comparison(),
        }
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn decode_query_component(text: &str) -> String {
    percent_decode_str(&text.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

impl<K: Into<String>, V: Into<String>> std::iter::FromIterator<(K, V)> for NamedValues {
    /// Each pair becomes a single-valued entry; repeated keys are kept as separate entries.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        NamedValues {
            entries: iter
                .into_iter()
                .map(|(k, v)| Entry::single(k, v))
                .collect(),
            comparison: KeyComparison::Ordinal,
        }
    }
}

impl NamedValueSource for NamedValues {
    fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_> {
        Box::new(self.entries.iter().cloned())
    }
    fn entry(&self, key: &str) -> Option<Entry> {
        self.entries
            .iter()
            .find(|e| self.comparison.matches(&e.key, key))
            .cloned()
    }
    fn key_comparison(&self) -> KeyComparison {
        self.comparison
    }
}
