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

//! [`NamedValueSource`] over [`http::HeaderMap`].
//!
//! Each header name is one entry. A header sent more than once becomes a multi-valued entry whose
//! combined value joins the values with commas (which is what a proxy folding them into one line
//! would produce). Lookups are case-insensitive, as header names are.
//!
//! [`http::HeaderMap`]: https://docs.rs/http/latest/http/header/struct.HeaderMap.html

use crate::source::{Entry, KeyComparison, NamedValueSource, SubValue};

use http::header::{GetAll, HeaderMap, HeaderValue};

fn header_entry(name: &str, values: GetAll<'_, HeaderValue>) -> Entry {
    let subs: Vec<SubValue> = values
        .iter()
        // Header values needn't be UTF-8; a lossy rendering beats dropping them
        .map(|v| SubValue::new(Some(name.to_string()), String::from_utf8_lossy(v.as_bytes())))
        .collect();
    let combined = subs
        .iter()
        .map(|s| s.value.as_str())
        .collect::<Vec<&str>>()
        .join(",");
    Entry::multi(name, subs, combined)
}

impl NamedValueSource for HeaderMap<HeaderValue> {
    fn entries(&self) -> Box<dyn Iterator<Item = Entry> + '_> {
        Box::new(
            self.keys()
                .map(move |name| header_entry(name.as_str(), self.get_all(name))),
        )
    }
    /// The entry is reported under `key` as given, not the map's lower-cased name
    fn entry(&self, key: &str) -> Option<Entry> {
        let values = self.get_all(key);
        if values.iter().next().is_none() {
            None
        } else {
            Some(header_entry(key, values))
        }
    }
    fn key_comparison(&self) -> KeyComparison {
        KeyComparison::IgnoreCase
    }
}
