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

//! Choosing which values to render.
//!
//! [`select`] resolves a [`NamedValueSource`], a [`KeySelection`] & a multi-value policy into the
//! ordered [`Group`]s of [`RenderedPair`]s the [formatter](crate::format) turns into text. It is a
//! pure function: nothing is logged, nothing is mutated & nothing fails. A requested key that isn't
//! there simply doesn't show up.

use crate::source::{Entry, KeyComparison, NamedValueSource};

/// Which keys to render.
///
/// An empty key list means "every key" & an empty exclusion list means "exclude nothing". The
/// exclusion list is consulted only when selecting every key; when keys are named explicitly,
/// it is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeySelection {
    keys: Vec<String>,
    exclude: Vec<String>,
}

impl KeySelection {
    /// Select every key
    pub fn all() -> KeySelection {
        KeySelection::default()
    }
    /// Select `keys`, in that order
    pub fn keys<I, T>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }
    /// Skip `keys` when selecting every key
    pub fn exclude<I, T>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.exclude = keys.into_iter().map(Into::into).collect();
        self
    }
    /// The explicitly requested keys, if any
    pub fn requested(&self) -> Option<&[String]> {
        if self.keys.is_empty() {
            None
        } else {
            Some(&self.keys)
        }
    }
    fn excludes(&self, key: &str, comparison: KeyComparison) -> bool {
        self.exclude.iter().any(|k| comparison.matches(k, key))
    }
}

/// One key/value pair, ready for formatting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPair {
    pub key: String,
    pub value: String,
}

impl RenderedPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> RenderedPair {
        RenderedPair {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The pairs produced by one source [`Entry`]: just one, unless the entry was expanded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub pairs: Vec<RenderedPair>,
}

impl Group {
    pub fn new(pairs: Vec<RenderedPair>) -> Group {
        Group { pairs }
    }
}

/// Resolve `selection` against `source`.
///
/// With explicit keys, groups come out in the order the keys were given (duplicates included);
/// keys missing from `source` are skipped. Without, every entry of `source` that isn't excluded
/// comes out in `source`'s own order.
///
/// When `expand_multi_value` is set, an entry with several sub-values yields one pair per
/// sub-value: the first under the entry's own key, the rest under their own sub-keys. Otherwise
/// (and always for single-valued entries) an entry yields one pair carrying its combined value.
pub fn select<S: NamedValueSource + ?Sized>(
    source: &S,
    selection: &KeySelection,
    expand_multi_value: bool,
) -> Vec<Group> {
    match selection.requested() {
        Some(keys) => keys
            .iter()
            .filter_map(|key| source.entry(key))
            .map(|entry| group(&entry, expand_multi_value))
            .collect(),
        None => {
            let comparison = source.key_comparison();
            source
                .entries()
                .filter(|entry| !selection.excludes(entry.key(), comparison))
                .map(|entry| group(&entry, expand_multi_value))
                .collect()
        }
    }
}

fn group(entry: &Entry, expand_multi_value: bool) -> Group {
    if expand_multi_value && entry.is_multi_valued() {
        Group::new(
            entry
                .values()
                .iter()
                .enumerate()
                .map(|(i, sub)| {
                    let key = match (i, &sub.key) {
                        (0, _) | (_, None) => entry.key(),
                        (_, Some(key)) => key.as_str(),
                    };
                    RenderedPair::new(key, sub.value.as_str())
                })
                .collect(),
        )
    } else {
        Group::new(vec![RenderedPair::new(entry.key(), entry.combined_value())])
    }
}

/// All pairs of all groups, in order
pub fn flatten(groups: &[Group]) -> Vec<RenderedPair> {
    groups.iter().flat_map(|g| g.pairs.iter().cloned()).collect()
}
