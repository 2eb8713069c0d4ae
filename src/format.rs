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

//! Turning selected pairs into text.
//!
//! # Introduction
//!
//! [`format`] is the last step in rendering a collection: given the [`Group`]s produced by
//! [`select`], a [`Style`] & an [`OutputFormat`], produce the string that goes into the log line.
//!
//! [`select`]: crate::select::select
//!
//! The output shapes are fixed by what log consumers already parse, so they are reproduced
//! exactly, warts & all. In particular the two built-in styles disagree on what "JSON" means:
//!
//! | Style                   | Flat                                | JsonArray                                  |
//! |-------------------------|-------------------------------------|--------------------------------------------|
//! | [`Style::cookie`]       | `key=TEST&Key1=TEST1,key2=Test`     | `{"key=TEST&Key1=TEST1"},{"key2=Test"}`    |
//! | [`Style::query_string`] | `Id:1,`⏎`Id2:2`                     | `[{"Id":"1"},`⏎`{"Id2":"2"}]`             |
//!
//! The cookie style wraps each group's flat text, as a single JSON string, in braces; the
//! query-string style emits real objects (and drops the enclosing array when there is just one).
//! [`OutputFormat::JsonDictionary`] is the same for both: one object mapping keys to values.
//!
//! Whatever the format, no pairs means an empty string.

use crate::{
    coerce::json_string,
    error::{Error, Result},
    select::{Group, RenderedPair},
};

use backtrace::Backtrace;
use serde::Deserialize;

/// The platform line separator, used by the query-string style
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// The shape of the rendered text
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputFormat {
    /// Delimiter-joined plain text
    #[default]
    Flat,
    /// JSON objects or string literals, depending on the [`Style`]; also accepted as "Json"
    JsonArray,
    /// A single JSON object mapping keys to values
    JsonDictionary,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(OutputFormat::Flat),
            "json" | "jsonarray" | "json-array" => Ok(OutputFormat::JsonArray),
            "jsondictionary" | "json-dictionary" => Ok(OutputFormat::JsonDictionary),
            _ => Err(Error::BadOutputFormat {
                text: s.to_string(),
                back: Backtrace::new(),
            }),
        }
    }
}

impl std::convert::TryFrom<String> for OutputFormat {
    type Error = Error;
    fn try_from(x: String) -> Result<Self> {
        x.parse()
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OutputFormat::Flat => "Flat",
                OutputFormat::JsonArray => "JsonArray",
                OutputFormat::JsonDictionary => "JsonDictionary",
            }
        )
    }
}

/// What [`OutputFormat::JsonArray`] produces
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JsonShape {
    /// `{"<flat group text>"}` per group, comma-joined
    GroupLiteral,
    /// `{"key":"value"}` per pair; several are wrapped in `[...]`
    Objects,
}

/// Separators & JSON shape for one kind of collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Style {
    /// Between a key & its value
    pub value_separator: String,
    /// Between pairs of the same group
    pub item_separator: String,
    /// Between groups
    pub group_separator: String,
    /// When set, every pair is a unit of its own & [`Style::with_item_separator`] sets the group
    /// separator too
    pub pairs_only: bool,
    pub json: JsonShape,
}

impl Style {
    /// `key=TEST&Key1=TEST1,key2=Test`
    pub fn cookie() -> Style {
        Style {
            value_separator: "=".to_string(),
            item_separator: "&".to_string(),
            group_separator: ",".to_string(),
            pairs_only: false,
            json: JsonShape::GroupLiteral,
        }
    }
    /// `Id:1,` + newline + `Id2:2`
    pub fn query_string() -> Style {
        let sep = format!(",{}", LINE_SEPARATOR);
        Style {
            value_separator: ":".to_string(),
            item_separator: sep.clone(),
            group_separator: sep,
            pairs_only: true,
            json: JsonShape::Objects,
        }
    }
    pub fn with_value_separator(mut self, sep: impl Into<String>) -> Self {
        self.value_separator = sep.into();
        self
    }
    /// Replace the separator between pairs (and, for a `pairs_only` style, between groups)
    pub fn with_item_separator(mut self, sep: impl Into<String>) -> Self {
        self.item_separator = sep.into();
        if self.pairs_only {
            self.group_separator = self.item_separator.clone();
        }
        self
    }
    /// Replace the separator between groups only
    pub fn with_group_separator(mut self, sep: impl Into<String>) -> Self {
        self.group_separator = sep.into();
        self
    }
}

/// Render `groups` as text.
pub fn format(groups: &[Group], style: &Style, format: OutputFormat) -> String {
    if groups.iter().all(|g| g.pairs.is_empty()) {
        return String::new();
    }
    match (format, style.json) {
        (OutputFormat::Flat, _) => groups
            .iter()
            .filter(|g| !g.pairs.is_empty())
            .map(|g| flat_group(g, style))
            .collect::<Vec<String>>()
            .join(&style.group_separator),
        (OutputFormat::JsonArray, JsonShape::GroupLiteral) => groups
            .iter()
            .filter(|g| !g.pairs.is_empty())
            .map(|g| format!("{{{}}}", json_string(&flat_group(g, style))))
            .collect::<Vec<String>>()
            .join(","),
        (OutputFormat::JsonArray, JsonShape::Objects) => {
            let objects: Vec<String> = groups
                .iter()
                .flat_map(|g| g.pairs.iter())
                .map(|p| format!("{{{}}}", json_member(p)))
                .collect();
            if objects.len() == 1 {
                objects.concat()
            } else {
                format!("[{}]", objects.join(&format!(",{}", LINE_SEPARATOR)))
            }
        }
        (OutputFormat::JsonDictionary, _) => {
            let mut seen: Vec<&str> = Vec::new();
            let members: Vec<String> = groups
                .iter()
                .flat_map(|g| g.pairs.iter())
                .filter(|p| {
                    if seen.contains(&p.key.as_str()) {
                        false
                    } else {
                        seen.push(&p.key);
                        true
                    }
                })
                .map(json_member)
                .collect();
            format!("{{{}}}", members.join(","))
        }
    }
}

/// Render `pairs` as text, each pair being a group of its own.
pub fn format_pairs(pairs: &[RenderedPair], style: &Style, format: OutputFormat) -> String {
    let groups: Vec<Group> = pairs.iter().map(|p| Group::new(vec![p.clone()])).collect();
    self::format(&groups, style, format)
}

fn flat_group(group: &Group, style: &Style) -> String {
    group
        .pairs
        .iter()
        .map(|p| format!("{}{}{}", p.key, style.value_separator, p.value))
        .collect::<Vec<String>>()
        .join(&style.item_separator)
}

fn json_member(pair: &RenderedPair) -> String {
    format!("{}:{}", json_string(&pair.key), json_string(&pair.value))
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::{
        select::{flatten, select, KeySelection},
        source::NamedValues,
    };

    fn group(pairs: &[(&str, &str)]) -> Group {
        Group::new(pairs.iter().map(|(k, v)| RenderedPair::new(*k, *v)).collect())
    }

    fn two_cookies() -> Vec<Group> {
        vec![
            group(&[("key", "TEST"), ("Key1", "TEST1")]),
            group(&[("key2", "Test"), ("key3", "Test456")]),
        ]
    }

    #[test]
    fn cookie_style() {
        let style = Style::cookie();
        assert_eq!(
            format(&[group(&[("key", "TEST")])], &style, OutputFormat::Flat),
            "key=TEST"
        );
        assert_eq!(
            format(&two_cookies()[..1], &style, OutputFormat::Flat),
            "key=TEST&Key1=TEST1"
        );
        assert_eq!(
            format(&two_cookies(), &style, OutputFormat::Flat),
            "key=TEST&Key1=TEST1,key2=Test&key3=Test456"
        );
        assert_eq!(
            format(&two_cookies()[..1], &style, OutputFormat::JsonArray),
            "{\"key=TEST&Key1=TEST1\"}"
        );
        assert_eq!(
            format(&two_cookies(), &style, OutputFormat::JsonArray),
            "{\"key=TEST&Key1=TEST1\"},{\"key2=Test&key3=Test456\"}"
        );
        assert_eq!(
            format(&two_cookies(), &style, OutputFormat::JsonDictionary),
            "{\"key\":\"TEST\",\"Key1\":\"TEST1\",\"key2\":\"Test\",\"key3\":\"Test456\"}"
        );
    }

    #[test]
    fn query_string_style() {
        let style = Style::query_string();
        let one = [RenderedPair::new("Id", "1")];
        let two = [RenderedPair::new("Id", "1"), RenderedPair::new("Id2", "2")];

        assert_eq!(format_pairs(&one, &style, OutputFormat::Flat), "Id:1");
        assert_eq!(
            format_pairs(&one, &style, OutputFormat::JsonArray),
            "{\"Id\":\"1\"}"
        );
        assert_eq!(
            format_pairs(&two, &style, OutputFormat::Flat),
            format!("Id:1,{}Id2:2", LINE_SEPARATOR)
        );
        assert_eq!(
            format_pairs(&two, &style, OutputFormat::JsonArray),
            format!("[{{\"Id\":\"1\"}},{}{{\"Id2\":\"2\"}}]", LINE_SEPARATOR)
        );
        assert_eq!(
            format_pairs(&two, &style, OutputFormat::JsonDictionary),
            "{\"Id\":\"1\",\"Id2\":\"2\"}"
        );
    }

    #[test]
    fn empty_is_empty() {
        for style in [Style::cookie(), Style::query_string()] {
            for fmt in [
                OutputFormat::Flat,
                OutputFormat::JsonArray,
                OutputFormat::JsonDictionary,
            ] {
                assert_eq!(format(&[], &style, fmt), "");
                assert_eq!(format_pairs(&[], &style, fmt), "");
                assert_eq!(format(&[Group::new(vec![])], &style, fmt), "");
            }
        }
    }

    #[test]
    fn dictionary_keeps_first_of_repeated_keys() {
        let pairs = [
            RenderedPair::new("a", "1"),
            RenderedPair::new("b", "2"),
            RenderedPair::new("a", "3"),
        ];
        assert_eq!(
            format_pairs(&pairs, &Style::cookie(), OutputFormat::JsonDictionary),
            "{\"a\":\"1\",\"b\":\"2\"}"
        );
    }

    #[test]
    fn json_escapes() {
        let pairs = [RenderedPair::new("q", "say \"hi\"")];
        assert_eq!(
            format_pairs(&pairs, &Style::query_string(), OutputFormat::JsonArray),
            "{\"q\":\"say \\\"hi\\\"\"}"
        );
    }

    #[test]
    fn custom_separators() {
        let style = Style::cookie()
            .with_value_separator(":")
            .with_item_separator(";");
        assert_eq!(
            format(&two_cookies(), &style, OutputFormat::Flat),
            "key:TEST;Key1:TEST1,key2:Test;key3:Test456"
        );

        let style = style.with_group_separator(" | ");
        assert_eq!(
            format(&two_cookies(), &style, OutputFormat::Flat),
            "key:TEST;Key1:TEST1 | key2:Test;key3:Test456"
        );
        // The cookie JSON literal is built from the flat group text
        assert_eq!(
            format(&two_cookies()[..1], &style, OutputFormat::JsonArray),
            "{\"key:TEST;Key1:TEST1\"}"
        );
    }

    #[test]
    fn query_string_separators() {
        let pairs = [RenderedPair::new("Id", "1"), RenderedPair::new("Id2", "2")];

        let style = Style::query_string().with_item_separator(";");
        assert_eq!(style.group_separator, ";");
        assert_eq!(format_pairs(&pairs, &style, OutputFormat::Flat), "Id:1;Id2:2");

        // Expanded groups are joined the same way as their pairs
        let groups = vec![group(&[("Id", "1"), ("Id", "3")]), group(&[("Id2", "2")])];
        assert_eq!(format(&groups, &style, OutputFormat::Flat), "Id:1;Id:3;Id2:2");

        let style = style.with_value_separator("=").with_group_separator(" & ");
        assert_eq!(format(&groups, &style, OutputFormat::Flat), "Id=1;Id=3 & Id2=2");
    }

    #[test]
    fn flat_text_splits_back_into_pairs() {
        let style = Style::cookie();
        let groups = two_cookies();
        let text = format(&groups, &style, OutputFormat::Flat);
        let parsed: Vec<Group> = text
            .split(style.group_separator.as_str())
            .map(|g| {
                Group::new(
                    g.split(style.item_separator.as_str())
                        .map(|p| {
                            let (k, v) = p.split_once(style.value_separator.as_str()).unwrap();
                            RenderedPair::new(k, v)
                        })
                        .collect(),
                )
            })
            .collect();
        assert_eq!(parsed, groups);

        let style = Style::query_string();
        let pairs = flatten(&groups);
        let text = format_pairs(&pairs, &style, OutputFormat::Flat);
        let parsed: Vec<RenderedPair> = text
            .split(style.group_separator.as_str())
            .map(|p| {
                let (k, v) = p.split_once(style.value_separator.as_str()).unwrap();
                RenderedPair::new(k, v)
            })
            .collect();
        assert_eq!(parsed, pairs);
    }

    #[test]
    fn output_format_names() {
        assert_eq!("Flat".parse::<OutputFormat>().unwrap(), OutputFormat::Flat);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::JsonArray);
        assert_eq!(
            "JsonArray".parse::<OutputFormat>().unwrap(),
            OutputFormat::JsonArray
        );
        assert_eq!(
            "json-dictionary".parse::<OutputFormat>().unwrap(),
            OutputFormat::JsonDictionary
        );
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default(), OutputFormat::Flat);
        assert_eq!(format!("{}", OutputFormat::JsonDictionary), "JsonDictionary");
    }

    #[test]
    fn literal_scenarios() {
        let c = NamedValues::from_cookie_header("key=TEST&Key1=TEST1");
        let groups = select(&c, &KeySelection::all().keys(["key"]), true);
        assert_eq!(
            format(&groups, &Style::cookie(), OutputFormat::Flat),
            "key=TEST&Key1=TEST1"
        );

        let q = NamedValues::from_query_string("Id=1&Id2=2");
        let groups = select(&q, &KeySelection::all().keys(["Id", "Id2"]), false);
        assert_eq!(
            format(&groups, &Style::query_string(), OutputFormat::JsonArray),
            format!("[{{\"Id\":\"1\"}},{}{{\"Id2\":\"2\"}}]", LINE_SEPARATOR)
        );

        let only_key1 = NamedValues::from_cookie_header("key1=TEST");
        let groups = select(&only_key1, &KeySelection::all().keys(["key"]), true);
        assert_eq!(format(&groups, &Style::cookie(), OutputFormat::Flat), "");
    }
}
