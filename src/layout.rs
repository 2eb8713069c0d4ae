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

//! Layouts: named renderers, built in code or from configuration.
//!
//! A layout file is a TOML document with one `[[renderer]]` table per value to render; `type`
//! picks the renderer & `name` labels its output:
//!
//! ```toml
//! [[renderer]]
//! type = "request-cookie"
//! name = "cookies"
//! items = ["key", "key2"]
//! expand_multi_value = true
//! output_format = "Json"
//!
//! [[renderer]]
//! type = "request-querystring"
//! name = "query"
//! exclude = ["password"]
//!
//! [[renderer]]
//! type = "session"
//! name = "user"
//! key = "user.name"
//! nested = true
//!
//! [[renderer]]
//! type = "request-property"
//! name = "url"
//! property = "url"
//! ```
//!
//! Unknown renderer types & output formats are rejected when the file is read, not when an event
//! is rendered.

use crate::{
    context::RequestContext,
    error::{Error, Result},
    format::OutputFormat,
    renderer::{
        Collection, CollectionRenderer, ItemRenderer, ItemScope, PropertyRenderer, Renderer,
        RequestProperty,
    },
};

use backtrace::Backtrace;
use serde::Deserialize;
use tracing::debug;

/// Settings shared by the collection renderers
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CollectionConfig {
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub expand_multi_value: bool,
    #[serde(default)]
    pub output_format: OutputFormat,
    pub value_separator: Option<String>,
    pub item_separator: Option<String>,
    pub group_separator: Option<String>,
}

impl CollectionConfig {
    fn build(self, collection: Collection) -> CollectionRenderer {
        let mut r = CollectionRenderer::new(collection)
            .items(self.items)
            .exclude(self.exclude)
            .expand_multi_value(self.expand_multi_value)
            .output_format(self.output_format);
        if let Some(sep) = self.value_separator {
            r = r.value_separator(sep);
        }
        if let Some(sep) = self.item_separator {
            r = r.item_separator(sep);
        }
        // Applied last, so it wins over a shared item separator
        if let Some(sep) = self.group_separator {
            r = r.group_separator(sep);
        }
        r
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ItemConfig {
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub nested: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PropertyConfig {
    pub name: String,
    pub property: RequestProperty,
}

/// One `[[renderer]]` table
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RendererConfig {
    #[serde(rename = "request-cookie")]
    RequestCookie(CollectionConfig),
    #[serde(rename = "request-querystring")]
    RequestQueryString(CollectionConfig),
    #[serde(rename = "request-headers")]
    RequestHeaders(CollectionConfig),
    #[serde(rename = "item")]
    Item(ItemConfig),
    #[serde(rename = "session")]
    Session(ItemConfig),
    #[serde(rename = "request-property")]
    RequestProperty(PropertyConfig),
}

impl RendererConfig {
    pub fn name(&self) -> &str {
        match self {
            RendererConfig::RequestCookie(c)
            | RendererConfig::RequestQueryString(c)
            | RendererConfig::RequestHeaders(c) => &c.name,
            RendererConfig::Item(c) | RendererConfig::Session(c) => &c.name,
            RendererConfig::RequestProperty(c) => &c.name,
        }
    }
    pub fn build(self) -> (String, Box<dyn Renderer + Send + Sync>) {
        match self {
            RendererConfig::RequestCookie(c) => {
                (c.name.clone(), Box::new(c.build(Collection::Cookies)))
            }
            RendererConfig::RequestQueryString(c) => {
                (c.name.clone(), Box::new(c.build(Collection::QueryString)))
            }
            RendererConfig::RequestHeaders(c) => {
                (c.name.clone(), Box::new(c.build(Collection::Headers)))
            }
            RendererConfig::Item(c) => (
                c.name,
                Box::new(ItemRenderer::new(ItemScope::Items, c.key).nested(c.nested)),
            ),
            RendererConfig::Session(c) => (
                c.name,
                Box::new(ItemRenderer::new(ItemScope::Session, c.key).nested(c.nested)),
            ),
            RendererConfig::RequestProperty(c) => {
                (c.name, Box::new(PropertyRenderer::new(c.property)))
            }
        }
    }
}

/// A whole layout file
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct LayoutConfig {
    #[serde(default, rename = "renderer")]
    pub renderers: Vec<RendererConfig>,
}

/// Named renderers, rendered in order.
#[derive(Default)]
pub struct Layout {
    renderers: Vec<(String, Box<dyn Renderer + Send + Sync>)>,
}

impl Layout {
    pub fn new() -> Layout {
        Layout::default()
    }
    pub fn with_renderer(
        mut self,
        name: impl Into<String>,
        renderer: impl Renderer + Send + Sync + 'static,
    ) -> Self {
        self.renderers.push((name.into(), Box::new(renderer)));
        self
    }
    pub fn from_config(config: LayoutConfig) -> Layout {
        Layout {
            renderers: config
                .renderers
                .into_iter()
                .map(RendererConfig::build)
                .collect(),
        }
    }
    pub fn from_toml(text: &str) -> Result<Layout> {
        let config: LayoutConfig = toml::from_str(text).map_err(|err| Error::BadConfig {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        debug!(
            "read a layout with {} renderer(s): {:?}",
            config.renderers.len(),
            config
                .renderers
                .iter()
                .map(RendererConfig::name)
                .collect::<Vec<&str>>()
        );
        Ok(Layout::from_config(config))
    }
    pub fn len(&self) -> usize {
        self.renderers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
    /// Render every renderer against `ctx`, pairing each result with its name
    pub fn render(&self, ctx: &dyn RequestContext) -> Vec<(&str, String)> {
        self.renderers
            .iter()
            .map(|(name, r)| (name.as_str(), r.render(ctx)))
            .collect()
    }
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.renderers.iter().map(|(name, _)| name))
            .finish()
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::{context::Request, source::NamedValues};

    use serde_json::json;

    const LAYOUT: &str = r#"
[[renderer]]
type = "request-cookie"
name = "cookies"
items = ["key", "key2"]
expand_multi_value = true
output_format = "Json"

[[renderer]]
type = "request-querystring"
name = "query"
exclude = ["password"]
value_separator = "="

[[renderer]]
type = "session"
name = "user"
key = "user.name"
nested = true

[[renderer]]
type = "request-property"
name = "method"
property = "method"
"#;

    #[test]
    fn reads_toml() {
        let config: LayoutConfig = toml::from_str(LAYOUT).unwrap();
        assert_eq!(config.renderers.len(), 4);
        assert_eq!(
            config.renderers[0],
            RendererConfig::RequestCookie(CollectionConfig {
                name: "cookies".to_string(),
                items: vec!["key".to_string(), "key2".to_string()],
                exclude: vec![],
                expand_multi_value: true,
                output_format: OutputFormat::JsonArray,
                value_separator: None,
                item_separator: None,
                group_separator: None,
            })
        );
        assert_eq!(
            config.renderers[3],
            RendererConfig::RequestProperty(PropertyConfig {
                name: "method".to_string(),
                property: RequestProperty::Method,
            })
        );
    }

    #[test]
    fn renders_in_order() {
        let layout = Layout::from_toml(LAYOUT).unwrap();
        assert_eq!(layout.len(), 4);
        let req = Request::builder()
            .cookies(NamedValues::from_cookie_header(
                "key=TEST&Key1=TEST1; key2=Test&key3=Test456",
            ))
            .query_string(NamedValues::from_query_string("password=hunter2&Id=1"))
            .session(json!({"user": {"name": "bree"}}))
            .method("GET")
            .build();
        assert_eq!(
            layout.render(&req),
            vec![
                (
                    "cookies",
                    "{\"key=TEST&Key1=TEST1\"},{\"key2=Test&key3=Test456\"}".to_string()
                ),
                ("query", "Id=1".to_string()),
                ("user", "bree".to_string()),
                ("method", "GET".to_string()),
            ]
        );
    }

    #[test]
    fn separators_from_toml() {
        let layout = Layout::from_toml(
            r#"
[[renderer]]
type = "request-querystring"
name = "q"
item_separator = "|"

[[renderer]]
type = "request-cookie"
name = "c"
item_separator = ";"
group_separator = " "
"#,
        )
        .unwrap();
        let req = Request::builder()
            .query_string(NamedValues::from_query_string("Id=1&Id2=2"))
            .cookies(NamedValues::from_cookie_header("a=1&x=2; b=2"))
            .build();
        assert_eq!(
            layout.render(&req),
            vec![
                ("q", "Id:1|Id2:2".to_string()),
                ("c", "a=1&x=2 b=2".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_bad_output_format() {
        let err = Layout::from_toml(
            r#"
[[renderer]]
type = "request-cookie"
name = "cookies"
output_format = "xml"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::BadConfig { .. }));
        assert!(format!("{}", err).contains("xml"));
    }

    #[test]
    fn rejects_unknown_renderer() {
        assert!(
            Layout::from_toml("[[renderer]]\ntype = \"aspnet-mvc-action\"\nname = \"a\"\n").is_err()
        );
        assert!(Layout::from_toml("").unwrap().is_empty());
    }

    #[test]
    fn built_in_code() {
        let layout = Layout::new()
            .with_renderer("url", PropertyRenderer::new(RequestProperty::Url))
            .with_renderer("id", CollectionRenderer::query_string().items(["Id"]));
        let req = Request::builder()
            .url("/x?Id=1")
            .query_string(NamedValues::from_query_string("Id=1"))
            .build();
        assert_eq!(
            layout.render(&req),
            vec![("url", "/x?Id=1".to_string()), ("id", "Id:1".to_string())]
        );
        assert_eq!(format!("{:?}", layout), "[\"url\", \"id\"]");
    }
}
