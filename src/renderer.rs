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

//! Renderers: one request value each, as text.
//!
//! A [`Renderer`] reads one thing from a [`RequestContext`] & renders it as a string. Nothing a
//! renderer meets is an error: a missing collection, key or property renders as the empty string.
//!
//! - [`CollectionRenderer`]: cookies, query string or headers, via [`select`] & [`format`]
//! - [`ItemRenderer`]: one request item or session value, optionally by nested path
//! - [`PropertyRenderer`]: URL, method or user identity

use crate::{
    coerce::{lookup, to_log_string},
    context::RequestContext,
    format::{format, OutputFormat, Style},
    guard::ReentrancyGuard,
    select::{select, KeySelection},
    source::NamedValueSource,
};

use serde::Deserialize;
use tracing::trace;

/// The reentrancy scope held while reading session values
pub const SESSION_SCOPE: &str = "session";

/// Render some aspect of a request as text.
pub trait Renderer {
    fn render(&self, ctx: &dyn RequestContext) -> String;
}

/// Which of the request's collections to render
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Collection {
    Cookies,
    QueryString,
    Headers,
}

impl Collection {
    /// Cookies render cookie-style; the query string & headers render query-string-style.
    pub fn style(&self) -> Style {
        match self {
            Collection::Cookies => Style::cookie(),
            Collection::QueryString | Collection::Headers => Style::query_string(),
        }
    }
    fn source<'a>(&self, ctx: &'a dyn RequestContext) -> Option<&'a dyn NamedValueSource> {
        match self {
            Collection::Cookies => ctx.cookies(),
            Collection::QueryString => ctx.query_string(),
            Collection::Headers => ctx.headers(),
        }
    }
}

/// Render selected entries of one of the request's collections.
///
/// ```rust
/// use tracing_request_renderers::{
///     context::Request, format::OutputFormat, renderer::{CollectionRenderer, Renderer},
///     source::NamedValues,
/// };
/// let req = Request::builder()
///     .cookies(NamedValues::from_cookie_header("key=TEST&Key1=TEST1; key2=Test&key3=Test456"))
///     .build();
/// let r = CollectionRenderer::cookies()
///     .items(["key", "key2"])
///     .expand_multi_value(true)
///     .output_format(OutputFormat::JsonArray);
/// assert_eq!(r.render(&req), r#"{"key=TEST&Key1=TEST1"},{"key2=Test&key3=Test456"}"#);
/// ```
#[derive(Clone, Debug)]
pub struct CollectionRenderer {
    collection: Collection,
    selection: KeySelection,
    expand_multi_value: bool,
    output_format: OutputFormat,
    style: Style,
}

impl CollectionRenderer {
    pub fn new(collection: Collection) -> CollectionRenderer {
        CollectionRenderer {
            collection,
            selection: KeySelection::all(),
            expand_multi_value: false,
            output_format: OutputFormat::default(),
            style: collection.style(),
        }
    }
    pub fn cookies() -> CollectionRenderer {
        CollectionRenderer::new(Collection::Cookies)
    }
    pub fn query_string() -> CollectionRenderer {
        CollectionRenderer::new(Collection::QueryString)
    }
    pub fn headers() -> CollectionRenderer {
        CollectionRenderer::new(Collection::Headers)
    }
    /// Render only these keys, in this order
    pub fn items<I, T>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.selection = self.selection.keys(keys);
        self
    }
    /// Leave these keys out (when no items are named)
    pub fn exclude<I, T>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.selection = self.selection.exclude(keys);
        self
    }
    pub fn expand_multi_value(mut self, expand: bool) -> Self {
        self.expand_multi_value = expand;
        self
    }
    pub fn output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }
    pub fn value_separator(mut self, sep: impl Into<String>) -> Self {
        self.style = self.style.with_value_separator(sep);
        self
    }
    /// For query strings & headers this separates every pair; for cookies, the pairs of one cookie
    pub fn item_separator(mut self, sep: impl Into<String>) -> Self {
        self.style = self.style.with_item_separator(sep);
        self
    }
    pub fn group_separator(mut self, sep: impl Into<String>) -> Self {
        self.style = self.style.with_group_separator(sep);
        self
    }
}

impl Renderer for CollectionRenderer {
    fn render(&self, ctx: &dyn RequestContext) -> String {
        match self.collection.source(ctx) {
            Some(source) => format(
                &select(source, &self.selection, self.expand_multi_value),
                &self.style,
                self.output_format,
            ),
            None => {
                trace!("no {:?} available on this request", self.collection);
                String::new()
            }
        }
    }
}

/// Where an [`ItemRenderer`] looks
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemScope {
    Items,
    Session,
}

/// Render one request item or session value.
///
/// Session reads happen inside the [`SESSION_SCOPE`] reentrancy scope: should reading the session
/// log (& that event come back here to be rendered), the nested read renders nothing.
#[derive(Clone, Debug)]
pub struct ItemRenderer {
    scope: ItemScope,
    key: String,
    nested: bool,
}

impl ItemRenderer {
    pub fn new(scope: ItemScope, key: impl Into<String>) -> ItemRenderer {
        ItemRenderer {
            scope,
            key: key.into(),
            nested: false,
        }
    }
    pub fn item(key: impl Into<String>) -> ItemRenderer {
        ItemRenderer::new(ItemScope::Items, key)
    }
    pub fn session(key: impl Into<String>) -> ItemRenderer {
        ItemRenderer::new(ItemScope::Session, key)
    }
    /// Treat the key as a dot-separated path into nested values
    pub fn nested(mut self, nested: bool) -> Self {
        self.nested = nested;
        self
    }
    fn lookup_in(&self, root: Option<&serde_json::Value>) -> String {
        root.and_then(|root| lookup(root, &self.key, self.nested))
            .and_then(to_log_string)
            .unwrap_or_default()
    }
}

impl Renderer for ItemRenderer {
    fn render(&self, ctx: &dyn RequestContext) -> String {
        match self.scope {
            ItemScope::Items => self.lookup_in(ctx.items()),
            ItemScope::Session => match ReentrancyGuard::acquire(SESSION_SCOPE) {
                Ok(_guard) => self.lookup_in(ctx.session()),
                Err(err) => {
                    trace!("not reading session value '{}': {}", self.key, err);
                    String::new()
                }
            },
        }
    }
}

/// Scalar properties of a request
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestProperty {
    Url,
    Method,
    UserIdentity,
}

/// Render one scalar property of the request.
#[derive(Clone, Debug)]
pub struct PropertyRenderer {
    property: RequestProperty,
}

impl PropertyRenderer {
    pub fn new(property: RequestProperty) -> PropertyRenderer {
        PropertyRenderer { property }
    }
}

impl Renderer for PropertyRenderer {
    fn render(&self, ctx: &dyn RequestContext) -> String {
        match self.property {
            RequestProperty::Url => ctx.url(),
            RequestProperty::Method => ctx.method(),
            RequestProperty::UserIdentity => ctx.user_identity(),
        }
        .unwrap_or_default()
        .to_string()
    }
}
