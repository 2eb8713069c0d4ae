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

//! Renderers that turn the cookies, query string, headers & other values of the current web
//! request into text, along with a [`tracing-subscriber`] [`Layer`] that appends them to
//! [`tracing`] [`Event`]s.
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
//!
//! # Introduction
//!
//! When something goes wrong serving a request, the log line is far more useful if it carries a
//! little of the request along with it: the session cookie, the `Id` query parameter, the
//! `X-Request-Id` header. The interesting part isn't fetching those values (every web framework
//! can do that) but deciding _which_ of them to emit & formatting them so that downstream tooling
//! can pick them apart again. Existing log pipelines tend to depend on the exact text, so the
//! formats here are fixed:
//!
//! - cookies render as `key=value&key=value` items, one group per cookie, groups joined by `,`
//! - query strings render as `key:value` items, one per line
//! - either may instead be rendered as a JSON array or a JSON object
//!
//! The pieces are deliberately small. A [`NamedValueSource`] is any keyed collection of (possibly
//! multi-valued) strings. [`select`] picks entries from one by key, honoring an exclusion list,
//! and optionally expands multi-valued entries into their sub-values. [`format`] turns what was
//! selected into text. A [`Renderer`] ties the two together for one kind of request value, and a
//! [`Layout`] names a list of renderers, in code or from a TOML file.
//!
//! [`NamedValueSource`]: crate::source::NamedValueSource
//! [`select`]: crate::select::select
//! [`format`]: crate::format::format
//! [`Renderer`]: crate::renderer::Renderer
//! [`Layout`]: crate::layout::Layout
//!
//! # Usage
//!
//! This crate doesn't know what web framework you use; you tell the [`Layer`] how to find the
//! current request by handing it a [`RequestAccessor`] (any closure returning the request will
//! do):
//!
//! [`Layer`]: crate::layer::Layer
//! [`RequestAccessor`]: crate::context::RequestAccessor
//!
//! ```rust
//! use tracing::info;
//! use tracing_request_renderers::{
//!     context::{Request, RequestContext},
//!     layer::Layer,
//!     layout::Layout,
//!     renderer::CollectionRenderer,
//!     sink::WriterSink,
//!     source::NamedValues,
//! };
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! use std::sync::Arc;
//!
//! let request: Arc<dyn RequestContext + Send + Sync> = Arc::new(
//!     Request::builder()
//!         .query_string(NamedValues::from_query_string("Id=1&Id2=2"))
//!         .build(),
//! );
//!
//! let layout = Layout::new().with_renderer("query", CollectionRenderer::query_string().items(["Id"]));
//! let subscriber = Registry::default().with(Layer::new(
//!     layout,
//!     move || Some(request.clone()),
//!     WriterSink::new(std::io::sink()),
//! ));
//!
//! tracing::subscriber::with_default(subscriber, || {
//!     info!("Hello, world!");
//! });
//! ```
//!
//! Will produce lines that look something like this:
//!
//! ```text
//! 2025-06-23T16:10:55.123456Z INFO rust_out: Hello, world! query=Id:1
//! ```
//!
//! The renderers don't need the [`Layer`] at all, of course:
//!
//! ```rust
//! use tracing_request_renderers::{
//!     context::Request,
//!     format::OutputFormat,
//!     renderer::{CollectionRenderer, Renderer},
//!     source::NamedValues,
//! };
//!
//! let request = Request::builder()
//!     .cookies(NamedValues::from_cookie_header("key=TEST&Key1=TEST1; key2=Test&key3=Test456"))
//!     .build();
//! let renderer = CollectionRenderer::cookies()
//!     .items(["key", "key2"])
//!     .expand_multi_value(true)
//!     .output_format(OutputFormat::JsonArray);
//! assert_eq!(
//!     renderer.render(&request),
//!     r#"{"key=TEST&Key1=TEST1"},{"key2=Test&key3=Test456"}"#
//! );
//! ```

pub mod coerce;
pub mod context;
pub mod error;
pub mod event;
pub mod format;
pub mod guard;
#[cfg(feature = "http")]
pub mod headers;
pub mod layer;
pub mod layout;
pub mod renderer;
pub mod select;
pub mod sink;
pub mod source;
