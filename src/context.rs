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

//! The request, as seen by a renderer.
//!
//! This crate does not know what web framework you use. [`RequestContext`] is the projection of a
//! request that renderers read from, & [`RequestAccessor`] is how the [`Layer`] finds the request
//! that is current when an event fires. Both are handed to the [`Layer`] when it is built; there
//! is no process-wide registry to look them up in.
//!
//! [`Request`] is a plain, owned [`RequestContext`]. With the `http` feature it can be
//! snapshotted from an [`http::request::Parts`].
//!
//! [`Layer`]: crate::layer::Layer
//! [`http::request::Parts`]: https://docs.rs/http/latest/http/request/struct.Parts.html

use crate::source::{NamedValueSource, NamedValues};

use serde_json::Value;

use std::sync::Arc;

/// Read-only access to the values of one request.
///
/// Every method defaults to "not available", so implementations only provide what their platform
/// has.
pub trait RequestContext {
    fn cookies(&self) -> Option<&dyn NamedValueSource> {
        None
    }
    fn query_string(&self) -> Option<&dyn NamedValueSource> {
        None
    }
    fn headers(&self) -> Option<&dyn NamedValueSource> {
        None
    }
    /// Request-scoped items, as a JSON object
    fn items(&self) -> Option<&Value> {
        None
    }
    /// Session values, as a JSON object
    fn session(&self) -> Option<&Value> {
        None
    }
    fn url(&self) -> Option<&str> {
        None
    }
    fn method(&self) -> Option<&str> {
        None
    }
    fn user_identity(&self) -> Option<&str> {
        None
    }
}

/// Find the request (if any) that is current on the calling thread or task.
///
/// How "current" is tracked (a task-local, a request-scoped extension, ...) is entirely up to the
/// host. Closures returning the right type implement this trait.
pub trait RequestAccessor: Send + Sync {
    fn current(&self) -> Option<Arc<dyn RequestContext + Send + Sync>>;
}

impl<F> RequestAccessor for F
where
    F: Fn() -> Option<Arc<dyn RequestContext + Send + Sync>> + Send + Sync,
{
    fn current(&self) -> Option<Arc<dyn RequestContext + Send + Sync>> {
        (self)()
    }
}

/// An owned snapshot of a request.
#[derive(Clone, Debug, Default)]
pub struct Request {
    cookies: Option<NamedValues>,
    query_string: Option<NamedValues>,
    headers: Option<NamedValues>,
    items: Option<Value>,
    session: Option<Value>,
    url: Option<String>,
    method: Option<String>,
    user_identity: Option<String>,
}

pub struct RequestBuilder {
    imp: Request,
}

impl RequestBuilder {
    pub fn cookies(mut self, cookies: NamedValues) -> Self {
        self.imp.cookies = Some(cookies);
        self
    }
    pub fn query_string(mut self, query_string: NamedValues) -> Self {
        self.imp.query_string = Some(query_string);
        self
    }
    pub fn headers(mut self, headers: NamedValues) -> Self {
        self.imp.headers = Some(headers);
        self
    }
    pub fn items(mut self, items: Value) -> Self {
        self.imp.items = Some(items);
        self
    }
    pub fn session(mut self, session: Value) -> Self {
        self.imp.session = Some(session);
        self
    }
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.imp.url = Some(url.into());
        self
    }
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.imp.method = Some(method.into());
        self
    }
    pub fn user_identity(mut self, user_identity: impl Into<String>) -> Self {
        self.imp.user_identity = Some(user_identity.into());
        self
    }
    pub fn build(self) -> Request {
        self.imp
    }
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            imp: Request::default(),
        }
    }
    /// Continue building from this snapshot
    pub fn into_builder(self) -> RequestBuilder {
        RequestBuilder { imp: self }
    }
}

#[cfg(feature = "http")]
impl Request {
    /// Snapshot the headers, cookies, query string, URI & method of `parts`.
    ///
    /// Cookies come from every `Cookie` header, in order. Items, session & user identity aren't
    /// part of an HTTP request; add them with [`Request::into_builder`] if your framework has them.
    pub fn from_http(parts: &http::request::Parts) -> Request {
        let mut cookies = NamedValues::new();
        parts
            .headers
            .get_all(http::header::COOKIE)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .flat_map(|header| {
                NamedValues::from_cookie_header(&header)
                    .entries()
                    .collect::<Vec<_>>()
            })
            .for_each(|entry| cookies.push(entry));
        Request {
            cookies: Some(cookies),
            query_string: Some(NamedValues::from_query_string(
                parts.uri.query().unwrap_or(""),
            )),
            headers: Some(NamedValues::collect_from(&parts.headers)),
            url: Some(parts.uri.to_string()),
            method: Some(parts.method.as_str().to_string()),
            ..Request::default()
        }
    }
}

impl RequestContext for Request {
    fn cookies(&self) -> Option<&dyn NamedValueSource> {
        self.cookies.as_ref().map(|c| c as &dyn NamedValueSource)
    }
    fn query_string(&self) -> Option<&dyn NamedValueSource> {
        self.query_string
            .as_ref()
            .map(|q| q as &dyn NamedValueSource)
    }
    fn headers(&self) -> Option<&dyn NamedValueSource> {
        self.headers.as_ref().map(|h| h as &dyn NamedValueSource)
    }
    fn items(&self) -> Option<&Value> {
        self.items.as_ref()
    }
    fn session(&self) -> Option<&Value> {
        self.session.as_ref()
    }
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
    fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }
    fn user_identity(&self) -> Option<&str> {
        self.user_identity.as_deref()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn builder_and_accessor() {
        let req: Arc<dyn RequestContext + Send + Sync> = Arc::new(
            Request::builder()
                .url("https://bree.local/x?Id=1")
                .method("GET")
                .query_string(NamedValues::from_query_string("Id=1"))
                .build(),
        );
        assert_eq!(req.url(), Some("https://bree.local/x?Id=1"));
        assert_eq!(req.method(), Some("GET"));
        assert!(req.cookies().is_none());
        assert!(req.query_string().unwrap().entry("Id").is_some());

        let accessor = move || Some(req.clone());
        assert_eq!(accessor.current().unwrap().method(), Some("GET"));

        let nothing = || -> Option<Arc<dyn RequestContext + Send + Sync>> { None };
        assert!(nothing.current().is_none());
    }

    #[cfg(feature = "http")]
    #[test]
    fn from_http_parts() {
        let (parts, _) = http::Request::builder()
            .method("POST")
            .uri("https://bree.local/login?Id=1&Id2=2")
            .header("Cookie", "key=TEST&Key1=TEST1")
            .header("cookie", "key2=Test")
            .header("X-Trace", "abc")
            .body(())
            .unwrap()
            .into_parts();
        let req = Request::from_http(&parts)
            .into_builder()
            .user_identity("bree")
            .build();

        assert_eq!(req.method(), Some("POST"));
        assert_eq!(req.url(), Some("https://bree.local/login?Id=1&Id2=2"));
        assert_eq!(req.user_identity(), Some("bree"));

        let cookies = req.cookies().unwrap();
        let keys: Vec<String> = cookies.entries().map(|e| e.key().to_string()).collect();
        assert_eq!(keys, vec!["key", "key2"]);

        let headers = req.headers().unwrap();
        assert_eq!(headers.entry("x-trace").unwrap().combined_value(), "abc");
        assert_eq!(
            req.query_string().unwrap().entry("Id2").unwrap().combined_value(),
            "2"
        );
    }
}
