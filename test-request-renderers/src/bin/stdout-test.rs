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

//! Write a few events, decorated with a canned request, to stdout.

use tracing::{debug, error, info, trace, warn};
use tracing_request_renderers::{
    context::{Request, RequestContext},
    layer::Layer,
    layout::Layout,
    source::NamedValues,
};
use tracing_subscriber::{
    layer::SubscriberExt, // Needed to get `with()`
    registry::Registry,
};

use std::sync::Arc;

const LAYOUT: &str = r#"
[[renderer]]
type = "request-cookie"
name = "cookies"
items = ["key", "key2"]
expand_multi_value = true
output_format = "json"

[[renderer]]
type = "request-querystring"
name = "query"
exclude = ["password"]
output_format = "json-dictionary"

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

pub fn main() {
    let request: Arc<dyn RequestContext + Send + Sync> = Arc::new(
        Request::builder()
            .cookies(NamedValues::from_cookie_header(
                "key=TEST&Key1=TEST1; key2=Test&key3=Test456",
            ))
            .query_string(NamedValues::from_query_string("Id=1&password=hunter2&Id2=2"))
            .session(serde_json::json!({"user": {"name": "你好"}}))
            .method("GET")
            .build(),
    );

    // Setup the real subsriber...
    let subscriber = Registry::default().with(Layer::stdout(
        Layout::from_toml(LAYOUT).unwrap(),
        move || Some(request.clone()),
    ));
    // and install it.
    let _guard = tracing::subscriber::set_default(subscriber);

    trace!("你好, stdout.");
    debug!("你好, stdout.");
    info!("你好, stdout.");
    warn!("你好, stdout.");
    error!("你好, stdout.");
}
