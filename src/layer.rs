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

//! [tracing-request-renderers](crate) [`Layer`] implementation.
//!
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! [`Layer`] is parameterized by the [`EventFormatter`] that turns an [`Event`] into its message
//! text & the [`Sink`] that receives the finished line. Consumers are free to implement either
//! trait themselves.
//!
//! [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html

use crate::{
    context::RequestAccessor,
    error::Error,
    event::{EventFormatter, MessageFormatter},
    guard::ReentrancyGuard,
    layout::Layout,
    sink::{Sink, WriterSink},
};

use backtrace::Backtrace;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::Event;
use tracing_subscriber::layer::Context;

// When the tracing-log feature is enabled, use NormalizeEvent to recover the level & target of
// events that originated from the `log` crate.
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

use std::sync::Arc;

/// Held while the [`Layer`] handles an event; events raised meanwhile on the same thread (by a
/// renderer, or by our own error reporting) are dropped.
pub const LAYER_SCOPE: &str = "layer";

/// Assemble the line for one event.
///
/// `<timestamp> <LEVEL> <target>: <message>`, followed by ` name=value` for each rendered value
/// that isn't empty. The timestamp is RFC 3339 in UTC with microseconds; `None` means "now".
pub fn format_line(
    level: &tracing::Level,
    target: &str,
    message: &str,
    values: &[(&str, String)],
    timestamp: Option<DateTime<Utc>>,
) -> String {
    let mut line = format!(
        "{} {} {}: {}",
        timestamp
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Micros, true),
        level,
        target,
        message
    );
    values
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .for_each(|(name, value)| {
            line.push(' ');
            line.push_str(name);
            line.push('=');
            line.push_str(value);
        });
    line
}

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that appends the rendered values of
/// the current request to each [`Event`].
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
///
/// The current request is whatever the [`RequestAccessor`] given at construction says it is; when
/// it says there is none, events are written with their message alone.
pub struct Layer<S, F: EventFormatter<S>, K: Sink>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    event_formatter: F,
    sink: K,
    layout: Layout,
    accessor: Arc<dyn RequestAccessor>,
    // The Subscriber type only exists to be handed on to the EventFormatter.
    subscriber_type: std::marker::PhantomData<S>,
}

impl<S, K: Sink> Layer<S, MessageFormatter, K>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    /// Construct a Layer that writes each event's message, followed by `layout` rendered against
    /// the current request, to `sink`
    pub fn new(layout: Layout, accessor: impl RequestAccessor + 'static, sink: K) -> Self {
        Layer::with_event_formatter(layout, accessor, MessageFormatter, sink)
    }
}

impl<S> Layer<S, MessageFormatter, WriterSink<std::io::Stdout>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    /// Construct a Layer that writes to stdout
    pub fn stdout(layout: Layout, accessor: impl RequestAccessor + 'static) -> Self {
        Layer::new(layout, accessor, WriterSink::stdout())
    }
}

impl<S, F: EventFormatter<S>, K: Sink> Layer<S, F, K>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    /// construct Layer with custom inners
    pub fn with_event_formatter(
        layout: Layout,
        accessor: impl RequestAccessor + 'static,
        event_formatter: F,
        sink: K,
    ) -> Self {
        Layer {
            event_formatter,
            sink,
            layout,
            accessor: Arc::new(accessor),
            subscriber_type: std::marker::PhantomData,
        }
    }
    fn render_values(&self) -> Vec<(&str, String)> {
        match self.accessor.current() {
            Some(request) => self.layout.render(&*request),
            None => Vec::new(),
        }
    }
}

impl<S, F, K> tracing_subscriber::layer::Layer<S> for Layer<S, F, K>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    F: EventFormatter<S> + 'static,
    K: Sink + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let _guard = match ReentrancyGuard::acquire(LAYER_SCOPE) {
            Ok(guard) => guard,
            Err(_) => return,
        };

        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        self.event_formatter
            .on_event(event, ctx)
            .map_err(|err| Error::Format {
                source: Box::new(err),
                back: Backtrace::new(),
            })
            .and_then(|x| match x {
                Some(msg) => self.sink.send(&format_line(
                    meta.level(),
                    meta.target(),
                    &msg,
                    &self.render_values(),
                    None,
                )),
                None => Ok(()),
            })
            .unwrap_or_else(|err| {
                ::tracing::error!("request renderer layer failed: {}", err);
            })
    }
}

#[cfg(test)]
mod smoke {

    use super::*;

    use crate::{
        context::{Request, RequestContext},
        error::Result,
        renderer::CollectionRenderer,
        source::NamedValues,
    };

    use tracing_subscriber::layer::SubscriberExt;

    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<String>>>);

    impl Sink for Capture {
        fn send(&self, line: &str) -> Result<()> {
            self.0.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }

    impl Capture {
        /// Captured lines with their timestamps stripped
        fn lines(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|l| l.split_once(' ').unwrap().1.to_string())
                .collect()
        }
    }

    fn layout() -> Layout {
        Layout::new()
            .with_renderer(
                "cookies",
                CollectionRenderer::cookies()
                    .items(["key"])
                    .expand_multi_value(true),
            )
            .with_renderer("query", CollectionRenderer::query_string().items(["Id"]))
            .with_renderer("missing", CollectionRenderer::query_string().items(["nope"]))
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line(
                &tracing::Level::INFO,
                "test-target",
                "Hello, world!",
                &[("cookies", "key=TEST".to_string()), ("query", String::new())],
                Some(std::time::UNIX_EPOCH.into()),
            ),
            "1970-01-01T00:00:00.000000Z INFO test-target: Hello, world! cookies=key=TEST"
        );
        assert_eq!(
            format_line(
                &tracing::Level::WARN,
                "t",
                "Hello, 世界!",
                &[],
                Some(std::time::UNIX_EPOCH.into()),
            ),
            "1970-01-01T00:00:00.000000Z WARN t: Hello, 世界!"
        );
    }

    #[test]
    fn test_current_request() {
        let req: Arc<dyn RequestContext + Send + Sync> = Arc::new(
            Request::builder()
                .cookies(NamedValues::from_cookie_header("key=TEST&Key1=TEST1"))
                .query_string(NamedValues::from_query_string("Id=1&Id2=2"))
                .build(),
        );
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(Layer::new(
            layout(),
            move || Some(req.clone()),
            capture.clone(),
        ));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "checkout", "Hello, {}!", "world");
        });

        assert_eq!(
            capture.lines(),
            vec!["INFO checkout: Hello, world! cookies=key=TEST&Key1=TEST1 query=Id:1"]
        );
    }

    #[test]
    fn test_no_current_request() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(Layer::new(
            layout(),
            || -> Option<Arc<dyn RequestContext + Send + Sync>> { None },
            capture.clone(),
        ));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "checkout", "no request here");
            // Fields only: the event's name stands in for the message
            tracing::info!(target: "checkout", answer = 42);
        });

        let lines = capture.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "WARN checkout: no request here");
        assert!(lines[1].starts_with("INFO checkout: event src/layer.rs:"));
    }

    #[test]
    fn test_reentrant_events_dropped() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(Layer::new(
            layout(),
            || -> Option<Arc<dyn RequestContext + Send + Sync>> { None },
            capture.clone(),
        ));

        tracing::subscriber::with_default(subscriber, || {
            {
                let _held = ReentrancyGuard::acquire(LAYER_SCOPE).unwrap();
                tracing::info!(target: "checkout", "swallowed");
            }
            tracing::info!(target: "checkout", "written");
        });

        assert_eq!(capture.lines(), vec!["INFO checkout: written"]);
    }
}
