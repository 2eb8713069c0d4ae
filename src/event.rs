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

//! Primitives for mapping [`tracing`] [`Event`]s to text.
//!
//! [`EventFormatter`] implementations decide what text (if any) an [`Event`] contributes to the
//! line the [`Layer`] writes; the rendered request values are appended after it. This module
//! provides a single implementation, [`MessageFormatter`], that extracts the "message" field (or
//! falls back to the event name).
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
//! [`Layer`]: crate::layer::Layer

use std::convert::Infallible;

type StdResult<T, E> = std::result::Result<T, E>;

/// Format [`tracing`] [`Event`]s as UTF-8 text.
///
/// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
/// [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
///
/// Returning `Ok(None)` means the event should produce no line at all.
pub trait EventFormatter<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    type Error: std::error::Error + Send + Sync + 'static;
    fn on_event(
        &self,
        event: &tracing::Event,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> StdResult<Option<String>, Self::Error>;
}

/// An [`EventFormatter`] that returns an [`Event`]'s "message" field.
///
/// [`Event`]: https://docs.rs/tracing/latest/tracing/struct.Event.html
///
/// Events recorded with fields only (`info!(order_id = 7)`) still get a line: their message is
/// the event's name, which `tracing` sets to `event <file>:<line>`.
#[derive(Clone, Debug, Default)]
pub struct MessageFormatter;

#[derive(Default)]
struct Message(Option<String>);

impl tracing::field::Visit for Message {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = Some(value.to_owned());
        }
    }
    // `message` normally arrives pre-formatted as `fmt::Arguments`, whose `Debug` is unquoted.
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S> EventFormatter<S> for MessageFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    type Error = Infallible;
    fn on_event(
        &self,
        event: &tracing::Event,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> StdResult<Option<String>, Infallible> {
        let mut message = Message::default();
        event.record(&mut message);
        Ok(Some(
            message
                .0
                .unwrap_or_else(|| event.metadata().name().to_owned()),
        ))
    }
}
