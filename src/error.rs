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
//! [tracing-request-renderers](crate) errors

use backtrace::Backtrace;

/// [tracing-request-renderers](crate) error type
///
/// Note what is *not* here: a requested key that isn't in the collection, an empty collection, or
/// an empty key selection. Those are ordinary inputs that render as empty (or partial) output, not
/// errors. What remains are configuration mistakes, reentrancy refusals & failures in the
/// [`tracing`] plumbing.
#[non_exhaustive]
pub enum Error {
    /// Unrecognized output format name in renderer configuration
    BadOutputFormat { text: String, back: Backtrace },
    /// A layout configuration could not be deserialized
    BadConfig {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// Formatting an Event failed
    Format {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// A reentrancy scope was already held by this thread
    Reentrant { scope: &'static str },
    /// Writing a rendered line failed
    Sink {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadOutputFormat { text, .. } => write!(
                f,
                "'{}' is not an output format (expected Flat, Json, JsonArray or JsonDictionary)",
                text
            ),
            Error::BadConfig { source, .. } => {
                write!(f, "While reading a layout configuration, got {}", source)
            }
            Error::Format { source, .. } => {
                write!(f, "While formatting an Event, got {}", source)
            }
            Error::Reentrant { scope } => {
                write!(f, "The '{}' scope is already active on this thread", scope)
            }
            Error::Sink { source, .. } => write!(f, "Sink error: {}", source),
            _ => write!(f, "Other tracing-request-renderers error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadOutputFormat { text: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::BadConfig { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::Format { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::Reentrant { .. } => write!(f, "{}", self),
            Error::Sink { source: _, back } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "tracing-request-renderers error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
