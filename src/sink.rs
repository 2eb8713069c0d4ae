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

//! Where rendered lines go.
//!
//! This module defines the [`Sink`] trait the [`Layer`] writes through, along with
//! [`WriterSink`], which writes to anything implementing [`std::io::Write`].
//!
//! [`Layer`]: crate::layer::Layer
//!
//! # Examples
//!
//! ```rust
//! use tracing_request_renderers::sink::{Sink, WriterSink};
//! let sink = WriterSink::new(Vec::new());
//! sink.send("Hello, world!").unwrap();
//! assert_eq!(sink.into_inner(), b"Hello, world!\n");
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;

use std::{io::Write, sync::Mutex};

/// Operations all sinks must support.
pub trait Sink {
    /// Write one complete line; the sink supplies the line terminator.
    fn send(&self, line: &str) -> Result<()>;
}

/// Writes each line, newline-terminated, to a [`Write`] implementation.
pub struct WriterSink<W: Write> {
    writer: Mutex<W>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> WriterSink<W> {
        WriterSink {
            writer: Mutex::new(writer),
        }
    }
    pub fn into_inner(self) -> W {
        // A panic mid-write leaves nothing worth protecting
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WriterSink<std::io::Stdout> {
    pub fn stdout() -> WriterSink<std::io::Stdout> {
        WriterSink::new(std::io::stdout())
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn send(&self, line: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(writer, "{}", line)
            .and_then(|_| writer.flush())
            .map_err(|err| Error::Sink {
                source: Box::new(err),
                back: Backtrace::new(),
            })
    }
}

#[cfg(test)]
mod test {

    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_lines() {
        let sink = WriterSink::new(Vec::new());
        sink.send("one").unwrap();
        sink.send("two").unwrap();
        assert_eq!(sink.into_inner(), b"one\ntwo\n");
    }

    #[test]
    fn reports_io_errors() {
        let sink = WriterSink::new(Broken);
        assert!(matches!(sink.send("one"), Err(Error::Sink { .. })));
    }
}
