//! Fan-out writer: one input stream, N downstream sinks.
//!
//! Every chunk is written in full to each sink, in sink order, before the
//! next chunk is accepted. The first sink error aborts the write; later
//! sinks do not see that chunk.

use std::io::{self, Write};

/// Forwards each write to all of its sinks.
pub struct FanOut<'a, const N: usize> {
    sinks: [&'a mut dyn Write; N],
}

impl<'a, const N: usize> FanOut<'a, N> {
    pub fn new(sinks: [&'a mut dyn Write; N]) -> Self {
        Self { sinks }
    }
}

impl<const N: usize> Write for FanOut<'_, N> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in self.sinks.iter_mut() {
            sink.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}
