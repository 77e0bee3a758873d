use std::io::{self, Write};

use bytes::{Buf, Bytes};

use crate::http::producer::Producer;
use crate::http::response::Response;

/// Outbound side of a connection: the serialized header block, then the
/// body producer's chunks, one at a time.
pub struct ResponseWriter {
    pending: Bytes,
    producer: Option<Box<dyn Producer>>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        Self {
            pending: response.head_bytes(),
            producer: response.body,
            written: 0,
        }
    }

    /// Total bytes handed to the socket so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Writes as much as `stream` accepts without blocking.
    ///
    /// Returns `Ok(true)` once the header block and every producer chunk
    /// have been written, `Ok(false)` if the stream would block first.
    pub fn write_to<W: Write>(&mut self, stream: &mut W) -> io::Result<bool> {
        loop {
            while !self.pending.is_empty() {
                match stream.write(&self.pending) {
                    Ok(0) => {
                        return Err(io::Error::new(
                            io::ErrorKind::WriteZero,
                            "connection closed while writing",
                        ));
                    }
                    Ok(n) => {
                        self.pending.advance(n);
                        self.written += n;
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }

            let Some(producer) = self.producer.as_mut() else {
                return Ok(true);
            };
            let chunk = producer.more()?;
            if chunk.is_empty() {
                self.producer = None;
                return Ok(true);
            }
            self.pending = chunk;
        }
    }
}
