//! Pull-based response body source.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};

use bytes::{Bytes, BytesMut};

/// Default number of bytes handed out per pull.
pub const CHUNK_SIZE: usize = 4096;

/// Something the writer can drain chunk by chunk. An empty chunk means the
/// source is exhausted.
pub trait Producer: fmt::Debug {
    fn more(&mut self) -> io::Result<Bytes>;
}

/// Streams an open file in fixed-size chunks.
///
/// Every chunk but the last is exactly `chunk_size` bytes. The file is
/// dropped (closed) the first time a pull finds it exhausted.
pub struct FileProducer<R = File> {
    file: Option<R>,
    chunk_size: usize,
}

impl<R> FileProducer<R> {
    pub fn new(file: R) -> Self {
        Self::with_chunk_size(file, CHUNK_SIZE)
    }

    pub fn with_chunk_size(file: R, chunk_size: usize) -> Self {
        Self {
            file: Some(file),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn is_exhausted(&self) -> bool {
        self.file.is_none()
    }
}

impl<R: Read> Producer for FileProducer<R> {
    fn more(&mut self) -> io::Result<Bytes> {
        let Some(file) = self.file.as_mut() else {
            return Ok(Bytes::new());
        };

        let mut buf = BytesMut::zeroed(self.chunk_size);
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if filled == 0 {
            self.file = None;
            return Ok(Bytes::new());
        }

        buf.truncate(filled);
        Ok(buf.freeze())
    }
}

impl<R> fmt::Debug for FileProducer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileProducer")
            .field("open", &self.file.is_some())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}
