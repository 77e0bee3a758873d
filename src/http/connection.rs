use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr};
use std::rc::Rc;

use bytes::BytesMut;
use mio::event::Source;
use mio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::http::handler::Dispatcher;
use crate::http::parser::{ParseError, TERMINATOR, find_headers_end_from, parse_http_request};
use crate::http::request::Request;
use crate::http::response::{DEFAULT_VERSION, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::server::reactor::EventHandler;

const READ_CHUNK: usize = 4096;

/// One accepted client socket, serving exactly one request.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    /// Prefix of `buffer` already searched for the terminator.
    scanned: usize,
    max_header_bytes: usize,
    state: ConnectionState,
    dispatcher: Rc<Dispatcher>,
}

pub enum ConnectionState {
    /// Collecting bytes until the header terminator shows up
    ReadingHeaders,
    /// Request parsed, response not chosen yet
    Dispatching(Request),
    WritingResponse(ResponseWriter),
    Closed,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        dispatcher: Rc<Dispatcher>,
        max_header_bytes: usize,
    ) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            scanned: 0,
            max_header_bytes,
            state: ConnectionState::ReadingHeaders,
            dispatcher,
        }
    }

    /// Leaves `ReadingHeaders` once the buffer holds a whole header block,
    /// or once it has grown past the header limit without one.
    fn try_parse(&mut self) -> anyhow::Result<()> {
        // A terminator may straddle the previous read boundary.
        let from = self.scanned.saturating_sub(TERMINATOR.len() - 1);
        if find_headers_end_from(&self.buffer, from).is_none() {
            self.scanned = self.buffer.len();
            if self.buffer.len() > self.max_header_bytes {
                self.bad_request(ParseError::HeadersTooLarge(self.max_header_bytes));
            }
            return Ok(());
        }

        match parse_http_request(&self.buffer) {
            Err(ParseError::Incomplete) => Ok(()),
            Err(e) => {
                self.bad_request(e);
                Ok(())
            }
            Ok((request, _consumed)) => {
                self.state = ConnectionState::Dispatching(request);
                self.dispatch()
            }
        }
    }

    fn bad_request(&mut self, error: ParseError) {
        warn!(peer = %self.peer, %error, "Bad request");
        let response = self
            .dispatcher
            .error(StatusCode::BadRequest, DEFAULT_VERSION);
        self.state = ConnectionState::WritingResponse(ResponseWriter::new(response));
    }

    fn dispatch(&mut self) -> anyhow::Result<()> {
        // Left Closed if dispatch fails; the reactor then drops the connection.
        let request = match std::mem::replace(&mut self.state, ConnectionState::Closed) {
            ConnectionState::Dispatching(request) => request,
            other => {
                self.state = other;
                return Ok(());
            }
        };

        info!(
            peer = %self.peer,
            method = %request.method,
            target = %request.target,
            version = %request.version,
            "Request"
        );

        let response = self.dispatcher.dispatch(&request)?;
        debug!(peer = %self.peer, status = response.status.as_u16(), "Response");

        self.state = ConnectionState::WritingResponse(ResponseWriter::new(response));
        Ok(())
    }
}

impl EventHandler for Connection {
    fn wants_read(&self) -> bool {
        matches!(self.state, ConnectionState::ReadingHeaders)
    }

    fn wants_write(&self) -> bool {
        matches!(self.state, ConnectionState::WritingResponse(_))
    }

    fn on_read_ready(&mut self) -> anyhow::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        while self.wants_read() {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    debug!(peer = %self.peer, "Peer closed before sending a full request");
                    self.state = ConnectionState::Closed;
                }
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    self.try_parse()?;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn on_write_ready(&mut self) -> anyhow::Result<()> {
        let ConnectionState::WritingResponse(writer) = &mut self.state else {
            return Ok(());
        };

        if writer.write_to(&mut self.stream)? {
            debug!(peer = %self.peer, bytes = writer.written(), "Response sent");
            self.state = ConnectionState::Closed;
        }
        Ok(())
    }

    fn on_close(&mut self) {
        self.state = ConnectionState::Closed;
        // The peer may already be gone.
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    fn source(&mut self) -> &mut dyn Source {
        &mut self.stream
    }
}
