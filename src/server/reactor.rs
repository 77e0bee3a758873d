//! Single-threaded readiness loop.
//!
//! The reactor owns the listening socket and every connection it accepted.
//! Each iteration waits (bounded by the poll timeout) for readiness, then
//! calls into the ready handlers. Nothing here is shared with other
//! threads apart from the [`ShutdownHandle`].

use std::io;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mio::event::Source;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use slab::Slab;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::http::handler::Dispatcher;

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;

/// What the reactor needs from anything it multiplexes.
pub trait EventHandler {
    fn wants_read(&self) -> bool;
    fn wants_write(&self) -> bool;
    fn on_read_ready(&mut self) -> anyhow::Result<()>;
    fn on_write_ready(&mut self) -> anyhow::Result<()>;
    /// Called once, right before the handler is dropped.
    fn on_close(&mut self);
    fn source(&mut self) -> &mut dyn Source;

    /// Interest to register, or `None` once the handler is finished.
    fn interest(&self) -> Option<Interest> {
        match (self.wants_read(), self.wants_write()) {
            (true, true) => Some(Interest::READABLE | Interest::WRITABLE),
            (true, false) => Some(Interest::READABLE),
            (false, true) => Some(Interest::WRITABLE),
            (false, false) => None,
        }
    }
}

struct Registration {
    handler: Box<dyn EventHandler>,
    interest: Interest,
}

/// Stops a running reactor from any thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Err(e) = self.waker.wake() {
            warn!(error = %e, "Failed to wake reactor");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

pub struct Reactor {
    poll: Poll,
    events: Events,
    listener: Option<TcpListener>,
    connections: Slab<Registration>,
    dispatcher: Rc<Dispatcher>,
    poll_timeout: Duration,
    max_header_bytes: usize,
    shutdown: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl Reactor {
    /// Takes over a bound, listening socket.
    pub fn new(
        listener: std::net::TcpListener,
        dispatcher: Dispatcher,
        config: &ServerConfig,
    ) -> io::Result<Self> {
        listener.set_nonblocking(true)?;
        let mut listener = TcpListener::from_std(listener);

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);

        Ok(Self {
            poll,
            events: Events::with_capacity(config.events_capacity),
            listener: Some(listener),
            connections: Slab::new(),
            dispatcher: Rc::new(dispatcher),
            poll_timeout: config.poll_timeout(),
            max_header_bytes: config.max_header_bytes,
            shutdown: Arc::new(AtomicBool::new(false)),
            waker,
        })
    }

    /// The flag [`run`](Self::run) checks between iterations. Signal
    /// handlers may set it directly.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            waker: Arc::clone(&self.waker),
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Runs until the shutdown flag is raised, then closes the listener.
    /// Connections still in flight are dropped, not drained.
    pub fn run(&mut self) -> io::Result<()> {
        info!(addr = ?self.local_addr(), "Reactor started");

        while !self.shutdown.load(Ordering::SeqCst) {
            if let Err(e) = self.poll.poll(&mut self.events, Some(self.poll_timeout)) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e);
            }

            let ready: Vec<(Token, bool, bool)> = self
                .events
                .iter()
                .map(|event| {
                    let failed = event.is_error();
                    (
                        event.token(),
                        event.is_readable() || event.is_read_closed() || failed,
                        event.is_writable() || event.is_write_closed() || failed,
                    )
                })
                .collect();

            for (token, readable, writable) in ready {
                match token {
                    LISTENER => self.accept(),
                    WAKER => {}
                    token => self.service(token, readable, writable),
                }
            }
        }

        self.stop();
        Ok(())
    }

    fn accept(&mut self) {
        loop {
            let Some(listener) = self.listener.as_ref() else {
                return;
            };
            match listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "Incoming connection");
                    if let Err(e) = self.register(stream, peer) {
                        warn!(%peer, error = %e, "Failed to register connection");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    return;
                }
            }
        }
    }

    fn register(&mut self, stream: TcpStream, peer: SocketAddr) -> io::Result<()> {
        let entry = self.connections.vacant_entry();
        let token = Token(entry.key() + FIRST_CONNECTION);

        let mut handler: Box<dyn EventHandler> = Box::new(Connection::new(
            stream,
            peer,
            Rc::clone(&self.dispatcher),
            self.max_header_bytes,
        ));
        let interest = Interest::READABLE;
        self.poll
            .registry()
            .register(handler.source(), token, interest)?;

        entry.insert(Registration { handler, interest });
        Ok(())
    }

    fn service(&mut self, token: Token, readable: bool, writable: bool) {
        let Some(key) = token.0.checked_sub(FIRST_CONNECTION) else {
            return;
        };
        let Some(registration) = self.connections.get_mut(key) else {
            return;
        };

        if let Err(e) = drive(registration.handler.as_mut(), readable, writable) {
            warn!(error = %e, "Connection failed");
            self.close(key);
            return;
        }

        match registration.handler.interest() {
            None => self.close(key),
            Some(interest) if interest != registration.interest => {
                let result = self
                    .poll
                    .registry()
                    .reregister(registration.handler.source(), token, interest);
                match result {
                    Ok(()) => registration.interest = interest,
                    Err(e) => {
                        warn!(error = %e, "Failed to update interest");
                        self.close(key);
                    }
                }
            }
            Some(_) => {}
        }
    }

    fn close(&mut self, key: usize) {
        let Some(mut registration) = self.connections.try_remove(key) else {
            return;
        };
        if let Err(e) = self.poll.registry().deregister(registration.handler.source()) {
            debug!(error = %e, "Failed to deregister connection");
        }
        registration.handler.on_close();
    }

    fn stop(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            if let Err(e) = self.poll.registry().deregister(&mut listener) {
                debug!(error = %e, "Failed to deregister listener");
            }
        }
        info!(in_flight = self.connections.len(), "Worker shutdown");
        self.connections.clear();
    }
}

/// Delivers one readiness event to a handler, honouring its current wants.
fn drive(handler: &mut dyn EventHandler, readable: bool, writable: bool) -> anyhow::Result<()> {
    if readable && handler.wants_read() {
        handler.on_read_ready()?;
    }
    if writable && handler.wants_write() {
        handler.on_write_ready()?;
    }
    Ok(())
}
