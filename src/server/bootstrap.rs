//! Pre-fork worker startup.
//!
//! The listening socket is created once, with `SO_REUSEPORT` set, before any
//! fork. Every worker process (the parent included) inherits it and runs its
//! own [`Reactor`]; the kernel spreads incoming connections across them.
//! Workers are not supervised: a dead worker is not replaced.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;

use anyhow::Context;
use signal_hook::consts::{SIGINT, SIGTERM};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{info, info_span};

use crate::config::Config;
use crate::http::handler::Dispatcher;
use crate::server::reactor::Reactor;

/// A forked worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Worker {
    pub pid: libc::pid_t,
}

enum Fork {
    Parent(Worker),
    Child,
}

/// Opens a non-blocking listening socket that other processes may share.
pub fn bind_listener(addr: SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_reuse_port(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

fn fork() -> io::Result<Fork> {
    // SAFETY: called before any reactor, signal handler or extra thread
    // exists; the child only continues with state it fully owns.
    match unsafe { libc::fork() } {
        -1 => Err(io::Error::last_os_error()),
        0 => Ok(Fork::Child),
        pid => Ok(Fork::Parent(Worker { pid })),
    }
}

/// Forks `count - 1` children. Returns the spawned workers in the parent and
/// an empty list in every child.
pub fn spawn_workers(count: usize) -> io::Result<Vec<Worker>> {
    let mut children = Vec::with_capacity(count.saturating_sub(1));
    for _ in 1..count {
        match fork()? {
            Fork::Parent(worker) => {
                info!(pid = worker.pid, "Spawned worker");
                children.push(worker);
            }
            Fork::Child => return Ok(Vec::new()),
        }
    }
    Ok(children)
}

/// Binds, forks and runs this process's reactor until SIGINT/SIGTERM.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let addr = config
        .listen_addr()
        .to_socket_addrs()
        .with_context(|| format!("resolving {}", config.listen_addr()))?
        .next()
        .with_context(|| format!("no address for {}", config.listen_addr()))?;

    let listener = bind_listener(addr, config.server.backlog)
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, workers = config.server.workers, "Listening");

    spawn_workers(config.server.workers).context("forking workers")?;
    run_worker(listener, config)
}

/// Runs one worker's reactor on an inherited listening socket.
pub fn run_worker(listener: TcpListener, config: &Config) -> anyhow::Result<()> {
    let span = info_span!("worker", pid = std::process::id());
    let _guard = span.enter();

    let mut reactor = Reactor::new(listener, Dispatcher::from_config(config), &config.server)
        .context("creating reactor")?;

    let flag = reactor.shutdown_flag();
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&flag))
            .with_context(|| format!("registering handler for signal {signal}"))?;
    }

    reactor.run().context("reactor loop failed")
}
