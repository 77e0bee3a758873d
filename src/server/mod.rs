//! Process and event-loop layer: the pre-fork bootstrap and the
//! per-worker reactor.

pub mod bootstrap;
pub mod reactor;

pub use bootstrap::{Worker, bind_listener, run};
pub use reactor::{EventHandler, Reactor, ShutdownHandle};
