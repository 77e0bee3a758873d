//! Beacon - pre-forking static file server
//!
//! Core library: configuration, the HTTP layer and the reactor/worker
//! machinery.

pub mod config;
pub mod http;
pub mod server;
