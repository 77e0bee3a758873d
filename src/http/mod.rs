//! HTTP protocol implementation.
//!
//! A restricted HTTP/1.x: one request per connection, `GET` and `HEAD`
//! only, the client's protocol token echoed in the status line.
//!
//! # Architecture
//!
//! - **`connection`**: the per-socket state machine driven by the reactor
//! - **`parser`**: finds the header terminator and parses the header block
//! - **`request`**: parsed request representation
//! - **`query`**: query string decoding (repeated keys, blank values)
//! - **`handler`**: method table and response assembly
//! - **`files`**: document root and path resolution
//! - **`mime`**: content type by file extension
//! - **`response`**: status codes and the response header block
//! - **`producer`**: chunked file body source
//! - **`writer`**: pushes the header block and body chunks to the socket
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │  ReadingHeaders  │ ← Buffer bytes until CRLFCRLF
//!        └──────┬───────────┘
//!               │ Header block complete (or malformed → 400)
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Method table, path resolution
//!        └──────┬───────────┘
//!               │ Response chosen
//!               ▼
//!        ┌──────────────────┐
//!        │ WritingResponse  │ ← Header block, then producer chunks
//!        └──────┬───────────┘
//!               │ Producer exhausted
//!               ▼
//!             Closed
//! ```
//!
//! Any failure along the way closes the connection without a retry.

pub mod connection;
pub mod files;
pub mod handler;
pub mod mime;
pub mod parser;
pub mod producer;
pub mod query;
pub mod request;
pub mod response;
pub mod writer;
