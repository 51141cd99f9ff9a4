//! Remote Module
//!
//! Boundary to the hosted backend-as-a-service: sink contract, HTTP
//! implementation, and startup readiness.

mod http;
mod init;
mod sink;

pub use http::HttpSink;
pub use init::{await_ready, ready_channel, spawn_remote_init, ReadyReceiver, ReadySender};
pub use sink::{RemoteSink, SharedSink};
