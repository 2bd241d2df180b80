//! JSON-RPC protocol handling
//!
//! Provides the request/response envelopes and the method dispatcher.

pub mod rpc;
pub mod server;
