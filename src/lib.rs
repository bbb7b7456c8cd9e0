//! Zentinel Token Exchange
//!
//! OAuth 2.0 Token Exchange (RFC 8693) grant validation for the Zentinel
//! authentication agent. See [`exchange`] for the pipeline.

pub mod exchange;

pub use exchange::*;
