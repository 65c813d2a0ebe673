//! Solex chain client: submits compiled artifacts to an Ethereum-style
//! execution backend over JSON-RPC.
//!
//! The backend node is an external capability. This crate owns the wire
//! conversation: transaction submission, receipt polling, revert
//! classification, per-call deadlines with a single retry for transient
//! faults, and decoding of the assertion library's `TestEvent` logs.

pub mod abi;
pub mod client;
pub mod transport;

pub use client::JsonRpcBackend;
pub use transport::{HttpTransport, RpcTransport, TransportError};
