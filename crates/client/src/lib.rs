//! Network side of feedstash.
//!
//! This crate provides the transport capability with a reqwest adapter,
//! the remote payload mapper, and the remote feed loader.

pub mod remote;
pub mod transport;

pub use remote::{RemoteError, RemoteFeedLoader};
pub use transport::{HttpTransport, Transport, TransportConfig, TransportError, TransportResponse};
