//! Transport capability: one GET per call, status and body back.
//!
//! Status codes are not interpreted here; a 404 with a body is a successful
//! exchange. Only failures to complete the exchange are errors.

pub mod error;
pub mod http;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

pub use error::TransportError;
pub use http::{HttpTransport, TransportConfig};

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Performs a single GET for a URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        (**self).get(url).await
    }
}
