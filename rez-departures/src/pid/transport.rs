//! The request contract the board fetcher depends on.

use std::future::Future;
use std::sync::Arc;

use super::error::TransportError;

/// Successful upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Issues one GET request against the upstream API.
///
/// Implementations own timeouts, authentication and any retrying; callers
/// only see the final outcome.
pub trait Transport: Send + Sync {
    fn request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send {
        (**self).request(path, query)
    }
}
