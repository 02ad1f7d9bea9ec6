//! Network Retrieval Facility
//!
//! The fetch adapter consumes a [`Transport`]: something that takes a URL
//! and eventually yields a status and body, or a network error. No HTTP
//! client is bundled; plug one in by implementing the trait, or pass a
//! closure returning a boxed future.
//!
//! ```rust
//! use futures_util::future::{BoxFuture, FutureExt};
//! use hooklab_core::error::TransportError;
//! use hooklab_core::transport::{Response, Transport};
//!
//! let transport = |url: &str| -> BoxFuture<'static, Result<Response, TransportError>> {
//!     let body = format!("{{\"url\":\"{url}\"}}");
//!     async move { Ok(Response::ok(body)) }.boxed()
//! };
//! let _future = transport.request("/posts/1");
//! ```

use futures_util::future::BoxFuture;

use crate::error::TransportError;

/// What a completed request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A `200` response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An asynchronous retrieval facility.
///
/// The returned future must not borrow from `self` or `url`: the fetch
/// adapter moves it onto the runtime.
pub trait Transport: Send + Sync {
    fn request(&self, url: &str) -> BoxFuture<'static, Result<Response, TransportError>>;
}

impl<F> Transport for F
where
    F: Fn(&str) -> BoxFuture<'static, Result<Response, TransportError>> + Send + Sync,
{
    fn request(&self, url: &str) -> BoxFuture<'static, Result<Response, TransportError>> {
        self(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_the_2xx_range() {
        assert!(Response::ok("").is_success());
        assert!(Response::new(204, "").is_success());
        assert!(!Response::new(199, "").is_success());
        assert!(!Response::new(301, "").is_success());
        assert!(!Response::new(404, "").is_success());
    }
}
