//! Network transport seam.
//!
//! The engine never performs I/O itself; it asks a [`Transport`] to fetch.
//! Any transport-level failure is reported as [`Error::Network`]. A response
//! with a non-2xx status is still a response, not an error.

use async_trait::async_trait;

use crate::Error;
use crate::request::Request;
use crate::response::ResponseSnapshot;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the request from the network.
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot, Error>;
}
