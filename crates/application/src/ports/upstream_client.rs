use crate::model::{Request, Response};
use async_trait::async_trait;
use crossbar_dns_domain::{DomainError, UpstreamSpec};
use std::net::SocketAddr;

/// Sends one query to one concrete upstream address and returns the
/// decoded answer. Wire encoding and transport details live behind this
/// port.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn exchange(
        &self,
        upstream: &UpstreamSpec,
        server: SocketAddr,
        request: &Request,
    ) -> Result<Response, DomainError>;
}
