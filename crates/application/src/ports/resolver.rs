use crate::model::{Request, Response};
use async_trait::async_trait;
use crossbar_dns_domain::DomainError;

/// One link in a resolution chain.
///
/// An implementation either answers the request itself (short-circuit) or
/// delegates to the next link it holds a reference to. Chains are wired
/// at startup and never restructured afterwards.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError>;

    /// Stable name used when logging chain traversal.
    fn name(&self) -> &'static str;
}
