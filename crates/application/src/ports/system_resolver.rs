use async_trait::async_trait;
use crossbar_dns_domain::{DomainError, IpVersion};
use std::net::IpAddr;

/// Process-level hostname resolution, used when no bootstrap DNS is
/// configured.
#[async_trait]
pub trait SystemResolver: Send + Sync {
    async fn lookup_addresses(
        &self,
        ip_version: IpVersion,
        host: &str,
    ) -> Result<Vec<IpAddr>, DomainError>;
}
