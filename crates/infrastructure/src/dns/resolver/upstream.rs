use crate::dns::bootstrap::Bootstrap;
use crate::dns::ip_set::IpSet;
use async_trait::async_trait;
use crossbar_dns_application::model::{Request, Response};
use crossbar_dns_application::ports::{Resolver, UpstreamClient};
use crossbar_dns_domain::{DomainError, UpstreamSpec};
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace};

/// Terminal chain link forwarding queries to one configured upstream.
///
/// Construction performs no resolution. The upstream's addresses come
/// from the bootstrap on first use and are pinned for the resolver's
/// lifetime; the round-robin cursor inside the pinned [`IpSet`] is shared
/// by every caller dialing this upstream.
pub struct UpstreamResolver {
    upstream: UpstreamSpec,
    client: Arc<dyn UpstreamClient>,
    bootstrap: Weak<Bootstrap>,
    ips: OnceLock<Arc<IpSet>>,
}

impl UpstreamResolver {
    pub fn new_unchecked(
        upstream: UpstreamSpec,
        client: Arc<dyn UpstreamClient>,
        bootstrap: Weak<Bootstrap>,
    ) -> Self {
        Self {
            upstream,
            client,
            bootstrap,
            ips: OnceLock::new(),
        }
    }

    pub fn upstream(&self) -> &UpstreamSpec {
        &self.upstream
    }

    async fn ip_set(&self) -> Result<Arc<IpSet>, DomainError> {
        if let Some(set) = self.ips.get() {
            return Ok(Arc::clone(set));
        }

        let bootstrap = self.bootstrap.upgrade().ok_or_else(|| {
            DomainError::ConfigError(format!(
                "bootstrap dropped while resolving '{}'",
                self.upstream
            ))
        })?;
        let set = Arc::new(bootstrap.upstream_ips(self).await?);

        // If another caller raced us here, the first pinned set wins.
        Ok(Arc::clone(self.ips.get_or_init(|| set)))
    }
}

#[async_trait]
impl Resolver for UpstreamResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        let ips = self.ip_set().await?;
        let server = SocketAddr::new(ips.current(), self.upstream.port);

        trace!(upstream = %self.upstream, %server, "forwarding query");

        match self.client.exchange(&self.upstream, server, request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                // Next caller tries the following address.
                ips.rotate();
                debug!(upstream = %self.upstream, %server, error = %e, "upstream exchange failed");
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "upstream"
    }
}
